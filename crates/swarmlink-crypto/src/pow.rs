//! Hashcash-style proof-of-work gate for swarm submissions.
//!
//! Storage nodes reject messages that do not carry a valid nonce, forcing a
//! CPU cost on every sender and rate-limiting spam. The difficulty target is
//! derived from the payload size and the requested time-to-live: bigger or
//! longer-lived messages are more expensive to store, so they cost more to
//! submit.
//!
//! The search loop is pure CPU work with no shared state. It must run off the
//! caller's latency-sensitive threads; cancellation is cooperative via an
//! [`AtomicBool`] polled between hash batches.

use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha512};
use thiserror::Error;

/// Nonce width in bytes. Fixed by the storage network's wire format.
pub const NONCE_SIZE: usize = 8;

/// Default trials-per-byte difficulty factor.
///
/// Debug builds use a cheap target so tests stay fast. Release builds must
/// use 100 to interoperate with the live storage network, which verifies
/// against exactly that value.
pub const DEFAULT_NONCE_TRIALS: u32 = if cfg!(debug_assertions) { 10 } else { 100 };

/// How many nonce candidates are hashed between cancellation checks.
const CANCEL_POLL_INTERVAL: u64 = 4096;

/// Errors from the proof-of-work search.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PowError {
    /// The caller's cancellation flag was set before a valid nonce was found.
    #[error("proof-of-work cancelled after {iterations} iterations")]
    Cancelled {
        /// Nonce candidates tried before cancellation was observed.
        iterations: u64,
    },
}

/// Difficulty target for a payload of `payload_len` bytes stored for
/// `ttl_seconds`.
///
/// `target = 2^64 / (trials * (len + 8 + ttl * (len + 8) / 2^16))` with floor
/// division throughout. A `ttl_seconds` of zero is legal; the `len + 8` term
/// keeps the denominator non-zero as long as `nonce_trials >= 1` (enforced
/// here by clamping).
pub fn target(ttl_seconds: u64, payload_len: usize, nonce_trials: u32) -> u64 {
    let size = payload_len as u128 + NONCE_SIZE as u128;
    let trials = u128::from(nonce_trials.max(1));
    let denominator = trials * (size + (u128::from(ttl_seconds) * size) / 65536);
    ((1u128 << 64) / denominator) as u64
}

/// Find the first nonce whose trial value meets the difficulty target.
///
/// Candidates are tried by incrementing an 8-byte big-endian counter from
/// zero; the first nonce tested is `0x00..01`. For each candidate the trial
/// value is the first 8 bytes of `SHA-512(nonce || SHA-512(payload))` read
/// big-endian, and the search stops as soon as it is `<= target`.
///
/// The loop is unbounded. Callers that may need to abandon a send should use
/// [`compute_nonce_cancellable`].
pub fn compute_nonce(payload: &[u8], ttl_millis: u64, nonce_trials: u32) -> [u8; NONCE_SIZE] {
    let never = AtomicBool::new(false);
    match compute_nonce_cancellable(payload, ttl_millis, nonce_trials, &never) {
        Ok(nonce) => nonce,
        // The flag above is never set, so the search cannot be cancelled.
        Err(PowError::Cancelled { .. }) => unreachable!("cancellation flag is never set"),
    }
}

/// [`compute_nonce`] with cooperative cancellation.
///
/// The flag is polled every [`CANCEL_POLL_INTERVAL`] candidates, so
/// cancellation latency is bounded by one hash batch.
pub fn compute_nonce_cancellable(
    payload: &[u8],
    ttl_millis: u64,
    nonce_trials: u32,
    cancel: &AtomicBool,
) -> Result<[u8; NONCE_SIZE], PowError> {
    let target = target(ttl_millis / 1000, payload.len(), nonce_trials);
    let initial_hash = Sha512::digest(payload);

    let mut nonce = [0u8; NONCE_SIZE];
    let mut trial_value = u64::MAX;
    let mut iterations: u64 = 0;

    while trial_value > target {
        if iterations % CANCEL_POLL_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return Err(PowError::Cancelled { iterations });
        }
        increment_be(&mut nonce);

        let mut hasher = Sha512::new();
        hasher.update(nonce);
        hasher.update(initial_hash);
        let digest = hasher.finalize();

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        trial_value = u64::from_be_bytes(head);

        iterations = iterations.wrapping_add(1);
    }

    Ok(nonce)
}

/// Compute the proof-of-work for a swarm submission and return the nonce
/// base64-encoded for transport.
///
/// The hashed preimage matches what storage nodes reconstruct on
/// verification: the decimal ASCII timestamp, the decimal ASCII TTL, the
/// recipient public key, then the (already base64-encoded) message data.
pub fn calculate(
    data: &[u8],
    recipient: &str,
    timestamp_millis: u64,
    ttl_millis: u64,
    nonce_trials: u32,
    cancel: &AtomicBool,
) -> Result<String, PowError> {
    let payload = preimage(data, recipient, timestamp_millis, ttl_millis);
    let nonce = compute_nonce_cancellable(&payload, ttl_millis, nonce_trials, cancel)?;
    Ok(BASE64.encode(nonce))
}

/// Check that a nonce satisfies the target for the given payload parameters.
pub fn verify(nonce: &[u8; NONCE_SIZE], payload: &[u8], ttl_millis: u64, nonce_trials: u32) -> bool {
    let target = target(ttl_millis / 1000, payload.len(), nonce_trials);
    trial_value(nonce, payload) <= target
}

/// Trial value of a single nonce candidate against a payload.
pub fn trial_value(nonce: &[u8; NONCE_SIZE], payload: &[u8]) -> u64 {
    let initial_hash = Sha512::digest(payload);
    let mut hasher = Sha512::new();
    hasher.update(nonce);
    hasher.update(initial_hash);
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// Build the verification preimage for a swarm submission.
pub fn preimage(data: &[u8], recipient: &str, timestamp_millis: u64, ttl_millis: u64) -> Vec<u8> {
    let timestamp = timestamp_millis.to_string();
    let ttl = ttl_millis.to_string();
    let mut payload =
        Vec::with_capacity(timestamp.len() + ttl.len() + recipient.len() + data.len());
    payload.extend_from_slice(timestamp.as_bytes());
    payload.extend_from_slice(ttl.as_bytes());
    payload.extend_from_slice(recipient.as_bytes());
    payload.extend_from_slice(data);
    payload
}

/// Increment an 8-byte big-endian counter by one, wrapping on overflow.
fn increment_be(nonce: &mut [u8; NONCE_SIZE]) {
    for byte in nonce.iter_mut().rev() {
        let (next, overflow) = byte.overflowing_add(1);
        *byte = next;
        if !overflow {
            return;
        }
    }
}
