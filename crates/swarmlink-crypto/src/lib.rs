//! Swarmlink Cryptographic Primitives
//!
//! Pure building blocks for the decentralized messaging core: the hashcash
//! proof-of-work gate, the shared-sender-keys hash ratchet, and the two
//! message codecs (pairwise and closed-group). No I/O and no async; state
//! lives with the caller.
//!
//! # Key Lifecycle
//!
//! ```text
//! Genesis Chain Key (per group, per sender; distributed out-of-band)
//!        │
//!        ▼
//! Hash Ratchet → one-time Message Keys (HMAC-SHA256 chain)
//!        │
//!        ▼
//! AES-256-GCM inner layer ──┐
//!                           ├── Closed-group ciphertext
//! Ephemeral X25519 + AES-256-GCM outer layer ──┘
//! ```
//!
//! Message keys are used for exactly one encryption operation. Skipped keys
//! are retained briefly for out-of-order swarm delivery, then evicted.
//!
//! # Security
//!
//! Forward Secrecy:
//! - Ratchet advancement: old chain keys are zeroized after deriving the next
//! - Message key disposal: keys are zeroized on drop after single use
//!
//! Sender Isolation:
//! - Each (group, sender) pair has its own chain; compromising one chain does
//!   not expose other senders' messages
//!
//! Authenticity:
//! - AES-256-GCM rejects tampering on both layers
//! - The inner ratchet layer proves group membership; non-members cannot
//!   derive any message key

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod agreement;
pub mod pairwise;
pub mod pow;
pub mod sender_keys;

pub use agreement::{KeyPair, PUBLIC_KEY_SIZE, generate_key_pair};
pub use pow::{DEFAULT_NONCE_TRIALS, NONCE_SIZE, PowError};
pub use sender_keys::{
    ClosedGroupCiphertext, ClosedGroupError, HashRatchet, MessageKey, RatchetState,
    UnwrappedMessage,
};
