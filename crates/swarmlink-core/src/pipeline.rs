//! The send and receive pipeline.
//!
//! [`MessagePipeline`] is the one place where the wire types, the codecs,
//! the ratchet registry, and the external seams ([`KeyStore`],
//! [`SwarmClient`]) meet. Outbound: validate, encode, encrypt for the
//! destination, envelope, proof-of-work, submit. Inbound: parse the
//! envelope, decrypt by kind before any content parsing, resolve the
//! content to a [`Message`].
//!
//! All cryptographic work is synchronous; the only suspension point is the
//! final swarm submission, after every lock has been released.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

use swarmlink_crypto::sender_keys::{self, ClosedGroupCiphertext};
use swarmlink_crypto::{DEFAULT_NONCE_TRIALS, PUBLIC_KEY_SIZE, pairwise, pow};
use swarmlink_proto::{Content, Envelope, EnvelopeKind, Message, SwarmMessage};

use crate::chains::{ChainError, ChainRegistry};
use crate::error::{ReceiveError, SendError};
use crate::keys::{format_public_key, parse_public_key};
use crate::keystore::KeyStore;
use crate::swarm_client::SwarmClient;

/// Where an outbound message is headed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A one-to-one conversation, keyed by the contact's hex public key.
    Contact(String),
    /// A closed group, keyed by the group's hex public key.
    ClosedGroup(String),
    /// A community room on an open-group server. No end-to-end layer; the
    /// server reads the content by design.
    OpenGroup {
        /// Server identifier the room lives on.
        server: String,
        /// Room name within the server.
        room: String,
    },
}

/// A message recovered from the network, with its resolved provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// The decoded message.
    pub message: Message,
    /// Hex public key of the actual sender. For closed groups this comes
    /// from the authenticated inner record, not the envelope.
    pub sender: String,
    /// Hex public key of the group, when the message arrived through one.
    pub group: Option<String>,
    /// Sender-claimed timestamp from the envelope.
    pub timestamp_millis: u64,
}

/// The protocol core's top-level object.
///
/// Generic over its two seams so tests can substitute in-memory fakes. One
/// pipeline serves one local user; it is `Send + Sync` and intended to be
/// shared behind an `Arc`.
pub struct MessagePipeline<S, C> {
    store: Arc<S>,
    swarm: Arc<C>,
    chains: ChainRegistry,
    nonce_trials: u32,
}

impl<S: KeyStore, C: SwarmClient> MessagePipeline<S, C> {
    /// Build a pipeline with the default proof-of-work difficulty.
    pub fn new(store: Arc<S>, swarm: Arc<C>) -> Self {
        Self::with_nonce_trials(store, swarm, DEFAULT_NONCE_TRIALS)
    }

    /// Build a pipeline with an explicit trials factor. Anything other than
    /// the live network's value breaks interop; this exists for tests.
    pub fn with_nonce_trials(store: Arc<S>, swarm: Arc<C>, nonce_trials: u32) -> Self {
        Self { store, swarm, chains: ChainRegistry::new(), nonce_trials }
    }

    /// Encrypt, prove, and submit one message.
    ///
    /// `timestamp_millis` is sender-claimed and travels in the envelope;
    /// callers pass wall-clock time, tests pass fixed values.
    pub async fn send(
        &self,
        message: &Message,
        destination: &Destination,
        timestamp_millis: u64,
    ) -> Result<(), SendError> {
        let never = AtomicBool::new(false);
        self.send_cancellable(message, destination, timestamp_millis, &never).await
    }

    /// [`send`](Self::send) with cooperative cancellation of the
    /// proof-of-work search. A set flag surfaces as
    /// [`SendError::ProofOfWorkFailed`].
    pub async fn send_cancellable(
        &self,
        message: &Message,
        destination: &Destination,
        timestamp_millis: u64,
        cancel: &AtomicBool,
    ) -> Result<(), SendError> {
        if !message.is_valid_for_sending() {
            return Err(SendError::InvalidMessage);
        }
        let plaintext = message.to_content().encode()?;

        // All chain work happens inside encrypt_for, synchronously; locks
        // are released before the first await below.
        let (content, kind, source, recipient) = self.encrypt_for(&plaintext, destination)?;

        let envelope = Envelope { source, timestamp_millis, kind, content };
        let data = BASE64.encode(envelope.encode()?);

        let ttl_millis = message.ttl_millis();
        let nonce = pow::calculate(
            data.as_bytes(),
            &recipient,
            timestamp_millis,
            ttl_millis,
            self.nonce_trials,
            cancel,
        )
        .map_err(|_| SendError::ProofOfWorkFailed)?;

        let submission = SwarmMessage {
            recipient_public_key: recipient,
            data,
            ttl_millis,
            timestamp_millis,
            nonce,
        };
        debug!(
            recipient = %submission.recipient_public_key,
            ttl_millis,
            "submitting message to swarm"
        );
        self.swarm
            .submit(submission)
            .await
            .map_err(|reason| SendError::DeliveryFailed { reason })
    }

    /// Parse and decrypt one envelope from the network.
    ///
    /// Inbound failures are recovered here: anything malformed, hostile, or
    /// stale is logged and dropped, and `None` is returned. A misbehaving
    /// peer must not be able to crash the process or corrupt chain state.
    pub fn receive(&self, envelope_bytes: &[u8]) -> Option<IncomingMessage> {
        match self.receive_inner(envelope_bytes) {
            Ok(incoming) => Some(incoming),
            Err(error) => {
                warn!(%error, "dropping inbound message");
                None
            }
        }
    }

    /// Install the genesis chain key for a (group, sender) pair, replacing
    /// any existing chain. Called when a group is created, when a
    /// closed-group update distributes chain keys, or when the group key
    /// pair rotates (a new epoch starts every chain over).
    pub fn install_chain_key(
        &self,
        group_public_key: &str,
        sender_public_key: &[u8; PUBLIC_KEY_SIZE],
        chain_key: [u8; 32],
    ) -> Result<(), SendError> {
        self.chains
            .install_genesis(self.store.as_ref(), group_public_key, sender_public_key, chain_key)
            .map_err(SendError::SerializationFailed)
    }

    /// Register membership in a closed group: the private half of the group
    /// key pair, needed to open the outer layer of inbound group messages.
    pub fn add_group(&self, group_public_key: &str, group_private_key: [u8; 32]) {
        self.store.put_group_private_key(group_public_key, group_private_key);
    }

    fn encrypt_for(
        &self,
        plaintext: &[u8],
        destination: &Destination,
    ) -> Result<(Vec<u8>, EnvelopeKind, String, String), SendError> {
        match destination {
            Destination::Contact(contact) => {
                let recipient_key = parse_public_key(contact)
                    .map_err(|reason| SendError::InvalidDestination { reason })?;
                let content = pairwise::seal(plaintext, &recipient_key);
                let source = format_public_key(&self.store.user_key_pair().public_key);
                Ok((content, EnvelopeKind::SessionMessage, source, contact.clone()))
            }
            Destination::ClosedGroup(group) => {
                let group_key = parse_public_key(group)
                    .map_err(|reason| SendError::InvalidDestination { reason })?;
                let user = self.store.user_key_pair();
                let wrapped = self
                    .chains
                    .with_chain(self.store.as_ref(), group, &user.public_key, None, |ratchet| {
                        sender_keys::wrap(plaintext, &group_key, &user.public_key, ratchet)
                    })
                    .map_err(|e| match e {
                        ChainError::NoChain => {
                            SendError::MissingGroupKey { group: group.clone() }
                        }
                        ChainError::CorruptRecord(e) => SendError::SerializationFailed(e),
                        ChainError::Ratchet(e) => SendError::EncryptionFailed(e),
                    })?;
                Ok((wrapped.encode(), EnvelopeKind::ClosedGroupMessage, group.clone(), group.clone()))
            }
            Destination::OpenGroup { server, .. } => {
                // No end-to-end layer for community rooms; the content goes
                // to the server as-is, still enveloped and proved.
                let source = format_public_key(&self.store.user_key_pair().public_key);
                Ok((plaintext.to_vec(), EnvelopeKind::SessionMessage, source, server.clone()))
            }
        }
    }

    fn receive_inner(&self, envelope_bytes: &[u8]) -> Result<IncomingMessage, ReceiveError> {
        let envelope =
            Envelope::decode(envelope_bytes).map_err(ReceiveError::MalformedEnvelope)?;

        let (plaintext, sender, group) = match envelope.kind {
            EnvelopeKind::SessionMessage => {
                // Normalize and validate the claimed sender before any
                // decryption work.
                let sender_key = parse_public_key(&envelope.source)
                    .map_err(|reason| ReceiveError::InvalidSource { reason })?;
                let user = self.store.user_key_pair();
                let plaintext = pairwise::open(&envelope.content, &user.private_key)?;
                (plaintext, format_public_key(&sender_key), None)
            }
            EnvelopeKind::ClosedGroupMessage => {
                let group = envelope.source.clone();
                let group_private_key = self
                    .store
                    .group_private_key(&group)
                    .ok_or_else(|| ReceiveError::MissingGroupPrivateKey { group: group.clone() })?;

                let ciphertext = ClosedGroupCiphertext::decode(&envelope.content)?;
                // The outer layer names the sender; only then can the right
                // chain be locked for the inner layer.
                let inner = sender_keys::open_outer(&ciphertext, &group_private_key)?;

                let user = self.store.user_key_pair();
                let unwrapped = self
                    .chains
                    .with_chain(
                        self.store.as_ref(),
                        &group,
                        &inner.sender_public_key,
                        None,
                        |ratchet| sender_keys::finish_unwrap(&inner, &user.public_key, ratchet),
                    )
                    .map_err(|e| e.into_receive_error(&group))?;

                let sender = format_public_key(&unwrapped.sender_public_key);
                (unwrapped.plaintext, sender, Some(group))
            }
        };

        let content = Content::decode(&plaintext).map_err(ReceiveError::ProtoConversionFailed)?;
        let message = Message::from_content(content).ok_or(ReceiveError::UnrecognizedContent)?;

        Ok(IncomingMessage {
            message,
            sender,
            group,
            timestamp_millis: envelope.timestamp_millis,
        })
    }
}
