//! Swarmlink Protocol Core
//!
//! The send/receive pipeline for the decentralized messaging protocol: takes
//! a [`Message`](swarmlink_proto::Message) from the embedding application,
//! encrypts it for its destination, attaches the storage network's
//! proof-of-work, and submits it; in the other direction it turns raw
//! envelope bytes from the swarm back into messages.
//!
//! The pipeline owns no I/O and no persistence. Both live behind traits —
//! [`KeyStore`] for keys and ratchet records, [`SwarmClient`] for the
//! storage network — so embedders bring their own storage and transport and
//! tests bring in-memory fakes.
//!
//! # Concurrency
//!
//! Ratchet chains are the only shared mutable state. Every
//! read-advance-persist cycle runs under a per-(group, sender) lock, and no
//! code awaits while holding one: the receive path is fully synchronous, and
//! the send path finishes its chain work before the swarm submission
//! suspends.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chains;
mod error;
mod keys;
mod keystore;
mod pipeline;
mod swarm_client;

pub use error::{ReceiveError, SendError};
pub use keys::{format_public_key, parse_public_key};
pub use keystore::{ChainId, InMemoryKeyStore, KeyStore};
pub use pipeline::{Destination, IncomingMessage, MessagePipeline};
pub use swarm_client::SwarmClient;
