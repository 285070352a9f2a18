//! Transaction validation engine for a permissioned DPoS chain.
//!
//! Given a transaction, the outputs its inputs spend and a read-only view of
//! chain state, [`validate`] decides whether the transaction may enter a
//! block. The engine is pure: it never mutates state and installs no
//! `tracing` subscriber.

pub mod codec;
pub mod config;
pub mod context;
pub mod crypto;
pub mod error;
pub mod evidence;
pub mod height;
pub mod params;
pub mod payload;
pub mod pipeline;
pub mod state;
pub mod structure;
pub mod transaction;
pub mod types;

pub use config::ChainParams;
pub use context::{ContextValidator, Verdict};
pub use error::{CodecError, ConfigError, ErrorKind, ScriptError, ValidationError};
pub use evidence::EvidenceComparator;
pub use params::{References, ValidationParameters};
pub use payload::{Payload, TxType};
pub use pipeline::{
    check_common, check_context, check_height_version, check_payload_type, check_structure,
    validate,
};
pub use state::{MemoryState, StateView};
pub use transaction::{Input, Output, Program, Transaction};
pub use types::{Fixed64, ProgramHash, Uint256};
