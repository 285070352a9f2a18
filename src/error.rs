// src/error.rs

use thiserror::Error;

/// Coarse classification of a rejection. Callers branch on this; the message
/// carried by [`ValidationError`] is the stable, human-facing part.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input/output/attribute/program cardinality, field formats, sizes.
    Structural,
    /// The payload variant does not match the declared type tag.
    PayloadType,
    /// The payload version is not active at the validation height.
    HeightVersion,
    /// Malformed program code or a signature that does not verify.
    Signature,
    /// Missing entity, wrong lifecycle state, duplicate registration.
    StateConsistency,
    /// Fee, deposit or amount accounting mismatch.
    EconomicInvariant,
}

/// A typed rejection. The `Display` output is the literal message only and is
/// part of the observable contract: keep existing texts stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Structural(String),

    #[error("{0}")]
    PayloadType(String),

    #[error("{0}")]
    HeightVersion(String),

    #[error("{0}")]
    Signature(String),

    #[error("{0}")]
    StateConsistency(String),

    #[error("{0}")]
    EconomicInvariant(String),
}

impl ValidationError {
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    pub fn payload_type(msg: impl Into<String>) -> Self {
        Self::PayloadType(msg.into())
    }

    pub fn height_version(msg: impl Into<String>) -> Self {
        Self::HeightVersion(msg.into())
    }

    pub fn signature(msg: impl Into<String>) -> Self {
        Self::Signature(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::StateConsistency(msg.into())
    }

    pub fn economic(msg: impl Into<String>) -> Self {
        Self::EconomicInvariant(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Structural(_) => ErrorKind::Structural,
            Self::PayloadType(_) => ErrorKind::PayloadType,
            Self::HeightVersion(_) => ErrorKind::HeightVersion,
            Self::Signature(_) => ErrorKind::Signature,
            Self::StateConsistency(_) => ErrorKind::StateConsistency,
            Self::EconomicInvariant(_) => ErrorKind::EconomicInvariant,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Structural(m)
            | Self::PayloadType(m)
            | Self::HeightVersion(m)
            | Self::Signature(m)
            | Self::StateConsistency(m)
            | Self::EconomicInvariant(m) => m,
        }
    }
}

/// Failures of the bounded reader used on raw evidence bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The data stream ended before the structure could be fully read.
    #[error("incomplete data")]
    IncompleteData,

    /// A length prefix exceeded the reader's limit.
    #[error("length {0} exceeds limit")]
    LengthTooLarge(u64),

    /// A fixed-width field had the wrong size (e.g. a public key).
    #[error("invalid field length {0}")]
    InvalidLength(usize),

    /// Bytes left over after a full parse (cursor desynchronization).
    #[error("trailing data: {0} bytes left after parse")]
    TrailingData(usize),
}

impl From<CodecError> for ValidationError {
    fn from(e: CodecError) -> Self {
        ValidationError::Structural(e.to_string())
    }
}

/// Program code / signature failures. `InvalidCode` (malformed script) and
/// `InvalidSignature` (verification failure) are kept apart on purpose: the
/// caller's reaction differs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("invalid program code: {0}")]
    InvalidCode(&'static str),

    #[error("invalid program parameter")]
    InvalidParameter,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,

    /// (valid, required)
    #[error("not enough valid signatures: {0} of {1}")]
    NotEnoughSignatures(usize, usize),

    #[error("aggregate public key is the point at infinity")]
    DegenerateAggregate,
}

impl From<ScriptError> for ValidationError {
    fn from(e: ScriptError) -> Self {
        ValidationError::Signature(e.to_string())
    }
}

/// Chain parameter loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid chain params json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid chain params: {0}")]
    Invalid(String),
}
