//! Chained multi-party signing.
//!
//! Several governance payloads are signed by parties in sequence, each one
//! over everything before it:
//!
//! ```text
//! buf  = preamble_1                 -> signer 1 signs buf
//! buf += varbytes(sig_1) + preamble_2 -> signer 2 signs buf
//! ...
//! ```
//!
//! The fold below rebuilds that buffer link by link and verifies each
//! signature against the buffer as it stood when that party signed. A
//! mutated byte in any earlier signature changes every later buffer.

use tracing::trace;

use super::verify::verify_standard;
use crate::codec::write_var_bytes;
use crate::error::ValidationError;

/// One party in a signing chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainLink<'a> {
    /// Used in error messages ("owner", "new owner", ...).
    pub role: &'static str,
    /// Bytes this party appends before signing.
    pub preamble: &'a [u8],
    /// `None` marks an absent optional party, whose signature must be empty.
    pub public_key: Option<&'a [u8]>,
    pub signature: &'a [u8],
}

impl<'a> ChainLink<'a> {
    pub fn new(
        role: &'static str,
        preamble: &'a [u8],
        public_key: &'a [u8],
        signature: &'a [u8],
    ) -> Self {
        Self {
            role,
            preamble,
            public_key: Some(public_key),
            signature,
        }
    }

    /// A link whose key is empty means the party is absent.
    pub fn optional(
        role: &'static str,
        preamble: &'a [u8],
        public_key: &'a [u8],
        signature: &'a [u8],
    ) -> Self {
        Self {
            role,
            preamble,
            public_key: (!public_key.is_empty()).then_some(public_key),
            signature,
        }
    }
}

/// Verifies every link in order; returns the fully signed buffer.
pub fn verify_chain(links: &[ChainLink<'_>]) -> Result<Vec<u8>, ValidationError> {
    links.iter().try_fold(Vec::new(), |mut buf, link| {
        buf.extend_from_slice(link.preamble);
        match link.public_key {
            Some(key) => {
                verify_standard(key, &buf, link.signature).map_err(|_| {
                    ValidationError::signature(format!("{} signature check failed", link.role))
                })?;
                trace!(role = link.role, len = buf.len(), "chain link verified");
            }
            None if !link.signature.is_empty() => {
                return Err(ValidationError::signature(format!(
                    "{} signature should be empty",
                    link.role
                )));
            }
            None => {}
        }
        write_var_bytes(&mut buf, link.signature);
        Ok(buf)
    })
}

/// Signs the same buffers `verify_chain` checks. Test helper for callers
/// building fixtures.
#[cfg(test)]
pub(crate) fn sign_chain(
    parts: &[(&[u8], Option<&k256::ecdsa::SigningKey>)],
) -> Vec<Vec<u8>> {
    use k256::ecdsa::signature::Signer;
    let mut buf = Vec::new();
    let mut out = Vec::new();
    for (preamble, key) in parts {
        buf.extend_from_slice(preamble);
        let sig = match key {
            Some(sk) => {
                let s: k256::ecdsa::Signature = sk.sign(&buf);
                s.to_bytes().to_vec()
            }
            None => Vec::new(),
        };
        write_var_bytes(&mut buf, &sig);
        out.push(sig);
    }
    out
}
