//! Signature verification primitives.
//!
//! ECDSA (secp256k1, SHA-256 digest) for standard and M-of-N programs;
//! BIP-340 Schnorr over `sha256(msg)` for aggregate-key programs.

use std::collections::HashSet;

use bitcoin_hashes::{sha256, Hash};
use k256::ecdsa;
use k256::ecdsa::signature::Verifier;
use k256::schnorr;
use k256::schnorr::signature::hazmat::PrehashVerifier;

use super::{parameter_signatures, ProgramCode, PUBLIC_KEY_LEN, SIGNATURE_LEN};
use crate::error::ScriptError;

/// Verifies one ECDSA signature by a compressed public key.
pub fn verify_standard(key: &[u8], msg: &[u8], signature: &[u8]) -> Result<(), ScriptError> {
    let vk = ecdsa::VerifyingKey::from_sec1_bytes(key).map_err(|_| ScriptError::InvalidPublicKey)?;
    if signature.len() != SIGNATURE_LEN {
        return Err(ScriptError::InvalidSignature);
    }
    let sig = ecdsa::Signature::from_slice(signature).map_err(|_| ScriptError::InvalidSignature)?;
    vk.verify(msg, &sig).map_err(|_| ScriptError::InvalidSignature)
}

/// Requires at least `m` distinct keys of `keys` to have produced one of the
/// signatures in `parameter`.
pub fn verify_multisig(
    m: usize,
    keys: &[&[u8]],
    msg: &[u8],
    parameter: &[u8],
) -> Result<(), ScriptError> {
    let signatures = parameter_signatures(parameter)?;
    if signatures.len() > keys.len() {
        return Err(ScriptError::InvalidParameter);
    }
    if signatures.len() < m {
        return Err(ScriptError::NotEnoughSignatures(signatures.len(), m));
    }
    // Keyed by bytes: a key repeated in the code still signs once.
    let mut signers: HashSet<&[u8]> = HashSet::with_capacity(signatures.len());
    for sig in &signatures {
        if let Some(key) = keys
            .iter()
            .find(|k| !signers.contains(**k) && verify_standard(k, msg, sig).is_ok())
        {
            signers.insert(*key);
        }
    }
    if signers.len() < m {
        return Err(ScriptError::NotEnoughSignatures(signers.len(), m));
    }
    Ok(())
}

/// Verifies a BIP-340 signature by the x-coordinate of a compressed key.
pub fn verify_schnorr(key: &[u8], msg: &[u8], signature: &[u8]) -> Result<(), ScriptError> {
    if key.len() != PUBLIC_KEY_LEN {
        return Err(ScriptError::InvalidPublicKey);
    }
    let vk = schnorr::VerifyingKey::from_bytes(&key[1..]).map_err(|_| ScriptError::InvalidPublicKey)?;
    let sig = schnorr::Signature::try_from(signature).map_err(|_| ScriptError::InvalidSignature)?;
    let digest = sha256::Hash::hash(msg).to_byte_array();
    vk.verify_prehash(&digest, &sig)
        .map_err(|_| ScriptError::InvalidSignature)
}

/// Verifies a program (code + parameter) over `msg`, mode chosen by the code shape.
pub fn verify_program(code: &[u8], parameter: &[u8], msg: &[u8]) -> Result<(), ScriptError> {
    match ProgramCode::classify(code)? {
        ProgramCode::Standard { key } => {
            let sigs = parameter_signatures(parameter)?;
            let [sig] = sigs.as_slice() else {
                return Err(ScriptError::InvalidParameter);
            };
            verify_standard(key, msg, sig)
        }
        ProgramCode::Schnorr { key } => {
            let sigs = parameter_signatures(parameter)?;
            let [sig] = sigs.as_slice() else {
                return Err(ScriptError::InvalidParameter);
            };
            verify_schnorr(key, msg, sig)
        }
        ProgramCode::Multisig { m, keys, .. } => verify_multisig(m, &keys, msg, parameter),
    }
}
