//! Program codes, address derivation and signature verification.
//!
//! A program code is a tiny fixed-shape script. Its shape selects the
//! verification mode and the address prefix:
//!
//! | shape                                 | mode                | prefix        |
//! |---------------------------------------|---------------------|---------------|
//! | `0x21 <key33> 0xac`                   | ECDSA, one key      | `STANDARD`    |
//! | `OP_M (0x21 <key33>)*N OP_N 0xae`     | ECDSA, M-of-N       | `MULTISIG`    |
//! | `OP_M (0x21 <key33>)*N OP_N 0xaf`     | ECDSA, M-of-N       | `CROSS_CHAIN` |
//! | `0x21 <key33> 0xad`                   | BIP-340 Schnorr     | `STANDARD`    |
//!
//! A parameter is a run of `0x40 <sig64>` pushes.

pub mod chain;
pub mod verify;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{ProjectivePoint, PublicKey};

use crate::error::ScriptError;
use crate::types::{prefix, ProgramHash};

pub use chain::{verify_chain, ChainLink};
pub use verify::{verify_multisig, verify_program, verify_schnorr, verify_standard};

pub const PUBLIC_KEY_LEN: usize = 33;
pub const SIGNATURE_LEN: usize = 64;

pub const OP_PUSH_KEY: u8 = 0x21;
pub const OP_PUSH_SIG: u8 = 0x40;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_SCHNORR: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CROSSCHAIN: u8 = 0xaf;
/// Trailing opcode substituted when deriving a DID from a standard code.
pub const OP_DID: u8 = 0xad;

const SINGLE_KEY_CODE_LEN: usize = 1 + PUBLIC_KEY_LEN + 1;

// -----------------------------------------------------------------------------
// Classification
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramCode<'a> {
    Standard { key: &'a [u8] },
    Multisig {
        m: usize,
        keys: Vec<&'a [u8]>,
        cross_chain: bool,
    },
    Schnorr { key: &'a [u8] },
}

impl<'a> ProgramCode<'a> {
    pub fn classify(code: &'a [u8]) -> Result<Self, ScriptError> {
        let Some(&last) = code.last() else {
            return Err(ScriptError::InvalidCode("empty code"));
        };
        match last {
            OP_CHECKSIG => Ok(ProgramCode::Standard {
                key: single_key(code)?,
            }),
            OP_SCHNORR => Ok(ProgramCode::Schnorr {
                key: single_key(code)?,
            }),
            OP_CHECKMULTISIG | OP_CROSSCHAIN => {
                let (m, keys) = multisig_keys(code)?;
                Ok(ProgramCode::Multisig {
                    m,
                    keys,
                    cross_chain: last == OP_CROSSCHAIN,
                })
            }
            _ => Err(ScriptError::InvalidCode("unknown trailing opcode")),
        }
    }

    pub fn address_prefix(&self) -> u8 {
        match self {
            ProgramCode::Standard { .. } | ProgramCode::Schnorr { .. } => prefix::STANDARD,
            ProgramCode::Multisig {
                cross_chain: false, ..
            } => prefix::MULTISIG,
            ProgramCode::Multisig {
                cross_chain: true, ..
            } => prefix::CROSS_CHAIN,
        }
    }
}

fn single_key(code: &[u8]) -> Result<&[u8], ScriptError> {
    if code.len() != SINGLE_KEY_CODE_LEN || code[0] != OP_PUSH_KEY {
        return Err(ScriptError::InvalidCode("single key code layout"));
    }
    Ok(&code[1..1 + PUBLIC_KEY_LEN])
}

fn small_int(op: u8) -> Option<usize> {
    (OP_1..=OP_16)
        .contains(&op)
        .then(|| (op - OP_1) as usize + 1)
}

fn multisig_keys(code: &[u8]) -> Result<(usize, Vec<&[u8]>), ScriptError> {
    if code.len() < 3 {
        return Err(ScriptError::InvalidCode("multisig code too short"));
    }
    let m = small_int(code[0]).ok_or(ScriptError::InvalidCode("multisig M"))?;
    let n = small_int(code[code.len() - 2]).ok_or(ScriptError::InvalidCode("multisig N"))?;
    let body = &code[1..code.len() - 2];
    if body.len() != n * (1 + PUBLIC_KEY_LEN) {
        return Err(ScriptError::InvalidCode("multisig key count"));
    }
    let mut keys = Vec::with_capacity(n);
    for chunk in body.chunks_exact(1 + PUBLIC_KEY_LEN) {
        if chunk[0] != OP_PUSH_KEY {
            return Err(ScriptError::InvalidCode("multisig key push"));
        }
        keys.push(&chunk[1..]);
    }
    if m > n {
        return Err(ScriptError::InvalidCode("multisig M exceeds N"));
    }
    Ok((m, keys))
}

// -----------------------------------------------------------------------------
// Builders
// -----------------------------------------------------------------------------

fn single_key_code(key: &[u8], op: u8) -> Result<Vec<u8>, ScriptError> {
    if key.len() != PUBLIC_KEY_LEN {
        return Err(ScriptError::InvalidPublicKey);
    }
    let mut code = Vec::with_capacity(SINGLE_KEY_CODE_LEN);
    code.push(OP_PUSH_KEY);
    code.extend_from_slice(key);
    code.push(op);
    Ok(code)
}

pub fn standard_code(key: &[u8]) -> Result<Vec<u8>, ScriptError> {
    single_key_code(key, OP_CHECKSIG)
}

pub fn schnorr_code(key: &[u8]) -> Result<Vec<u8>, ScriptError> {
    single_key_code(key, OP_SCHNORR)
}

/// `OP_M (0x21 key)*N OP_N 0xae|0xaf`; keys are taken in the given order.
pub fn multisig_code<K: AsRef<[u8]>>(
    m: usize,
    keys: &[K],
    cross_chain: bool,
) -> Result<Vec<u8>, ScriptError> {
    let n = keys.len();
    if m == 0 || m > n || n > 16 {
        return Err(ScriptError::InvalidCode("multisig M/N out of range"));
    }
    let mut code = Vec::with_capacity(3 + n * (1 + PUBLIC_KEY_LEN));
    code.push(OP_1 + (m - 1) as u8);
    for k in keys {
        let k = k.as_ref();
        if k.len() != PUBLIC_KEY_LEN {
            return Err(ScriptError::InvalidPublicKey);
        }
        code.push(OP_PUSH_KEY);
        code.extend_from_slice(k);
    }
    code.push(OP_1 + (n - 1) as u8);
    code.push(if cross_chain { OP_CROSSCHAIN } else { OP_CHECKMULTISIG });
    Ok(code)
}

// -----------------------------------------------------------------------------
// Addresses
// -----------------------------------------------------------------------------

/// Address of a program code, prefix chosen by its shape.
pub fn program_hash(code: &[u8]) -> Result<ProgramHash, ScriptError> {
    let prefix = ProgramCode::classify(code)?.address_prefix();
    Ok(ProgramHash::from_code(prefix, code))
}

/// Standard address of a single public key.
pub fn standard_hash(key: &[u8]) -> Result<ProgramHash, ScriptError> {
    Ok(ProgramHash::from_code(prefix::STANDARD, &standard_code(key)?))
}

/// Deposit address of a single public key.
pub fn deposit_hash(key: &[u8]) -> Result<ProgramHash, ScriptError> {
    Ok(standard_hash(key)?.with_prefix(prefix::DEPOSIT))
}

/// Deposit address of a redeem code.
pub fn deposit_hash_from_code(code: &[u8]) -> ProgramHash {
    ProgramHash::from_code(prefix::DEPOSIT, code)
}

/// Stake address tracking vote rights for the owner of `code`.
pub fn stake_hash(code: &[u8]) -> ProgramHash {
    ProgramHash::from_code(prefix::DPOS_V2, code)
}

/// Council identity of a candidate code.
pub fn cid(code: &[u8]) -> ProgramHash {
    ProgramHash::from_code(prefix::ID_CHAIN, code)
}

/// Decentralized identity of a candidate code: trailing opcode swapped for `OP_DID`.
pub fn did(code: &[u8]) -> ProgramHash {
    let mut did_code = code.to_vec();
    if let Some(last) = did_code.last_mut() {
        *last = OP_DID;
    }
    ProgramHash::from_code(prefix::ID_CHAIN, &did_code)
}

// -----------------------------------------------------------------------------
// Keys & parameters
// -----------------------------------------------------------------------------

/// Sum of the given compressed keys (EC point addition), compressed.
pub fn aggregate_public_keys<K: AsRef<[u8]>>(keys: &[K]) -> Result<[u8; 33], ScriptError> {
    if keys.is_empty() {
        return Err(ScriptError::DegenerateAggregate);
    }
    let mut sum = ProjectivePoint::IDENTITY;
    for k in keys {
        let pk =
            PublicKey::from_sec1_bytes(k.as_ref()).map_err(|_| ScriptError::InvalidPublicKey)?;
        sum += pk.to_projective();
    }
    let aggregate =
        PublicKey::from_affine(sum.to_affine()).map_err(|_| ScriptError::DegenerateAggregate)?;
    let encoded = aggregate.to_encoded_point(true);
    let mut out = [0u8; 33];
    out.copy_from_slice(encoded.as_bytes());
    Ok(out)
}

/// Returns `true` when `key` is a valid compressed secp256k1 point.
pub fn is_valid_public_key(key: &[u8]) -> bool {
    key.len() == PUBLIC_KEY_LEN && PublicKey::from_sec1_bytes(key).is_ok()
}

/// Splits a parameter into its 64-byte signatures.
pub fn parameter_signatures(parameter: &[u8]) -> Result<Vec<&[u8]>, ScriptError> {
    if parameter.is_empty() || parameter.len() % (1 + SIGNATURE_LEN) != 0 {
        return Err(ScriptError::InvalidParameter);
    }
    parameter
        .chunks_exact(1 + SIGNATURE_LEN)
        .map(|c| {
            if c[0] == OP_PUSH_SIG {
                Ok(&c[1..])
            } else {
                Err(ScriptError::InvalidParameter)
            }
        })
        .collect()
}

/// Builds a parameter from signatures, in order.
pub fn build_parameter<S: AsRef<[u8]>>(signatures: &[S]) -> Vec<u8> {
    let mut out = Vec::with_capacity(signatures.len() * (1 + SIGNATURE_LEN));
    for s in signatures {
        out.push(OP_PUSH_SIG);
        out.extend_from_slice(s.as_ref());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> Vec<u8> {
        let sk = k256::SecretKey::from_slice(&[seed; 32]).expect("valid scalar");
        sk.public_key().to_encoded_point(true).as_bytes().to_vec()
    }

    #[test]
    fn classify_each_shape() {
        let k = key(1);
        assert!(matches!(
            ProgramCode::classify(&standard_code(&k).unwrap()),
            Ok(ProgramCode::Standard { .. })
        ));
        assert!(matches!(
            ProgramCode::classify(&schnorr_code(&k).unwrap()),
            Ok(ProgramCode::Schnorr { .. })
        ));
        let code = multisig_code(2, &[key(1), key(2), key(3)], true).unwrap();
        match ProgramCode::classify(&code).unwrap() {
            ProgramCode::Multisig {
                m,
                keys,
                cross_chain,
            } => {
                assert_eq!((m, keys.len(), cross_chain), (2, 3, true));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn malformed_codes_are_invalid_code() {
        for code in [
            vec![],
            vec![0x21, 0xac],
            vec![0x52, 0x51, 0xae],
            vec![0x01, 0x02, 0x03],
        ] {
            assert!(
                matches!(ProgramCode::classify(&code), Err(ScriptError::InvalidCode(_))),
                "code {:?} must be rejected as invalid code",
                code
            );
        }
    }

    #[test]
    fn deposit_hash_shares_body_with_standard_hash() {
        let k = key(7);
        let std = standard_hash(&k).unwrap();
        let dep = deposit_hash(&k).unwrap();
        assert_eq!(dep.prefix(), prefix::DEPOSIT);
        assert_eq!(&dep.0[1..], &std.0[1..]);
        assert_eq!(dep, deposit_hash_from_code(&standard_code(&k).unwrap()));
    }

    #[test]
    fn aggregate_is_order_independent() {
        let a = aggregate_public_keys(&[key(1), key(2), key(3)]).unwrap();
        let b = aggregate_public_keys(&[key(3), key(1), key(2)]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, aggregate_public_keys(&[key(1), key(2)]).unwrap());
    }

    #[test]
    fn parameter_layout() {
        let sigs = [[1u8; 64], [2u8; 64]];
        let param = build_parameter(&sigs);
        assert_eq!(param.len(), 130);
        assert_eq!(parameter_signatures(&param).unwrap().len(), 2);
        assert_eq!(
            parameter_signatures(&param[..129]),
            Err(ScriptError::InvalidParameter)
        );
    }
}
