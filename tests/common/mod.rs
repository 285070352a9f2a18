//! Shared test helpers: deterministic keys, an in-memory chain and
//! transaction builders.

#![allow(dead_code)]

use bitcoin_hashes::{sha256, Hash};
use k256::ecdsa::signature::Signer;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::schnorr;

use txcheck::crypto;
use txcheck::params::References;
use txcheck::state::{Producer, ProducerIdentity, ProducerState};
use txcheck::transaction::Program;
use txcheck::{
    ChainParams, Fixed64, Input, MemoryState, Output, ProgramHash, Transaction, Uint256,
    ValidationError, ValidationParameters, Verdict,
};

/// Every feature of the default parameters is active at this height.
pub const HEIGHT: u32 = 2_000_000;

pub fn ela(n: i64) -> Fixed64 {
    Fixed64::from_ela(n)
}

// -----------------------------------------------------------------------------
// Keys
// -----------------------------------------------------------------------------

/// A secp256k1 key pair derived from a one-byte seed.
pub struct Key {
    pub secret: [u8; 32],
    pub sk: SigningKey,
    pub public: Vec<u8>,
}

impl Key {
    pub fn new(seed: u8) -> Self {
        let secret = [seed; 32];
        let sk = SigningKey::from_slice(&secret).expect("valid scalar");
        let public = sk.verifying_key().to_encoded_point(true).as_bytes().to_vec();
        Self { secret, sk, public }
    }

    pub fn code(&self) -> Vec<u8> {
        crypto::standard_code(&self.public).expect("standard code")
    }

    pub fn schnorr_code(&self) -> Vec<u8> {
        crypto::schnorr_code(&self.public).expect("schnorr code")
    }

    pub fn address(&self) -> ProgramHash {
        crypto::standard_hash(&self.public).expect("standard hash")
    }

    pub fn deposit(&self) -> ProgramHash {
        crypto::deposit_hash(&self.public).expect("deposit hash")
    }

    pub fn stake(&self) -> ProgramHash {
        crypto::stake_hash(&self.code())
    }

    pub fn cid(&self) -> ProgramHash {
        crypto::cid(&self.code())
    }

    pub fn did(&self) -> ProgramHash {
        crypto::did(&self.code())
    }

    /// ECDSA signature, 64 bytes.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        let sig: k256::ecdsa::Signature = self.sk.sign(msg);
        sig.to_bytes().to_vec()
    }

    /// BIP-340 signature over `sha256(msg)`.
    pub fn schnorr_sign(&self, msg: &[u8]) -> Vec<u8> {
        schnorr_sign_with(&self.secret, msg)
    }
}

pub fn schnorr_sign_with(secret: &[u8; 32], msg: &[u8]) -> Vec<u8> {
    use k256::schnorr::signature::hazmat::PrehashSigner;
    let sk = schnorr::SigningKey::from_bytes(secret).expect("valid scalar");
    let digest = sha256::Hash::hash(msg).to_byte_array();
    let sig: schnorr::Signature = sk.sign_prehash(&digest).expect("schnorr sign");
    sig.to_bytes().to_vec()
}

/// Secret whose public key is the EC sum of the given keys' public keys.
pub fn aggregate_secret(keys: &[&Key]) -> [u8; 32] {
    let mut sum = k256::Scalar::ZERO;
    for k in keys {
        let sk = k256::SecretKey::from_slice(&k.secret).expect("valid scalar");
        sum += *sk.to_nonzero_scalar();
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&sum.to_bytes());
    out
}

// -----------------------------------------------------------------------------
// Chain environment
// -----------------------------------------------------------------------------

/// Chain parameters, state and resolved references for one validation call.
pub struct Env {
    pub config: ChainParams,
    pub state: MemoryState,
    pub refs: References,
    pub height: u32,
}

impl Env {
    pub fn new() -> Self {
        Self {
            config: ChainParams::default(),
            state: MemoryState::new(),
            refs: References::new(),
            height: HEIGHT,
        }
    }

    pub fn params(&self) -> ValidationParameters<'_> {
        ValidationParameters::new(self.height, &self.config, &self.state, &self.refs)
    }

    pub fn validate(&self, tx: &Transaction) -> Result<Verdict, ValidationError> {
        txcheck::validate(tx, &self.params())
    }

    /// Adds an input spending a fresh output of `value` held by `owner`.
    pub fn fund(&mut self, tx: &mut Transaction, owner: ProgramHash, value: Fixed64) {
        let id = Uint256::hash(&(self.refs.len() as u64 + 1).to_le_bytes());
        let input = Input::new(id, 0);
        self.refs
            .insert(input, Output::new(self.config.ela_asset_id, value, owner));
        tx.inputs.push(input);
    }

    pub fn pay(&self, tx: &mut Transaction, to: ProgramHash, value: Fixed64) {
        tx.outputs
            .push(Output::new(self.config.ela_asset_id, value, to));
    }
}

// -----------------------------------------------------------------------------
// Transactions
// -----------------------------------------------------------------------------

/// Appends a standard program per key, each signing the unsigned bytes.
pub fn sign_tx(tx: &mut Transaction, keys: &[&Key]) {
    let msg = tx.serialize_unsigned();
    for key in keys {
        tx.programs.push(Program {
            code: key.code(),
            parameter: crypto::build_parameter(&[key.sign(&msg)]),
        });
    }
}

/// Appends a Schnorr program for `key` signing the unsigned bytes.
pub fn schnorr_sign_tx(tx: &mut Transaction, key: &Key) {
    let msg = tx.serialize_unsigned();
    tx.programs.push(Program {
        code: key.schnorr_code(),
        parameter: crypto::build_parameter(&[key.schnorr_sign(&msg)]),
    });
}

// -----------------------------------------------------------------------------
// State entities
// -----------------------------------------------------------------------------

pub fn producer(owner: &Key, node: &Key, nickname: &str, state: ProducerState) -> Producer {
    Producer {
        info: txcheck::payload::ProducerInfo {
            owner_key: owner.public.clone(),
            node_key: node.public.clone(),
            nickname: nickname.into(),
            url: "https://example.org".into(),
            ..Default::default()
        },
        state,
        identity: ProducerIdentity::DposV1,
        register_height: 1,
        cancel_height: 0,
        activate_request_height: None,
        stake_until: 0,
        deposit_amount: ela(5000),
        penalty: Fixed64::ZERO,
    }
}
