//! Producer registration, update, cancel and activation payloads.

use crate::codec::{write_u32, write_u64, write_var_bytes, write_var_string};

/// Payload version whose signature lives in a Schnorr program instead of the payload.
pub const PRODUCER_SCHNORR_VERSION: u8 = 2;

/// Payload version that adds `stake_until` (DPoS v2 producers).
pub const PRODUCER_DPOS_V2_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProducerInfo {
    pub owner_key: Vec<u8>,
    pub node_key: Vec<u8>,
    pub nickname: String,
    pub url: String,
    pub location: u64,
    pub net_address: String,
    /// Block height until which DPoS v2 stake stays locked (version ≥ 1).
    pub stake_until: u32,
    /// Owner's signature over the unsigned form (absent in the Schnorr version).
    pub signature: Vec<u8>,
}

impl ProducerInfo {
    pub fn serialize_unsigned(&self, buf: &mut Vec<u8>, version: u8) {
        write_var_bytes(buf, &self.owner_key);
        write_var_bytes(buf, &self.node_key);
        write_var_string(buf, &self.nickname);
        write_var_string(buf, &self.url);
        write_u64(buf, self.location);
        write_var_string(buf, &self.net_address);
        if version >= PRODUCER_DPOS_V2_VERSION {
            write_u32(buf, self.stake_until);
        }
    }

    pub fn unsigned_bytes(&self, version: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_unsigned(&mut buf, version);
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>, version: u8) {
        self.serialize_unsigned(buf, version);
        if version < PRODUCER_SCHNORR_VERSION {
            write_var_bytes(buf, &self.signature);
        }
    }
}

/// Cancel request: the owner key plus its signature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessProducer {
    pub owner_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl ProcessProducer {
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_var_bytes(&mut buf, &self.owner_key);
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) {
        write_var_bytes(buf, &self.owner_key);
        write_var_bytes(buf, &self.signature);
    }
}

/// Activation request, signed by the node key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivateProducer {
    pub node_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl ActivateProducer {
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_var_bytes(&mut buf, &self.node_key);
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) {
        write_var_bytes(buf, &self.node_key);
        write_var_bytes(buf, &self.signature);
    }
}
