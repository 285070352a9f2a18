//! Council candidate payloads.

use crate::codec::{write_u64, write_var_bytes, write_var_string};
use crate::types::ProgramHash;

/// Version that adds the DID field.
pub const CR_INFO_DID_VERSION: u8 = 1;
/// Version signed through a Schnorr program.
pub const CR_INFO_SCHNORR_VERSION: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrInfo {
    /// Standard redeem code of the candidate; CID and deposit address derive from it.
    pub code: Vec<u8>,
    pub cid: ProgramHash,
    pub did: ProgramHash,
    pub nickname: String,
    pub url: String,
    pub location: u64,
    pub signature: Vec<u8>,
}

impl CrInfo {
    pub fn serialize_unsigned(&self, buf: &mut Vec<u8>, version: u8) {
        write_var_bytes(buf, &self.code);
        buf.extend_from_slice(self.cid.as_bytes());
        if version >= CR_INFO_DID_VERSION {
            buf.extend_from_slice(self.did.as_bytes());
        }
        write_var_string(buf, &self.nickname);
        write_var_string(buf, &self.url);
        write_u64(buf, self.location);
    }

    pub fn unsigned_bytes(&self, version: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_unsigned(&mut buf, version);
        buf
    }

    pub fn serialize(&self, buf: &mut Vec<u8>, version: u8) {
        self.serialize_unsigned(buf, version);
        if version < CR_INFO_SCHNORR_VERSION {
            write_var_bytes(buf, &self.signature);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnregisterCr {
    pub cid: ProgramHash,
    pub signature: Vec<u8>,
}

impl UnregisterCr {
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        self.cid.as_bytes().to_vec()
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.cid.as_bytes());
        write_var_bytes(buf, &self.signature);
    }
}
