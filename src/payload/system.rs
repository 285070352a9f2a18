//! Block-producer generated payloads.

use crate::codec::{write_u32, write_var_bytes, write_var_uint};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoinBase {
    pub content: Vec<u8>,
}

impl CoinBase {
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        write_var_bytes(buf, &self.content);
    }
}

/// Announces the arbitrator set for the next turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NextTurnDposInfo {
    pub working_height: u32,
    pub cr_public_keys: Vec<Vec<u8>>,
    pub dpos_public_keys: Vec<Vec<u8>>,
}

impl NextTurnDposInfo {
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        write_u32(buf, self.working_height);
        for keys in [&self.cr_public_keys, &self.dpos_public_keys] {
            write_var_uint(buf, keys.len() as u64);
            for k in keys {
                write_var_bytes(buf, k);
            }
        }
    }
}
