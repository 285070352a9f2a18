//! Side-chain withdrawal payload.

use crate::codec::{write_u32, write_var_string, write_var_uint};
use crate::types::Uint256;

/// Version signed by a Schnorr aggregate of the listed arbitrators.
pub const WITHDRAW_SCHNORR_VERSION: u8 = 1;

/// Version 0 lists the side-chain hashes in the payload and is signed by a
/// legacy M-of-N program. Version 1 moves the hashes into typed outputs and
/// names the signing arbitrators by index into the live set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WithdrawFromSideChain {
    pub block_height: u32,
    pub genesis_block_address: String,
    pub side_chain_tx_hashes: Vec<Uint256>,
    pub signers: Vec<u32>,
}

impl WithdrawFromSideChain {
    pub fn serialize(&self, buf: &mut Vec<u8>, version: u8) {
        if version >= WITHDRAW_SCHNORR_VERSION {
            write_var_uint(buf, self.signers.len() as u64);
            for s in &self.signers {
                write_u32(buf, *s);
            }
            return;
        }
        write_u32(buf, self.block_height);
        write_var_string(buf, &self.genesis_block_address);
        write_var_uint(buf, self.side_chain_tx_hashes.len() as u64);
        for h in &self.side_chain_tx_hashes {
            buf.extend_from_slice(h.as_bytes());
        }
    }
}
