//! Transaction model and its canonical unsigned serialization.
//!
//! The unsigned form (everything except programs) is what program signatures
//! commit to and what the transaction id hashes. Payload signatures are part
//! of the payload and therefore part of the unsigned form.

use crate::codec::{write_u16, write_u32, write_var_bytes, write_var_uint};
use crate::payload::{Payload, TxType};
use crate::types::{Fixed64, ProgramHash, Uint256};

/// Transaction layout version carrying typed outputs.
pub const TX_VERSION_09: u8 = 0x09;

// -----------------------------------------------------------------------------
// Inputs
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub tx_id: Uint256,
    pub index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Input {
    pub previous: OutPoint,
    pub sequence: u32,
}

impl Input {
    pub fn new(tx_id: Uint256, index: u16) -> Self {
        Self {
            previous: OutPoint { tx_id, index },
            sequence: u32::MAX,
        }
    }

    fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.previous.tx_id.as_bytes());
        write_u16(buf, self.previous.index);
        write_u32(buf, self.sequence);
    }
}

// -----------------------------------------------------------------------------
// Outputs
// -----------------------------------------------------------------------------

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputType {
    None = 0x00,
    Withdraw = 0x04,
    Stake = 0x07,
}

/// Typed output payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPayload {
    None,
    /// Locks value in the stake pool for `stake_address`.
    Stake { version: u8, stake_address: ProgramHash },
    /// Pays out one side-chain withdrawal.
    Withdraw {
        side_chain_tx_hash: Uint256,
        target_amount: Fixed64,
    },
}

impl OutputPayload {
    pub fn output_type(&self) -> OutputType {
        match self {
            OutputPayload::None => OutputType::None,
            OutputPayload::Stake { .. } => OutputType::Stake,
            OutputPayload::Withdraw { .. } => OutputType::Withdraw,
        }
    }

    fn write(&self, buf: &mut Vec<u8>) {
        buf.push(self.output_type() as u8);
        match self {
            OutputPayload::None => {}
            OutputPayload::Stake {
                version,
                stake_address,
            } => {
                buf.push(*version);
                buf.extend_from_slice(stake_address.as_bytes());
            }
            OutputPayload::Withdraw {
                side_chain_tx_hash,
                target_amount,
            } => {
                buf.extend_from_slice(side_chain_tx_hash.as_bytes());
                target_amount.write(buf);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub asset_id: Uint256,
    pub value: Fixed64,
    pub output_lock: u32,
    pub program_hash: ProgramHash,
    pub payload: OutputPayload,
}

impl Output {
    pub fn new(asset_id: Uint256, value: Fixed64, program_hash: ProgramHash) -> Self {
        Self {
            asset_id,
            value,
            output_lock: 0,
            program_hash,
            payload: OutputPayload::None,
        }
    }

    fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.asset_id.as_bytes());
        self.value.write(buf);
        write_u32(buf, self.output_lock);
        buf.extend_from_slice(self.program_hash.as_bytes());
        self.payload.write(buf);
    }
}

// -----------------------------------------------------------------------------
// Attributes & programs
// -----------------------------------------------------------------------------

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeUsage {
    Nonce = 0x00,
    Script = 0x20,
    Memo = 0x81,
    Description = 0x90,
    DescriptionUrl = 0x91,
    Confirmations = 0x92,
}

impl TryFrom<u8> for AttributeUsage {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        match byte {
            0x00 => Ok(AttributeUsage::Nonce),
            0x20 => Ok(AttributeUsage::Script),
            0x81 => Ok(AttributeUsage::Memo),
            0x90 => Ok(AttributeUsage::Description),
            0x91 => Ok(AttributeUsage::DescriptionUrl),
            0x92 => Ok(AttributeUsage::Confirmations),
            other => Err(other),
        }
    }
}

/// Attribute with its raw usage byte; unknown usages are a structural error,
/// not a construction error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub usage: u8,
    pub data: Vec<u8>,
}

impl Attribute {
    pub fn new(usage: AttributeUsage, data: Vec<u8>) -> Self {
        Self {
            usage: usage as u8,
            data,
        }
    }
}

/// Redeem code plus its signature parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub code: Vec<u8>,
    pub parameter: Vec<u8>,
}

// -----------------------------------------------------------------------------
// Transaction
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u8,
    pub tx_type: TxType,
    pub payload_version: u8,
    pub payload: Payload,
    pub attributes: Vec<Attribute>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub lock_time: u32,
    pub programs: Vec<Program>,
}

impl Transaction {
    /// Empty transaction shell of the given kind; callers fill the vectors.
    pub fn new(tx_type: TxType, payload_version: u8, payload: Payload) -> Self {
        Self {
            version: TX_VERSION_09,
            tx_type,
            payload_version,
            payload,
            attributes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            programs: Vec::new(),
        }
    }

    /// Builds the unsigned bytes in strict field order:
    /// version, type, payload version, payload, attributes, inputs, outputs, lock time.
    pub fn serialize_unsigned(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256);
        out.push(self.version);
        out.push(self.tx_type.as_u8());
        out.push(self.payload_version);
        self.payload.serialize(&mut out, self.payload_version);

        write_var_uint(&mut out, self.attributes.len() as u64);
        for attr in &self.attributes {
            out.push(attr.usage);
            write_var_bytes(&mut out, &attr.data);
        }

        write_var_uint(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            input.write(&mut out);
        }

        write_var_uint(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            output.write(&mut out);
        }

        write_u32(&mut out, self.lock_time);
        out
    }

    /// Transaction id: double-SHA256 of the unsigned form.
    pub fn hash(&self) -> Uint256 {
        Uint256::hash(&self.serialize_unsigned())
    }

    /// Checked total of all output values.
    pub fn output_total(&self) -> Option<Fixed64> {
        Fixed64::checked_sum(self.outputs.iter().map(|o| o.value))
    }
}
