//! Hash, address and amount primitives.
//!
//! `Uint256` ids are stored in internal (wire) order and displayed reversed,
//! the same convention as Bitcoin TxIDs. Ordering follows the displayed form,
//! so "ascending hash" means ascending hex string.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use bitcoin_hashes::{hash160, sha256d, Hash};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::{write_i64, Reader};
use crate::error::CodecError;

/// Address prefixes (first byte of a [`ProgramHash`]).
pub mod prefix {
    pub const STANDARD: u8 = 0x21;
    pub const MULTISIG: u8 = 0x12;
    pub const CROSS_CHAIN: u8 = 0x4B;
    pub const CR_EXPENSES: u8 = 0x1C;
    pub const DEPOSIT: u8 = 0x1F;
    pub const ID_CHAIN: u8 = 0x67;
    pub const DPOS_V2: u8 = 0x3F;
    pub const DESTROY: u8 = 0x00;
}

// -----------------------------------------------------------------------------
// Uint256
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Uint256(pub [u8; 32]);

impl Uint256 {
    pub const ZERO: Uint256 = Uint256([0u8; 32]);

    /// Double-SHA256 of `data`, in internal order.
    pub fn hash(data: &[u8]) -> Self {
        Uint256(sha256d::Hash::hash(data).to_byte_array())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Uint256(r.read_array::<32>()?))
    }
}

impl Ord for Uint256 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for Uint256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.iter().rev() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint256({})", self)
    }
}

impl FromStr for Uint256 {
    type Err = CodecError;

    /// Parses the displayed (reversed) 64-char hex form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim()).map_err(|_| CodecError::InvalidLength(s.len()))?;
        if bytes.len() != 32 {
            return Err(CodecError::InvalidLength(bytes.len()));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        out.reverse();
        Ok(Uint256(out))
    }
}

impl Serialize for Uint256 {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Uint256 {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Uint256::from_str(&s).map_err(serde::de::Error::custom)
    }
}

// -----------------------------------------------------------------------------
// ProgramHash (21 bytes: prefix || hash160(code))
// -----------------------------------------------------------------------------

pub const PROGRAM_HASH_LEN: usize = 21;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ProgramHash(pub [u8; PROGRAM_HASH_LEN]);

impl ProgramHash {
    /// `prefix || ripemd160(sha256(code))`.
    pub fn from_code(prefix: u8, code: &[u8]) -> Self {
        let h = hash160::Hash::hash(code).to_byte_array();
        let mut out = [0u8; PROGRAM_HASH_LEN];
        out[0] = prefix;
        out[1..].copy_from_slice(&h);
        ProgramHash(out)
    }

    /// Well-known system address: `prefix` followed by an ASCII tag, zero padded.
    pub fn system(prefix: u8, tag: &[u8]) -> Self {
        let mut out = [0u8; PROGRAM_HASH_LEN];
        out[0] = prefix;
        let n = tag.len().min(PROGRAM_HASH_LEN - 1);
        out[1..1 + n].copy_from_slice(&tag[..n]);
        ProgramHash(out)
    }

    pub fn prefix(&self) -> u8 {
        self.0[0]
    }

    /// Same hash body under another prefix (e.g. standard → deposit).
    pub fn with_prefix(&self, prefix: u8) -> Self {
        let mut out = self.0;
        out[0] = prefix;
        ProgramHash(out)
    }

    pub fn as_bytes(&self) -> &[u8; PROGRAM_HASH_LEN] {
        &self.0
    }

    pub fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(ProgramHash(r.read_array::<PROGRAM_HASH_LEN>()?))
    }
}

impl fmt::Display for ProgramHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ProgramHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgramHash({})", self)
    }
}

impl FromStr for ProgramHash {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim()).map_err(|_| CodecError::InvalidLength(s.len()))?;
        if bytes.len() != PROGRAM_HASH_LEN {
            return Err(CodecError::InvalidLength(bytes.len()));
        }
        let mut out = [0u8; PROGRAM_HASH_LEN];
        out.copy_from_slice(&bytes);
        Ok(ProgramHash(out))
    }
}

impl Serialize for ProgramHash {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ProgramHash {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        ProgramHash::from_str(&s).map_err(serde::de::Error::custom)
    }
}

// -----------------------------------------------------------------------------
// Fixed64
// -----------------------------------------------------------------------------

/// Signed fixed-point amount with 8 decimals (1 ELA = 100_000_000).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed64(pub i64);

impl Fixed64 {
    pub const ZERO: Fixed64 = Fixed64(0);
    pub const ONE_ELA: i64 = 100_000_000;

    pub const fn from_ela(ela: i64) -> Self {
        Fixed64(ela * Self::ONE_ELA)
    }

    pub fn checked_add(self, rhs: Fixed64) -> Option<Fixed64> {
        self.0.checked_add(rhs.0).map(Fixed64)
    }

    pub fn checked_sub(self, rhs: Fixed64) -> Option<Fixed64> {
        self.0.checked_sub(rhs.0).map(Fixed64)
    }

    pub fn checked_mul(self, n: i64) -> Option<Fixed64> {
        self.0.checked_mul(n).map(Fixed64)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked sum; `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Fixed64>>(iter: I) -> Option<Fixed64> {
        iter.into_iter()
            .try_fold(Fixed64::ZERO, |acc, v| acc.checked_add(v))
    }

    pub fn write(&self, buf: &mut Vec<u8>) {
        write_i64(buf, self.0);
    }

    pub fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Fixed64(r.read_u64()? as i64))
    }
}

impl fmt::Display for Fixed64 {
    /// `5000`, `0.0001`, `-1.5`: integer part, then up to 8 decimals with
    /// trailing zeros trimmed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0 as i128;
        let abs = v.unsigned_abs();
        let sign = if v < 0 { "-" } else { "" };
        let int = abs / Self::ONE_ELA as u128;
        let frac = abs % Self::ONE_ELA as u128;
        if frac == 0 {
            write!(f, "{}{}", sign, int)
        } else {
            let digits = format!("{:08}", frac);
            write!(f, "{}{}.{}", sign, int, digits.trim_end_matches('0'))
        }
    }
}

impl fmt::Debug for Fixed64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed64({})", self)
    }
}
