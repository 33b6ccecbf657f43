//! Revert data decoding.
//!
//! Solidity reverts carry a 4-byte selector followed by ABI-encoded
//! arguments. Two selectors are built in (`Error(string)` and
//! `Panic(uint256)`); everything else is matched against the custom errors
//! of the settlement and driver contracts.

use primitive_types::U256;
use relay_crypto::keccak256;
use std::fmt;

const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Custom errors the relay knows how to name.
pub const KNOWN_CUSTOM_ERRORS: &[&str] = &[
    "Settlement_InvalidEpoch()",
    "Settlement_ValSetHeaderAlreadySubmitted()",
    "Settlement_VerificationFailed()",
    "Settlement_InvalidVersion()",
    "Settlement_InvalidCaptureTimestamp()",
    "Settlement_QuorumThresholdGtTotalVotingPower()",
    "Settlement_DuplicateExtraDataKey()",
    "Settlement_NotInitialized()",
    "ValSetDriver_InvalidEpoch()",
    "ValSetDriver_ZeroEpochDuration()",
    "KeyRegistry_InvalidKeyTag()",
];

/// Decoded revert reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    /// `Error(string)` with its message
    Error(String),
    /// `Panic(uint256)` with its code
    Panic(U256),
    /// Known custom error, by signature
    Custom(&'static str),
    /// Unrecognized selector with the raw revert data
    Unknown(Vec<u8>),
    /// Revert without data
    Empty,
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevertReason::Error(msg) => write!(f, "Error({:?})", msg),
            RevertReason::Panic(code) => write!(f, "Panic(0x{:02x})", code),
            RevertReason::Custom(sig) => f.write_str(sig),
            RevertReason::Unknown(data) => write!(f, "unknown revert 0x{}", hex::encode(data)),
            RevertReason::Empty => f.write_str("empty revert"),
        }
    }
}

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Decode raw revert data.
pub fn decode_revert(data: &[u8]) -> RevertReason {
    if data.is_empty() {
        return RevertReason::Empty;
    }
    if data.len() < 4 {
        return RevertReason::Unknown(data.to_vec());
    }
    let (sel, args) = data.split_at(4);

    if sel == ERROR_STRING_SELECTOR {
        return decode_error_string(args)
            .map(RevertReason::Error)
            .unwrap_or_else(|| RevertReason::Unknown(data.to_vec()));
    }
    if sel == PANIC_SELECTOR {
        return match args.get(..32) {
            Some(word) => RevertReason::Panic(U256::from_big_endian(word)),
            None => RevertReason::Unknown(data.to_vec()),
        };
    }

    KNOWN_CUSTOM_ERRORS
        .iter()
        .find(|sig| selector(sig) == sel)
        .map(|sig| RevertReason::Custom(*sig))
        .unwrap_or_else(|| RevertReason::Unknown(data.to_vec()))
}

/// ABI-decode the string argument of `Error(string)`.
fn decode_error_string(args: &[u8]) -> Option<String> {
    let offset = read_usize_word(args, 0)?;
    let len = read_usize_word(args, offset)?;
    let start = offset.checked_add(32)?;
    let bytes = args.get(start..start.checked_add(len)?)?;
    Some(String::from_utf8_lossy(bytes).into_owned())
}

fn read_usize_word(data: &[u8], at: usize) -> Option<usize> {
    let word = data.get(at..at.checked_add(32)?)?;
    let value = U256::from_big_endian(word);
    if value > U256::from(u32::MAX) {
        return None;
    }
    Some(value.low_u64() as usize)
}

/// Encode `Error(string)` revert data.
pub fn encode_error_string(message: &str) -> Vec<u8> {
    let bytes = message.as_bytes();
    let padded = bytes.len().div_ceil(32) * 32;
    let mut out = Vec::with_capacity(4 + 64 + padded);
    out.extend_from_slice(&ERROR_STRING_SELECTOR);
    out.extend_from_slice(&word(32));
    out.extend_from_slice(&word(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(4 + 64 + padded, 0);
    out
}

/// Encode an argument-less custom error.
pub fn encode_custom_error(signature: &str) -> Vec<u8> {
    selector(signature).to_vec()
}

fn word(value: u64) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[24..].copy_from_slice(&value.to_be_bytes());
    w
}
