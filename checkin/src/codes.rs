//! Check-in code generation and decoding
//!
//! A code packs the low 15 bits of an instance id and a person id into a
//! 30-bit value, written as six base-31 digits followed by a checksum digit
//! and displayed as `XXX-XXXX`. The alphabet leaves out symbols that are
//! easy to misread on a label (0/O, 1/I/L).
//!
//! Codes are only unique modulo 2^15: callers scope them with the instance
//! currently being worked through [`validate`].

use std::fmt;
use thiserror::Error;

use shared::logging::Component;
use shared::{InstanceId, PersonId, checkin_warn};

/// Symbols a code may contain, in digit order
pub const ALPHABET: &[u8; BASE as usize] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

const BASE: u32 = 31;
const DATA_DIGITS: usize = 6;
const CODE_LEN: usize = DATA_DIGITS + 1;
const FIELD_MASK: u64 = 0x7FFF;
const FIELD_BITS: u32 = 15;

/// Number of packed values six data digits can carry (31^6)
///
/// Packed values at or above this wrap when encoded; see [`fits_code_space`].
pub const CODE_SPACE: u32 = BASE.pow(DATA_DIGITS as u32);

/// Why a code was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("code must have 7 symbols, found {found}")]
    WrongLength { found: usize },

    #[error("unrecognized symbol {symbol:?}")]
    UnknownSymbol { symbol: char },

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("code belongs to instance {decoded}, expected {expected}")]
    InstanceMismatch { expected: u16, decoded: u16 },

    #[error("code belongs to person {decoded}, expected {expected}")]
    PersonMismatch { expected: u16, decoded: u16 },
}

/// A formatted check-in code such as `A3K-M9P2`
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct CheckinCode(String);

impl CheckinCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CheckinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CheckinCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fields recovered from a code (each reduced modulo 2^15)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DecodedCode {
    pub instance_id: u16,
    pub person_id: u16,
}

/// Low 15 bits of a roster id, the part a code carries
pub fn reduce(id: u64) -> u16 {
    (id & FIELD_MASK) as u16
}

fn pack(person_id: PersonId, instance_id: InstanceId) -> u32 {
    (u32::from(reduce(instance_id.value())) << FIELD_BITS) | u32::from(reduce(person_id.value()))
}

/// Whether the pair encodes without wrapping and therefore round-trips
pub fn fits_code_space(person_id: PersonId, instance_id: InstanceId) -> bool {
    pack(person_id, instance_id) < CODE_SPACE
}

/// Sum of the value's hexadecimal nibbles, modulo the alphabet size
fn checksum(mut data: u32) -> u32 {
    let mut total = 0;
    while data != 0 {
        total += data & 0xF;
        data >>= 4;
    }
    total % BASE
}

fn symbol(index: u32) -> char {
    char::from(ALPHABET[index as usize])
}

fn index_of(symbol: char) -> Option<u32> {
    ALPHABET
        .iter()
        .position(|&candidate| char::from(candidate) == symbol)
        .map(|index| index as u32)
}

/// Generate the check-in code for a person at an event instance
pub fn encode(person_id: PersonId, instance_id: InstanceId) -> CheckinCode {
    if !fits_code_space(person_id, instance_id) {
        checkin_warn!(
            Component::Codec,
            person_id = %person_id,
            instance_id = %instance_id,
            "Ids exceed the code space, the code will not decode back to them"
        );
    }
    let packed = pack(person_id, instance_id);

    let mut digits = [0u32; CODE_LEN];
    let mut remaining = packed;
    for slot in digits[..DATA_DIGITS].iter_mut().rev() {
        *slot = remaining % BASE;
        remaining /= BASE;
    }
    digits[DATA_DIGITS] = checksum(packed);

    let symbols: String = digits.iter().map(|&digit| symbol(digit)).collect();
    CheckinCode(format!("{}-{}", &symbols[..3], &symbols[3..]))
}

/// Decode a code back into its instance and person fields
///
/// Case, hyphens and spaces are ignored, so hand-typed codes decode the same
/// as scanned ones.
pub fn decode(code: &str) -> Result<DecodedCode, CodeError> {
    let normalized: Vec<char> = code
        .chars()
        .filter(|c| *c != '-' && *c != ' ')
        .flat_map(char::to_uppercase)
        .collect();

    if normalized.len() != CODE_LEN {
        return Err(CodeError::WrongLength {
            found: normalized.len(),
        });
    }

    let mut indices = [0u32; CODE_LEN];
    for (slot, &c) in indices.iter_mut().zip(&normalized) {
        *slot = index_of(c).ok_or(CodeError::UnknownSymbol { symbol: c })?;
    }

    // Six base-31 digits stay below 31^6, which fits in a u32.
    let packed = indices[..DATA_DIGITS]
        .iter()
        .fold(0u32, |acc, &digit| acc * BASE + digit);

    if checksum(packed) != indices[DATA_DIGITS] {
        return Err(CodeError::ChecksumMismatch);
    }

    Ok(DecodedCode {
        instance_id: ((packed >> FIELD_BITS) & FIELD_MASK as u32) as u16,
        person_id: (packed & FIELD_MASK as u32) as u16,
    })
}

/// Decode a code and confirm it matches the expected instance and/or person
pub fn validate(
    code: &str,
    expected_instance: Option<InstanceId>,
    expected_person: Option<PersonId>,
) -> Result<DecodedCode, CodeError> {
    let decoded = decode(code)?;

    if let Some(instance_id) = expected_instance {
        let expected = reduce(instance_id.value());
        if expected != decoded.instance_id {
            return Err(CodeError::InstanceMismatch {
                expected,
                decoded: decoded.instance_id,
            });
        }
    }

    if let Some(person_id) = expected_person {
        let expected = reduce(person_id.value());
        if expected != decoded.person_id {
            return Err(CodeError::PersonMismatch {
                expected,
                decoded: decoded.person_id,
            });
        }
    }

    Ok(decoded)
}
