// src/zkp/attribute_codec.rs
//! Fixed-width encoding of a credential's attribute vector, the disclosure
//! bitmask, and the layout of the circuit's public signals.
//!
//! The public-signal order is described by a versioned [`SignalLayout`]
//! rather than by index arithmetic scattered across callers. Version 1 is:
//!
//! | index | signal |
//! |-------|--------|
//! | 0 | presentation tag: Poseidon of holder secret, credential hash and challenge |
//! | 1..=10 | attribute `i` if revealed, else `0` |
//! | 11 | challenge |
//! | 12 | issuer key digest |
//! | 13 | schema hash |
//! | 14 | credential hash, as attested by the issuer |

use std::collections::BTreeMap;

use crate::errors::CodecError;
use crate::models::credential::{MAX_ATTRIBUTES, ZERO_SENTINEL};

/// Positions of each value inside a proof's public signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalLayout {
    pub version: u32,
    pub presentation_tag_index: usize,
    pub attribute_offset: usize,
    pub attribute_count: usize,
    pub challenge_index: usize,
    pub issuer_key_index: usize,
    pub schema_index: usize,
    pub credential_hash_index: usize,
    pub len: usize,
}

pub const SIGNAL_LAYOUT_V1: SignalLayout = SignalLayout {
    version: 1,
    presentation_tag_index: 0,
    attribute_offset: 1,
    attribute_count: MAX_ATTRIBUTES,
    challenge_index: MAX_ATTRIBUTES + 1,
    issuer_key_index: MAX_ATTRIBUTES + 2,
    schema_index: MAX_ATTRIBUTES + 3,
    credential_hash_index: MAX_ATTRIBUTES + 4,
    len: MAX_ATTRIBUTES + 5,
};

impl SignalLayout {
    /// Looks up a known layout by version number.
    pub fn for_version(version: u32) -> Option<SignalLayout> {
        match version {
            1 => Some(SIGNAL_LAYOUT_V1),
            _ => None,
        }
    }

    /// Signal index carrying attribute `attribute_index`, if it is in range.
    pub fn attribute_signal(&self, attribute_index: usize) -> Option<usize> {
        (attribute_index < self.attribute_count).then(|| self.attribute_offset + attribute_index)
    }
}

impl Default for SignalLayout {
    fn default() -> Self {
        SIGNAL_LAYOUT_V1
    }
}

/// Builds the 10-slot reveal bitmask.
///
/// Indices `>= 10` are silently ignored; duplicates are harmless.
pub fn encode_flags(reveal_indices: &[usize]) -> [u8; MAX_ATTRIBUTES] {
    let mut flags = [0u8; MAX_ATTRIBUTES];
    for &index in reveal_indices {
        if index < MAX_ATTRIBUTES {
            flags[index] = 1;
        }
    }
    flags
}

/// Right-pads an attribute vector with the zero sentinel to exactly 10 slots.
///
/// # Errors
/// [`CodecError::TooManyAttributes`] if more than 10 attributes are supplied.
pub fn pad_attributes(attributes: &[String]) -> Result<[String; MAX_ATTRIBUTES], CodecError> {
    if attributes.len() > MAX_ATTRIBUTES {
        return Err(CodecError::TooManyAttributes {
            found: attributes.len(),
            max: MAX_ATTRIBUTES,
        });
    }

    let mut padded: [String; MAX_ATTRIBUTES] = std::array::from_fn(|_| ZERO_SENTINEL.to_string());
    for (slot, value) in padded.iter_mut().zip(attributes) {
        *slot = value.clone();
    }
    Ok(padded)
}

/// Recovers the disclosed attributes from a proof's public signals.
///
/// Walks `reveal_indices` in the order given and keeps a pair only when the
/// corresponding signal exists and is not the zero sentinel. A requested
/// attribute whose true value is zero therefore looks unrevealed.
pub fn decode_revealed(
    public_signals: &[String],
    reveal_indices: &[usize],
    layout: &SignalLayout,
) -> BTreeMap<usize, String> {
    let mut revealed = BTreeMap::new();
    for &index in reveal_indices {
        let Some(position) = layout.attribute_signal(index) else {
            continue;
        };
        match public_signals.get(position) {
            Some(value) if value.trim() != ZERO_SENTINEL => {
                revealed.insert(index, value.clone());
            }
            _ => {}
        }
    }
    revealed
}

/// Every attribute a proof's public signals actually disclose: all non-zero
/// attribute slots, whatever the prover claims to have requested.
pub fn disclosed_attributes(public_signals: &[String], layout: &SignalLayout) -> BTreeMap<usize, String> {
    let every_slot: Vec<usize> = (0..layout.attribute_count).collect();
    decode_revealed(public_signals, &every_slot, layout)
}
