// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

//! Lenient Base64 for binary blob values.
//!
//! Decoding skips every byte outside the standard alphabet and padding, so
//! whitespace and stray punctuation in the document are tolerated. Padding
//! may be missing entirely, but padding followed by more payload is
//! rejected, as is a leftover of a single symbol. Encoding always emits
//! canonical padded output.

use crate::modules::error::{self, Error, ErrorKind, Result};
use ::base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};

const PADDED: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_encode_padding(true),
);

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes bytes as canonical padded Base64.
pub fn encode(data: &[u8]) -> String {
    PADDED.encode(data)
}

/// Decodes Base64 text leniently, per the rules above.
pub fn decode(text: &[u8]) -> Result<Vec<u8>> {
    let mut symbols = Vec::with_capacity(text.len());
    let mut seen_padding = false;
    for &byte in text {
        if byte == b'=' {
            seen_padding = true;
            continue;
        }
        let in_alphabet =
            byte.is_ascii_alphanumeric() || byte == b'+' || byte == b'/';
        if !in_alphabet {
            continue;
        }
        if seen_padding {
            // Payload after padding.
            return Err(error::new(ErrorKind::InvalidBase64));
        }
        symbols.push(byte);
    }
    if symbols.len() % 4 == 1 {
        return Err(error::new(ErrorKind::InvalidBase64));
    }
    LENIENT
        .decode(&symbols)
        .map_err(|_| invalid())
}

fn invalid() -> Error {
    error::new(ErrorKind::InvalidBase64)
}
