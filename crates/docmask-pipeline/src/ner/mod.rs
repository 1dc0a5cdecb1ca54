// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Named-entity handling for text redaction: BIO span decoding and placeholder
// substitution.

pub mod decode;
pub mod substitute;

pub use decode::{SpanGroup, SpanGroups, TaggedToken, decode_spans};
pub use substitute::MaskSubstitution;

use sha2::{Digest, Sha256};

/// Short SHA-256 fingerprint of a sensitive value, safe to log.
pub(crate) fn fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(&digest[..6])
}
