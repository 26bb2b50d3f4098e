//! Byte-order-mark sniffing and the decode cascade.
//!
//! Input is tried in this order, first success wins:
//!
//! | Step | Condition                     | Result                |
//! |------|-------------------------------|-----------------------|
//! | 1    | `EF BB BF` prefix             | UTF-8 (BOM stripped)  |
//! | 2    | `FF FE` prefix                | UTF-16 little-endian  |
//! | 3    | `FE FF` prefix                | UTF-16 big-endian     |
//! | 4    | valid UTF-8                   | UTF-8                 |
//! | 5    | [`DecodePolicy::lossy_utf8`]  | UTF-8, U+FFFD for bad sequences |
//! | 6    | legacy code page decodes      | [`DecodePolicy::legacy`] |
//!
//! A BOM-tagged UTF-8 body that fails strict decoding continues at step 5.
//! UTF-16 with an odd trailing byte drops that byte.

use std::borrow::Cow;
use std::fmt;

use encoding_rs::Encoding as CodePage;

use crate::error::DecodeError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const UTF16LE_BOM: &[u8] = b"\xFF\xFE";
const UTF16BE_BOM: &[u8] = b"\xFE\xFF";

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// The encoding a document's bytes were decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    /// A single- or double-byte code page.
    Legacy(&'static CodePage),
}

impl Encoding {
    /// Human-readable label for status displays.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf8Bom => "UTF-8 BOM",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Legacy(cp) => cp.name(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// DecodePolicy
// ---------------------------------------------------------------------------

/// Knobs for the fallback end of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodePolicy {
    /// Accept invalid UTF-8 with replacement characters before trying the
    /// legacy code page.
    pub lossy_utf8: bool,
    /// Code page used when every UTF-8 attempt is refused.
    pub legacy: &'static CodePage,
}

impl Default for DecodePolicy {
    fn default() -> Self {
        Self {
            lossy_utf8: true,
            legacy: encoding_rs::WINDOWS_1252,
        }
    }
}

/// Result of a successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: Encoding,
    /// Replacement characters were substituted for malformed input.
    pub lossy: bool,
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

/// Run the decode cascade over `bytes`.
///
/// # Errors
///
/// [`DecodeError::Exhausted`] when strict UTF-8 fails, lossy UTF-8 is
/// disabled, and the legacy code page rejects the input too.
pub fn decode(bytes: &[u8], policy: &DecodePolicy) -> Result<Decoded, DecodeError> {
    if let Some(body) = bytes.strip_prefix(UTF8_BOM) {
        return decode_unmarked(body, policy, Encoding::Utf8Bom);
    }
    if let Some(body) = bytes.strip_prefix(UTF16LE_BOM) {
        return Ok(decode_utf16(body, encoding_rs::UTF_16LE, Encoding::Utf16Le));
    }
    if let Some(body) = bytes.strip_prefix(UTF16BE_BOM) {
        return Ok(decode_utf16(body, encoding_rs::UTF_16BE, Encoding::Utf16Be));
    }
    decode_unmarked(bytes, policy, Encoding::Utf8)
}

fn decode_unmarked(
    bytes: &[u8],
    policy: &DecodePolicy,
    utf8: Encoding,
) -> Result<Decoded, DecodeError> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(Decoded {
            text: text.to_owned(),
            encoding: utf8,
            lossy: false,
        });
    }

    if policy.lossy_utf8 {
        tracing::warn!(len = bytes.len(), "invalid UTF-8, decoding with replacement");
        return Ok(Decoded {
            text: String::from_utf8_lossy(bytes).into_owned(),
            encoding: utf8,
            lossy: true,
        });
    }

    match policy
        .legacy
        .decode_without_bom_handling_and_without_replacement(bytes)
    {
        Some(text) => {
            tracing::warn!(codepage = policy.legacy.name(), "falling back to legacy code page");
            Ok(Decoded {
                text: text.into_owned(),
                encoding: Encoding::Legacy(policy.legacy),
                lossy: false,
            })
        }
        None => Err(DecodeError::Exhausted {
            len: bytes.len(),
            codepage: policy.legacy.name(),
        }),
    }
}

fn decode_utf16(body: &[u8], codec: &'static CodePage, encoding: Encoding) -> Decoded {
    let even = &body[..body.len() & !1];
    let (text, lossy): (Cow<'_, str>, bool) = codec.decode_without_bom_handling(even);
    Decoded {
        text: text.into_owned(),
        encoding,
        lossy,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
