//! Supported text encodings
//!
//! A fixed set of encodings that `encoding_rs` can both decode and encode.
//! Keys are WHATWG labels; decoding is strict (malformed input is an error,
//! never replaced).

use encoding_rs::Encoding;
use std::borrow::Cow;

use crate::{Error, Result};

/// Default encoding key
pub const DEFAULT_ENCODING: &str = "utf-8";

/// (WHATWG label, display name)
const SUPPORTED: &[(&str, &str)] = &[
    ("utf-8", "Unicode (UTF-8)"),
    ("windows-1252", "Western European (Windows-1252 / Latin-1)"),
    ("iso-8859-15", "Western European (ISO-8859-15)"),
    ("iso-8859-2", "Central European (ISO-8859-2)"),
    ("windows-1251", "Cyrillic (Windows-1251)"),
    ("koi8-r", "Cyrillic (KOI8-R)"),
    ("macintosh", "Western (Mac OS Roman)"),
    ("shift_jis", "Japanese (Shift JIS)"),
    ("euc-jp", "Japanese (EUC-JP)"),
    ("gb18030", "Chinese Simplified (GB18030)"),
    ("big5", "Chinese Traditional (Big5)"),
    ("euc-kr", "Korean (EUC-KR)"),
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A resolved member of the supported set
#[derive(Debug, Clone, Copy)]
pub struct TextEncoding {
    key: &'static str,
    encoding: &'static Encoding,
}

impl TextEncoding {
    pub fn utf8() -> Self {
        Self {
            key: DEFAULT_ENCODING,
            encoding: encoding_rs::UTF_8,
        }
    }

    /// Resolve an encoding key from the supported set
    pub fn from_key(key: &str) -> Result<Self> {
        let wanted = key.trim().to_ascii_lowercase();
        SUPPORTED
            .iter()
            .find(|(k, _)| *k == wanted)
            .and_then(|(k, _)| {
                Encoding::for_label(k.as_bytes()).map(|encoding| Self { key: *k, encoding })
            })
            .ok_or(Error::UnsupportedEncoding(wanted))
    }

    /// Explicit choice when supported, UTF-8 when blank or absent
    pub fn select(choice: Option<&str>) -> Result<Self> {
        match choice.map(str::trim).filter(|c| !c.is_empty()) {
            Some(key) => Self::from_key(key),
            None => Ok(Self::utf8()),
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Strictly decode `bytes`
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
        let bytes = if self.encoding == encoding_rs::UTF_8 {
            bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
        } else {
            bytes
        };

        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .ok_or_else(|| Error::Decode {
                encoding: self.key.to_string(),
            })
    }

    /// Encode `text`, failing on unmappable characters
    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>> {
        let (bytes, _, had_unmappable) = self.encoding.encode(text);
        if had_unmappable {
            return Err(Error::Encode {
                encoding: self.key.to_string(),
            });
        }
        Ok(bytes)
    }
}

/// Supported encodings as (key, display name), sorted by key
pub fn supported_encodings() -> Vec<(&'static str, &'static str)> {
    let mut list: Vec<_> = SUPPORTED.to_vec();
    list.sort_by(|a, b| a.0.cmp(b.0));
    list
}
