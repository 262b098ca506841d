use crate::Failure;

use std::borrow::Cow;
use std::str::{self, Utf8Error};

/// A text encoding that bodies may be declared in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Charset {
    Utf8,
    Latin1,
    Ascii,
}

#[derive(Debug, thiserror::Error)]
pub enum CharsetError {
    #[error("unknown charset {0:?}")]
    Unknown(String),
    #[error("byte 0x{byte:02x} at offset {offset} is not valid ascii")]
    NotAscii { byte: u8, offset: usize },
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
}

impl Charset {
    /// Resolve a charset label such as `utf-8` or `ISO-8859-1`.
    pub fn from_label(label: &str) -> Result<Charset, Failure> {
        let label = label.trim().trim_matches('"').to_ascii_lowercase();
        match label.as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" | "l1" => Ok(Charset::Latin1),
            "ascii" | "us-ascii" => Ok(Charset::Ascii),
            _ => Err(Failure::decode(
                "charset error",
                CharsetError::Unknown(label),
            )),
        }
    }

    pub fn decode<'a>(self, bytes: &'a [u8]) -> Result<Cow<'a, str>, Failure> {
        self.try_decode(bytes)
            .map_err(|err| Failure::decode("charset error", err))
    }

    fn try_decode<'a>(self, bytes: &'a [u8]) -> Result<Cow<'a, str>, CharsetError> {
        match self {
            Charset::Utf8 => Ok(Cow::Borrowed(str::from_utf8(bytes)?)),
            Charset::Latin1 => match str::from_utf8(bytes) {
                Ok(text) if bytes.is_ascii() => Ok(Cow::Borrowed(text)),
                _ => Ok(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
            },
            Charset::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(CharsetError::NotAscii {
                    byte: bytes[offset],
                    offset,
                }),
                None => Ok(Cow::Borrowed(str::from_utf8(bytes)?)),
            },
        }
    }
}
