//! Legacy codepage boundary
//!
//! Rule and dictionary logic operates on Unicode strings throughout; the
//! only places byte-level encodings appear are the fixed-record binary
//! dictionary and the byte-length validation inherited from it. Both go
//! through [`TextCodec`] so the rest of the core never names a codepage
//! crate directly.

use encoding_rs::{EUC_KR, SHIFT_JIS};

/// The two legacy codepages the fixed-record format is defined over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePage {
    /// Japanese side (Shift-JIS / cp932 family).
    Japanese,
    /// Korean side (Unified Hangul Code / cp949 family).
    Korean,
}

/// Conversion between internal Unicode text and the legacy codepages.
pub trait TextCodec: Send + Sync {
    /// Encode `text` into the given codepage. Unmappable characters are
    /// substituted (numeric character references), never an error.
    fn encode(&self, text: &str, page: CodePage) -> Vec<u8>;

    /// Decode legacy bytes into a string. Malformed sequences decode to
    /// the replacement character.
    fn decode(&self, bytes: &[u8], page: CodePage) -> String;

    /// Length of `text` once encoded, for the fixed-record byte limits.
    fn encoded_len(&self, text: &str, page: CodePage) -> usize {
        self.encode(text, page).len()
    }
}

/// Production codec over `encoding_rs`.
///
/// `encoding_rs` names the Korean encoding EUC-KR but implements the
/// Unified Hangul Code extension, which is what the legacy dictionaries
/// actually contain.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyCodec;

impl LegacyCodec {
    fn encoding(page: CodePage) -> &'static encoding_rs::Encoding {
        match page {
            CodePage::Japanese => SHIFT_JIS,
            CodePage::Korean => EUC_KR,
        }
    }
}

impl TextCodec for LegacyCodec {
    fn encode(&self, text: &str, page: CodePage) -> Vec<u8> {
        let (bytes, _, _) = Self::encoding(page).encode(text);
        bytes.into_owned()
    }

    fn decode(&self, bytes: &[u8], page: CodePage) -> String {
        let (text, _, _) = Self::encoding(page).decode(bytes);
        text.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn japanese_round_trip() {
        let codec = LegacyCodec;
        let text = "こんにちは";
        let bytes = codec.encode(text, CodePage::Japanese);
        // Shift-JIS kana are two bytes each
        assert_eq!(bytes.len(), 10);
        assert_eq!(codec.decode(&bytes, CodePage::Japanese), text);
    }

    #[test]
    fn korean_round_trip() {
        let codec = LegacyCodec;
        let text = "안녕하세요";
        let bytes = codec.encode(text, CodePage::Korean);
        assert_eq!(bytes.len(), 10);
        assert_eq!(codec.decode(&bytes, CodePage::Korean), text);
    }

    #[test]
    fn ascii_is_single_byte_in_both() {
        let codec = LegacyCodec;
        assert_eq!(codec.encoded_len("abc123", CodePage::Japanese), 6);
        assert_eq!(codec.encoded_len("abc123", CodePage::Korean), 6);
    }
}
