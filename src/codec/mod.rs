//! バイト列とテキスト表現の相互変換
//!
//! HEX表現は常に可逆、テキスト表現はエンコーディング次第で失敗しうる。

mod hex;
mod text;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use hex::{from_hex_text, is_hex_digit, to_hex_text, HEX_GROUP_WIDTH};
pub use text::{from_text, to_text, to_text_lossless};

/// 変換エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// HEX文字列として解釈できない
    #[error("invalid hex format: {token:?}")]
    InvalidHexFormat { token: String },
    /// 指定エンコーディングでデコードできないバイト列
    #[error("bytes are not valid {encoding}")]
    UndecodableBytes { encoding: CharEncoding },
    /// 指定エンコーディングで表現できない文字
    #[error("cannot encode {ch:?} in {encoding}")]
    EncodingError { ch: char, encoding: CharEncoding },
}

/// 文字エンコーディング
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CharEncoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
    ShiftJis,
    EucJp,
    Utf16Le,
    Utf16Be,
}

impl CharEncoding {
    /// 全エンコーディング（切替順）
    pub const ALL: [CharEncoding; 7] = [
        CharEncoding::Utf8,
        CharEncoding::Ascii,
        CharEncoding::Latin1,
        CharEncoding::ShiftJis,
        CharEncoding::EucJp,
        CharEncoding::Utf16Le,
        CharEncoding::Utf16Be,
    ];

    /// 表示名
    pub fn name(self) -> &'static str {
        match self {
            CharEncoding::Utf8 => "utf-8",
            CharEncoding::Ascii => "ascii",
            CharEncoding::Latin1 => "latin-1",
            CharEncoding::ShiftJis => "shift_jis",
            CharEncoding::EucJp => "euc-jp",
            CharEncoding::Utf16Le => "utf-16le",
            CharEncoding::Utf16Be => "utf-16be",
        }
    }

    /// ラベルから解決（大文字小文字を区別しない）
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        let encoding = match normalized.as_str() {
            "utf-8" | "utf8" => CharEncoding::Utf8,
            "ascii" | "us-ascii" => CharEncoding::Ascii,
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => CharEncoding::Latin1,
            "shift-jis" | "sjis" | "cp932" => CharEncoding::ShiftJis,
            "euc-jp" | "eucjp" => CharEncoding::EucJp,
            "utf-16le" | "utf16le" => CharEncoding::Utf16Le,
            "utf-16be" | "utf16be" => CharEncoding::Utf16Be,
            _ => return None,
        };
        Some(encoding)
    }
}

impl fmt::Display for CharEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 未知のエンコーディングラベル
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown encoding: {0:?}")]
pub struct UnknownEncoding(pub String);

impl FromStr for CharEncoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| UnknownEncoding(s.to_string()))
    }
}

impl TryFrom<String> for CharEncoding {
    type Error = UnknownEncoding;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CharEncoding> for String {
    fn from(value: CharEncoding) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_aliases() {
        assert_eq!("UTF8".parse::<CharEncoding>(), Ok(CharEncoding::Utf8));
        assert_eq!("us-ascii".parse::<CharEncoding>(), Ok(CharEncoding::Ascii));
        assert_eq!("ISO-8859-1".parse::<CharEncoding>(), Ok(CharEncoding::Latin1));
        assert_eq!("shift_jis".parse::<CharEncoding>(), Ok(CharEncoding::ShiftJis));
        assert_eq!("EUC_JP".parse::<CharEncoding>(), Ok(CharEncoding::EucJp));
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(
            "klingon".parse::<CharEncoding>(),
            Err(UnknownEncoding("klingon".to_string()))
        );
    }

    #[test]
    fn test_name_parses_back() {
        for encoding in CharEncoding::ALL {
            assert_eq!(encoding.name().parse::<CharEncoding>(), Ok(encoding));
        }
    }
}
