use super::CodecError;

/// 1バイトあたりの表示幅（"XX "）
pub const HEX_GROUP_WIDTH: usize = 3;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// バイト列を "3f a0 01" 形式の文字列に変換
pub fn to_hex_text(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * HEX_GROUP_WIDTH);
    for (i, &byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
        out.push(HEX_DIGITS[(byte & 0x0F) as usize] as char);
    }
    out
}

/// HEX文字列をバイト列に変換
///
/// 空白区切りの各トークンは偶数桁の16進数でなければならない。
/// "0001" のように区切りのないトークンは2桁ずつに分割する。
/// 入力途中の1桁だけのトークンは切り捨てずにエラーとする。
pub fn from_hex_text(text: &str) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::with_capacity(text.len() / HEX_GROUP_WIDTH + 1);
    for token in text.split_whitespace() {
        if token.len() % 2 != 0 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CodecError::InvalidHexFormat {
                token: token.to_string(),
            });
        }
        for pair in token.as_bytes().chunks(2) {
            bytes.push((nibble(pair[0]) << 4) | nibble(pair[1]));
        }
    }
    Ok(bytes)
}

/// 入力可能なHEX文字か（小文字のみ）
pub fn is_hex_digit(ch: char) -> bool {
    matches!(ch, '0'..='9' | 'a'..='f')
}

fn nibble(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex_text() {
        assert_eq!(to_hex_text(&[0x3f, 0xa0, 0x01]), "3f a0 01");
        assert_eq!(to_hex_text(&[0x00]), "00");
        assert_eq!(to_hex_text(&[]), "");
    }

    #[test]
    fn test_from_hex_text() {
        assert_eq!(from_hex_text("3f a0 01"), Ok(vec![0x3f, 0xa0, 0x01]));
        assert_eq!(from_hex_text("  3F\nA0\t01 \n"), Ok(vec![0x3f, 0xa0, 0x01]));
        assert_eq!(from_hex_text("0001"), Ok(vec![0x00, 0x01]));
        assert_eq!(from_hex_text(""), Ok(vec![]));
    }

    #[test]
    fn test_rejects_partial_input() {
        assert_eq!(
            from_hex_text("a"),
            Err(CodecError::InvalidHexFormat { token: "a".to_string() })
        );
        assert_eq!(
            from_hex_text("00 1"),
            Err(CodecError::InvalidHexFormat { token: "1".to_string() })
        );
    }

    #[test]
    fn test_rejects_non_hex() {
        assert_eq!(
            from_hex_text("zz"),
            Err(CodecError::InvalidHexFormat { token: "zz".to_string() })
        );
        assert!(from_hex_text("0x10").is_err());
    }

    #[test]
    fn test_roundtrip_all_byte_values() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(from_hex_text(&to_hex_text(&bytes)), Ok(bytes));
    }

    #[test]
    fn test_is_hex_digit() {
        assert!(is_hex_digit('0'));
        assert!(is_hex_digit('f'));
        assert!(!is_hex_digit('F'));
        assert!(!is_hex_digit('g'));
        assert!(!is_hex_digit(' '));
    }
}
