use encoding_rs::{Encoding, EncoderResult, EUC_JP, SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8};

use super::{CharEncoding, CodecError};

/// バイト列を文字列にデコード（置換文字は使わない）
pub fn to_text(bytes: &[u8], encoding: CharEncoding) -> Result<String, CodecError> {
    let undecodable = || CodecError::UndecodableBytes { encoding };
    match encoding {
        CharEncoding::Ascii => {
            if bytes.is_ascii() {
                Ok(bytes.iter().map(|&b| b as char).collect())
            } else {
                Err(undecodable())
            }
        }
        // Latin-1は全バイトが1文字に対応する
        CharEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        _ => encoding_rs_for(encoding)
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
            .ok_or_else(undecodable),
    }
}

/// 再エンコードで元のバイト列に戻る場合のみデコードする
///
/// Shift_JIS の NEC/IBM 重複コードや EUC-JP の JIS X 0212 のように
/// デコードはできても同じバイト列に戻らないものは UndecodableBytes とする。
pub fn to_text_lossless(bytes: &[u8], encoding: CharEncoding) -> Result<String, CodecError> {
    let text = to_text(bytes, encoding)?;
    match from_text(&text, encoding) {
        Ok(encoded) if encoded == bytes => Ok(text),
        _ => Err(CodecError::UndecodableBytes { encoding }),
    }
}

/// 文字列をバイト列にエンコード
pub fn from_text(text: &str, encoding: CharEncoding) -> Result<Vec<u8>, CodecError> {
    let unmappable = |ch| CodecError::EncodingError { ch, encoding };
    match encoding {
        CharEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
        CharEncoding::Ascii => text
            .chars()
            .map(|ch| if ch.is_ascii() { Ok(ch as u8) } else { Err(unmappable(ch)) })
            .collect(),
        CharEncoding::Latin1 => text
            .chars()
            .map(|ch| u8::try_from(u32::from(ch)).map_err(|_| unmappable(ch)))
            .collect(),
        // encoding_rsはUTF-16への出力をサポートしない
        CharEncoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        CharEncoding::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
        CharEncoding::ShiftJis | CharEncoding::EucJp => {
            encode_strict(text, encoding_rs_for(encoding)).map_err(unmappable)
        }
    }
}

fn encoding_rs_for(encoding: CharEncoding) -> &'static Encoding {
    match encoding {
        CharEncoding::ShiftJis => SHIFT_JIS,
        CharEncoding::EucJp => EUC_JP,
        CharEncoding::Utf16Le => UTF_16LE,
        CharEncoding::Utf16Be => UTF_16BE,
        _ => UTF_8,
    }
}

/// 表現できない文字があればその文字を返す
fn encode_strict(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>, char> {
    let mut encoder = encoding.new_encoder();
    let capacity = encoder
        .max_buffer_length_from_utf8_without_replacement(text.len())
        .unwrap_or(text.len() * 2);
    let mut out = Vec::with_capacity(capacity);
    let mut pos = 0;
    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(&text[pos..], &mut out, true);
        pos += read;
        match result {
            EncoderResult::InputEmpty => return Ok(out),
            EncoderResult::Unmappable(ch) => return Err(ch),
            EncoderResult::OutputFull => out.reserve(out.capacity().max(16)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_rejects_high_bytes() {
        assert_eq!(
            to_text(&[0xFF], CharEncoding::Ascii),
            Err(CodecError::UndecodableBytes { encoding: CharEncoding::Ascii })
        );
        assert_eq!(to_text(b"hi", CharEncoding::Ascii), Ok("hi".to_string()));
    }

    #[test]
    fn test_utf8_rejects_broken_sequence() {
        assert!(to_text(&[0xE3, 0x81], CharEncoding::Utf8).is_err());
        assert_eq!(
            to_text("あ".as_bytes(), CharEncoding::Utf8),
            Ok("あ".to_string())
        );
    }

    #[test]
    fn test_latin1_decodes_everything() {
        assert_eq!(to_text(&[0xE9], CharEncoding::Latin1), Ok("é".to_string()));
        assert_eq!(from_text("é", CharEncoding::Latin1), Ok(vec![0xE9]));
    }

    #[test]
    fn test_unencodable_character() {
        assert_eq!(
            from_text("aé", CharEncoding::Ascii),
            Err(CodecError::EncodingError { ch: 'é', encoding: CharEncoding::Ascii })
        );
        assert_eq!(
            from_text("€", CharEncoding::Latin1),
            Err(CodecError::EncodingError { ch: '€', encoding: CharEncoding::Latin1 })
        );
    }

    #[test]
    fn test_shift_jis() {
        let bytes = from_text("あ", CharEncoding::ShiftJis).unwrap();
        assert_eq!(bytes, vec![0x82, 0xA0]);
        assert_eq!(to_text(&bytes, CharEncoding::ShiftJis), Ok("あ".to_string()));
        assert_eq!(
            from_text("😀", CharEncoding::ShiftJis),
            Err(CodecError::EncodingError { ch: '😀', encoding: CharEncoding::ShiftJis })
        );
    }

    #[test]
    fn test_utf16_odd_length_is_undecodable() {
        assert_eq!(from_text("A", CharEncoding::Utf16Le), Ok(vec![0x41, 0x00]));
        assert_eq!(from_text("A", CharEncoding::Utf16Be), Ok(vec![0x00, 0x41]));
        assert!(to_text(&[0x41], CharEncoding::Utf16Le).is_err());
    }

    #[test]
    fn test_lossless_rejects_non_round_trip() {
        // NEC選定IBM拡張: デコードはできるが FA 5C に再エンコードされる
        assert_eq!(to_text(&[0xED, 0x40], CharEncoding::ShiftJis), Ok("纊".to_string()));
        assert_eq!(
            to_text_lossless(&[0xED, 0x40], CharEncoding::ShiftJis),
            Err(CodecError::UndecodableBytes { encoding: CharEncoding::ShiftJis })
        );
        // JIS X 0212 はデコードのみ対応
        assert_eq!(
            to_text_lossless(&[0x8F, 0xB0, 0xA1, 0x41], CharEncoding::EucJp),
            Err(CodecError::UndecodableBytes { encoding: CharEncoding::EucJp })
        );
        assert_eq!(
            to_text_lossless(&[0x82, 0xA0], CharEncoding::ShiftJis),
            Ok("あ".to_string())
        );
    }
}
