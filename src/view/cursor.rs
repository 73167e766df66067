use crate::codec::{is_hex_digit, HEX_GROUP_WIDTH};

/// HEX表示上の位置（行, 列）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

/// HEX表示の文字位置とフレーム内バイト位置の対応付け
///
/// HEX表示は1バイト3文字（"XX "）の固定幅で、bytes_per_row バイトごとに折り返す。
/// 位置は表示文字列の先頭からの文字オフセットで扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorMapper {
    bytes_per_row: usize,
}

impl CursorMapper {
    pub fn new(bytes_per_row: usize) -> Self {
        Self {
            bytes_per_row: bytes_per_row.max(1),
        }
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    /// 1行の文字数
    pub fn line_width(&self) -> usize {
        self.bytes_per_row * HEX_GROUP_WIDTH
    }

    /// 列をバイトグループの先頭に揃える
    pub fn snap(column: usize) -> usize {
        column - column % HEX_GROUP_WIDTH
    }

    /// (行, 列) → フレーム内バイト位置
    pub fn text_offset_to_byte_index(&self, line: usize, column: usize) -> usize {
        self.offset_to_byte_index(line * self.line_width() + column)
    }

    /// 文字オフセット → フレーム内バイト位置
    pub fn offset_to_byte_index(&self, offset: usize) -> usize {
        Self::snap(offset) / HEX_GROUP_WIDTH
    }

    /// フレーム内バイト位置 → そのグループ先頭の文字オフセット
    pub fn byte_index_to_offset(&self, byte_index: usize) -> usize {
        byte_index * HEX_GROUP_WIDTH
    }

    /// 文字オフセット → (行, 列)
    pub fn position(&self, offset: usize) -> TextPosition {
        TextPosition {
            line: offset / self.line_width(),
            column: offset % self.line_width(),
        }
    }

    /// (行, 列) → 文字オフセット
    pub fn offset(&self, position: TextPosition) -> usize {
        position.line * self.line_width() + position.column
    }

    /// 左右移動: delta_bytes バイト分（3文字単位）動かしてグループ先頭に揃える
    ///
    /// 表示文字列の末尾（追記位置）まで移動できる。
    pub fn step(&self, offset: usize, delta_bytes: isize, text_len: usize) -> usize {
        let snapped = Self::snap(offset);
        let delta = delta_bytes.unsigned_abs() * HEX_GROUP_WIDTH;
        let moved = if delta_bytes < 0 {
            snapped.saturating_sub(delta)
        } else {
            snapped.saturating_add(delta)
        };
        moved.min(text_len)
    }

    /// 上下移動: 1行分動かす（列はグループ先頭に揃えない）
    ///
    /// 移動先が範囲外なら動かない。
    pub fn step_line(&self, offset: usize, delta_lines: isize, text_len: usize) -> usize {
        let delta = delta_lines.unsigned_abs() * self.line_width();
        if delta_lines < 0 {
            offset.checked_sub(delta).unwrap_or(offset)
        } else {
            match offset.checked_add(delta) {
                Some(moved) if moved <= text_len => moved,
                _ => offset,
            }
        }
    }

    /// カーソル位置のHEX文字を上書きし、新しいカーソル位置を返す
    ///
    /// 0-9, a-f 以外は無視して None を返す。区切りの空白は上書きせずに次の桁へ進む。
    /// 末尾では新しいグループとして追記する。
    pub fn overwrite(&self, text: &mut String, offset: usize, ch: char) -> Option<usize> {
        if !is_hex_digit(ch) {
            return None;
        }
        let mut offset = offset.min(text.len());
        if offset < text.len() && is_separator(offset) {
            offset += 1;
        }

        if offset < text.len() {
            let mut buf = [0u8; 4];
            text.replace_range(offset..offset + 1, ch.encode_utf8(&mut buf));
            let mut next = offset + 1;
            if next < text.len() && is_separator(next) {
                next += 1;
            }
            Some(next)
        } else {
            if text.len() % HEX_GROUP_WIDTH == HEX_GROUP_WIDTH - 1 {
                text.push(' ');
            }
            text.push(ch);
            Some(text.len())
        }
    }

    /// 末尾の1文字を削除し、新しい末尾位置を返す（区切りの空白も一緒に消す）
    pub fn erase_last(&self, text: &mut String) -> usize {
        text.pop();
        if text.ends_with(' ') {
            text.pop();
        }
        text.len()
    }
}

/// 区切り位置（"XX " の3文字目）か
fn is_separator(offset: usize) -> bool {
    offset % HEX_GROUP_WIDTH == HEX_GROUP_WIDTH - 1
}

/// "Byte N of M" 表示用の1始まりのファイル内位置
pub fn byte_index_to_display_number(byte_index: usize, frame_index: usize, chunk_size: usize) -> usize {
    byte_index + frame_index * chunk_size + 1
}
