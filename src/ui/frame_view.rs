use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::Colors;
use crate::codec::HEX_GROUP_WIDTH;
use crate::view::RenderMode;

/// アドレス欄の幅（"XXXXXXXX  "）
const ADDR_WIDTH: u16 = 10;

/// フレームの表示文字列を描画するウィジェット
pub struct FrameView<'a> {
    /// 表示文字列（編集中の内容）
    text: &'a str,
    /// 実際に表示しているモード
    mode: RenderMode,
    /// カーソル位置（文字列のバイトオフセット）
    cursor: usize,
    /// 1行あたりのバイト数（HEXモード）
    bytes_per_row: usize,
    /// フレーム先頭のファイル内オフセット
    base_addr: usize,
    /// 表示開始行
    scroll: usize,
}

impl<'a> FrameView<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            mode: RenderMode::Hex,
            cursor: 0,
            bytes_per_row: 16,
            base_addr: 0,
            scroll: 0,
        }
    }

    pub fn mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn bytes_per_row(mut self, bytes: usize) -> Self {
        self.bytes_per_row = bytes.max(1);
        self
    }

    pub fn base_addr(mut self, addr: usize) -> Self {
        self.base_addr = addr;
        self
    }

    pub fn scroll(mut self, row: usize) -> Self {
        self.scroll = row;
        self
    }

    fn line_width(&self) -> usize {
        self.bytes_per_row * HEX_GROUP_WIDTH
    }

    /// バイト値に応じた色を取得
    fn byte_color(byte: u8) -> Color {
        match byte {
            0x00 => Colors::HEX_ZERO,
            0xFF => Colors::HEX_HIGH,
            0x20..=0x7E => Colors::HEX_PRINTABLE,
            _ => Colors::HEX_NORMAL,
        }
    }

    /// i文字目が属するグループの色（入力途中なら黄色）
    fn group_color(&self, i: usize) -> Color {
        let start = i - i % HEX_GROUP_WIDTH;
        self.text
            .get(start..start + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .map_or(Colors::HEX_PARTIAL, Self::byte_color)
    }

    fn cursor_style() -> Style {
        Style::default().bg(Colors::CURSOR_BG).fg(Colors::CURSOR)
    }

    /// HEXモードの1行を描画
    fn render_hex_row(&self, row: usize, area: Rect, buf: &mut Buffer) {
        let len = self.text.len();
        let start = row * self.line_width();
        let end = (start + self.line_width()).min(len);
        let cursor_at_eof = self.cursor >= len;

        // データがなく、かつカーソルもこの行にない場合はスキップ
        let eof_row = cursor_at_eof && len % self.line_width() == 0;
        if start > len || (start == len && !eof_row) {
            return;
        }

        let addr = self.base_addr + row * self.bytes_per_row;
        buf.set_string(area.x, area.y, format!("{:08X}", addr), Style::default().fg(Colors::ADDR));

        let mut x = area.x + ADDR_WIDTH;
        for i in start..end {
            if x >= area.right() {
                return;
            }
            let ch = self.text.get(i..i + 1).unwrap_or("?");
            let style = if i == self.cursor {
                Self::cursor_style()
            } else {
                Style::default().fg(self.group_color(i))
            };
            buf.set_string(x, area.y, ch, style);
            x += 1;
        }

        // 末尾（追記位置）のカーソル
        if cursor_at_eof && x < area.right() {
            if end == len && end - start < self.line_width() {
                buf.set_string(x, area.y, "_", Self::cursor_style());
            }
        }
    }

    fn render_hex(&self, area: Rect, buf: &mut Buffer) {
        // ヘッダー行を描画
        let header = format!(
            "{:8}  {}",
            "Offset",
            (0..self.bytes_per_row)
                .map(|i| format!("{:02X}", i))
                .collect::<Vec<_>>()
                .join(" ")
        );
        buf.set_string(
            area.x,
            area.y,
            &header,
            Style::default()
                .fg(Colors::HEADER)
                .add_modifier(Modifier::BOLD),
        );

        // データ行を描画
        let visible_rows = (area.height as usize).saturating_sub(1);
        for i in 0..visible_rows {
            let row_area = Rect {
                x: area.x,
                y: area.y + 1 + i as u16,
                width: area.width,
                height: 1,
            };
            self.render_hex_row(self.scroll + i, row_area, buf);
        }
    }

    fn render_text(&self, area: Rect, buf: &mut Buffer) {
        let cells = layout_text(self.text, area.width as usize);
        let visible = self.scroll..self.scroll + area.height as usize;

        for cell in cells.iter().filter(|c| visible.contains(&c.row)) {
            let y = area.y + (cell.row - self.scroll) as u16;
            let x = area.x + cell.x as u16;
            let control = is_control(cell.grapheme);
            let style = if cell.offset == self.cursor {
                Self::cursor_style()
            } else if control {
                Style::default().fg(Colors::TEXT_CONTROL)
            } else {
                Style::default().fg(Colors::TEXT_NORMAL)
            };
            buf.set_string(x, y, if control { "." } else { cell.grapheme }, style);
        }

        // 末尾（追記位置）のカーソル
        if self.cursor >= self.text.len() {
            let (row, x) = cells.last().map_or((0, 0), |c| (c.row, c.x + c.width));
            if visible.contains(&row) && x < area.width as usize {
                buf.set_string(
                    area.x + x as u16,
                    area.y + (row - self.scroll) as u16,
                    "_",
                    Self::cursor_style(),
                );
            }
        }
    }
}

impl Widget for FrameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.mode {
            RenderMode::Hex => self.render_hex(area, buf),
            RenderMode::Text => self.render_text(area, buf),
        }
    }
}

/// テキスト表示の1グラフェム
struct Cell<'a> {
    offset: usize,
    grapheme: &'a str,
    row: usize,
    x: usize,
    width: usize,
}

/// 表示幅で折り返したグラフェムの配置
fn layout_text(text: &str, width: usize) -> Vec<Cell<'_>> {
    let width = width.max(1);
    let mut cells = Vec::new();
    let (mut row, mut x) = (0, 0);
    for (offset, grapheme) in text.grapheme_indices(true) {
        let w = if is_control(grapheme) { 1 } else { grapheme.width().max(1) };
        if x > 0 && x + w > width {
            row += 1;
            x = 0;
        }
        cells.push(Cell {
            offset,
            grapheme,
            row,
            x,
            width: w,
        });
        x += w;
    }
    cells
}

fn is_control(grapheme: &str) -> bool {
    grapheme.chars().any(char::is_control)
}

/// カーソルがある表示行（スクロール位置の計算用）
///
/// HEXモードはヘッダー行を含まない。
pub fn cursor_row(text: &str, mode: RenderMode, cursor: usize, bytes_per_row: usize, width: u16) -> usize {
    match mode {
        RenderMode::Hex => cursor / (bytes_per_row.max(1) * HEX_GROUP_WIDTH),
        RenderMode::Text => {
            let cells = layout_text(text, width as usize);
            cells
                .iter()
                .find(|c| c.offset >= cursor)
                .or(cells.last())
                .map_or(0, |c| c.row)
        }
    }
}
