mod frame_view;

pub use frame_view::{cursor_row, FrameView};

use ratatui::style::Color;

/// 表示色
pub struct Colors;

impl Colors {
    pub const HEADER: Color = Color::Cyan;
    pub const ADDR: Color = Color::DarkGray;
    pub const HEX_NORMAL: Color = Color::White;
    pub const HEX_ZERO: Color = Color::DarkGray;
    pub const HEX_HIGH: Color = Color::Red;
    pub const HEX_PRINTABLE: Color = Color::Green;
    /// 入力途中の不完全なグループ
    pub const HEX_PARTIAL: Color = Color::Yellow;
    pub const TEXT_NORMAL: Color = Color::White;
    pub const TEXT_CONTROL: Color = Color::DarkGray;
    pub const CURSOR: Color = Color::Black;
    pub const CURSOR_BG: Color = Color::Yellow;
}
