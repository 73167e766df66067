//! 表示・編集セッションとカーソル位置の対応付け

mod cursor;
mod session;

pub use cursor::{byte_index_to_display_number, CursorMapper, TextPosition};
pub use session::{BytePosition, Notice, RenderMode, Rendered, SessionError, ViewSession};
