use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::cursor::byte_index_to_display_number;
use crate::buffer::{self, BufferError, Direction, FrameStore};
use crate::codec::{self, CharEncoding, CodecError};
use crate::config::Config;

/// 表示モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Hex,
    Text,
}

impl RenderMode {
    /// バイト列を表示用文字列に変換
    ///
    /// テキストは再エンコードで同じバイト列に戻る場合のみ表示する。
    pub fn render(self, bytes: &[u8], encoding: CharEncoding) -> Result<String, CodecError> {
        match self {
            RenderMode::Hex => Ok(codec::to_hex_text(bytes)),
            RenderMode::Text => codec::to_text_lossless(bytes, encoding),
        }
    }

    /// 編集された文字列を検証してバイト列に戻す
    pub fn validate(self, text: &str, encoding: CharEncoding) -> Result<Vec<u8>, CodecError> {
        match self {
            RenderMode::Hex => codec::from_hex_text(text),
            RenderMode::Text => codec::from_text(text, encoding),
        }
    }

    /// もう一方のモード
    pub fn toggled(self) -> Self {
        match self {
            RenderMode::Hex => RenderMode::Text,
            RenderMode::Text => RenderMode::Hex,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Hex => "HEX",
            RenderMode::Text => "TXT",
        }
    }
}

/// 描画時の通知（エラーではない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// テキストとしてデコードできずHEXで表示した
    TextUnavailable { encoding: CharEncoding },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TextUnavailable { encoding } => {
                write!(f, "Frame is not valid {encoding}, showing hex")
            }
        }
    }
}

/// 描画結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// 実際に使われた表示モード
    pub mode: RenderMode,
    pub text: String,
    pub notice: Option<Notice>,
}

/// "Byte N of M" 表示用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BytePosition {
    /// 1始まりのファイル内位置
    pub number: usize,
    /// 合計バイト数
    pub total: usize,
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// 編集内容が不正（フレームは変更されていない）
    #[error("invalid input: {0}")]
    InvalidInput(#[from] CodecError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// フレームストアと表示モードをまとめた編集セッション
///
/// 移動・モード切替・保存の前に必ず表示中の編集内容を検証して確定する。
/// 検証に失敗した場合はフレームを一切変更しない。
#[derive(Debug, Clone)]
pub struct ViewSession {
    store: FrameStore,
    chunk_size: usize,
    encoding: CharEncoding,
    /// 選択中の表示モード
    mode: RenderMode,
    /// 直前の描画で実際に使われたモード（編集内容の検証に使う）
    displayed: RenderMode,
    text_available: bool,
    path: Option<PathBuf>,
    /// 読み込み・保存以降に変更があったか
    dirty: bool,
}

impl ViewSession {
    pub fn new(config: &Config) -> Self {
        Self {
            store: FrameStore::new(),
            chunk_size: config.buffer_size.max(1),
            encoding: config.encoding,
            mode: RenderMode::Hex,
            displayed: RenderMode::Hex,
            text_available: true,
            path: None,
            dirty: false,
        }
    }

    /// ファイルを読み込む
    ///
    /// 読み込みに失敗した場合は現在のフレームをそのまま残す。
    pub fn load(&mut self, path: impl Into<PathBuf>) -> Result<(), SessionError> {
        let path = path.into();
        let chunks = buffer::read_chunks(&path, self.chunk_size)?;
        self.load_chunks(chunks);
        self.path = Some(path);
        Ok(())
    }

    /// チャンク列から読み込み（標準入力用）
    pub fn load_bytes(&mut self, data: &[u8]) {
        self.load_chunks(data.chunks(self.chunk_size).map(<[u8]>::to_vec).collect());
        self.path = None;
    }

    fn load_chunks(&mut self, chunks: Vec<Vec<u8>>) {
        self.store.load(chunks);
        self.sync_displayed();
        self.dirty = false;
    }

    /// displayed をアクティブフレームで実際に使われるモードに合わせる
    fn sync_displayed(&mut self) {
        self.displayed = match self.store.current() {
            Ok(bytes) if self.mode == RenderMode::Text => {
                self.text_available = codec::to_text_lossless(bytes, self.encoding).is_ok();
                if self.text_available { RenderMode::Text } else { RenderMode::Hex }
            }
            _ => self.mode,
        };
    }

    /// 表示中のフレームを描画
    ///
    /// テキストモードでデコードできない場合はHEXで描画し、通知を付ける。
    /// 選択中のモード自体は変更しない。
    pub fn render(&mut self) -> Result<Rendered, SessionError> {
        let bytes = self.store.current()?;
        let rendered = match self.mode.render(bytes, self.encoding) {
            Ok(text) => {
                self.text_available = match self.mode {
                    RenderMode::Text => true,
                    RenderMode::Hex => codec::to_text_lossless(bytes, self.encoding).is_ok(),
                };
                Rendered {
                    mode: self.mode,
                    text,
                    notice: None,
                }
            }
            Err(e) => {
                warn!(frame = self.store.active_index(), error = %e, "falling back to hex");
                self.text_available = false;
                Rendered {
                    mode: RenderMode::Hex,
                    text: codec::to_hex_text(bytes),
                    notice: Some(Notice::TextUnavailable {
                        encoding: self.encoding,
                    }),
                }
            }
        };
        self.displayed = rendered.mode;
        Ok(rendered)
    }

    /// 表示中の編集内容を検証して確定
    ///
    /// 未読み込みの場合は新しいフレームとして追加する。
    pub fn commit_pending(&mut self, text: &str) -> Result<(), SessionError> {
        let bytes = self.displayed.validate(text, self.encoding).map_err(|e| {
            warn!(mode = self.displayed.name(), error = %e, "rejected edit");
            e
        })?;
        if self.store.commit(bytes) {
            self.dirty = true;
            debug!(frame = self.store.active_index(), "frame committed");
        }
        Ok(())
    }

    /// 次のフレームへ（確定に失敗したら移動しない）
    pub fn next_frame(&mut self, pending_text: &str) -> Result<(), SessionError> {
        self.navigate(Direction::Next, pending_text)
    }

    /// 前のフレームへ（確定に失敗したら移動しない）
    pub fn previous_frame(&mut self, pending_text: &str) -> Result<(), SessionError> {
        self.navigate(Direction::Previous, pending_text)
    }

    fn navigate(&mut self, direction: Direction, pending_text: &str) -> Result<(), SessionError> {
        if !self.store.is_loaded() {
            return Ok(());
        }
        self.commit_pending(pending_text)?;
        self.store.advance(direction);
        self.sync_displayed();
        Ok(())
    }

    /// 表示モードを切り替えて再描画
    ///
    /// 編集内容は切替前のモードで検証する。失敗したらモードは変わらない。
    pub fn switch_render_mode(
        &mut self,
        new_mode: RenderMode,
        pending_text: &str,
    ) -> Result<Rendered, SessionError> {
        self.commit_pending(pending_text)?;
        debug!(from = self.mode.name(), to = new_mode.name(), "render mode switched");
        self.mode = new_mode;
        self.render()
    }

    /// 編集内容を確定してファイル全体のバイト列を返す
    pub fn save(&mut self, pending_text: &str) -> Result<Vec<u8>, SessionError> {
        self.commit_pending(pending_text)?;
        Ok(self.store.to_byte_stream())
    }

    /// 編集内容を確定してファイルに書き込む
    ///
    /// 書き込みに成功した場合のみ未変更状態に戻す。戻り値: 書き込んだバイト数
    pub fn save_to(&mut self, path: impl Into<PathBuf>, pending_text: &str) -> Result<usize, SessionError> {
        let path = path.into();
        let bytes = self.save(pending_text)?;
        buffer::write_bytes(&path, &bytes)?;
        self.path = Some(path);
        self.dirty = false;
        Ok(bytes.len())
    }

    /// カーソルのバイト位置をファイル全体での位置に変換
    pub fn byte_position(&self, byte_index: usize) -> Option<BytePosition> {
        let frame_index = self.store.active_index()?;
        Some(BytePosition {
            number: byte_index_to_display_number(byte_index, frame_index, self.chunk_size),
            total: self.store.byte_count(),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_loaded()
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn displayed_mode(&self) -> RenderMode {
        self.displayed
    }

    pub fn text_available(&self) -> bool {
        self.text_available
    }

    pub fn encoding(&self) -> CharEncoding {
        self.encoding
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn frame_count(&self) -> usize {
        self.store.frame_count()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.store.active_index()
    }

    pub fn byte_count(&self) -> usize {
        self.store.byte_count()
    }

    /// 表示中のフレームのバイト列
    pub fn current_frame(&self) -> Result<&[u8], SessionError> {
        Ok(self.store.current()?)
    }

    /// 指定フレームに移動（確定済みの内容のみ扱う）
    pub fn seek(&mut self, index: usize) -> Result<(), SessionError> {
        self.store.seek(index)?;
        self.sync_displayed();
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// ファイル名を取得
    pub fn filename(&self) -> Option<&str> {
        self.path.as_ref().and_then(|p| p.file_name()).and_then(|s| s.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(chunk_size: usize, encoding: CharEncoding) -> ViewSession {
        ViewSession::new(&Config {
            buffer_size: chunk_size,
            encoding,
            ..Config::default()
        })
    }

    #[test]
    fn test_render_before_load() {
        let mut s = session(4, CharEncoding::Utf8);
        assert!(matches!(
            s.render(),
            Err(SessionError::Buffer(BufferError::NoDataLoaded))
        ));
    }

    #[test]
    fn test_text_fallback_keeps_preference() {
        let mut s = session(4, CharEncoding::Ascii);
        s.load_bytes(&[0xFF]);
        let rendered = s.switch_render_mode(RenderMode::Text, "ff").unwrap();
        assert_eq!(rendered.mode, RenderMode::Hex);
        assert_eq!(rendered.text, "ff");
        assert_eq!(
            rendered.notice,
            Some(Notice::TextUnavailable { encoding: CharEncoding::Ascii })
        );
        assert!(!s.text_available());
        assert_eq!(s.mode(), RenderMode::Text);
        assert_eq!(s.displayed_mode(), RenderMode::Hex);
    }

    #[test]
    fn test_fallback_edit_is_validated_as_hex() {
        let mut s = session(4, CharEncoding::Ascii);
        s.load_bytes(&[0xFF]);
        s.switch_render_mode(RenderMode::Text, "ff").unwrap();
        s.commit_pending("fe").unwrap();
        assert_eq!(s.current_frame().unwrap(), &[0xFE]);
    }

    #[test]
    fn test_invalid_hex_leaves_frame() {
        let mut s = session(4, CharEncoding::Utf8);
        s.load_bytes(&[1, 2]);
        s.render().unwrap();
        for bad in ["a", "zz", "01 0"] {
            assert!(matches!(
                s.commit_pending(bad),
                Err(SessionError::InvalidInput(CodecError::InvalidHexFormat { .. }))
            ));
        }
        assert_eq!(s.current_frame().unwrap(), &[1, 2]);
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_failed_navigation_does_not_move() {
        let mut s = session(2, CharEncoding::Utf8);
        s.load_bytes(&[1, 2, 3, 4]);
        s.render().unwrap();
        assert!(s.next_frame("0").is_err());
        assert_eq!(s.active_index(), Some(0));
        assert!(s.previous_frame("xx").is_err());
        assert_eq!(s.active_index(), Some(0));
    }

    #[test]
    fn test_edit_survives_navigation() {
        let mut s = session(2, CharEncoding::Utf8);
        s.load_bytes(&[0xAA, 0xBB, 0xCC, 0xDD]);
        let text = s.render().unwrap().text;
        assert_eq!(text, "aa bb");
        s.next_frame("00 01").unwrap();
        let text = s.render().unwrap().text;
        assert_eq!(text, "cc dd");
        s.previous_frame(&text).unwrap();
        assert_eq!(s.render().unwrap().text, "00 01");
        assert!(s.is_dirty());
    }

    #[test]
    fn test_switch_validates_with_mode_being_left() {
        let mut s = session(8, CharEncoding::Utf8);
        s.load_bytes(b"hi");
        s.render().unwrap();
        // HEXモードのまま検証されるので "hi" は不正
        assert!(s.switch_render_mode(RenderMode::Text, "hi").is_err());
        assert_eq!(s.mode(), RenderMode::Hex);

        let rendered = s.switch_render_mode(RenderMode::Text, "68 69").unwrap();
        assert_eq!(rendered.text, "hi");

        let rendered = s.switch_render_mode(RenderMode::Hex, "ok").unwrap();
        assert_eq!(rendered.text, "6f 6b");
    }

    #[test]
    fn test_text_edit_rejects_unencodable() {
        let mut s = session(8, CharEncoding::Ascii);
        s.load_bytes(b"hi");
        s.switch_render_mode(RenderMode::Text, "68 69").unwrap();
        assert!(matches!(
            s.commit_pending("hé"),
            Err(SessionError::InvalidInput(CodecError::EncodingError { ch: 'é', .. }))
        ));
        assert_eq!(s.current_frame().unwrap(), b"hi");
    }

    #[test]
    fn test_navigation_before_load_is_noop() {
        let mut s = session(8, CharEncoding::Utf8);
        s.next_frame("zz").unwrap();
        s.previous_frame("zz").unwrap();
        assert!(!s.is_loaded());
    }

    #[test]
    fn test_save_before_load_appends_frame() {
        let mut s = session(8, CharEncoding::Utf8);
        assert_eq!(s.save("de ad").unwrap(), vec![0xDE, 0xAD]);
        assert_eq!(s.frame_count(), 1);
    }

    #[test]
    fn test_byte_position() {
        let mut s = session(4, CharEncoding::Utf8);
        assert_eq!(s.byte_position(0), None);
        s.load_bytes(&[0; 10]);
        s.render().unwrap();
        s.next_frame("00 00 00 00").unwrap();
        assert_eq!(
            s.byte_position(1),
            Some(BytePosition { number: 6, total: 10 })
        );
    }

    #[test]
    fn test_navigation_updates_displayed_mode() {
        let mut s = session(1, CharEncoding::Ascii);
        s.load_bytes(&[0x41, 0xFF]);
        let rendered = s.switch_render_mode(RenderMode::Text, "41").unwrap();
        assert_eq!(rendered.text, "A");

        // 描画し直さずに確定しても新しいフレームのモードで検証する
        s.next_frame("A").unwrap();
        assert_eq!(s.displayed_mode(), RenderMode::Hex);
        assert!(!s.text_available());
        s.commit_pending("fe").unwrap();
        assert_eq!(s.current_frame().unwrap(), &[0xFE]);

        s.seek(0).unwrap();
        assert_eq!(s.displayed_mode(), RenderMode::Text);
        s.commit_pending("B").unwrap();
        assert_eq!(s.current_frame().unwrap(), b"B");
    }
}
