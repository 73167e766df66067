use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use unicode_segmentation::UnicodeSegmentation;

use super::{Action, KeyMod, PrefixKey};
use crate::codec;
use crate::config::Config;
use crate::ui::{self, FrameView};
use crate::view::{CursorMapper, RenderMode, Rendered, SessionError, ViewSession};

/// プロンプト入力モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptMode {
    #[default]
    Off,
    /// ファイルパス入力中（開く）
    OpenFile,
    /// ファイルパス入力中（別名保存）
    SaveAs,
}

/// 確認モード（未保存変更時）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfirmMode {
    #[default]
    Off,
    /// 終了確認
    Quit,
    /// ファイルを開く確認（パスを保持）
    OpenFile(String),
}

/// アプリケーション状態
///
/// 表示文字列の編集だけを受け持ち、検証と確定は ViewSession に任せる。
pub struct App {
    session: ViewSession,
    mapper: CursorMapper,
    /// 編集中の表示文字列
    pending: String,
    /// 最後に描画した（確定済みの）文字列
    committed: String,
    /// 表示中のモード
    displayed: RenderMode,
    /// カーソル位置（pending のバイトオフセット）
    cursor: usize,
    /// 表示開始行
    scroll: usize,
    /// 表示可能な行数
    visible_rows: usize,
    /// 表示幅
    view_width: u16,
    /// プレフィックスキー状態（C-x等）
    prefix_key: PrefixKey,
    /// プロンプト入力モード
    prompt_mode: PromptMode,
    /// プロンプト入力内容
    prompt_input: String,
    /// 確認モード
    confirm_mode: ConfirmMode,
    /// 終了フラグ
    should_quit: bool,
    /// ステータスメッセージ
    status_message: Option<String>,
}

impl App {
    /// 新しいアプリケーションを作成
    pub fn new(config: &Config) -> Self {
        Self {
            session: ViewSession::new(config),
            mapper: CursorMapper::new(config.bytes_per_row),
            pending: String::new(),
            committed: String::new(),
            displayed: RenderMode::Hex,
            cursor: 0,
            scroll: 0,
            visible_rows: 24,
            view_width: 80,
            prefix_key: PrefixKey::None,
            prompt_mode: PromptMode::Off,
            prompt_input: String::new(),
            confirm_mode: ConfirmMode::Off,
            should_quit: false,
            status_message: None,
        }
    }

    /// ファイルを開く
    pub fn open(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.session.load(path)?;
        self.refresh();
        Ok(())
    }

    /// バイト列から読み込み（標準入力用）
    pub fn load_bytes(&mut self, data: &[u8]) {
        self.session.load_bytes(data);
        self.refresh();
    }

    /// 終了すべきかどうか
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// ファイル名を取得
    pub fn filename(&self) -> Option<&str> {
        self.session.filename()
    }

    /// 未保存の変更があるかどうか（未確定の編集を含む）
    pub fn is_modified(&self) -> bool {
        self.session.is_dirty() || self.pending != self.committed
    }

    /// 編集中の表示文字列
    pub fn pending_text(&self) -> &str {
        &self.pending
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn session(&self) -> &ViewSession {
        &self.session
    }

    /// 表示中のフレームを描画し直す（カーソルは先頭へ）
    fn refresh(&mut self) {
        match self.session.render() {
            Ok(rendered) => self.apply(rendered),
            Err(_) => {
                self.pending.clear();
                self.committed.clear();
                self.displayed = self.session.displayed_mode();
            }
        }
        self.cursor = 0;
        self.scroll = 0;
    }

    fn apply(&mut self, rendered: Rendered) {
        if let Some(notice) = rendered.notice {
            self.status_message = Some(notice.to_string());
        }
        self.displayed = rendered.mode;
        self.pending = rendered.text;
        self.committed = self.pending.clone();
        self.cursor = self.cursor.min(self.pending.len());
    }

    /// 検証エラーを表示（編集内容はそのまま残す）
    fn report(&mut self, error: &SessionError) {
        self.status_message = Some(match error {
            SessionError::InvalidInput(e) => format!("Invalid input, not committed: {e}"),
            SessionError::Buffer(e) => e.to_string(),
        });
    }

    fn next_frame(&mut self) {
        match self.session.next_frame(&self.pending) {
            Ok(()) => self.refresh(),
            Err(e) => self.report(&e),
        }
    }

    fn previous_frame(&mut self) {
        match self.session.previous_frame(&self.pending) {
            Ok(()) => self.refresh(),
            Err(e) => self.report(&e),
        }
    }

    fn toggle_mode(&mut self) {
        // 表示中ではなく選択中のモードを切り替える（フォールバック中でもHEXに戻せる）
        let target = self.session.mode().toggled();
        match self.session.switch_render_mode(target, &self.pending) {
            Ok(rendered) => {
                self.cursor = 0;
                self.scroll = 0;
                self.apply(rendered);
            }
            Err(e) => self.report(&e),
        }
    }

    /// 上書き保存（パスがなければ別名保存へ）
    fn save(&mut self) {
        match self.session.path().map(PathBuf::from) {
            Some(path) => self.save_to(path),
            None => self.start_prompt(PromptMode::SaveAs),
        }
    }

    fn save_to(&mut self, path: PathBuf) {
        match self.session.save_to(&path, &self.pending) {
            Ok(len) => {
                self.status_message = Some(format!("Saved {} bytes to {}", len, path.display()));
                if let Ok(rendered) = self.session.render() {
                    self.apply(rendered);
                }
            }
            Err(e) => self.report(&e),
        }
    }

    fn open_file(&mut self, path: &str) {
        let path = expand_path(path);
        match self.open(&path) {
            Ok(()) => {
                self.status_message = Some(format!("Opened: {}", path.display()));
            }
            Err(e) => {
                self.status_message = Some(format!("Failed to open: {}", e));
            }
        }
    }

    /// 編集内容を破棄して確定済みの内容に戻す
    fn revert(&mut self) {
        if self.pending != self.committed {
            self.pending = self.committed.clone();
            self.cursor = self.cursor.min(self.pending.len());
            self.status_message = Some("Reverted".to_string());
        }
    }

    /// カーソル位置のバイト（フレーム内）
    fn cursor_byte_index(&self) -> usize {
        match self.displayed {
            RenderMode::Hex => self.mapper.offset_to_byte_index(self.cursor),
            RenderMode::Text => self
                .pending
                .get(..self.cursor)
                .and_then(|prefix| codec::from_text(prefix, self.session.encoding()).ok())
                .map_or(0, |bytes| bytes.len()),
        }
    }

    fn cursor_left(&mut self) {
        self.cursor = match self.displayed {
            RenderMode::Hex => self.mapper.step(self.cursor, -1, self.pending.len()),
            RenderMode::Text => prev_grapheme(&self.pending, self.cursor),
        };
    }

    fn cursor_right(&mut self) {
        self.cursor = match self.displayed {
            RenderMode::Hex => self.mapper.step(self.cursor, 1, self.pending.len()),
            RenderMode::Text => next_grapheme(&self.pending, self.cursor),
        };
    }

    /// 上下移動（HEXモードは1行、テキストモードは表示幅分の文字数）
    fn cursor_vertical(&mut self, delta: isize) {
        match self.displayed {
            RenderMode::Hex => {
                self.cursor = self.mapper.step_line(self.cursor, delta, self.pending.len());
            }
            RenderMode::Text => {
                for _ in 0..self.view_width {
                    self.cursor = if delta < 0 {
                        prev_grapheme(&self.pending, self.cursor)
                    } else {
                        next_grapheme(&self.pending, self.cursor)
                    };
                }
            }
        }
    }

    fn cursor_home(&mut self) {
        self.cursor = match self.displayed {
            RenderMode::Hex => self.cursor - self.cursor % self.mapper.line_width(),
            RenderMode::Text => 0,
        };
    }

    fn cursor_end(&mut self) {
        self.cursor = match self.displayed {
            RenderMode::Hex if self.pending.is_empty() => 0,
            RenderMode::Hex => {
                let line_start = self.cursor - self.cursor % self.mapper.line_width();
                let last_group = line_start + self.mapper.line_width() - codec::HEX_GROUP_WIDTH;
                // 短い最終行では最後のバイトの先頭
                last_group.min(CursorMapper::snap(self.pending.len() - 1))
            }
            RenderMode::Text => self.pending.len(),
        };
    }

    /// 文字入力（常に上書き）
    fn input(&mut self, ch: char) {
        match self.displayed {
            RenderMode::Hex => match self.mapper.overwrite(&mut self.pending, self.cursor, ch) {
                Some(next) => self.cursor = next,
                None => self.status_message = Some(format!("Not a hex digit: {:?}", ch)),
            },
            RenderMode::Text => {
                if ch.is_control() {
                    return;
                }
                let end = next_grapheme(&self.pending, self.cursor);
                let mut buf = [0u8; 4];
                self.pending.replace_range(self.cursor..end, ch.encode_utf8(&mut buf));
                self.cursor += ch.len_utf8();
            }
        }
    }

    /// 末尾なら1文字削除、それ以外は左へ移動
    fn backspace(&mut self) {
        if self.cursor < self.pending.len() {
            self.cursor_left();
            return;
        }
        self.cursor = match self.displayed {
            RenderMode::Hex => self.mapper.erase_last(&mut self.pending),
            RenderMode::Text => {
                let start = prev_grapheme(&self.pending, self.pending.len());
                self.pending.truncate(start);
                start
            }
        };
    }

    /// ペースト内容を1文字ずつ入力
    fn paste(&mut self, content: &str) {
        for ch in content.chars().filter(|c| !c.is_whitespace()) {
            self.input(ch);
        }
    }

    fn start_prompt(&mut self, mode: PromptMode) {
        self.prompt_mode = mode;
        self.prompt_input = match mode {
            // 現在のファイル名をデフォルトに
            PromptMode::SaveAs => self
                .session
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };
    }

    /// アクションを実行
    pub fn execute(&mut self, action: Action) {
        // ステータスメッセージをクリア（一部のアクションを除く）
        if !matches!(action, Action::EnterCtrlX) {
            self.status_message = None;
        }

        match action {
            Action::Quit => {
                if self.is_modified() {
                    self.confirm_mode = ConfirmMode::Quit;
                } else {
                    self.should_quit = true;
                }
            }
            Action::Save => self.save(),
            Action::SaveAs => self.start_prompt(PromptMode::SaveAs),
            Action::OpenFile => self.start_prompt(PromptMode::OpenFile),
            Action::NextFrame => self.next_frame(),
            Action::PreviousFrame => self.previous_frame(),
            Action::CursorUp => self.cursor_vertical(-1),
            Action::CursorDown => self.cursor_vertical(1),
            Action::CursorLeft => self.cursor_left(),
            Action::CursorRight => self.cursor_right(),
            Action::CursorHome => self.cursor_home(),
            Action::CursorEnd => self.cursor_end(),
            Action::GotoBeginning => self.cursor = 0,
            Action::GotoEnd => self.cursor = self.pending.len(),
            Action::Input(ch) => self.input(ch),
            Action::Backspace => self.backspace(),
            Action::ToggleMode => self.toggle_mode(),
            Action::EnterCtrlX => {
                self.prefix_key = PrefixKey::CtrlX;
                self.status_message = Some("C-x-".to_string());
            }
            Action::Cancel => {
                self.prefix_key = PrefixKey::None;
                self.revert();
            }
            Action::None => {}
        }
    }

    /// イベントを1件処理（100ms 待って何もなければ戻る）
    pub fn handle_event(&mut self) -> Result<()> {
        if !event::poll(std::time::Duration::from_millis(100))? {
            return Ok(());
        }
        match event::read()? {
            Event::Paste(content) if self.prompt_mode != PromptMode::Off => {
                self.prompt_input.push_str(content.trim());
            }
            Event::Paste(content) => self.paste(&content),
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.prompt_mode != PromptMode::Off {
            self.handle_prompt_key(key);
            return;
        }
        if self.confirm_mode != ConfirmMode::Off {
            self.handle_confirm_key(key);
            return;
        }

        let mods = KeyMod {
            ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
            shift: key.modifiers.contains(KeyModifiers::SHIFT),
            alt: key.modifiers.contains(KeyModifiers::ALT),
        };
        let action = match std::mem::take(&mut self.prefix_key) {
            PrefixKey::None => Action::from_key(key.code, mods),
            PrefixKey::CtrlX => Action::from_key_after_ctrl_x(key.code, mods),
        };
        self.execute(action);
    }

    /// プロンプトモード中のキー処理
    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => self.cancel_prompt(),
            KeyCode::Char('g') if ctrl => self.cancel_prompt(),
            KeyCode::Enter => self.execute_prompt(),
            KeyCode::Backspace => {
                self.prompt_input.pop();
            }
            KeyCode::Char(ch) if !ctrl => {
                self.prompt_input.push(ch);
            }
            _ => {}
        }
    }

    fn cancel_prompt(&mut self) {
        self.prompt_mode = PromptMode::Off;
        self.status_message = Some("Cancelled".to_string());
    }

    /// プロンプト入力を実行
    fn execute_prompt(&mut self) {
        let input = std::mem::take(&mut self.prompt_input);
        let mode = std::mem::take(&mut self.prompt_mode);
        let path = input.trim();
        if path.is_empty() {
            self.status_message = Some("No file specified".to_string());
            return;
        }

        match mode {
            PromptMode::OpenFile => {
                // 未保存の変更があれば確認
                if self.is_modified() {
                    self.confirm_mode = ConfirmMode::OpenFile(path.to_string());
                } else {
                    self.open_file(path);
                }
            }
            PromptMode::SaveAs => self.save_to(expand_path(path)),
            PromptMode::Off => {}
        }
    }

    /// 確認モード中のキー処理（y: 保存して実行, n: 保存せずに実行）
    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('y' | 'Y') => {
                self.save();
                if self.is_modified() {
                    // 保存できなかった（別名保存のプロンプトを含む）
                    self.confirm_mode = ConfirmMode::Off;
                } else {
                    self.execute_confirmed_action();
                }
            }
            KeyCode::Char('n' | 'N') => self.execute_confirmed_action(),
            KeyCode::Char('c' | 'C') | KeyCode::Esc => self.cancel_confirm(),
            KeyCode::Char('g') if ctrl => self.cancel_confirm(),
            _ => {}
        }
    }

    fn cancel_confirm(&mut self) {
        self.confirm_mode = ConfirmMode::Off;
        self.status_message = Some("Cancelled".to_string());
    }

    /// 確認後のアクションを実行
    fn execute_confirmed_action(&mut self) {
        match std::mem::take(&mut self.confirm_mode) {
            ConfirmMode::Quit => self.should_quit = true,
            ConfirmMode::OpenFile(path) => self.open_file(&path),
            ConfirmMode::Off => {}
        }
    }

    /// カーソル位置が表示範囲内になるようにスクロール
    fn ensure_cursor_visible(&mut self) {
        let row = ui::cursor_row(
            &self.pending,
            self.displayed,
            self.cursor,
            self.mapper.bytes_per_row(),
            self.view_width,
        );
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + self.visible_rows {
            self.scroll = row + 1 - self.visible_rows;
        }
    }

    fn status_line(&self) -> String {
        if self.prompt_mode == PromptMode::OpenFile {
            return format!("Open file: {}_", self.prompt_input);
        }
        if self.prompt_mode == PromptMode::SaveAs {
            return format!("Save as: {}_", self.prompt_input);
        }
        if self.confirm_mode != ConfirmMode::Off {
            return "Save changes? (y)es (n)o (c)ancel".to_string();
        }

        let filename = self.session.filename().unwrap_or("[New]");
        let modified = if self.is_modified() { "[+]" } else { "" };
        if let Some(ref msg) = self.status_message {
            return format!(" {}{} | {}", filename, modified, msg);
        }

        let frame = match self.session.active_index() {
            Some(index) => format!("Frame {}/{}", index + 1, self.session.frame_count()),
            None => "No data".to_string(),
        };
        let byte = match self.session.byte_position(self.cursor_byte_index()) {
            Some(pos) => format!("Byte {} of {}", pos.number, pos.total),
            None => "Byte -".to_string(),
        };
        // テキスト表示を選んでいるがHEXで表示している
        let mode = if self.session.mode() != self.displayed {
            format!("{}({})", self.displayed.name(), self.session.mode().name())
        } else {
            self.displayed.name().to_string()
        };
        format!(
            " {}{} | {} | {} | {} | {}",
            filename,
            modified,
            frame,
            byte,
            mode,
            self.session.encoding(),
        )
    }

    /// UIを描画
    pub fn draw(&mut self, frame: &mut Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // メイン
                Constraint::Length(1), // ステータス
            ])
            .split(frame.area());

        let main = layout[0];
        self.view_width = main.width;
        self.visible_rows = match self.displayed {
            // ヘッダー行の分を引く
            RenderMode::Hex => (main.height as usize).saturating_sub(1),
            RenderMode::Text => main.height as usize,
        }
        .max(1);
        self.ensure_cursor_visible();

        let base_addr = self.session.active_index().unwrap_or(0) * self.session.chunk_size();
        let view = FrameView::new(&self.pending)
            .mode(self.displayed)
            .cursor(self.cursor)
            .bytes_per_row(self.mapper.bytes_per_row())
            .base_addr(base_addr)
            .scroll(self.scroll);
        frame.render_widget(view, main);

        let status_widget = Paragraph::new(self.status_line())
            .style(Style::default().bg(Color::DarkGray).fg(Color::White));
        frame.render_widget(status_widget, layout[1]);
    }
}

/// チルダ展開
fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// 前のグラフェム境界
fn prev_grapheme(text: &str, offset: usize) -> usize {
    text.get(..offset)
        .and_then(|prefix| prefix.grapheme_indices(true).next_back())
        .map_or(0, |(i, _)| i)
}

/// 次のグラフェム境界
fn next_grapheme(text: &str, offset: usize) -> usize {
    text.get(offset..)
        .and_then(|rest| rest.graphemes(true).next())
        .map_or(text.len(), |g| offset + g.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CharEncoding;

    fn app_with(bytes: &[u8], buffer_size: usize) -> App {
        let mut app = App::new(&Config {
            buffer_size,
            ..Config::default()
        });
        app.load_bytes(bytes);
        app
    }

    fn type_keys(app: &mut App, keys: &str) {
        for ch in keys.chars() {
            app.execute(Action::Input(ch));
        }
    }

    #[test]
    fn test_typing_overwrites_hex() {
        let mut app = app_with(&[0x00, 0x11], 8);
        type_keys(&mut app, "ab");
        assert_eq!(app.pending_text(), "ab 11");
        assert_eq!(app.cursor(), 3);
        assert!(app.is_modified());
    }

    #[test]
    fn test_invalid_edit_blocks_navigation() {
        let mut app = app_with(&[0x00, 0x11, 0x22], 2);
        app.execute(Action::GotoEnd);
        type_keys(&mut app, "f");
        assert_eq!(app.pending_text(), "00 11 f");
        app.execute(Action::NextFrame);
        assert_eq!(app.session().active_index(), Some(0));
        assert_eq!(app.pending_text(), "00 11 f");
        assert!(app.status_message().unwrap_or("").starts_with("Invalid input"));

        type_keys(&mut app, "f");
        app.execute(Action::NextFrame);
        assert_eq!(app.session().active_index(), Some(1));
        assert_eq!(app.pending_text(), "22");
        app.execute(Action::PreviousFrame);
        assert_eq!(app.pending_text(), "00 11 ff");
    }

    #[test]
    fn test_cancel_reverts_pending() {
        let mut app = app_with(&[0x00], 8);
        type_keys(&mut app, "9");
        app.execute(Action::Cancel);
        assert_eq!(app.pending_text(), "00");
        assert!(!app.is_modified());
    }

    #[test]
    fn test_text_mode_overwrites_grapheme() {
        let mut app = app_with("héllo".as_bytes(), 64);
        app.execute(Action::ToggleMode);
        assert_eq!(app.pending_text(), "héllo");
        app.execute(Action::CursorRight);
        type_keys(&mut app, "e");
        assert_eq!(app.pending_text(), "hello");
        app.execute(Action::ToggleMode);
        assert_eq!(app.pending_text(), "68 65 6c 6c 6f");
    }

    #[test]
    fn test_backspace_at_end_removes_digit() {
        let mut app = app_with(&[0x00, 0x11], 8);
        app.execute(Action::GotoEnd);
        app.execute(Action::Backspace);
        assert_eq!(app.pending_text(), "00 1");
        app.execute(Action::Backspace);
        assert_eq!(app.pending_text(), "00");
    }

    #[test]
    fn test_prev_next_grapheme() {
        let text = "aé!";
        assert_eq!(next_grapheme(text, 0), 1);
        assert_eq!(next_grapheme(text, 1), 3);
        assert_eq!(prev_grapheme(text, 3), 1);
        assert_eq!(prev_grapheme(text, 0), 0);
        assert_eq!(next_grapheme(text, 4), 4);
    }

    #[test]
    fn test_toggle_back_to_hex_from_fallback() {
        let mut app = App::new(&Config {
            buffer_size: 1,
            encoding: CharEncoding::Ascii,
            ..Config::default()
        });
        app.load_bytes(&[0xFF, 0x41]);
        app.execute(Action::ToggleMode);
        assert_eq!(app.pending_text(), "ff");
        assert_eq!(app.session().mode(), RenderMode::Text);

        app.execute(Action::ToggleMode);
        assert_eq!(app.session().mode(), RenderMode::Hex);
        app.execute(Action::NextFrame);
        assert_eq!(app.pending_text(), "41");
    }

    #[test]
    fn test_end_on_short_last_line() {
        let mut app = app_with(&[0x00, 0x11, 0x22], 8);
        app.execute(Action::CursorEnd);
        assert_eq!(app.cursor(), 6);

        type_keys(&mut app, "3");
        assert_eq!(app.pending_text(), "00 11 32");
        app.execute(Action::GotoEnd);
        type_keys(&mut app, "4");
        app.execute(Action::CursorEnd);
        assert_eq!(app.cursor(), 9);
    }
}
