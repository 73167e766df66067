mod state;

pub use state::App;

use crossterm::event::KeyCode;

/// プレフィックスキー状態（Emacs 2ストローク用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixKey {
    #[default]
    None,
    /// C-x を押した状態
    CtrlX,
}

/// アプリケーションアクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Save,
    SaveAs,
    OpenFile,

    // フレーム移動
    NextFrame,
    PreviousFrame,

    // カーソル移動
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    GotoBeginning, // M-< フレーム先頭
    GotoEnd,       // M-> フレーム末尾

    // 編集
    Input(char),
    Backspace,
    ToggleMode, // HEX <-> TEXT

    // プレフィックスキー
    EnterCtrlX, // C-x を押した
    Cancel,     // C-g で編集内容を破棄

    None,
}

/// キー修飾子
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyMod {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Action {
    /// キーコードからアクションに変換（Emacsキーバインド）
    pub fn from_key(key: KeyCode, mods: KeyMod) -> Self {
        let KeyMod { ctrl, alt, .. } = mods;

        match (key, ctrl, alt) {
            (KeyCode::Char('x'), true, false) => Action::EnterCtrlX,

            (KeyCode::Char('g'), true, false) => Action::Cancel,
            (KeyCode::Esc, _, _) => Action::Cancel,

            // === Emacsカーソル移動 ===
            (KeyCode::Char('f'), true, false) => Action::CursorRight,
            (KeyCode::Char('b'), true, false) => Action::CursorLeft,
            (KeyCode::Char('n'), true, false) => Action::CursorDown,
            (KeyCode::Char('p'), true, false) => Action::CursorUp,
            (KeyCode::Char('a'), true, false) => Action::CursorHome,
            (KeyCode::Char('e'), true, false) => Action::CursorEnd,
            (KeyCode::Char('<'), false, true) => Action::GotoBeginning,
            (KeyCode::Char('>'), false, true) => Action::GotoEnd,

            (KeyCode::Up, false, false) => Action::CursorUp,
            (KeyCode::Down, false, false) => Action::CursorDown,
            (KeyCode::Left, false, false) => Action::CursorLeft,
            (KeyCode::Right, false, false) => Action::CursorRight,
            (KeyCode::Home, _, _) => Action::CursorHome,
            (KeyCode::End, _, _) => Action::CursorEnd,

            // === フレーム移動 ===
            // C-v / PageDown: 次のフレーム、M-v / PageUp: 前のフレーム
            (KeyCode::Char('v'), true, false) => Action::NextFrame,
            (KeyCode::Char('v'), false, true) => Action::PreviousFrame,
            (KeyCode::PageDown, _, _) => Action::NextFrame,
            (KeyCode::PageUp, _, _) => Action::PreviousFrame,

            (KeyCode::Tab, false, false) => Action::ToggleMode,
            (KeyCode::Backspace, false, false) => Action::Backspace,

            // 修飾キーなしの文字は入力
            (KeyCode::Char(ch), false, false) => Action::Input(ch),

            _ => Action::None,
        }
    }

    /// C-x の後のキーを処理
    pub fn from_key_after_ctrl_x(key: KeyCode, mods: KeyMod) -> Self {
        match (key, mods.ctrl) {
            // C-x C-c: 終了
            (KeyCode::Char('c'), true) => Action::Quit,
            // C-x C-s: 保存
            (KeyCode::Char('s'), true) => Action::Save,
            // C-x C-w: 別名保存
            (KeyCode::Char('w'), true) => Action::SaveAs,
            // C-x C-f: ファイルを開く
            (KeyCode::Char('f'), true) => Action::OpenFile,
            _ => Action::Cancel,
        }
    }
}
