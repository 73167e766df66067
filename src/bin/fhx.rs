use std::fs::File;
use std::io::{self, IsTerminal, Read, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute, queue,
    terminal::{
        disable_raw_mode, enable_raw_mode, BeginSynchronizedUpdate, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fhx::app::App;
use fhx::codec::CharEncoding;
use fhx::config::Config;

/// Paged terminal hex/text editor
#[derive(Parser, Debug)]
#[command(name = "fhx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to open
    #[arg(value_name = "FILE")]
    file: Option<String>,

    /// Frame size in bytes (overrides config)
    #[arg(short = 's', long)]
    buffer_size: Option<usize>,

    /// Text encoding, e.g. utf-8, ascii, latin-1, shift_jis (overrides config)
    #[arg(short, long)]
    encoding: Option<CharEncoding>,

    /// Bytes per row in hex view (overrides config)
    #[arg(short, long)]
    bytes_per_row: Option<usize>,

    /// Config file (default: ~/.config/fhx/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(ref path) = args.log {
        init_logging(path)?;
    }
    let config = load_config(&args)?;
    info!(?config, "starting");

    // 標準入力からデータを読み込む（パイプされている場合）
    let stdin_data = if !io::stdin().is_terminal() {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        Some(data)
    } else {
        None
    };

    // ターミナルの初期化
    // Bracketed Pasteでペースト内容を一括取り込み
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // アプリケーションの実行
    let result = run_app(&mut terminal, &args, &config, stdin_data);

    // ターミナルの後処理
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// ログをファイルに出力（画面はUIが使う）
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// 設定ファイルを読み、コマンドライン引数で上書き
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(size) = args.buffer_size {
        config.buffer_size = size;
    }
    if let Some(encoding) = args.encoding {
        config.encoding = encoding;
    }
    if let Some(bytes) = args.bytes_per_row {
        config.bytes_per_row = bytes;
    }
    config.validate()?;
    Ok(config)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    args: &Args,
    config: &Config,
    stdin_data: Option<Vec<u8>>,
) -> Result<()> {
    let mut app = App::new(config);

    // データを読み込む（優先順位: ファイル > 標準入力）
    if let Some(ref path) = args.file {
        app.open(path)?;
    } else if let Some(data) = stdin_data {
        app.load_bytes(&data);
    }

    // メインループ
    loop {
        update_title(terminal.backend_mut(), &app)?;

        // Synchronized Update: 描画のちらつきを防止
        queue!(terminal.backend_mut(), BeginSynchronizedUpdate)?;
        terminal.draw(|f| app.draw(f))?;
        queue!(terminal.backend_mut(), EndSynchronizedUpdate)?;
        terminal.backend_mut().flush()?;

        app.handle_event()?;

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

/// ウィンドウタイトルを更新
fn update_title(backend: &mut CrosstermBackend<io::Stdout>, app: &App) -> Result<()> {
    let title = format!(
        "fhx - {}{}",
        app.filename().unwrap_or("[New File]"),
        if app.is_modified() { " [+]" } else { "" }
    );
    execute!(backend, SetTitle(&title))?;
    Ok(())
}
