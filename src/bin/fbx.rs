//! fbx - Frame-oriented hex tool for pipes
//!
//! Non-interactive front end over the same frame model as fhx.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use fhx::codec::{self, CharEncoding};
use fhx::config::Config;
use fhx::view::{RenderMode, ViewSession};

/// Frame-oriented hex tool for pipes
#[derive(Parser, Debug)]
#[command(name = "fbx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Frame size in bytes (overrides config)
    #[arg(short = 's', long, global = true)]
    buffer_size: Option<usize>,

    /// Text encoding (overrides config)
    #[arg(short, long, global = true)]
    encoding: Option<CharEncoding>,

    /// Config file (default: ~/.config/fhx/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Hex,
    Text,
}

impl From<Mode> for RenderMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Hex => RenderMode::Hex,
            Mode::Text => RenderMode::Text,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show frame count, byte count and which frames decode as text
    Info {
        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print one frame as hex or text
    Show {
        /// Frame number (0-based)
        #[arg(default_value = "0")]
        frame: usize,

        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Rendering mode
        #[arg(short, long, value_enum, default_value = "hex")]
        mode: Mode,
    },

    /// Replace the content of one frame and write the whole file
    Set {
        /// Frame number (0-based)
        frame: usize,

        /// New content (e.g. "de ad be ef" in hex mode)
        value: String,

        /// File to edit
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: overwrite input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How to interpret VALUE
        #[arg(short, long, value_enum, default_value = "hex")]
        mode: Mode,
    },

    /// Convert between hex and binary
    Conv {
        /// Direction: "hex2bin" or "bin2hex"
        direction: String,

        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// For bin2hex: bytes per line (default: 16)
        #[arg(short, long, default_value = "16")]
        width: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command {
        Command::Info { input } => cmd_info(&config, input),
        Command::Show { frame, input, mode } => cmd_show(&config, frame, input, mode.into()),
        Command::Set { frame, value, input, output, mode } => {
            cmd_set(&config, frame, &value, input, output, mode.into())
        }
        Command::Conv { direction, input, width } => cmd_conv(&direction, input, width),
    }
}

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
    config.validate()?;
    Ok(config)
}

/// Read input from file or stdin
fn read_input(path: Option<&PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(p) => Ok(std::fs::read(p)?),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Load a session from file (keeps the path) or stdin
fn open_session(config: &Config, input: Option<PathBuf>) -> Result<ViewSession> {
    let mut session = ViewSession::new(config);
    match input {
        Some(path) => session.load(path)?,
        None => session.load_bytes(&read_input(None)?),
    }
    Ok(session)
}

/// Render the active frame in the requested mode
fn render_as(session: &mut ViewSession, mode: RenderMode) -> Result<fhx::view::Rendered> {
    let current = session.render()?;
    Ok(session.switch_render_mode(mode, &current.text)?)
}

// === Commands ===

fn cmd_info(config: &Config, input: Option<PathBuf>) -> Result<()> {
    let mut session = open_session(config, input)?;

    println!("Size: {} bytes (0x{:X})", session.byte_count(), session.byte_count());
    println!("Frame size: {} bytes", session.chunk_size());
    println!("Frames: {}", session.frame_count());

    let mut decodable = 0;
    for frame in 0..session.frame_count() {
        session.seek(frame)?;
        session.render()?;
        if session.text_available() {
            decodable += 1;
        }
    }
    println!(
        "Text ({}): {} of {} frames",
        session.encoding(),
        decodable,
        session.frame_count()
    );

    Ok(())
}

fn cmd_show(config: &Config, frame: usize, input: Option<PathBuf>, mode: RenderMode) -> Result<()> {
    let mut session = open_session(config, input)?;
    session.seek(frame)?;

    let rendered = render_as(&mut session, mode)?;
    if let Some(notice) = rendered.notice {
        eprintln!("{}", notice);
    }
    println!("{}", rendered.text);

    Ok(())
}

fn cmd_set(
    config: &Config,
    frame: usize,
    value: &str,
    input: PathBuf,
    output: Option<PathBuf>,
    mode: RenderMode,
) -> Result<()> {
    let mut session = ViewSession::new(config);
    session.load(&input)?;
    session.seek(frame)?;

    let rendered = render_as(&mut session, mode)?;
    if rendered.mode != mode {
        // Undecodable frames can only be replaced in hex
        bail!(
            "Frame {} is not valid {}; give the new content in hex",
            frame,
            session.encoding()
        );
    }

    let output = output.unwrap_or(input);
    let written = session.save_to(&output, value)?;
    eprintln!("Wrote {} bytes to {}", written, output.display());

    Ok(())
}

fn cmd_conv(direction: &str, input: Option<PathBuf>, width: usize) -> Result<()> {
    match direction {
        "bin2hex" | "b2h" => {
            let data = read_input(input.as_ref())?;
            for chunk in data.chunks(width.max(1)) {
                println!("{}", codec::to_hex_text(chunk));
            }
        }
        "hex2bin" | "h2b" => {
            let text = String::from_utf8(read_input(input.as_ref())?)?;
            let bytes = codec::from_hex_text(&text)?;
            io::stdout().write_all(&bytes)?;
        }
        _ => bail!("Direction must be 'bin2hex' (b2h) or 'hex2bin' (h2b)"),
    }
    Ok(())
}
