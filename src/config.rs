//! 設定ファイルの読み込み
//!
//! 設定は `~/.config/fhx/config.toml`（Windowsは `%APPDATA%\fhx\config.toml`）に置く。
//!
//! ```toml
//! buffer_size = 8192
//! encoding = "utf-8"
//! bytes_per_row = 16
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::codec::CharEncoding;

/// 既定のフレームサイズ
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// アプリケーション設定（起動時に一度だけ作る）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 1フレームのバイト数
    pub buffer_size: usize,
    /// テキスト表示のエンコーディング
    pub encoding: CharEncoding,
    /// HEX表示1行あたりのバイト数（表示のみ）
    pub bytes_per_row: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            encoding: CharEncoding::default(),
            bytes_per_row: 16,
        }
    }
}

impl Config {
    /// 設定ファイルのパス
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fhx").join("config.toml"))
    }

    /// 既定の場所から読み込む
    ///
    /// ファイルがなければ既定値、読めない・不正な場合は警告を出して既定値を使う。
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!(error = %e, "using default config");
            Self::default()
        })
    }

    /// 指定ファイルから読み込む
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 値の範囲チェック
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be at least 1".to_string()));
        }
        if self.bytes_per_row == 0 {
            return Err(ConfigError::Invalid("bytes_per_row must be at least 1".to_string()));
        }
        Ok(())
    }
}
