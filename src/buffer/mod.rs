//! フレーム単位のバイナリバッファ

mod file_io;
mod frames;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use file_io::{read_chunks, write_bytes};
pub use frames::{Direction, FrameStore};

/// バッファ操作のエラー
#[derive(Debug, Error)]
pub enum BufferError {
    /// ファイル未読み込み
    #[error("no data loaded")]
    NoDataLoaded,
    /// 存在しないフレーム番号
    #[error("frame {index} out of range (file has {count} frames)")]
    FrameOutOfRange { index: usize, count: usize },
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
