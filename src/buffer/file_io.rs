use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use tracing::info;

use super::BufferError;

/// ファイルを chunk_size バイトずつ読み込む
///
/// 最後のチャンクだけは短くてよい。空ファイルは空のVecを返す。
pub fn read_chunks(path: impl AsRef<Path>, chunk_size: usize) -> Result<Vec<Vec<u8>>, BufferError> {
    let path = path.as_ref();
    let read_error = |source| BufferError::FileRead {
        path: path.to_path_buf(),
        source,
    };
    let chunk_size = chunk_size.max(1);

    let mut file = File::open(path).map_err(read_error)?;
    let mut chunks = Vec::new();
    let mut total = 0;
    loop {
        let chunk = read_chunk(&mut file, chunk_size).map_err(read_error)?;
        if chunk.is_empty() {
            break;
        }
        total += chunk.len();
        let short = chunk.len() < chunk_size;
        chunks.push(chunk);
        if short {
            break;
        }
    }

    info!(path = %path.display(), chunks = chunks.len(), bytes = total, "read file");
    Ok(chunks)
}

/// 1チャンク分を読む（短い読み込みは EOF まで繰り返す）
fn read_chunk(reader: &mut impl Read, chunk_size: usize) -> std::io::Result<Vec<u8>> {
    let mut chunk = vec![0u8; chunk_size];
    let mut filled = 0;
    while filled < chunk_size {
        match reader.read(&mut chunk[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    chunk.truncate(filled);
    Ok(chunk)
}

/// バイト列をファイルに書き込む（作成・切り詰め）
pub fn write_bytes(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), BufferError> {
    let path = path.as_ref();
    let write_error = |source| BufferError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(write_error)?;
    file.write_all(bytes).map_err(write_error)?;
    file.flush().map_err(write_error)?;

    info!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_are_exact_except_last() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, [1u8, 2, 3, 4, 5]).unwrap();

        let chunks = read_chunks(&path, 2).unwrap();
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let chunks = read_chunks(&path, 2).unwrap();
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_empty_file_reads_no_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, []).unwrap();

        assert!(read_chunks(&path, 8).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");

        let err = read_chunks(&path, 8).unwrap_err();
        assert!(matches!(err, BufferError::FileRead { .. }));
    }

    #[test]
    fn test_write_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, [9u8; 16]).unwrap();

        write_bytes(&path, &[1, 2]).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_write_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("out.bin");

        let err = write_bytes(&path, &[1]).unwrap_err();
        assert!(matches!(err, BufferError::FileWrite { .. }));
    }
}
