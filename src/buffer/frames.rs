use tracing::debug;

use super::BufferError;

/// フレーム移動方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// ファイルをチャンク単位で保持するストア
#[derive(Debug, Clone, Default)]
pub struct FrameStore {
    /// フレーム列（ファイル順）
    frames: Vec<Vec<u8>>,
    /// 表示中のフレーム
    active: usize,
    /// 全フレームの合計バイト数
    byte_count: usize,
}

impl FrameStore {
    /// 空のストアを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// フレーム列を丸ごと置き換える
    ///
    /// 空の入力は長さ0のフレーム1つとして扱う（空ファイル）。
    pub fn load(&mut self, chunks: Vec<Vec<u8>>) {
        let mut frames = chunks;
        if frames.is_empty() {
            frames.push(Vec::new());
        }
        self.byte_count = frames.iter().map(Vec::len).sum();
        self.frames = frames;
        self.active = 0;
        debug!(frames = self.frames.len(), bytes = self.byte_count, "frames loaded");
    }

    /// 読み込み済みかどうか
    pub fn is_loaded(&self) -> bool {
        !self.frames.is_empty()
    }

    /// フレーム数
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// 表示中のフレーム番号
    pub fn active_index(&self) -> Option<usize> {
        self.is_loaded().then_some(self.active)
    }

    /// 合計バイト数
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// 表示中のフレーム
    pub fn current(&self) -> Result<&[u8], BufferError> {
        self.frames
            .get(self.active)
            .map(Vec::as_slice)
            .ok_or(BufferError::NoDataLoaded)
    }

    /// 指定フレーム
    pub fn frame(&self, index: usize) -> Option<&[u8]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    /// 前後のフレームへ移動（端で折り返す）
    pub fn advance(&mut self, direction: Direction) {
        let count = self.frames.len();
        if count == 0 {
            return;
        }
        self.active = match direction {
            Direction::Next => (self.active + 1) % count,
            Direction::Previous => (self.active + count - 1) % count,
        };
        debug!(active = self.active, count, "frame changed");
    }

    /// 指定フレームへ移動
    pub fn seek(&mut self, index: usize) -> Result<(), BufferError> {
        if self.frames.is_empty() {
            return Err(BufferError::NoDataLoaded);
        }
        if index >= self.frames.len() {
            return Err(BufferError::FrameOutOfRange {
                index,
                count: self.frames.len(),
            });
        }
        self.active = index;
        Ok(())
    }

    /// 表示中のフレームを置き換える
    ///
    /// 長さが変わってもよい。未読み込みなら新しいフレームとして追加する。
    /// 戻り値: 内容が変化したかどうか
    pub fn commit(&mut self, bytes: Vec<u8>) -> bool {
        let Some(frame) = self.frames.get_mut(self.active) else {
            self.byte_count = bytes.len();
            self.frames.push(bytes);
            self.active = self.frames.len() - 1;
            return true;
        };
        if *frame == bytes {
            return false;
        }
        self.byte_count = self.byte_count - frame.len() + bytes.len();
        *frame = bytes;
        true
    }

    /// 全フレームを連結したバイト列
    pub fn to_byte_stream(&self) -> Vec<u8> {
        self.frames.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(chunks: &[&[u8]]) -> FrameStore {
        let mut store = FrameStore::new();
        store.load(chunks.iter().map(|c| c.to_vec()).collect());
        store
    }

    #[test]
    fn test_empty_load_has_one_frame() {
        let store = store(&[]);
        assert_eq!(store.frame_count(), 1);
        assert_eq!(store.current().unwrap(), &[] as &[u8]);
        assert_eq!(store.byte_count(), 0);
        assert!(store.to_byte_stream().is_empty());
    }

    #[test]
    fn test_current_before_load() {
        let store = FrameStore::new();
        assert!(matches!(store.current(), Err(BufferError::NoDataLoaded)));
        assert_eq!(store.active_index(), None);
    }

    #[test]
    fn test_advance_wraps() {
        let mut store = store(&[b"a", b"b", b"c"]);
        store.advance(Direction::Previous);
        assert_eq!(store.active_index(), Some(2));
        store.advance(Direction::Next);
        assert_eq!(store.active_index(), Some(0));
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        for start in 0..4 {
            let mut store = store(&[b"a", b"b", b"c", b"d"]);
            store.seek(start).unwrap();
            for _ in 0..4 {
                store.advance(Direction::Next);
            }
            assert_eq!(store.active_index(), Some(start));
            for _ in 0..4 {
                store.advance(Direction::Previous);
            }
            assert_eq!(store.active_index(), Some(start));
        }
    }

    #[test]
    fn test_seek_out_of_range() {
        let mut store = store(&[b"a", b"b"]);
        assert!(matches!(
            store.seek(2),
            Err(BufferError::FrameOutOfRange { index: 2, count: 2 })
        ));
        assert_eq!(store.active_index(), Some(0));
        assert!(matches!(
            FrameStore::new().seek(0),
            Err(BufferError::NoDataLoaded)
        ));
    }

    #[test]
    fn test_advance_without_data_is_noop() {
        let mut store = FrameStore::new();
        store.advance(Direction::Next);
        assert_eq!(store.active_index(), None);
    }

    #[test]
    fn test_commit_may_change_length() {
        let mut store = store(&[b"ab", b"cd"]);
        assert!(store.commit(b"xyz".to_vec()));
        assert_eq!(store.byte_count(), 5);
        assert_eq!(store.to_byte_stream(), b"xyzcd");
        assert!(!store.commit(b"xyz".to_vec()));
    }

    #[test]
    fn test_commit_without_data_appends() {
        let mut store = FrameStore::new();
        assert!(store.commit(vec![1, 2]));
        assert_eq!(store.frame_count(), 1);
        assert_eq!(store.active_index(), Some(0));
        assert_eq!(store.to_byte_stream(), vec![1, 2]);
    }

    #[test]
    fn test_byte_stream_includes_inactive_edits() {
        let mut store = store(&[b"ab", b"cd"]);
        store.commit(b"AB".to_vec());
        store.advance(Direction::Next);
        store.commit(b"CD".to_vec());
        assert_eq!(store.to_byte_stream(), b"ABCD");
    }
}
