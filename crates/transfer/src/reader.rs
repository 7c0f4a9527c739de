use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::{BlockPlan, BlockSpan, TransferError};

/// A block read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock {
    /// 1-based block number.
    pub index: u64,
    pub offset: u64,
    pub data: Vec<u8>,
}

/// Reads a file sequentially in the blocks of a [`BlockPlan`].
///
/// Only one block is held in memory at a time.
pub struct BlockReader {
    file: File,
    plan: BlockPlan,
    next: u64,
}

impl BlockReader {
    /// Opens `path` and plans it with `block_size`.
    ///
    /// The file length is captured once here; a file that shrinks
    /// afterwards yields [`TransferError::Truncated`].
    pub async fn open(path: &Path, block_size: u64) -> Result<Self, TransferError> {
        let file = File::open(path).await?;
        let file_len = file.metadata().await?.len();
        let plan = BlockPlan::new(file_len, block_size)?;
        Ok(Self {
            file,
            plan,
            next: 1,
        })
    }

    pub fn plan(&self) -> &BlockPlan {
        &self.plan
    }

    /// Reads the next block. Returns `None` once every block has been read.
    pub async fn next_block(&mut self) -> Result<Option<FileBlock>, TransferError> {
        let Some(BlockSpan { index, offset, len }) = self.plan.span(self.next) else {
            return Ok(None);
        };

        let mut data = vec![0u8; len as usize];
        let mut filled = 0;
        while filled < data.len() {
            let n = self.file.read(&mut data[filled..]).await?;
            if n == 0 {
                return Err(TransferError::Truncated {
                    expected: self.plan.file_len(),
                    actual: offset + filled as u64,
                });
            }
            filled += n;
        }

        self.next += 1;
        Ok(Some(FileBlock {
            index,
            offset,
            data,
        }))
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> u64 {
        self.plan
            .span(self.next)
            .map_or(0, |s| self.plan.file_len() - s.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    #[tokio::test]
    async fn reads_blocks_in_order() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "app.apk", b"AABBCCDDEE");

        let mut reader = BlockReader::open(&path, 4).await.unwrap();
        assert_eq!(reader.plan().block_count(), 3);
        assert_eq!(reader.remaining(), 10);

        let b1 = reader.next_block().await.unwrap().unwrap();
        assert_eq!((b1.index, b1.offset), (1, 0));
        assert_eq!(b1.data, b"AABB");
        assert_eq!(reader.remaining(), 6);

        let b2 = reader.next_block().await.unwrap().unwrap();
        assert_eq!((b2.index, b2.offset), (2, 4));
        assert_eq!(b2.data, b"CCDD");

        let b3 = reader.next_block().await.unwrap().unwrap();
        assert_eq!((b3.index, b3.offset), (3, 8));
        assert_eq!(b3.data, b"EE");

        assert!(reader.next_block().await.unwrap().is_none());
        assert_eq!(reader.remaining(), 0);
    }

    #[tokio::test]
    async fn exact_multiple_ends_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "app.apk", b"01234567");

        let mut reader = BlockReader::open(&path, 4).await.unwrap();
        let mut lens = Vec::new();
        while let Some(block) = reader.next_block().await.unwrap() {
            lens.push(block.data.len());
        }
        assert_eq!(lens, vec![4, 4]);
    }

    #[tokio::test]
    async fn reassembles_original_bytes() {
        let dir = TempDir::new().unwrap();
        let original: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let path = create_test_file(dir.path(), "app.apk", &original);

        let mut reader = BlockReader::open(&path, 97).await.unwrap();
        let mut out = Vec::new();
        let mut expected_index = 1;
        while let Some(block) = reader.next_block().await.unwrap() {
            assert_eq!(block.index, expected_index);
            assert_eq!(block.offset, out.len() as u64);
            out.extend_from_slice(&block.data);
            expected_index += 1;
        }
        assert_eq!(out, original);
        assert_eq!(expected_index - 1, 1000u64.div_ceil(97));
    }

    #[tokio::test]
    async fn empty_file_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "empty.apk", b"");
        let mut reader = BlockReader::open(&path, 4).await.unwrap();
        assert!(reader.next_block().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn truncated_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "app.apk", b"0123456789");
        let mut reader = BlockReader::open(&path, 4).await.unwrap();

        std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(5)
            .unwrap();

        reader.next_block().await.unwrap();
        let err = reader.next_block().await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::Truncated {
                expected: 10,
                actual: 5
            }
        ));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = BlockReader::open(&dir.path().join("nope.apk"), 4).await;
        assert!(matches!(result, Err(TransferError::Io(_))));
    }
}
