use crate::TransferError;

/// One block of a [`BlockPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// 1-based block number as sent on the wire.
    pub index: u64,
    /// Byte offset of the block within the file.
    pub offset: u64,
    pub len: u64,
}

/// Splits `file_len` bytes into blocks of `block_size`.
///
/// Blocks are numbered from 1 with no gaps. Every block is exactly
/// `block_size` bytes except the last, which may be shorter; a length that
/// is an exact multiple never yields a trailing empty block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlan {
    file_len: u64,
    block_size: u64,
}

impl BlockPlan {
    pub fn new(file_len: u64, block_size: u64) -> Result<Self, TransferError> {
        if block_size == 0 {
            return Err(TransferError::ZeroBlockSize);
        }
        Ok(Self {
            file_len,
            block_size,
        })
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// `ceil(file_len / block_size)`.
    pub fn block_count(&self) -> u64 {
        self.file_len.div_ceil(self.block_size)
    }

    /// Returns the span of block `index` (1-based), or `None` if out of range.
    pub fn span(&self, index: u64) -> Option<BlockSpan> {
        if index == 0 || index > self.block_count() {
            return None;
        }
        let offset = (index - 1) * self.block_size;
        let len = self.block_size.min(self.file_len - offset);
        Some(BlockSpan { index, offset, len })
    }

    /// Length of the final block, or 0 for an empty file.
    pub fn last_block_len(&self) -> u64 {
        self.span(self.block_count()).map_or(0, |s| s.len)
    }
}
