use core::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use bytes::BytesMut;

static NEXT_SOURCE_ID: AtomicU32 = AtomicU32::new(1);

/// 块来源的进程内唯一标识。
///
/// 归还块时，来源通过比较 `SourceId` 拒绝不属于自己的块。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u32);

impl SourceId {
    /// 分配一个新的来源标识。
    pub fn next() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// 返回原始数值，便于日志字段输出。
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// `Block` 是块来源发放的一段定长存储。
///
/// # 契约说明（What）
/// - `bytes` 的长度在整个生命周期内固定为来源的块大小，内容可任意读写；
/// - `source` 与 `index` 只由来源设置，调用方不可修改，归还时用于校验；
/// - `Block` 不实现 `Clone`：同一时刻一块存储只有一个所有者。
pub struct Block {
    source: SourceId,
    index: u32,
    bytes: BytesMut,
}

impl Block {
    /// 由块来源构造块。
    ///
    /// 自定义 [`BlockSource`](crate::BlockSource) 实现通过该方法把自有存储包装为块；
    /// `bytes` 的长度即块大小。
    pub fn new(source: SourceId, index: u32, bytes: BytesMut) -> Self {
        Self {
            source,
            index,
            bytes,
        }
    }

    /// 发放该块的来源。
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// 块在来源内的下标。
    pub fn index(&self) -> u32 {
        self.index
    }

    /// 块大小（字节）。
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// 块大小是否为 0。
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 只读访问整块存储。
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// 可写访问整块存储。
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("source", &self.source)
            .field("index", &self.index)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_ids_are_unique() {
        let a = SourceId::next();
        let b = SourceId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn block_exposes_fixed_storage() {
        let id = SourceId::next();
        let mut block = Block::new(id, 3, BytesMut::zeroed(24));
        assert_eq!(block.len(), 24);
        assert_eq!(block.index(), 3);
        assert_eq!(block.source(), id);
        block.as_mut_slice()[0] = 0xAB;
        assert_eq!(block.as_slice()[0], 0xAB);
    }
}
