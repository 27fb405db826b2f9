use alloc::{sync::Arc, vec, vec::Vec};
use core::sync::atomic::{AtomicUsize, Ordering};

use bytes::BytesMut;
use spin::Mutex;

use crate::{Block, BlockError, BlockSource, SourceId};

/// `MemPool` 是基于自由链表（Free List）的定长块池。
///
/// # 模块角色（Why）
/// - 作为 [`BlockSource`] 的默认实现，为 mbuf 池提供可预测的块存储；
/// - 构造时一次性分配 `block_count` 块，运行期 `get`/`put` 只搬移所有权，
///   满足内核路径“不做按需堆分配”的要求。
///
/// # 核心机制（How）
/// - `spin::Mutex<FreeList>` 同时保存空闲块与“是否已发放”位图，临界区只做一次 `pop`/`push`；
/// - `PoolMetrics` 以原子计数记录取块、还块、耗尽次数与空闲低水位，支撑 [`statistics`](Self::statistics)。
///
/// # 契约说明（What）
/// - **线程安全**：`Clone` 得到的句柄共享同一组块；
/// - **归还校验**：外来块返回 [`BlockError::ForeignBlock`]，越界返回 [`BlockError::IndexOutOfRange`]，
///   重复归还返回 [`BlockError::DoubleFree`]；校验失败的块被丢弃。
#[derive(Clone)]
pub struct MemPool {
    inner: Arc<PoolInner>,
}

impl MemPool {
    /// 创建包含 `block_count` 块、每块 `block_size` 字节的池。
    pub fn new(block_size: usize, block_count: usize) -> Result<Self, BlockError> {
        if block_size == 0 {
            return Err(BlockError::InvalidGeometry("block size must be non-zero"));
        }
        if block_count == 0 {
            return Err(BlockError::InvalidGeometry("block count must be non-zero"));
        }
        if u32::try_from(block_count).is_err() {
            return Err(BlockError::InvalidGeometry("block count exceeds u32 range"));
        }
        Ok(Self {
            inner: Arc::new(PoolInner::new(block_size, block_count)),
        })
    }

    /// 读取统计快照。
    pub fn statistics(&self) -> MemPoolStats {
        self.inner.snapshot()
    }
}

impl BlockSource for MemPool {
    fn id(&self) -> SourceId {
        self.inner.id
    }

    fn block_size(&self) -> usize {
        self.inner.block_size
    }

    fn block_count(&self) -> usize {
        self.inner.block_count
    }

    fn free_count(&self) -> usize {
        self.inner.free_list.lock().blocks.len()
    }

    fn get(&self) -> Result<Block, BlockError> {
        self.inner.get()
    }

    fn put(&self, block: Block) -> Result<(), BlockError> {
        self.inner.put(block)
    }
}

impl core::fmt::Debug for MemPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemPool")
            .field("id", &self.inner.id)
            .field("block_size", &self.inner.block_size)
            .field("block_count", &self.inner.block_count)
            .finish()
    }
}

/// `MemPool` 的统计快照。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemPoolStats {
    /// 块总数。
    pub block_count: usize,
    /// 当前空闲块数。
    pub free_blocks: usize,
    /// 历史最低空闲块数。
    pub min_free_blocks: usize,
    /// 成功取块次数。
    pub gets: usize,
    /// 成功还块次数。
    pub puts: usize,
    /// 因耗尽失败的取块次数。
    pub failed_gets: usize,
    /// 被拒绝的还块次数。
    pub rejected_puts: usize,
}

struct FreeList {
    blocks: Vec<Block>,
    issued: Vec<bool>,
}

struct PoolInner {
    id: SourceId,
    block_size: usize,
    block_count: usize,
    free_list: Mutex<FreeList>,
    metrics: PoolMetrics,
}

impl PoolInner {
    fn new(block_size: usize, block_count: usize) -> Self {
        let id = SourceId::next();
        // 逆序入栈，使首次取块按下标 0、1、2… 发放。
        let blocks = (0..block_count as u32)
            .rev()
            .map(|index| Block::new(id, index, BytesMut::zeroed(block_size)))
            .collect();
        Self {
            id,
            block_size,
            block_count,
            free_list: Mutex::new(FreeList {
                blocks,
                issued: vec![false; block_count],
            }),
            metrics: PoolMetrics::new(block_count),
        }
    }

    fn get(&self) -> Result<Block, BlockError> {
        let popped = {
            let mut list = self.free_list.lock();
            let popped = list.blocks.pop();
            if let Some(block) = &popped {
                let index = block.index() as usize;
                list.issued[index] = true;
            }
            popped.map(|block| (block, list.blocks.len()))
        };
        let Some((block, remaining)) = popped else {
            self.metrics.failed_gets.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                target: "spark_mempool",
                source = self.id.get(),
                "block source exhausted"
            );
            return Err(BlockError::Exhausted);
        };
        self.metrics.gets.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .min_free_blocks
            .fetch_min(remaining, Ordering::Relaxed);
        Ok(block)
    }

    fn put(&self, block: Block) -> Result<(), BlockError> {
        if let Err(err) = self.validate(&block) {
            self.metrics.rejected_puts.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                target: "spark_mempool",
                source = self.id.get(),
                error = %err,
                "rejected block release"
            );
            return Err(err);
        }

        let mut list = self.free_list.lock();
        let slot = &mut list.issued[block.index() as usize];
        if !*slot {
            drop(list);
            self.metrics.rejected_puts.fetch_add(1, Ordering::Relaxed);
            return Err(BlockError::DoubleFree {
                index: block.index(),
            });
        }
        *slot = false;
        list.blocks.push(block);
        drop(list);
        self.metrics.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn validate(&self, block: &Block) -> Result<(), BlockError> {
        if block.source() != self.id {
            return Err(BlockError::ForeignBlock {
                expected: self.id,
                found: block.source(),
            });
        }
        if block.index() as usize >= self.block_count {
            return Err(BlockError::IndexOutOfRange {
                index: block.index(),
                count: self.block_count,
            });
        }
        Ok(())
    }

    fn snapshot(&self) -> MemPoolStats {
        let free_blocks = self.free_list.lock().blocks.len();
        MemPoolStats {
            block_count: self.block_count,
            free_blocks,
            min_free_blocks: self.metrics.min_free_blocks.load(Ordering::Relaxed),
            gets: self.metrics.gets.load(Ordering::Relaxed),
            puts: self.metrics.puts.load(Ordering::Relaxed),
            failed_gets: self.metrics.failed_gets.load(Ordering::Relaxed),
            rejected_puts: self.metrics.rejected_puts.load(Ordering::Relaxed),
        }
    }
}

struct PoolMetrics {
    min_free_blocks: AtomicUsize,
    gets: AtomicUsize,
    puts: AtomicUsize,
    failed_gets: AtomicUsize,
    rejected_puts: AtomicUsize,
}

impl PoolMetrics {
    fn new(block_count: usize) -> Self {
        Self {
            min_free_blocks: AtomicUsize::new(block_count),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            failed_gets: AtomicUsize::new(0),
            rejected_puts: AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_issued_in_index_order() {
        let pool = MemPool::new(16, 3).expect("构造池失败");
        let a = pool.get().expect("取块失败");
        let b = pool.get().expect("取块失败");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(a.len(), 16);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn exhausted_pool_reports_error_and_counts_failure() {
        let pool = MemPool::new(8, 1).expect("构造池失败");
        let held = pool.get().expect("取块失败");
        assert_eq!(pool.get().unwrap_err(), BlockError::Exhausted);
        let stats = pool.statistics();
        assert_eq!(stats.failed_gets, 1);
        assert_eq!(stats.min_free_blocks, 0);
        pool.put(held).expect("归还失败");
        assert_eq!(pool.statistics().free_blocks, 1);
    }

    #[test]
    fn foreign_block_is_rejected() {
        let ours = MemPool::new(8, 1).expect("构造池失败");
        let theirs = MemPool::new(8, 1).expect("构造池失败");
        let block = theirs.get().expect("取块失败");
        let err = ours.put(block).unwrap_err();
        assert!(matches!(err, BlockError::ForeignBlock { .. }));
        assert_eq!(ours.statistics().rejected_puts, 1);
        assert_eq!(theirs.free_count(), 0, "被拒绝的块不会回到原来源");
    }

    #[test]
    fn forged_duplicate_is_detected() {
        let pool = MemPool::new(8, 2).expect("构造池失败");
        let forged = Block::new(pool.id(), 1, BytesMut::zeroed(8));
        assert_eq!(pool.put(forged).unwrap_err(), BlockError::DoubleFree { index: 1 });

        let out_of_range = Block::new(pool.id(), 5, BytesMut::zeroed(8));
        assert_eq!(
            pool.put(out_of_range).unwrap_err(),
            BlockError::IndexOutOfRange { index: 5, count: 2 }
        );
    }

    #[test]
    fn zero_geometry_is_invalid() {
        assert!(matches!(
            MemPool::new(0, 4),
            Err(BlockError::InvalidGeometry(_))
        ));
        assert!(matches!(
            MemPool::new(32, 0),
            Err(BlockError::InvalidGeometry(_))
        ));
    }
}
