use alloc::sync::Arc;
use core::fmt;

use spark_mempool::{Block, BlockSource, MemPool};

use crate::{
    Mbuf, MbufError, PacketHeader, PoolConfig, Result,
    config::MAX_USER_HEADER_LEN,
    sync::{AtomicUsize, Ordering},
};

/// `MbufPool` 把一个 [`BlockSource`] 包装为 mbuf 的发放与回收入口。
///
/// # 模块角色（Why）
/// - 每个缓冲都持有发放它的池句柄，链增长时从缓冲自己的池取新节点，
///   因而同一条链可以跨越多个池（`splice` 拼接来自不同池的链）；
/// - 池本身不持有缓冲，只负责几何约束校验、块来源交互与统计。
///
/// # 核心机制（How）
/// - `Clone` 只复制 `Arc` 句柄；池身份由 `Arc::ptr_eq` 判定；
/// - `PoolMetrics` 以原子计数记录成功发放、成功归还、耗尽与归还失败；
/// - `outstanding` 记录已发放未归还的缓冲数，发放前先占位，因而块来源比配置更大
///   （或与其它池共享）时，本池同时在外的缓冲也不超过 `buffer_count`。
///
/// # 契约说明（What）
/// - **前置条件**：`config.block_size` 不得超过块来源的块大小，`config.block_count`
///   不得超过块来源的块数；
/// - **后置条件**：发放的缓冲 `len() == 0`，`flags() == 0`，无后继。
#[derive(Clone)]
pub struct MbufPool {
    shared: Arc<PoolShared>,
}

struct PoolShared {
    source: Arc<dyn BlockSource>,
    block_size: usize,
    data_capacity: usize,
    buffer_count: usize,
    outstanding: AtomicUsize,
    metrics: PoolMetrics,
}

impl MbufPool {
    /// 在已有块来源之上配置 mbuf 池。
    pub fn new(source: Arc<dyn BlockSource>, config: &PoolConfig) -> Result<Self> {
        config.validate()?;
        if config.block_size > source.block_size() {
            return Err(MbufError::InvalidArgument(
                "block size exceeds the block source geometry",
            ));
        }
        if config.block_count > source.block_count() {
            return Err(MbufError::InvalidArgument(
                "block count exceeds the block source capacity",
            ));
        }
        tracing::debug!(
            target: "spark_mbuf::pool",
            source = %source.id(),
            block_size = config.block_size,
            block_count = config.block_count,
            "mbuf pool configured"
        );
        Ok(Self {
            shared: Arc::new(PoolShared {
                source,
                block_size: config.block_size,
                data_capacity: config.data_capacity(),
                buffer_count: config.block_count,
                outstanding: AtomicUsize::new(0),
                metrics: PoolMetrics::new(),
            }),
        })
    }

    /// 按配置新建一个专属的 [`MemPool`] 作为块来源。
    pub fn with_mempool(config: &PoolConfig) -> Result<Self> {
        config.validate()?;
        let mempool = MemPool::new(config.block_size, config.block_count)?;
        Self::new(Arc::new(mempool), config)
    }

    /// 单个缓冲的数据区容量。
    pub fn data_capacity(&self) -> usize {
        self.shared.data_capacity
    }

    pub fn block_size(&self) -> usize {
        self.shared.block_size
    }

    /// 配置的缓冲总数。
    pub fn buffer_count(&self) -> usize {
        self.shared.buffer_count
    }

    /// 本池还能发放的缓冲数：配置余量与块来源空闲块数中的较小者。
    pub fn free_count(&self) -> usize {
        let outstanding = self.shared.outstanding.load(Ordering::Acquire);
        let headroom = self.shared.buffer_count.saturating_sub(outstanding);
        headroom.min(self.shared.source.free_count())
    }

    /// 判断缓冲是否由本池发放。
    pub fn owns(&self, mbuf: &Mbuf) -> bool {
        Arc::ptr_eq(&self.shared, &mbuf.pool.shared)
    }

    /// 取得一个无报文头的缓冲，数据窗口前预留 `leading_space` 字节。
    ///
    /// `leading_space > data_capacity()` 时返回 [`MbufError::InvalidArgument`]；
    /// 在外缓冲已达配置数量或块来源耗尽时返回 [`MbufError::Exhausted`]。
    pub fn acquire(&self, leading_space: usize) -> Result<Mbuf> {
        if leading_space > self.shared.data_capacity {
            return Err(MbufError::InvalidArgument(
                "leading space exceeds buffer capacity",
            ));
        }
        let block = self.take_block()?;
        Ok(Mbuf::from_block(self.clone(), block, leading_space, None))
    }

    /// 取得一个携带报文头的缓冲，报文头长度与标志清零，用户头部区清零。
    ///
    /// 报文头是独立字段，只有用户头部区占用存储前部；之后至少要留下 1 字节数据区，
    /// 否则返回 [`MbufError::InvalidArgument`]。
    pub fn acquire_with_header(&self, user_header_len: usize) -> Result<Mbuf> {
        if user_header_len > MAX_USER_HEADER_LEN {
            return Err(MbufError::InvalidArgument("user header too long"));
        }
        let reserve = user_header_len;
        if reserve >= self.shared.data_capacity {
            return Err(MbufError::InvalidArgument(
                "packet header does not fit in buffer",
            ));
        }
        let block = self.take_block()?;
        let header = PacketHeader::new(user_header_len as u8);
        let mut mbuf = Mbuf::from_block(self.clone(), block, reserve, Some(header));
        mbuf.storage_mut()[..reserve].fill(0);
        Ok(mbuf)
    }

    /// 归还单个缓冲，返回被摘下的后继链（若有）。
    ///
    /// # 契约说明（What）
    /// - 缓冲不是本池发放的：返回 [`MbufError::InvalidArgument`]；
    /// - 块来源拒绝归还：错误按 [`From<BlockError>`](MbufError) 映射后返回；
    /// - 出错时整个输入（含后继链）被丢弃，其中的块不会再回到任何池。
    pub fn release(&self, mut mbuf: Mbuf) -> Result<Option<Mbuf>> {
        if !self.owns(&mbuf) {
            self.shared
                .metrics
                .release_failures
                .fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                target: "spark_mbuf::pool",
                source = %self.shared.source.id(),
                "release of a buffer issued by another pool"
            );
            return Err(MbufError::InvalidArgument(
                "buffer was not issued by this pool",
            ));
        }
        let rest = mbuf.next.take().map(|next| *next);
        let Mbuf { block, .. } = mbuf;
        match self.shared.source.put(block) {
            Ok(()) => {
                self.shared.outstanding.fetch_sub(1, Ordering::AcqRel);
                self.shared.metrics.released.fetch_add(1, Ordering::Relaxed);
                Ok(rest)
            }
            Err(err) => {
                self.shared
                    .metrics
                    .release_failures
                    .fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    target: "spark_mbuf::pool",
                    source = %self.shared.source.id(),
                    error = %err,
                    "block source rejected release"
                );
                Err(err.into())
            }
        }
    }

    /// 从链头开始逐个归还，遇到第一个错误即停止并返回该错误。
    ///
    /// 停止时尚未归还的剩余节点被丢弃（泄漏出池），与逐个调用 [`release`](Self::release) 的语义一致。
    pub fn release_chain(&self, head: Mbuf) -> Result<()> {
        let mut cur = Some(head);
        let mut released = 0usize;
        while let Some(mbuf) = cur {
            match self.release(mbuf) {
                Ok(rest) => {
                    released += 1;
                    cur = rest;
                }
                Err(err) => {
                    tracing::warn!(
                        target: "spark_mbuf::pool",
                        released,
                        error = %err,
                        "chain release stopped; remainder leaked"
                    );
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// 读取统计快照。
    pub fn statistics(&self) -> PoolStats {
        let metrics = &self.shared.metrics;
        PoolStats {
            buffer_count: self.shared.buffer_count,
            free_buffers: self.free_count(),
            acquired: metrics.acquired.load(Ordering::Relaxed),
            released: metrics.released.load(Ordering::Relaxed),
            exhausted: metrics.exhausted.load(Ordering::Relaxed),
            release_failures: metrics.release_failures.load(Ordering::Relaxed),
        }
    }

    fn take_block(&self) -> Result<Block> {
        if !self.reserve_slot() {
            self.shared.metrics.exhausted.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                target: "spark_mbuf::pool",
                source = %self.shared.source.id(),
                buffer_count = self.shared.buffer_count,
                "mbuf pool at configured buffer count"
            );
            return Err(MbufError::Exhausted);
        }
        match self.shared.source.get() {
            Ok(block) => {
                self.shared.metrics.acquired.fetch_add(1, Ordering::Relaxed);
                Ok(block)
            }
            Err(err) => {
                self.shared.outstanding.fetch_sub(1, Ordering::AcqRel);
                self.shared.metrics.exhausted.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    target: "spark_mbuf::pool",
                    source = %self.shared.source.id(),
                    error = %err,
                    "mbuf acquisition failed"
                );
                Err(err.into())
            }
        }
    }

    /// 在 `buffer_count` 以内为一次发放占位；已满时返回 `false`。
    fn reserve_slot(&self) -> bool {
        let outstanding = &self.shared.outstanding;
        let mut current = outstanding.load(Ordering::Acquire);
        loop {
            if current >= self.shared.buffer_count {
                return false;
            }
            match outstanding.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

impl fmt::Debug for MbufPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MbufPool")
            .field("source", &self.shared.source.id())
            .field("block_size", &self.shared.block_size)
            .field("data_capacity", &self.shared.data_capacity)
            .field("buffer_count", &self.shared.buffer_count)
            .finish()
    }
}

/// [`MbufPool`] 的统计快照。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// 配置的缓冲总数。
    pub buffer_count: usize,
    /// 本池当前还能发放的缓冲数，见 [`MbufPool::free_count`]。
    pub free_buffers: usize,
    /// 成功发放次数。
    pub acquired: usize,
    /// 成功归还次数。
    pub released: usize,
    /// 因达到配置缓冲数或块来源耗尽而失败的发放次数。
    pub exhausted: usize,
    /// 失败的归还次数。
    pub release_failures: usize,
}

struct PoolMetrics {
    acquired: AtomicUsize,
    released: AtomicUsize,
    exhausted: AtomicUsize,
    release_failures: AtomicUsize,
}

impl PoolMetrics {
    fn new() -> Self {
        Self {
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            exhausted: AtomicUsize::new(0),
            release_failures: AtomicUsize::new(0),
        }
    }
}
