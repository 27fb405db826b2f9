use crate::{Block, BlockError, SourceId};

/// `BlockSource` 描述 mbuf 池背后的定长块分配器。
///
/// # 契约定义（What）
/// - `get`：取出一块空闲块；没有空闲块时返回 [`BlockError::Exhausted`]，不得阻塞；
/// - `put`：归还此前由本来源发放的块；外来块、越界或重复归还必须返回错误而不是 panic；
/// - 所有方法在线程与中断上下文中都可能被调用，实现必须 `Send + Sync` 且临界区有界。
///
/// # 使用方式（How）
/// - 默认实现为 [`MemPool`](crate::MemPool)；
/// - 内核移植时可把硬件相关的块分配器包装成该 trait，以 `Arc<dyn BlockSource>` 注入 mbuf 池。
pub trait BlockSource: Send + Sync + 'static {
    /// 来源标识，发放的每一块都携带该标识。
    fn id(&self) -> SourceId;

    /// 每块字节数。
    fn block_size(&self) -> usize;

    /// 块总数。
    fn block_count(&self) -> usize;

    /// 当前空闲块数量。并发修改下仅为近似值。
    fn free_count(&self) -> usize;

    /// 取出一块。
    fn get(&self) -> Result<Block, BlockError>;

    /// 归还一块。失败时该块被丢弃，不再回到任何自由链表。
    fn put(&self, block: Block) -> Result<(), BlockError>;
}
