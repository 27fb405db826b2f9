//! 入队通知事件。
//!
//! 队列只负责在入队成功后把预先配置好的事件投递给 [`EventSink`]，
//! 事件如何被调度（唤醒任务、写入事件队列）由宿主决定。

/// 事件类别。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EventKind {
    /// 消息队列有新数据。
    MqueueData,
}

/// 队列在构造时配置、入队成功后投递的事件。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueEvent {
    pub kind: EventKind,
    /// 由消费者解释的上下文值。
    pub arg: usize,
}

impl QueueEvent {
    pub fn new(kind: EventKind, arg: usize) -> Self {
        Self { kind, arg }
    }
}

/// 事件投递目标。
///
/// # 契约说明（What）
/// - `post` 在队列锁之外调用，实现可以自由加锁或唤醒其他任务；
/// - `post` 不得阻塞过久，生产者可能运行在中断上下文。
pub trait EventSink: Send + Sync {
    fn post(&self, event: &QueueEvent);
}
