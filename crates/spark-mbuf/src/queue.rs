use alloc::collections::VecDeque;
use core::fmt;

use thiserror::Error;

use crate::{
    Mbuf, MbufError, QueueConfig, Result,
    event::{EventKind, EventSink, QueueEvent},
    sync::Mutex,
};

/// `MbufQueue` 是有头 mbuf 链的有界 FIFO，多生产者多消费者安全。
///
/// # 核心机制（How）
/// - 槽位在构造时按 `depth` 一次性预留，入队出队不再分配；
/// - 临界区只做一次 `push_back`/`pop_front`，通知事件在解锁后投递。
///
/// # 契约说明（What）
/// - 只接受携带报文头的链；
/// - 入队失败时链通过 [`EnqueueError::into_mbuf`] 原样交还调用方，所有权不会丢失；
/// - 出队顺序与入队顺序一致。
pub struct MbufQueue {
    slots: Mutex<VecDeque<Mbuf>>,
    depth: usize,
    event: QueueEvent,
}

impl MbufQueue {
    pub fn new(config: &QueueConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            slots: Mutex::new(VecDeque::with_capacity(config.depth)),
            depth: config.depth,
            event: QueueEvent::new(EventKind::MqueueData, config.notify_arg),
        })
    }

    /// 入队成功后投递的事件。
    pub fn event(&self) -> &QueueEvent {
        &self.event
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// 当前排队的链数。
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// 把一条有头链追加到队尾，成功后向 `sink`（若有）投递一次事件。
    ///
    /// # 契约说明（What）
    /// - 链头无报文头：[`MbufError::InvalidArgument`]；
    /// - 队列已满：[`MbufError::QueueFull`]；
    /// - 两种失败都不投递事件，链随错误交还。
    pub fn enqueue(
        &self,
        sink: Option<&dyn EventSink>,
        mbuf: Mbuf,
    ) -> Result<(), EnqueueError> {
        if !mbuf.is_pkthdr() {
            return Err(EnqueueError {
                error: MbufError::InvalidArgument("enqueued mbuf must carry a packet header"),
                mbuf,
            });
        }

        {
            let mut slots = self.slots.lock();
            if slots.len() >= self.depth {
                drop(slots);
                tracing::debug!(
                    target: "spark_mbuf::queue",
                    depth = self.depth,
                    "mbuf queue full"
                );
                return Err(EnqueueError {
                    error: MbufError::QueueFull { depth: self.depth },
                    mbuf,
                });
            }
            slots.push_back(mbuf);
        }

        if let Some(sink) = sink {
            sink.post(&self.event);
        }
        Ok(())
    }

    /// 取出队首的链；队列为空时返回 `None`。
    pub fn dequeue(&self) -> Option<Mbuf> {
        self.slots.lock().pop_front()
    }
}

impl fmt::Debug for MbufQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MbufQueue")
            .field("depth", &self.depth)
            .field("len", &self.len())
            .field("event", &self.event)
            .finish()
    }
}

/// 入队失败：错误原因与被拒绝的链。
#[derive(Debug, Error)]
#[error("{error}")]
pub struct EnqueueError {
    error: MbufError,
    mbuf: Mbuf,
}

impl EnqueueError {
    pub fn error(&self) -> MbufError {
        self.error
    }

    /// 取回被拒绝的链。
    pub fn into_mbuf(self) -> Mbuf {
        self.mbuf
    }
}
