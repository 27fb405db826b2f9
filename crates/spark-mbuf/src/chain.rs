//! 缓冲链操作。
//!
//! 所有操作都以链头 [`Mbuf`] 为入口。会改变链长度或结构的操作在返回前重建
//! “报文头长度 = 链中各缓冲长度之和” 这一不变量；调试构建中由断言兜底检查。
//!
//! 增长类操作（`append`、`prepend`、`copy_in` 尾部扩展、`duplicate`）只从池取缓冲，
//! 不做按字节的堆分配。

use alloc::boxed::Box;
use core::cmp::Ordering;

use crate::{Mbuf, MbufError, Result};

impl Mbuf {
    /// 把 `data` 追加到链尾。
    ///
    /// # 契约说明（What）
    /// - 先填满尾缓冲的 trailing space，再从尾缓冲所属的池取零前导空间的新缓冲继续写入；
    /// - 池耗尽时返回 [`MbufError::NoMemory`]，已写入的前缀保留在链中，
    ///   报文头长度只计入实际写入的字节；
    /// - 空 `data` 是空操作。
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        let requested = data.len();
        let mut rest = data;
        {
            let mut last = self.last_mut();
            let n = last.trailing_space().min(rest.len());
            if n > 0 {
                let start = last.offset + last.len;
                last.storage_mut()[start..start + n].copy_from_slice(&rest[..n]);
                last.len += n;
                rest = &rest[n..];
            }
            while !rest.is_empty() {
                let Ok(mut fresh) = last.pool.acquire(0) else {
                    break;
                };
                let n = fresh.capacity().min(rest.len());
                fresh.storage_mut()[..n].copy_from_slice(&rest[..n]);
                fresh.len = n;
                rest = &rest[n..];
                last = &mut **last.next.insert(Box::new(fresh));
            }
        }

        let written = requested - rest.len();
        if let Some(header) = self.pkthdr.as_mut() {
            header.len += written;
        }
        self.debug_check_pkthdr();

        if rest.is_empty() {
            Ok(())
        } else {
            tracing::debug!(
                target: "spark_mbuf::chain",
                requested,
                written,
                "append truncated: pool exhausted"
            );
            Err(MbufError::NoMemory { requested, written })
        }
    }

    /// 在链头之前扩展 `len` 字节，返回新的链头。
    ///
    /// # 逻辑解析（How）
    /// - 先消耗当前链头的 leading space；
    /// - 不足时从链头所属的池取新缓冲，数据窗口贴到存储末尾（全部容量作为 leading space），
    ///   挂在旧链头之前；链头有报文头时，报文头（长度、标志、用户头部区）迁移到新链头，
    ///   旧链头降为普通缓冲。
    ///
    /// # 契约说明（What）
    /// - 新扩展出的字节内容未定义，调用方随后用 [`copy_in`](Self::copy_in) 或
    ///   [`data_mut`](Self::data_mut) 写入；
    /// - 池耗尽时整条链（含已扩展出的新缓冲）被释放，返回 [`MbufError::NoMemory`]。
    pub fn prepend(self, len: usize) -> Result<Mbuf> {
        let mut head = self;
        let mut remaining = len;
        loop {
            let n = remaining.min(head.leading_space());
            head.offset -= n;
            head.len += n;
            if let Some(header) = head.pkthdr.as_mut() {
                header.len += n;
            }
            remaining -= n;
            if remaining == 0 {
                break;
            }

            let acquired = match head.pkthdr {
                Some(header) => head.pool.acquire_with_header(header.user_header_len()),
                None => head.pool.acquire(0),
            };
            let mut fresh = match acquired {
                Ok(fresh) => fresh,
                Err(err) => {
                    tracing::warn!(
                        target: "spark_mbuf::chain",
                        requested = len,
                        error = %err,
                        "prepend failed; freeing chain"
                    );
                    if let Err(release_err) = head.free_chain() {
                        tracing::warn!(
                            target: "spark_mbuf::chain",
                            error = %release_err,
                            "release after failed prepend incomplete"
                        );
                    }
                    return Err(MbufError::NoMemory {
                        requested: len,
                        written: 0,
                    });
                }
            };

            if let Some(header) = head.pkthdr.take() {
                let span = header.reserve();
                fresh.storage_mut()[..span].copy_from_slice(&head.storage()[..span]);
                fresh.pkthdr = Some(header);
            }
            fresh.offset = fresh.capacity();
            fresh.next = Some(Box::new(head));
            head = fresh;
        }
        head.debug_check_pkthdr();
        Ok(head)
    }

    /// 把 `second` 整条链挂到本链尾部。
    ///
    /// 本链有报文头时，其长度加上 `second` 的报文头长度（`second` 无头时为其各缓冲长度之和）；
    /// `second` 的报文头总是被清除。`second` 来自哪个池不受限制。
    pub fn splice(&mut self, mut second: Mbuf) {
        let second_header = second.pkthdr.take();
        if let Some(header) = self.pkthdr.as_mut() {
            header.len += second_header.map_or_else(|| second.chain_len(), |h| h.len);
        }
        self.last_mut().next = Some(Box::new(second));
        self.debug_check_pkthdr();
    }

    /// 从链头（`delta > 0`）或链尾（`delta < 0`）裁掉 `|delta|` 字节。
    ///
    /// # 契约说明（What）
    /// - 请求超过链长度时裁到空为止，不报错；
    /// - 头部裁剪只缩小窗口，不释放缓冲；
    /// - 尾部裁剪时被整段裁掉的尾缓冲归还到各自的池，归还失败只记录日志；
    /// - 报文头长度同步减去实际裁掉的字节数。
    pub fn adjust(&mut self, delta: isize) {
        if delta >= 0 {
            self.trim_front(delta.unsigned_abs());
        } else {
            self.trim_back(delta.unsigned_abs());
        }
        self.debug_check_pkthdr();
    }

    fn trim_front(&mut self, requested: usize) {
        let mut remaining = requested;
        let mut cur = Some(&mut *self);
        while let Some(node) = cur {
            if remaining == 0 {
                break;
            }
            if node.len <= remaining {
                remaining -= node.len;
                node.len = 0;
            } else {
                node.offset += remaining;
                node.len -= remaining;
                remaining = 0;
            }
            cur = node.next.as_deref_mut();
        }
        let trimmed = requested - remaining;
        if let Some(header) = self.pkthdr.as_mut() {
            header.len -= trimmed;
        }
    }

    fn trim_back(&mut self, requested: usize) {
        let last = self.last_mut();
        if last.len >= requested {
            last.len -= requested;
            if let Some(header) = self.pkthdr.as_mut() {
                header.len -= requested;
            }
            return;
        }

        let keep = self.chain_len().saturating_sub(requested);
        if let Some(header) = self.pkthdr.as_mut() {
            header.len = keep;
        }
        let mut remaining = keep;
        let mut cur: &mut Mbuf = self;
        loop {
            if cur.len >= remaining {
                cur.len = remaining;
                if let Some(tail) = cur.next.take() {
                    if let Err(err) = (*tail).free_chain() {
                        tracing::warn!(
                            target: "spark_mbuf::chain",
                            error = %err,
                            "failed to release trimmed tail"
                        );
                    }
                }
                return;
            }
            remaining -= cur.len;
            match cur.next {
                Some(ref mut next) => cur = &mut **next,
                None => return,
            }
        }
    }

    /// 定位链内偏移 `offset`，返回其所在缓冲与缓冲内偏移。
    ///
    /// 偏移恰好等于链长度时返回尾缓冲与其 `len()`（追加位置）；超过链长度返回
    /// [`MbufError::NotFound`]。
    pub fn locate(&self, offset: usize) -> Result<(&Mbuf, usize)> {
        let mut cur = self;
        let mut rel = offset;
        loop {
            let next = cur.next.as_deref();
            if rel < cur.len || (rel == cur.len && next.is_none()) {
                return Ok((cur, rel));
            }
            match next {
                Some(next) => {
                    rel -= cur.len;
                    cur = next;
                }
                None => {
                    return Err(MbufError::NotFound {
                        offset,
                        len: self.chain_len(),
                    });
                }
            }
        }
    }

    /// 把链内从 `offset` 开始的 `dst.len()` 字节复制到 `dst`。
    ///
    /// 链中数据不足时返回 [`MbufError::ShortChain`]，此时 `dst` 不被修改。
    pub fn copy_out(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        let available = self.chain_len();
        let needed = offset.saturating_add(dst.len());
        if needed > available {
            return Err(MbufError::ShortChain { needed, available });
        }
        let mut skip = offset;
        let mut filled = 0;
        for node in self.iter() {
            if filled == dst.len() {
                break;
            }
            if skip >= node.len {
                skip -= node.len;
                continue;
            }
            let n = (node.len - skip).min(dst.len() - filled);
            dst[filled..filled + n].copy_from_slice(&node.data()[skip..skip + n]);
            filled += n;
            skip = 0;
        }
        Ok(())
    }

    /// 把 `src` 写入链内 `offset` 处，覆盖已有字节，超出链尾的部分通过 [`append`](Self::append) 扩展。
    ///
    /// # 契约说明（What）
    /// - `offset` 超过链长度返回 [`MbufError::NotFound`]，链不变；
    /// - 扩展失败返回 [`MbufError::NoMemory`]，`requested`/`written` 以整个 `src` 计；
    /// - 报文头长度变为 `max(原长度, offset + src.len())`。
    pub fn copy_in(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        let len = self.chain_len();
        if offset > len {
            return Err(MbufError::NotFound { offset, len });
        }

        let mut skip = offset;
        let mut rest = src;
        let mut cur = Some(&mut *self);
        while let Some(node) = cur {
            if rest.is_empty() {
                break;
            }
            if skip >= node.len {
                skip -= node.len;
            } else {
                let n = (node.len - skip).min(rest.len());
                let start = node.offset + skip;
                node.storage_mut()[start..start + n].copy_from_slice(&rest[..n]);
                rest = &rest[n..];
                skip = 0;
            }
            cur = node.next.as_deref_mut();
        }

        if rest.is_empty() {
            return Ok(());
        }
        let overwritten = src.len() - rest.len();
        self.append(rest).map_err(|err| match err {
            MbufError::NoMemory { written, .. } => MbufError::NoMemory {
                requested: src.len(),
                written: overwritten + written,
            },
            other => other,
        })
    }

    /// 按字节序比较链内从 `offset` 开始的数据与 `data`。
    ///
    /// 空 `data` 总是 [`Ordering::Equal`]；链中数据不足 `data.len()` 字节时返回
    /// [`MbufError::ShortChain`]。
    pub fn compare(&self, offset: usize, data: &[u8]) -> Result<Ordering> {
        if data.is_empty() {
            return Ok(Ordering::Equal);
        }
        let available = self.chain_len();
        let needed = offset.saturating_add(data.len());
        if needed > available {
            return Err(MbufError::ShortChain { needed, available });
        }

        let mut skip = offset;
        let mut rest = data;
        for node in self.iter() {
            if rest.is_empty() {
                break;
            }
            if skip >= node.len {
                skip -= node.len;
                continue;
            }
            let n = (node.len - skip).min(rest.len());
            match node.data()[skip..skip + n].cmp(&rest[..n]) {
                Ordering::Equal => {}
                unequal => return Ok(unequal),
            }
            rest = &rest[n..];
            skip = 0;
        }
        Ok(Ordering::Equal)
    }

    /// 深拷贝整条链。
    ///
    /// 每个副本从原缓冲所属的池取得，保留偏移、长度、标志、报文头与用户头部区。
    /// 任一节点取不到时，已取得的副本全部归还，返回 [`MbufError::NoMemory`]。
    pub fn duplicate(&self) -> Result<Mbuf> {
        let mut head = match self.clone_node() {
            Ok(head) => head,
            Err(err) => return Err(self.duplicate_failed(err, 0)),
        };
        let mut copied = 1;
        let mut tail = &mut head;
        let mut src = self.next.as_deref();
        while let Some(node) = src {
            match node.clone_node() {
                Ok(copy) => {
                    tail = &mut **tail.next.insert(Box::new(copy));
                    copied += 1;
                }
                Err(err) => {
                    if let Err(release_err) = head.free_chain() {
                        tracing::warn!(
                            target: "spark_mbuf::chain",
                            error = %release_err,
                            "release after failed duplicate incomplete"
                        );
                    }
                    return Err(self.duplicate_failed(err, copied));
                }
            }
            src = node.next.as_deref();
        }
        head.debug_check_pkthdr();
        Ok(head)
    }

    fn clone_node(&self) -> Result<Mbuf> {
        let mut copy = self.pool.acquire(0)?;
        let span = self.offset + self.len;
        copy.storage_mut()[..span].copy_from_slice(&self.storage()[..span]);
        copy.offset = self.offset;
        copy.len = self.len;
        copy.flags = self.flags;
        copy.pkthdr = self.pkthdr;
        Ok(copy)
    }

    fn duplicate_failed(&self, err: MbufError, copied: usize) -> MbufError {
        tracing::warn!(
            target: "spark_mbuf::chain",
            copied,
            buffers = self.buffer_count(),
            error = %err,
            "duplicate failed"
        );
        MbufError::NoMemory {
            requested: self.chain_len(),
            written: 0,
        }
    }

    /// 保证链头缓冲连续容纳前 `len` 字节，便于按结构解析协议头。
    ///
    /// # 逻辑解析（How）
    /// - 链头已有 `len` 字节时直接返回；
    /// - 链头窗口之后放不下时，先把窗口平移到报文头保留区之后；
    /// - 依次从后继缓冲搬移字节，被搬空的后继归还到其所属的池。
    ///
    /// # 契约说明（What）
    /// - 不取新缓冲；`len` 超过链头可用容量返回 [`MbufError::InvalidArgument`]，
    ///   超过链长度返回 [`MbufError::ShortChain`]，两种情况下链均不变；
    /// - 链中字节序列与报文头长度保持不变。
    pub fn pullup(&mut self, len: usize) -> Result<()> {
        if self.len >= len {
            return Ok(());
        }
        let reserve = self.header_reserve();
        if len > self.capacity() - reserve {
            return Err(MbufError::InvalidArgument(
                "pullup length exceeds buffer capacity",
            ));
        }
        let available = self.chain_len();
        if len > available {
            return Err(MbufError::ShortChain {
                needed: len,
                available,
            });
        }

        if self.offset + len > self.capacity() {
            let (start, n) = (self.offset, self.len);
            self.storage_mut().copy_within(start..start + n, reserve);
            self.offset = reserve;
        }

        while self.len < len {
            let Some(mut next) = self.next.take() else {
                break;
            };
            let n = (len - self.len).min(next.len);
            let dst = self.offset + self.len;
            let src = next.offset;
            self.storage_mut()[dst..dst + n].copy_from_slice(&next.storage()[src..src + n]);
            self.len += n;
            next.offset += n;
            next.len -= n;

            if next.len == 0 {
                self.next = next.next.take();
                let pool = next.pool.clone();
                if let Err(err) = pool.release(*next) {
                    tracing::warn!(
                        target: "spark_mbuf::chain",
                        error = %err,
                        "failed to release drained buffer"
                    );
                }
            } else {
                self.next = Some(next);
            }
        }
        self.debug_check_pkthdr();
        Ok(())
    }

    /// 把本缓冲归还到其所属的池，返回后继链。
    pub fn free(self) -> Result<Option<Mbuf>> {
        let pool = self.pool.clone();
        pool.release(self)
    }

    /// 把整条链逐个归还到各缓冲所属的池；遇到第一个错误即停止。
    pub fn free_chain(self) -> Result<()> {
        let mut cur = Some(self);
        while let Some(mbuf) = cur {
            cur = mbuf.free()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use crate::{MbufError, MbufPool, PoolConfig};
    use core::cmp::Ordering;

    fn pool(capacity: usize, count: usize) -> MbufPool {
        MbufPool::with_mempool(&PoolConfig::with_data_capacity(capacity, count))
            .expect("构造池失败")
    }

    #[test]
    fn append_spills_into_new_buffers() {
        let pool = pool(8, 8);
        let mut head = pool.acquire_with_header(0).expect("取缓冲失败");
        assert_eq!(head.trailing_space(), 8);
        head.append(b"0123456789").expect("追加失败");
        assert_eq!(head.to_vec(), b"0123456789");
        assert_eq!(head.data(), b"01234567");
        assert_eq!(head.pkthdr().map(|h| h.len()), Some(10));
        assert_eq!(head.buffer_count(), 2);
        head.free_chain().expect("释放失败");
        assert_eq!(pool.free_count(), 8);
    }

    #[test]
    fn append_reports_partial_write() {
        let pool = pool(4, 2);
        let mut head = pool.acquire(0).expect("取缓冲失败");
        let err = head.append(b"abcdefghij").unwrap_err();
        assert_eq!(
            err,
            MbufError::NoMemory {
                requested: 10,
                written: 8
            }
        );
        assert_eq!(head.to_vec(), b"abcdefgh");
        head.free_chain().expect("释放失败");
    }

    #[test]
    fn prepend_uses_leading_space_first() {
        let pool = pool(16, 4);
        let mut m = pool.acquire(6).expect("取缓冲失败");
        m.append(b"tail").expect("追加失败");
        let mut m = m.prepend(4).expect("前置失败");
        assert_eq!(m.buffer_count(), 1);
        m.copy_in(0, b"head").expect("写入失败");
        assert_eq!(m.to_vec(), b"headtail");
        assert_eq!(m.leading_space(), 2);
        m.free_chain().expect("释放失败");
    }

    #[test]
    fn prepend_migrates_packet_header() {
        let pool = pool(16, 4);
        let mut m = pool.acquire_with_header(2).expect("取缓冲失败");
        m.user_header_mut().expect("应有用户头部区").copy_from_slice(b"UH");
        m.pkthdr_mut().expect("应有报文头").set_flags(0x80);
        m.append(b"body").expect("追加失败");

        let mut m = m.prepend(3).expect("前置失败");
        assert_eq!(m.buffer_count(), 2);
        assert_eq!(m.len(), 3);
        let header = *m.pkthdr().expect("新链头应携带报文头");
        assert_eq!(header.len(), 7);
        assert_eq!(header.flags(), 0x80);
        assert_eq!(m.user_header(), Some(&b"UH"[..]));
        assert!(!m.next().expect("应有后继").is_pkthdr());

        m.copy_in(0, b"hdr").expect("写入失败");
        assert_eq!(m.to_vec(), b"hdrbody");
        m.free_chain().expect("释放失败");
    }

    #[test]
    fn prepend_failure_frees_whole_chain() {
        let pool = pool(8, 1);
        let m = pool.acquire(0).expect("取缓冲失败");
        let err = m.prepend(4).unwrap_err();
        assert!(matches!(err, MbufError::NoMemory { requested: 4, .. }));
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn prepend_failure_after_linking_new_heads_frees_everything() {
        let pool = pool(8, 3);
        let mut m = pool.acquire_with_header(1).expect("取缓冲失败");
        m.append(b"0123456789").expect("追加失败");
        assert_eq!(m.buffer_count(), 2);
        assert_eq!(pool.free_count(), 1);

        let len = 2 * m.capacity();
        let err = m.prepend(len).unwrap_err();
        assert_eq!(
            err,
            MbufError::NoMemory {
                requested: 16,
                written: 0
            }
        );
        assert_eq!(pool.free_count(), 3, "已挂上的新链头与原链一并归还");
    }

    #[test]
    fn adjust_trims_front_across_buffers() {
        let pool = pool(4, 8);
        let mut m = pool.acquire(0).expect("取缓冲失败");
        m.append(b"0123456789").expect("追加失败");
        m.adjust(5);
        assert_eq!(m.to_vec(), b"56789");
        assert_eq!(m.len(), 0);
        assert_eq!(m.buffer_count(), 3, "头部裁剪不释放缓冲");
        m.free_chain().expect("释放失败");
        assert_eq!(pool.free_count(), 8);
    }

    #[test]
    fn adjust_trims_back_and_releases_tail() {
        let pool = pool(4, 8);
        let mut m = pool.acquire_with_header(0).expect("取缓冲失败");
        m.append(b"0123456789").expect("追加失败");
        assert_eq!(m.buffer_count(), 3);

        m.adjust(-7);
        assert_eq!(m.to_vec(), b"012");
        assert_eq!(m.pkthdr().map(|h| h.len()), Some(3));
        assert_eq!(m.buffer_count(), 1);
        assert_eq!(pool.free_count(), 7);

        m.adjust(-1);
        assert_eq!(m.to_vec(), b"01");
        m.adjust(-100);
        assert_eq!(m.chain_len(), 0);
        assert_eq!(m.pkthdr().map(|h| h.len()), Some(0));
        m.free_chain().expect("释放失败");
        assert_eq!(pool.free_count(), 8);
    }

    #[test]
    fn locate_walks_into_later_buffers() {
        let pool = pool(4, 4);
        let mut m = pool.acquire(0).expect("取缓冲失败");
        m.append(b"abcdefg").expect("追加失败");
        let (node, rel) = m.locate(5).expect("定位失败");
        assert_eq!(rel, 1);
        assert_eq!(node.data(), b"efg");

        let (node, rel) = m.locate(7).expect("链尾偏移应可定位");
        assert_eq!((node.len(), rel), (3, 3));
        assert_eq!(
            m.locate(8).unwrap_err(),
            MbufError::NotFound { offset: 8, len: 7 }
        );
        m.free_chain().expect("释放失败");
    }

    #[test]
    fn compare_spans_buffers() {
        let pool = pool(4, 4);
        let mut m = pool.acquire(0).expect("取缓冲失败");
        m.append(b"abcdefg").expect("追加失败");
        assert_eq!(m.compare(2, b"cdef"), Ok(Ordering::Equal));
        assert_eq!(m.compare(2, b"cdez"), Ok(Ordering::Less));
        assert_eq!(m.compare(0, b"ab"), Ok(Ordering::Equal));
        assert_eq!(m.compare(0, b"AB"), Ok(Ordering::Greater));
        assert_eq!(m.compare(7, b""), Ok(Ordering::Equal));
        assert!(matches!(
            m.compare(5, b"fgh"),
            Err(MbufError::ShortChain {
                needed: 8,
                available: 7
            })
        ));
        m.free_chain().expect("释放失败");
    }

    #[test]
    fn copy_out_rejects_short_chain_without_writing() {
        let pool = pool(4, 4);
        let mut m = pool.acquire(0).expect("取缓冲失败");
        m.append(b"abcdef").expect("追加失败");
        let mut dst = vec![0u8; 4];
        m.copy_out(2, &mut dst).expect("复制失败");
        assert_eq!(dst, b"cdef");

        let mut dst = vec![0u8; 5];
        assert!(m.copy_out(2, &mut dst).is_err());
        assert_eq!(dst, vec![0u8; 5]);
        m.free_chain().expect("释放失败");
    }

    #[test]
    fn copy_in_overwrites_and_extends() {
        let pool = pool(12, 4);
        let mut m = pool.acquire_with_header(0).expect("取缓冲失败");
        m.append(b"abcdef").expect("追加失败");
        m.copy_in(4, b"XYZW").expect("写入失败");
        assert_eq!(m.to_vec(), b"abcdXYZW");
        assert_eq!(m.pkthdr().map(|h| h.len()), Some(8));
        assert_eq!(
            m.copy_in(9, b"!").unwrap_err(),
            MbufError::NotFound { offset: 9, len: 8 }
        );
        m.free_chain().expect("释放失败");
    }

    #[test]
    fn duplicate_preserves_layout() {
        let pool = pool(16, 8);
        let mut m = pool.acquire_with_header(0).expect("取缓冲失败");
        m.append(b"0123456789").expect("追加失败");
        m.set_flags(0x3);
        let copy = m.duplicate().expect("复制失败");
        assert_eq!(copy.to_vec(), m.to_vec());
        assert_eq!(copy.buffer_count(), m.buffer_count());
        assert_eq!(copy.offset(), m.offset());
        assert_eq!(copy.flags(), 0x3);
        assert_eq!(copy.pkthdr(), m.pkthdr());

        m.copy_in(0, b"!").expect("写入失败");
        assert_eq!(copy.to_vec(), b"0123456789", "副本与原链互不影响");
        m.free_chain().expect("释放失败");
        copy.free_chain().expect("释放失败");
        assert_eq!(pool.free_count(), 8);
    }

    #[test]
    fn duplicate_failure_returns_partial_copies() {
        let pool = pool(4, 3);
        let mut m = pool.acquire(0).expect("取缓冲失败");
        m.append(b"abcdef").expect("追加失败");
        assert_eq!(pool.free_count(), 1);
        assert!(matches!(
            m.duplicate(),
            Err(MbufError::NoMemory { requested: 6, .. })
        ));
        assert_eq!(pool.free_count(), 1);
        m.free_chain().expect("释放失败");
    }

    #[test]
    fn pullup_makes_prefix_contiguous() {
        let pool = pool(8, 4);
        let mut m = pool.acquire(6).expect("取缓冲失败");
        m.append(b"ab").expect("追加失败");
        m.append(b"cdefghij").expect("追加失败");
        assert_eq!(m.buffer_count(), 2);

        m.pullup(5).expect("pullup 失败");
        assert_eq!(m.data(), b"abcde");
        assert_eq!(m.offset(), 0);
        assert_eq!(m.to_vec(), b"abcdefghij");

        m.pullup(8).expect("pullup 失败");
        assert_eq!(m.data(), b"abcdefgh");
        assert_eq!(m.buffer_count(), 2);
        assert_eq!(
            m.pullup(9).unwrap_err(),
            MbufError::InvalidArgument("pullup length exceeds buffer capacity")
        );
        m.free_chain().expect("释放失败");
        assert_eq!(pool.free_count(), 4);
    }
}
