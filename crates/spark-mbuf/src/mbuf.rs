use alloc::{boxed::Box, vec::Vec};
use core::fmt;

use spark_mempool::Block;

use crate::MbufPool;

/// 链头携带的报文头元数据。
///
/// # 契约说明（What）
/// - 只出现在链头缓冲上；`splice` 会清除被拼接链的报文头，`prepend` 会把它迁移到新链头；
/// - `len` 恒等于整条链所有缓冲 `len()` 之和，每个修改链结构或长度的操作结束时都会重建该不变量；
/// - 报文头本身不占数据区；只有 `user_header_len` 字节的用户自定义头部区位于头缓冲存储的前部，
///   通过 [`Mbuf::user_header`] 访问。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    pub(crate) len: usize,
    pub(crate) flags: u16,
    pub(crate) user_header_len: u8,
}

impl PacketHeader {
    pub(crate) fn new(user_header_len: u8) -> Self {
        Self {
            len: 0,
            flags: 0,
            user_header_len,
        }
    }

    /// 整条链的字节总数。
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 报文级标志位，含义由上层协议栈定义。
    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn set_flags(&mut self, flags: u16) {
        self.flags = flags;
    }

    /// 用户自定义头部区长度。
    pub fn user_header_len(&self) -> usize {
        usize::from(self.user_header_len)
    }

    /// 报文头在头缓冲存储前部占用的字节数，即用户头部区长度。
    pub(crate) fn reserve(&self) -> usize {
        self.user_header_len()
    }
}

/// `Mbuf` 是缓冲链中的一个节点：一块定长存储、其中的数据窗口，以及对链剩余部分的独占所有权。
///
/// # 结构设计（How）
/// - `block`：从池的块来源取得的存储，数据区为其前 `capacity()` 字节；
/// - `offset`/`len`：数据窗口，满足 `offset + len <= capacity()`；
/// - `pkthdr`：显式的报文头字段，取代在存储前部叠加结构体的做法，
///   “有头 / 无头” 只由该字段决定，不从内存布局推断；
/// - `next`：后继节点由前驱经 `Box` 独占持有，链天然无环，释放与复制时不会出现悬垂或重复释放。
///
/// # 契约说明（What）
/// - 只能经由 [`MbufPool::acquire`] / [`MbufPool::acquire_with_header`] 创建；
/// - 必须显式释放（[`Mbuf::free`]、[`Mbuf::free_chain`] 或 [`MbufPool::release_chain`]）。
///   直接丢弃会让存储回到堆而不是回到池，池的空闲数随之永久减少。
/// - 链中非链头节点只能只读访问（[`Mbuf::next`]）；修改一律经链头进行，
///   报文头长度因此不会与链脱节：
///
/// ```compile_fail
/// # use spark_mbuf::{MbufPool, PoolConfig};
/// # let pool = MbufPool::with_mempool(&PoolConfig::with_data_capacity(4, 4))?;
/// let mut head = pool.acquire_with_header(0)?;
/// head.append(b"abcdef")?;
/// head.next_mut().map(|inner| inner.append(b"xyz"));
/// # Ok::<(), spark_mbuf::MbufError>(())
/// ```
#[must_use = "mbufs must be released back to their pool"]
pub struct Mbuf {
    pub(crate) pool: MbufPool,
    pub(crate) block: Block,
    pub(crate) offset: usize,
    pub(crate) len: usize,
    pub(crate) flags: u8,
    pub(crate) pkthdr: Option<PacketHeader>,
    pub(crate) next: Option<Box<Mbuf>>,
}

impl Mbuf {
    pub(crate) fn from_block(
        pool: MbufPool,
        block: Block,
        offset: usize,
        pkthdr: Option<PacketHeader>,
    ) -> Self {
        Self {
            pool,
            block,
            offset,
            len: 0,
            flags: 0,
            pkthdr,
            next: None,
        }
    }

    /// 本缓冲数据窗口的长度。
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 数据窗口在存储中的起始偏移。
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 数据区容量（块大小减去节点开销）。
    pub fn capacity(&self) -> usize {
        self.pool.data_capacity()
    }

    /// 报文头占用的前部字节数；无头缓冲为 0。
    pub fn header_reserve(&self) -> usize {
        self.pkthdr.as_ref().map_or(0, PacketHeader::reserve)
    }

    /// 数据窗口之前可用于 `prepend` 的空间。
    pub fn leading_space(&self) -> usize {
        self.offset - self.header_reserve()
    }

    /// 数据窗口之后可用于 `append` 的空间。
    pub fn trailing_space(&self) -> usize {
        self.capacity() - self.offset - self.len
    }

    /// 数据窗口内容。
    pub fn data(&self) -> &[u8] {
        &self.storage()[self.offset..self.offset + self.len]
    }

    /// 可写访问数据窗口内容；窗口长度不变。
    pub fn data_mut(&mut self) -> &mut [u8] {
        let (start, end) = (self.offset, self.offset + self.len);
        &mut self.storage_mut()[start..end]
    }

    /// 缓冲级标志位。
    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags;
    }

    /// 是否携带报文头（即是否为一条有头链的链头）。
    pub fn is_pkthdr(&self) -> bool {
        self.pkthdr.is_some()
    }

    pub fn pkthdr(&self) -> Option<&PacketHeader> {
        self.pkthdr.as_ref()
    }

    pub fn pkthdr_mut(&mut self) -> Option<&mut PacketHeader> {
        self.pkthdr.as_mut()
    }

    /// 用户自定义头部区；无头缓冲返回 `None`。
    pub fn user_header(&self) -> Option<&[u8]> {
        let len = self.pkthdr.as_ref()?.user_header_len();
        Some(&self.storage()[..len])
    }

    pub fn user_header_mut(&mut self) -> Option<&mut [u8]> {
        let len = self.pkthdr.as_ref()?.user_header_len();
        Some(&mut self.storage_mut()[..len])
    }

    /// 后继节点。
    pub fn next(&self) -> Option<&Mbuf> {
        self.next.as_deref()
    }

    /// 发放该缓冲的池。
    pub fn pool(&self) -> &MbufPool {
        &self.pool
    }

    /// 从本节点开始遍历链。
    pub fn iter(&self) -> Iter<'_> {
        Iter { next: Some(self) }
    }

    /// 从本节点开始所有缓冲长度之和。
    pub fn chain_len(&self) -> usize {
        self.iter().map(Mbuf::len).sum()
    }

    /// 从本节点开始的缓冲个数。
    pub fn buffer_count(&self) -> usize {
        self.iter().count()
    }

    /// 把链中数据按顺序拼接为连续字节。
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.chain_len());
        for node in self.iter() {
            out.extend_from_slice(node.data());
        }
        out
    }

    /// 链尾节点。
    pub(crate) fn last_mut(&mut self) -> &mut Mbuf {
        let mut cur = self;
        loop {
            match cur.next {
                Some(ref mut next) => cur = &mut **next,
                None => return cur,
            }
        }
    }

    /// 数据区（整块存储的前 `capacity()` 字节）。
    pub(crate) fn storage(&self) -> &[u8] {
        let capacity = self.capacity();
        &self.block.as_slice()[..capacity]
    }

    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        let capacity = self.capacity();
        &mut self.block.as_mut_slice()[..capacity]
    }

    /// 断言报文头长度与链长度一致；仅在调试构建生效。
    pub(crate) fn debug_check_pkthdr(&self) {
        if let Some(header) = &self.pkthdr {
            debug_assert_eq!(
                header.len,
                self.chain_len(),
                "packet header length out of sync with chain"
            );
        }
    }
}

impl fmt::Debug for Mbuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mbuf")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("flags", &self.flags)
            .field("pkthdr", &self.pkthdr)
            .field("next", &self.next)
            .finish()
    }
}

/// 链节点迭代器，见 [`Mbuf::iter`]。
pub struct Iter<'a> {
    next: Option<&'a Mbuf>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Mbuf;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next.as_deref();
        Some(node)
    }
}
