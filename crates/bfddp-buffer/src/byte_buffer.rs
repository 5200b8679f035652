use core::fmt;
use thiserror::Error;

/// 游标越界时返回的错误。
///
/// # 契约说明（What）
/// - `Commit`：声明写入的字节数超过了剩余可写空间；
/// - `Consume`：声明消费的字节数超过了尚未消费的数据量；
/// - 两种情况下缓冲游标都保持调用前的状态。
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("commit of {requested} bytes exceeds {available} free bytes")]
    Commit { requested: usize, available: usize },
    #[error("consume of {requested} bytes exceeds {available} unconsumed bytes")]
    Consume { requested: usize, available: usize },
}

/// 固定容量、三游标的字节缓冲。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 为非阻塞读取提供一块可复用的接收区：读泵把套接字数据追加到空闲区，
///   帧提取器从消费游标处查看完整报文，调用方在处理完一轮报文后压缩空间；
/// - 运行期间不扩容，容量在构造时确定，避免读路径上的重新分配。
///
/// ## 结构（How）
/// - `storage`：长度为 `total` 的定长内存；
/// - `position`：下一个未写入字节的偏移；
/// - `packet`：下一个尚未消费帧的起始偏移。
///
/// ## 契约（What）
/// - 任意时刻 `packet <= position <= total`，且 `remaining() == total - position`；
/// - `[0, packet)` 已消费可回收，`[packet, position)` 已接收未交付，
///   `[position, total)` 为空闲区；
/// - 只有 [`commit`](Self::commit)、[`consume`](Self::consume)、
///   [`compact`](Self::compact) 与 [`clear`](Self::clear) 会修改游标。
pub struct ByteBuffer {
    storage: Box<[u8]>,
    position: usize,
    packet: usize,
}

impl ByteBuffer {
    /// 分配容量为 `total` 的缓冲，所有游标归零。
    pub fn with_capacity(total: usize) -> Self {
        Self {
            storage: vec![0u8; total].into_boxed_slice(),
            position: 0,
            packet: 0,
        }
    }

    /// 缓冲总容量。
    pub fn total(&self) -> usize {
        self.storage.len()
    }

    /// 下一个未写入字节的偏移。
    pub fn position(&self) -> usize {
        self.position
    }

    /// 剩余可写字节数，恒等于 `total - position`。
    pub fn remaining(&self) -> usize {
        self.total() - self.position
    }

    /// 下一个未消费帧的起始偏移。
    pub fn packet(&self) -> usize {
        self.packet
    }

    /// 写游标是否已经抵达容量上限。
    pub fn is_full(&self) -> bool {
        self.position == self.total()
    }

    /// 是否存在已接收但尚未消费的字节。
    pub fn has_unconsumed(&self) -> bool {
        self.packet < self.position
    }

    /// 已接收但尚未消费的区域 `[packet, position)`。
    pub fn unconsumed(&self) -> &[u8] {
        &self.storage[self.packet..self.position]
    }

    /// 空闲区 `[position, total)`，供读泵直接写入。
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.position..]
    }

    /// 确认已向空闲区写入 `len` 字节，推进写游标。
    pub fn commit(&mut self, len: usize) -> Result<(), BufferError> {
        let available = self.remaining();
        if len > available {
            return Err(BufferError::Commit {
                requested: len,
                available,
            });
        }
        self.position += len;
        Ok(())
    }

    /// 标记 `len` 字节已被调用方消费，推进消费游标。
    pub fn consume(&mut self, len: usize) -> Result<(), BufferError> {
        let available = self.position - self.packet;
        if len > available {
            return Err(BufferError::Consume {
                requested: len,
                available,
            });
        }
        self.packet += len;
        Ok(())
    }

    /// 回收已消费前缀：把 `[packet, position)` 搬到起点，返回回收的字节数。
    ///
    /// # 教案级注释
    ///
    /// ## 意图（Why）
    /// - 读泵只向 `position` 之后追加，若不回收前缀，已交付报文会永久占据空间，
    ///   最终导致缓冲写满而无法再读取；
    ///
    /// ## 逻辑（How）
    /// - `packet == 0` 时无可回收内容，直接返回 0；
    /// - 否则使用 `copy_within`（等价于 `memmove`，允许区间重叠）平移尾部数据，
    ///   随后 `position -= packet`、`packet = 0`。
    ///
    /// ## 契约（What）
    /// - **后置条件**：`packet() == 0` 且 `remaining() == total() - position()`；
    /// - 幂等：连续调用两次时第二次不改变任何状态。
    pub fn compact(&mut self) -> usize {
        let reclaimed = self.packet;
        if reclaimed == 0 {
            return 0;
        }
        self.storage.copy_within(reclaimed..self.position, 0);
        self.position -= reclaimed;
        self.packet = 0;
        reclaimed
    }

    /// 丢弃全部内容，游标归零。
    pub fn clear(&mut self) {
        self.position = 0;
        self.packet = 0;
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("total", &self.total())
            .field("position", &self.position)
            .field("remaining", &self.remaining())
            .field("packet", &self.packet)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(total: usize, bytes: &[u8]) -> ByteBuffer {
        let mut buffer = ByteBuffer::with_capacity(total);
        buffer.spare_mut()[..bytes.len()].copy_from_slice(bytes);
        buffer.commit(bytes.len()).expect("写入示例数据");
        buffer
    }

    #[test]
    fn compact_moves_tail_to_front() {
        let mut buffer = filled(16, b"abcdefgh");
        buffer.consume(5).expect("消费前缀");
        assert_eq!(buffer.compact(), 5);
        assert_eq!(buffer.unconsumed(), b"fgh");
        assert_eq!(buffer.position(), 3);
        assert_eq!(buffer.packet(), 0);
        assert_eq!(buffer.remaining(), 13);
    }

    #[test]
    fn compact_of_fully_consumed_buffer_empties_it() {
        let mut buffer = filled(8, b"abcdefgh");
        assert!(buffer.is_full());
        buffer.consume(8).expect("消费全部");
        buffer.compact();
        assert_eq!(buffer.position(), 0);
        assert_eq!(buffer.remaining(), 8);
        assert!(!buffer.has_unconsumed());
    }

    #[test]
    fn out_of_bounds_cursors_are_rejected() {
        let mut buffer = filled(4, b"ab");
        assert_eq!(
            buffer.commit(3),
            Err(BufferError::Commit {
                requested: 3,
                available: 2
            })
        );
        assert_eq!(
            buffer.consume(3),
            Err(BufferError::Consume {
                requested: 3,
                available: 2
            })
        );
        assert_eq!(buffer.position(), 2);
        assert_eq!(buffer.packet(), 0);
    }
}
