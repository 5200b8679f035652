use crate::error::{self, TransportError, map_io_error};
use bfddp_buffer::ByteBuffer;
use std::io::{self, Read};
use tracing::{debug, trace};

/// 一次读取调用的结果。
///
/// # 契约（What）
/// - `Received(n)`：本次调用向接收缓冲追加了 `n > 0` 个字节；
/// - `WouldBlock`：暂时没有数据（`WouldBlock`/`Interrupted`），等待事件循环再次通知；
/// - `BufferFull`：压缩后缓冲仍然写满，未发起系统调用；调用方需先消费报文；
/// - `Closed`：对端有序关闭，调用方应拆除连接。
///
/// 硬性 IO 失败不在此列，以 `Err(TransportError)` 返回。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Received(usize),
    WouldBlock,
    BufferFull,
    Closed,
}

impl ReadOutcome {
    /// 本次调用追加的字节数，非 `Received` 时为 0。
    pub fn bytes(&self) -> usize {
        match self {
            ReadOutcome::Received(n) => *n,
            _ => 0,
        }
    }
}

/// 把数据源尽可能多地读入缓冲空闲区。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 事件循环只告诉我们“可读”，不告诉我们有多少数据；循环读取直到
///   `WouldBlock` 或缓冲写满，减少事件循环的往返次数；
/// - 部分读取之后遇到关闭或错误时，先把已到达的字节交给调用方处理，
///   关闭/错误会在下一次调用时再次浮现。
///
/// ## 逻辑（How）
/// 1. 空闲区不超过 `reserve` 字节时先压缩，防止半截帧卡在缓冲尾部；
/// 2. 压缩后仍满：返回 `BufferFull`，不发起读取；
/// 3. 循环单次读取：
///    - `Ok(0)`：对端关闭；未读到任何数据时返回 `Closed`；
///    - `WouldBlock`/`Interrupted`：停止并返回累计值；
///    - 其它错误：未读到任何数据时返回错误，否则返回累计值；
///    - `Ok(n)`：提交 `n` 字节，缓冲写满则停止，否则继续。
///
/// ## 契约（What）
/// - `source` 必须处于非阻塞模式，否则最后一次读取会阻塞调用线程；
/// - **后置条件**：缓冲游标不变式保持成立，`Received(n)` 的 `n` 等于
///   `position` 的增量。
pub(crate) fn fill<R: Read>(
    mut source: R,
    buffer: &mut ByteBuffer,
    reserve: usize,
) -> Result<ReadOutcome, TransportError> {
    if buffer.remaining() <= reserve {
        let reclaimed = buffer.compact();
        trace!(reclaimed, "compacted receive buffer before read");
    }
    if buffer.is_full() {
        return Ok(ReadOutcome::BufferFull);
    }

    let mut total = 0usize;
    loop {
        match source.read(buffer.spare_mut()) {
            Ok(0) => {
                debug!(total, "tcp peer closed connection");
                return Ok(if total == 0 {
                    ReadOutcome::Closed
                } else {
                    ReadOutcome::Received(total)
                });
            }
            Ok(n) => {
                buffer.commit(n)?;
                total += n;
                trace!(n, total, position = buffer.position(), "tcp read");
                if buffer.is_full() {
                    return Ok(ReadOutcome::Received(total));
                }
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                return Ok(if total == 0 {
                    ReadOutcome::WouldBlock
                } else {
                    ReadOutcome::Received(total)
                });
            }
            Err(err) => {
                if total == 0 {
                    return Err(map_io_error(error::READ, err));
                }
                debug!(total, error = %err, "tcp read failed after partial data");
                return Ok(ReadOutcome::Received(total));
            }
        }
    }
}
