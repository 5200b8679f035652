//! `bfddp-buffer` 提供数据面连接使用的定长游标缓冲。
//!
//! # 模块定位（Why）
//! - 非阻塞读取会把同一条报文拆成多次到达，需要一块跨多次读取复用的接收区，
//!   并能在报文交付后回收已消费的前缀空间；
//! - 缓冲本身不做任何 IO，传输层只通过 `spare_mut`/`commit` 写入、通过
//!   `unconsumed`/`consume` 读取，便于在测试中脱离套接字单独验证游标契约。
//!
//! # 设计概要（How）
//! - [`ByteBuffer`] 持有一块固定容量的内存与 `position`、`packet` 两个游标，
//!   `remaining` 始终由 `total - position` 推导；
//! - [`ByteBuffer::compact`] 把 `[packet, position)` 的未消费字节搬到起点，
//!   即数据面协议里的 “pulldown”。
//!
//! # 命名约定（Consistency）
//! - `position`/`remaining`/`packet`/`total` 与连接上下文的游标术语保持一致，
//!   方便对照日志排障。

mod byte_buffer;

pub use byte_buffer::{BufferError, ByteBuffer};
