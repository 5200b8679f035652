#![doc = r#"
# bfddp-transport-tcp

## 设计动机（Why）
- **定位**：为 BFD 数据面客户端维护一条非阻塞 TCP 连接，并从字节流中切出
  长度前缀报文，调用方无需直接管理套接字缓冲。
- **架构角色**：位于外部事件循环之下。事件循环决定何时可读，本 crate 负责
  读取、分帧与空间回收，不启动线程，也不依赖异步运行时。

## 核心契约（What）
- [`Connection::read`] 返回 [`ReadOutcome`]，显式区分“读到数据”“稍后再试”
  “缓冲已满”“对端关闭”；硬性失败以 [`TransportError`] 返回，并附带稳定错误码
  与 [`ErrorCategory`]；
- [`Connection::next_message`] 只在完整报文到齐后返回视图，从不复制、从不推进
  消费游标；
- [`Connection::finish_read`] 把未消费的尾部字节搬回缓冲起点。

## 实现策略（How）
- 套接字由 `socket2` 创建并设置非阻塞与 `TCP_NODELAY`；关闭时对 `EINTR` 重试；
- 接收区是 `bfddp-buffer` 提供的定长三游标缓冲；
- 报文头布局由 [`FrameLayout`] 描述，长度字段位于头部偏移 0。

## 风险与考量（Trade-offs）
- 单连接、单线程模型：上下文不做内部同步；
- 报文声明长度超过接收缓冲容量时直接判为分帧错误，调用方需按最大报文配置容量。
"#]

mod config;
mod connection;
mod error;
mod frame;
mod pump;
mod socket;

pub use config::{ConnectionConfig, MIN_BUFFER_CAPACITY, TcpSocketConfig};
pub use connection::Connection;
pub use error::{ErrorCategory, OperationKind, TransportError};
pub use frame::{DEFAULT_HEADER_LEN, DEFAULT_MIN_FRAME_LEN, Frame, FrameLayout, LengthField};
pub use pump::ReadOutcome;

pub use bfddp_buffer::{BufferError, ByteBuffer};
