use crate::{
    config::ConnectionConfig,
    error::TransportError,
    frame::{self, Frame},
    pump::{self, ReadOutcome},
    socket,
};
use bfddp_buffer::ByteBuffer;
use socket2::Socket;
use std::net::SocketAddr;
use tracing::{debug, trace};

/// 数据面 TCP 连接上下文。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 调用方只需在外部事件循环报告“可读”时调用 [`read`](Self::read)，随后反复
///   调用 [`next_message`](Self::next_message) 取出完整报文，最后以
///   [`finish_read`](Self::finish_read) 回收空间，无需自行管理套接字缓冲；
/// - 所有操作都是同步、非阻塞的有界系统调用序列，“挂起”只以
///   [`ReadOutcome::WouldBlock`] 的形式交还给调用方的事件循环。
///
/// ## 结构（How）
/// - `socket`：`connect` 成功后持有的非阻塞套接字，失败或释放后为 `None`；
/// - `connecting`：异步握手是否仍在进行；
/// - `inbound`/`outbound`：构造时一次性分配的定长缓冲，发送路径仅保留对称结构；
/// - `config`：构造参数，提供报文头布局与套接字选项。
///
/// ## 契约（What）
/// - 每个逻辑会话独占一个上下文；所有修改操作接收 `&mut self`，跨线程共享需
///   由调用方自行同步；
/// - **处理循环**：`read` → 反复 `next_message` + `consume` → `finish_read`；
///   忘记 `consume` 会让已交付的字节永远无法回收，忘记 `finish_read` 时读泵会在
///   空闲区过小时自行压缩；
/// - `Drop` 与 [`release`](Self::release) 都会关闭套接字并释放两块缓冲。
///
/// ```ignore
/// let mut conn = Connection::new(64 * 1024, 4096);
/// conn.connect("127.0.0.1:50700".parse()?)?;
/// // 事件循环报告可读之后：
/// match conn.read()? {
///     ReadOutcome::Closed => return Ok(()),
///     _ => {}
/// }
/// while let Some(frame) = conn.next_message()? {
///     let len = frame.len();
///     handle(frame.payload());
///     conn.consume(len)?;
/// }
/// conn.finish_read();
/// ```
#[derive(Debug)]
pub struct Connection {
    socket: Option<Socket>,
    connecting: bool,
    inbound: ByteBuffer,
    outbound: ByteBuffer,
    config: ConnectionConfig,
}

impl Connection {
    /// 以给定收发容量创建上下文，容量低于 4096 时抬升至 4096。
    pub fn new(inbound_capacity: usize, outbound_capacity: usize) -> Self {
        Self::with_config(ConnectionConfig::new(inbound_capacity, outbound_capacity))
    }

    /// 以完整配置创建上下文，此时尚未创建套接字。
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            socket: None,
            connecting: false,
            inbound: ByteBuffer::with_capacity(config.inbound_capacity()),
            outbound: ByteBuffer::with_capacity(config.outbound_capacity()),
            config,
        }
    }

    /// 创建非阻塞套接字并发起建连。
    ///
    /// - 建连“进行中”不是失败：返回 `Ok(())` 且 [`is_connecting`](Self::is_connecting)
    ///   为 `true`，调用方在套接字可写后以 [`finish_connect`](Self::finish_connect) 确认；
    /// - 任何失败都会关闭新建的套接字，上下文中不保留句柄；
    /// - 上下文已持有套接字时，先关闭旧套接字并清空接收缓冲。
    pub fn connect(&mut self, addr: SocketAddr) -> Result<(), TransportError> {
        self.close_socket();
        let connected = socket::connect(addr, self.config.socket())?;
        self.socket = Some(connected.socket);
        self.connecting = connected.connecting;
        Ok(())
    }

    /// 确认异步建连是否完成。
    ///
    /// 返回 `Ok(true)` 表示连接已建立，`Ok(false)` 表示仍在握手；握手失败时关闭
    /// 套接字并返回错误。
    pub fn finish_connect(&mut self) -> Result<bool, TransportError> {
        let Some(sock) = self.socket.as_ref() else {
            return Err(TransportError::NotConnected);
        };
        if !self.connecting {
            return Ok(true);
        }
        match socket::poll_connected(sock) {
            Ok(established) => {
                if established {
                    debug!("tcp connect established");
                    self.connecting = false;
                }
                Ok(established)
            }
            Err(err) => {
                self.close_socket();
                Err(err)
            }
        }
    }

    /// 从套接字读取尽可能多的数据到接收缓冲。
    pub fn read(&mut self) -> Result<ReadOutcome, TransportError> {
        let Some(sock) = self.socket.as_ref() else {
            return Err(TransportError::NotConnected);
        };
        pump::fill(
            sock,
            &mut self.inbound,
            self.config.layout().min_frame_len(),
        )
    }

    /// 返回消费游标处的一条完整报文；数据不足时返回 `Ok(None)`。
    ///
    /// 不推进消费游标：处理完报文后需调用 [`consume`](Self::consume)，否则同一条
    /// 报文会被重复返回。
    pub fn next_message(&self) -> Result<Option<Frame<'_>>, TransportError> {
        frame::extract(&self.inbound, self.config.layout())
    }

    /// 标记 `len` 字节已被消费。
    pub fn consume(&mut self, len: usize) -> Result<(), TransportError> {
        self.inbound.consume(len)?;
        Ok(())
    }

    /// 回收已消费报文占用的空间。
    pub fn finish_read(&mut self) {
        let reclaimed = self.inbound.compact();
        trace!(
            reclaimed,
            position = self.inbound.position(),
            "finished read cycle"
        );
    }

    /// 依次交付所有完整报文并回收空间，返回交付的报文数。
    ///
    /// 回调接收整帧字节；遇到分帧错误时立即返回，已交付的报文仍会被回收。
    pub fn drain_messages<F>(&mut self, mut handler: F) -> Result<usize, TransportError>
    where
        F: FnMut(Frame<'_>),
    {
        let mut delivered = 0usize;
        let result = loop {
            let len = match frame::extract(&self.inbound, self.config.layout()) {
                Ok(Some(frame)) => {
                    let len = frame.len();
                    handler(frame);
                    len
                }
                Ok(None) => break Ok(delivered),
                Err(err) => break Err(err),
            };
            if let Err(err) = self.inbound.consume(len) {
                break Err(err.into());
            }
            delivered += 1;
        };
        self.finish_read();
        result
    }

    /// 关闭套接字并释放全部资源。
    pub fn release(self) {
        drop(self);
    }

    /// 异步握手是否仍在进行。
    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    /// 上下文是否持有套接字。
    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    /// 底层套接字，供外部事件循环注册。
    pub fn socket(&self) -> Option<&Socket> {
        self.socket.as_ref()
    }

    /// 底层文件描述符，供外部事件循环注册。
    #[cfg(unix)]
    pub fn raw_fd(&self) -> Option<std::os::fd::RawFd> {
        use std::os::fd::AsRawFd;
        self.socket.as_ref().map(AsRawFd::as_raw_fd)
    }

    /// 接收缓冲的只读视图。
    pub fn inbound(&self) -> &ByteBuffer {
        &self.inbound
    }

    /// 发送缓冲的只读视图。
    pub fn outbound(&self) -> &ByteBuffer {
        &self.outbound
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// 从任意数据源灌入接收缓冲，语义与 [`read`](Self::read) 相同。
    ///
    /// 仅在 `test-util` 特性下提供，用于以脚本化数据源复现切分、关闭与错误序列。
    #[cfg(feature = "test-util")]
    pub fn read_from<R: std::io::Read>(
        &mut self,
        source: R,
    ) -> Result<ReadOutcome, TransportError> {
        pump::fill(
            source,
            &mut self.inbound,
            self.config.layout().min_frame_len(),
        )
    }

    fn close_socket(&mut self) {
        if let Some(sock) = self.socket.take() {
            socket::close(sock);
        }
        self.connecting = false;
        self.inbound.clear();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(sock) = self.socket.take() {
            socket::close(sock);
        }
    }
}
