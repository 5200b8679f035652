use crate::frame::FrameLayout;
use socket2::Socket;
use std::{io, time::Duration};

/// 接收/发送缓冲的容量下限，低于该值的请求会被静默抬升。
pub const MIN_BUFFER_CAPACITY: usize = 4096;

/// TCP 套接字级配置项，实现对内核行为的显式控制。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - `TCP_NODELAY` 与非阻塞模式属于连接的固定前提，总会在建连时设置；
///   这里只收纳调用方可以选择的选项，目前是 `SO_LINGER`；
/// - 避免调用方直接操作 `socket2` 或平台相关常量。
///
/// ## 契约（What）
/// - `linger = Some(dur)`：`close` 之后最多等待 `dur` 发送残留数据，超时发送 RST；
/// - `linger = None`：沿用内核默认策略；
/// - **后置条件**：`apply` 返回 `Ok(())` 时选项已落地，失败时连接会被关闭。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TcpSocketConfig {
    linger: Option<Duration>,
}

impl TcpSocketConfig {
    /// 创建默认配置，等价于 `linger = None`。
    pub const fn new() -> Self {
        Self { linger: None }
    }

    /// 设置 `SO_LINGER` 超时时长。
    pub fn with_linger(mut self, linger: Option<Duration>) -> Self {
        self.linger = linger;
        self
    }

    /// 读取当前配置的超时时长。
    pub fn linger(&self) -> Option<Duration> {
        self.linger
    }

    pub(crate) fn apply(&self, socket: &Socket) -> io::Result<()> {
        match self.linger {
            Some(linger) => socket.set_linger(Some(linger)),
            None => Ok(()),
        }
    }
}

/// 连接上下文的构造参数。
///
/// 容量在构造时即被钳制到 [`MIN_BUFFER_CAPACITY`]，因此 `inbound_capacity()`
/// 返回的总是实际分配的大小。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    inbound_capacity: usize,
    outbound_capacity: usize,
    layout: FrameLayout,
    socket: TcpSocketConfig,
}

impl ConnectionConfig {
    /// 以给定的收发容量创建配置，其余字段取默认值。
    pub fn new(inbound_capacity: usize, outbound_capacity: usize) -> Self {
        Self {
            inbound_capacity: clamp_capacity(inbound_capacity),
            outbound_capacity: clamp_capacity(outbound_capacity),
            layout: FrameLayout::default(),
            socket: TcpSocketConfig::default(),
        }
    }

    pub fn with_inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = clamp_capacity(capacity);
        self
    }

    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = clamp_capacity(capacity);
        self
    }

    /// 指定报文头布局。
    pub fn with_layout(mut self, layout: FrameLayout) -> Self {
        self.layout = layout;
        self
    }

    /// 指定套接字选项。
    pub fn with_socket(mut self, socket: TcpSocketConfig) -> Self {
        self.socket = socket;
        self
    }

    pub fn inbound_capacity(&self) -> usize {
        self.inbound_capacity
    }

    pub fn outbound_capacity(&self) -> usize {
        self.outbound_capacity
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn socket(&self) -> &TcpSocketConfig {
        &self.socket
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(MIN_BUFFER_CAPACITY, MIN_BUFFER_CAPACITY)
    }
}

fn clamp_capacity(capacity: usize) -> usize {
    capacity.max(MIN_BUFFER_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_capacities_are_raised_to_floor() {
        let config = ConnectionConfig::new(100, 0);
        assert_eq!(config.inbound_capacity(), MIN_BUFFER_CAPACITY);
        assert_eq!(config.outbound_capacity(), MIN_BUFFER_CAPACITY);

        let config = config.with_inbound_capacity(1 << 16);
        assert_eq!(config.inbound_capacity(), 1 << 16);
    }

    #[test]
    fn socket_config_keeps_linger() {
        let socket = TcpSocketConfig::new().with_linger(Some(Duration::from_secs(1)));
        assert_eq!(socket.linger(), Some(Duration::from_secs(1)));
        assert_eq!(TcpSocketConfig::default().linger(), None);
    }
}
