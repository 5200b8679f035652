use crate::{
    config::TcpSocketConfig,
    error::{self, TransportError, map_io_error},
};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::{io, net::SocketAddr};
use tracing::debug;

/// 建连结果：套接字与“握手仍在进行”标记。
#[derive(Debug)]
pub(crate) struct Connected {
    pub socket: Socket,
    pub connecting: bool,
}

/// 创建非阻塞流式套接字并发起异步建连。
///
/// # 教案级注释
///
/// ## 逻辑（How）
/// 1. 按目标地址族创建 `SOCK_STREAM` 套接字；
/// 2. 设置非阻塞，并打开 `TCP_NODELAY` 使小包立即发送；
/// 3. 应用 [`TcpSocketConfig`] 中的可选项；
/// 4. 发起 `connect`：立即成功则 `connecting = false`；返回“进行中”则
///    `connecting = true`，不视为失败。
///
/// ## 契约（What）
/// - 第 2~4 步任一失败都会先关闭已创建的套接字，再返回触发失败的原始错误；
/// - 返回 `Ok` 时套接字所有权转交调用方。
pub(crate) fn connect(
    addr: SocketAddr,
    config: &TcpSocketConfig,
) -> Result<Connected, TransportError> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(|err| map_io_error(error::SOCKET, err))?;

    if let Err(err) = configure(&socket, config) {
        close(socket);
        return Err(map_io_error(error::CONFIGURE, err));
    }

    match socket.connect(&SockAddr::from(addr)) {
        Ok(()) => {
            debug!(%addr, "tcp connect established immediately");
            Ok(Connected {
                socket,
                connecting: false,
            })
        }
        Err(err) if is_in_progress(&err) => {
            debug!(%addr, "tcp connect in progress");
            Ok(Connected {
                socket,
                connecting: true,
            })
        }
        Err(err) => {
            close(socket);
            Err(map_io_error(error::CONNECT, err))
        }
    }
}

fn configure(socket: &Socket, config: &TcpSocketConfig) -> io::Result<()> {
    socket.set_nonblocking(true)?;
    socket.set_tcp_nodelay(true)?;
    config.apply(socket)
}

/// 查询异步建连的结果：`Ok(true)` 已建立，`Ok(false)` 仍在进行。
pub(crate) fn poll_connected(socket: &Socket) -> Result<bool, TransportError> {
    if let Some(err) = socket
        .take_error()
        .map_err(|err| map_io_error(error::CONNECT, err))?
    {
        return Err(map_io_error(error::CONNECT, err));
    }
    match socket.peer_addr() {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(false),
        Err(err) => Err(map_io_error(error::CONNECT, err)),
    }
}

/// 非阻塞建连“进行中”的判定。
///
/// unix 上只有 `EINPROGRESS` 表示握手已发出；`EAGAIN` 意味着本地临时端口
/// 耗尽，属于立即失败。
#[cfg(unix)]
fn is_in_progress(err: &io::Error) -> bool {
    err.raw_os_error() == Some(nix::errno::Errno::EINPROGRESS as i32)
}

#[cfg(not(unix))]
fn is_in_progress(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
}

/// 关闭套接字，被信号打断时重试。
///
/// 关闭失败只记录日志：调用方手里的原始错误（若有）保持不变，
/// 不会被关闭阶段的副作用替换。
#[cfg(unix)]
pub(crate) fn close(socket: Socket) {
    use nix::errno::Errno;
    use std::os::fd::IntoRawFd;

    let fd = socket.into_raw_fd();
    loop {
        match nix::unistd::close(fd) {
            Ok(()) => break,
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                tracing::warn!(fd, %errno, "tcp close failed");
                break;
            }
        }
    }
    debug!(fd, "tcp socket closed");
}

#[cfg(not(unix))]
pub(crate) fn close(socket: Socket) {
    drop(socket);
    debug!("tcp socket closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn only_einprogress_counts_as_pending_connect() {
        use nix::errno::Errno;

        let pending = io::Error::from_raw_os_error(Errno::EINPROGRESS as i32);
        assert!(is_in_progress(&pending));

        let exhausted = io::Error::from_raw_os_error(Errno::EAGAIN as i32);
        assert_eq!(exhausted.kind(), io::ErrorKind::WouldBlock);
        assert!(!is_in_progress(&exhausted));

        let refused = io::Error::from_raw_os_error(Errno::ECONNREFUSED as i32);
        assert!(!is_in_progress(&refused));
    }

    #[test]
    fn poll_connected_reports_unconnected_socket_as_pending() {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .expect("创建套接字");
        assert!(!poll_connected(&socket).expect("未建连的套接字不应报错"));
        close(socket);
    }
}
