use bfddp_buffer::BufferError;
use std::io;
use thiserror::Error;

/// 描述一次底层操作对应的稳定错误码与默认文案。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationKind {
    pub code: &'static str,
    pub message: &'static str,
}

pub(crate) const SOCKET: OperationKind = OperationKind {
    code: "bfddp.transport.tcp.socket_failed",
    message: "tcp socket",
};
pub(crate) const CONFIGURE: OperationKind = OperationKind {
    code: "bfddp.transport.tcp.configure_failed",
    message: "tcp configure",
};
pub(crate) const CONNECT: OperationKind = OperationKind {
    code: "bfddp.transport.tcp.connect_failed",
    message: "tcp connect",
};
pub(crate) const READ: OperationKind = OperationKind {
    code: "bfddp.transport.tcp.read_failed",
    message: "tcp read",
};

const NOT_CONNECTED_CODE: &str = "bfddp.transport.tcp.not_connected";
const FRAME_TOO_SHORT_CODE: &str = "bfddp.transport.tcp.frame_too_short";
const FRAME_TOO_LARGE_CODE: &str = "bfddp.transport.tcp.frame_too_large";
const BUFFER_CODE: &str = "bfddp.transport.tcp.buffer_cursor";

/// 错误分类，供调用方决定拆除连接还是稍后重试。
///
/// - `Retryable`：瞬时或可通过重新建连恢复的故障；
/// - `NonRetryable`：配置、权限类故障或调用顺序错误，原样重试无意义；
/// - `ProtocolViolation`：对端发送的字节流违反分帧约束，或调用方游标使用有误。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Retryable,
    NonRetryable,
    ProtocolViolation,
}

/// 传输层统一错误类型。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 每个失败都携带稳定错误码（`bfddp.transport.tcp.*`）与分类，日志与告警
///   可以据此精确聚合，而不必解析文案；
/// - 瞬时条件（`WouldBlock`/`Interrupted`）与对端关闭不会出现在这里，它们由
///   [`ReadOutcome`](crate::ReadOutcome) 表达。
///
/// ## 契约（What）
/// - `Io`：系统调用失败，`op` 指明失败的阶段，`source` 为原始 `io::Error`，
///   不会被关闭套接字时的副作用覆盖；
/// - `NotConnected`：在 `connect` 成功之前调用了读取或握手确认；
/// - `FrameTooShort` / `FrameTooLarge`：报文头声明的长度不可能构成合法帧；
/// - `Buffer`：调用方推进消费游标时越界。
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{}: {source}", .op.message)]
    Io {
        op: OperationKind,
        #[source]
        source: io::Error,
    },
    #[error("tcp: connection has no socket")]
    NotConnected,
    #[error("frame declares length {declared}, below the {header_len}-byte header")]
    FrameTooShort { declared: usize, header_len: usize },
    #[error("frame declares length {declared}, exceeding the {capacity}-byte receive buffer")]
    FrameTooLarge { declared: usize, capacity: usize },
    #[error("buffer cursor: {0}")]
    Buffer(#[from] BufferError),
}

impl TransportError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Io { op, .. } => op.code,
            TransportError::NotConnected => NOT_CONNECTED_CODE,
            TransportError::FrameTooShort { .. } => FRAME_TOO_SHORT_CODE,
            TransportError::FrameTooLarge { .. } => FRAME_TOO_LARGE_CODE,
            TransportError::Buffer(_) => BUFFER_CODE,
        }
    }

    /// 错误分类。
    pub fn category(&self) -> ErrorCategory {
        match self {
            TransportError::Io { source, .. } => categorize_io_error(source),
            TransportError::NotConnected => ErrorCategory::NonRetryable,
            TransportError::FrameTooShort { .. }
            | TransportError::FrameTooLarge { .. }
            | TransportError::Buffer(_) => ErrorCategory::ProtocolViolation,
        }
    }

    /// 若为系统调用失败，返回原始 `io::Error`。
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            TransportError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// 将 IO 错误映射为带阶段信息的传输错误。
pub(crate) fn map_io_error(op: OperationKind, source: io::Error) -> TransportError {
    TransportError::Io { op, source }
}

fn categorize_io_error(error: &io::Error) -> ErrorCategory {
    use io::ErrorKind;
    match error.kind() {
        ErrorKind::TimedOut
        | ErrorKind::WouldBlock
        | ErrorKind::Interrupted
        | ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotConnected
        | ErrorKind::AddrInUse
        | ErrorKind::AddrNotAvailable
        | ErrorKind::BrokenPipe
        | ErrorKind::NetworkUnreachable
        | ErrorKind::HostUnreachable => ErrorCategory::Retryable,
        _ => ErrorCategory::NonRetryable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_operation_code_and_source() {
        let err = map_io_error(READ, io::Error::from(io::ErrorKind::ConnectionReset));
        assert_eq!(err.code(), "bfddp.transport.tcp.read_failed");
        assert_eq!(err.category(), ErrorCategory::Retryable);
        assert_eq!(
            err.io_error().map(io::Error::kind),
            Some(io::ErrorKind::ConnectionReset)
        );
        assert!(err.to_string().starts_with("tcp read: "));
    }

    #[test]
    fn framing_errors_are_protocol_violations() {
        let err = TransportError::FrameTooLarge {
            declared: 1 << 20,
            capacity: 4096,
        };
        assert_eq!(err.code(), "bfddp.transport.tcp.frame_too_large");
        assert_eq!(err.category(), ErrorCategory::ProtocolViolation);
        assert!(err.io_error().is_none());
    }

    #[test]
    fn reading_before_connect_is_caller_misuse() {
        let err = TransportError::NotConnected;
        assert_eq!(err.code(), "bfddp.transport.tcp.not_connected");
        assert_eq!(err.category(), ErrorCategory::NonRetryable);
    }

    #[test]
    fn permission_errors_are_not_retryable() {
        let err = map_io_error(SOCKET, io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.category(), ErrorCategory::NonRetryable);
        assert_eq!(err.code(), "bfddp.transport.tcp.socket_failed");
    }
}
