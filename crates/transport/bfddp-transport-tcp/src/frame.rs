//! 长度前缀分帧：报文头布局与帧提取。
//!
//! 报文头的第一个字段是整帧长度（头部 + 负载），单位与缓冲偏移相同；
//! 其余字段的含义由消息格式层定义，这里只负责判定帧边界。

use crate::error::TransportError;
use bfddp_buffer::ByteBuffer;
use bytes::Buf;

/// 默认报文头长度。
pub const DEFAULT_HEADER_LEN: usize = 8;
/// 默认的“报文头 + 最小消息”长度，读泵据此决定是否先行压缩。
pub const DEFAULT_MIN_FRAME_LEN: usize = 64;

/// 报文头起始处长度字段的宽度与字节序。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LengthField {
    U16Be,
    U16Le,
    #[default]
    U32Be,
    U32Le,
}

impl LengthField {
    /// 字段占用的字节数。
    pub const fn width(self) -> usize {
        match self {
            LengthField::U16Be | LengthField::U16Le => 2,
            LengthField::U32Be | LengthField::U32Le => 4,
        }
    }

    /// 从报文头起始处解码长度，调用方保证 `header.len() >= self.width()`。
    fn decode(self, mut header: &[u8]) -> usize {
        match self {
            LengthField::U16Be => header.get_u16() as usize,
            LengthField::U16Le => header.get_u16_le() as usize,
            LengthField::U32Be => header.get_u32() as usize,
            LengthField::U32Le => header.get_u32_le() as usize,
        }
    }
}

/// 报文头布局。
///
/// # 契约（What）
/// - `header_len`：定长头部字节数，至少容纳长度字段；
/// - `length_field`：位于头部偏移 0 的长度字段；
/// - `min_frame_len`：头部加最小消息的长度，不小于 `header_len`；读泵在空闲区
///   不超过该值时先压缩，避免半截帧卡在缓冲尾部。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameLayout {
    header_len: usize,
    length_field: LengthField,
    min_frame_len: usize,
}

impl FrameLayout {
    /// 以头部长度与长度字段构造布局，`header_len` 不足以容纳长度字段时自动抬升。
    pub fn new(header_len: usize, length_field: LengthField) -> Self {
        let header_len = header_len.max(length_field.width());
        Self {
            header_len,
            length_field,
            min_frame_len: DEFAULT_MIN_FRAME_LEN.max(header_len),
        }
    }

    /// 覆盖最小帧长度，低于 `header_len` 时取 `header_len`。
    pub fn with_min_frame_len(mut self, min_frame_len: usize) -> Self {
        self.min_frame_len = min_frame_len.max(self.header_len);
        self
    }

    pub fn header_len(&self) -> usize {
        self.header_len
    }

    pub fn length_field(&self) -> LengthField {
        self.length_field
    }

    pub fn min_frame_len(&self) -> usize {
        self.min_frame_len
    }
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_LEN, LengthField::default())
    }
}

/// 指向接收缓冲内一条完整报文的只读视图。
///
/// 视图借用连接上下文，因此在下一次 `read`/`finish_read` 之前必须释放；
/// 处理完成后调用方以 [`Frame::len`] 推进消费游标。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    bytes: &'a [u8],
    header_len: usize,
}

impl<'a> Frame<'a> {
    /// 整帧长度（头部 + 负载），即报文头声明的长度。
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// 帧长度至少为头部长度，永远不为空。
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 整帧字节。
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// 定长头部。
    pub fn header(&self) -> &'a [u8] {
        &self.bytes[..self.header_len]
    }

    /// 头部之后的负载。
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[self.header_len..]
    }
}

impl AsRef<[u8]> for Frame<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

/// 判定消费游标处是否已有一条完整报文。
///
/// # 教案级注释
///
/// ## 逻辑（How）
/// 1. `packet >= position` 或可用字节不足一个头部：返回 `Ok(None)`；
/// 2. 从未消费区域的起点（`packet`）解码声明长度；
/// 3. 声明长度小于头部或大于缓冲容量：返回分帧错误，这类帧永远无法交付；
/// 4. 可用字节 `position - packet` 不少于声明长度时返回视图，否则 `Ok(None)`。
///
/// ## 契约（What）
/// - 不阻塞、不修改缓冲、不推进 `packet`。
pub(crate) fn extract<'a>(
    buffer: &'a ByteBuffer,
    layout: &FrameLayout,
) -> Result<Option<Frame<'a>>, TransportError> {
    let available = buffer.unconsumed();
    if available.len() < layout.header_len {
        return Ok(None);
    }

    let declared = layout.length_field.decode(available);
    if declared < layout.header_len {
        return Err(TransportError::FrameTooShort {
            declared,
            header_len: layout.header_len,
        });
    }
    if declared > buffer.total() {
        return Err(TransportError::FrameTooLarge {
            declared,
            capacity: buffer.total(),
        });
    }
    if available.len() < declared {
        return Ok(None);
    }

    Ok(Some(Frame {
        bytes: &available[..declared],
        header_len: layout.header_len,
    }))
}
