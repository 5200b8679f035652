//! `byte_buffer_contract` 集成测试：从 crate 外部验证 `ByteBuffer` 的游标契约。
//!
//! # 测试目标（Why）
//! - 压缩（pulldown）是接收路径上唯一会搬移数据的操作，必须保持未消费字节不变、
//!   游标自洽，并且可以被重复调用；
//! - 通过 proptest 生成任意的“写入/消费/压缩”序列，确认不变式在所有路径上成立。

use bfddp_buffer::{BufferError, ByteBuffer};
use proptest::prelude::*;

/// 影子模型的输入事件。
#[derive(Debug, Clone)]
enum Step {
    Write(Vec<u8>),
    Consume(usize),
    Compact,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..96).prop_map(Step::Write),
        (0usize..128).prop_map(Step::Consume),
        Just(Step::Compact),
    ]
}

fn assert_invariants(buffer: &ByteBuffer) {
    assert!(buffer.packet() <= buffer.position());
    assert!(buffer.position() <= buffer.total());
    assert_eq!(buffer.remaining(), buffer.total() - buffer.position());
    assert_eq!(buffer.is_full(), buffer.position() == buffer.total());
}

proptest! {
    /// 任意操作序列之后，缓冲的未消费区域与一个 `Vec<u8>` 影子模型保持一致。
    #[test]
    fn prop_cursor_sequences_match_shadow_model(steps in prop::collection::vec(step(), 1..64)) {
        let mut buffer = ByteBuffer::with_capacity(256);
        let mut shadow: Vec<u8> = Vec::new();

        for step in steps {
            match step {
                Step::Write(bytes) => {
                    let len = bytes.len().min(buffer.remaining());
                    buffer.spare_mut()[..len].copy_from_slice(&bytes[..len]);
                    buffer.commit(len).expect("写入长度不超过空闲区");
                    shadow.extend_from_slice(&bytes[..len]);
                }
                Step::Consume(len) => {
                    let result = buffer.consume(len);
                    if len <= shadow.len() {
                        prop_assert!(result.is_ok());
                        shadow.drain(..len);
                    } else {
                        prop_assert_eq!(
                            result,
                            Err(BufferError::Consume { requested: len, available: shadow.len() })
                        );
                    }
                }
                Step::Compact => {
                    buffer.compact();
                    prop_assert_eq!(buffer.packet(), 0);
                }
            }
            assert_invariants(&buffer);
            prop_assert_eq!(buffer.unconsumed(), &shadow[..]);
        }
    }

    /// 连续两次压缩时，第二次不改变任何游标与内容。
    #[test]
    fn prop_compaction_is_idempotent(
        data in prop::collection::vec(any::<u8>(), 0..200),
        consumed in 0usize..200,
    ) {
        let mut buffer = ByteBuffer::with_capacity(200);
        buffer.spare_mut()[..data.len()].copy_from_slice(&data);
        buffer.commit(data.len()).expect("写入测试数据");
        buffer.consume(consumed.min(data.len())).expect("消费前缀");

        buffer.compact();
        let snapshot = (buffer.position(), buffer.packet(), buffer.unconsumed().to_vec());
        prop_assert_eq!(buffer.compact(), 0);
        prop_assert_eq!(
            (buffer.position(), buffer.packet(), buffer.unconsumed().to_vec()),
            snapshot
        );
    }
}

/// 写满之后缓冲应报告已满，且不再接受任何提交。
#[test]
fn full_buffer_reports_fullness_and_rejects_commit() {
    let mut buffer = ByteBuffer::with_capacity(32);
    buffer.spare_mut().fill(0xAB);
    buffer.commit(32).expect("写满缓冲");
    assert!(buffer.is_full());
    assert!(buffer.spare_mut().is_empty());
    assert_eq!(
        buffer.commit(1),
        Err(BufferError::Commit {
            requested: 1,
            available: 0
        })
    );

    buffer.consume(16).expect("消费一半");
    buffer.compact();
    assert!(!buffer.is_full());
    assert_eq!(buffer.remaining(), 16);
}

/// 未消费任何字节时压缩为空操作。
#[test]
fn compact_without_consumed_prefix_is_noop() {
    let mut buffer = ByteBuffer::with_capacity(16);
    buffer.spare_mut()[..4].copy_from_slice(b"ping");
    buffer.commit(4).expect("写入");
    assert_eq!(buffer.compact(), 0);
    assert_eq!(buffer.unconsumed(), b"ping");
    assert_eq!(buffer.position(), 4);
}

/// `clear` 丢弃全部数据并恢复完整空闲区。
#[test]
fn clear_resets_cursors() {
    let mut buffer = ByteBuffer::with_capacity(16);
    buffer.commit(10).expect("写入");
    buffer.consume(3).expect("消费");
    buffer.clear();
    assert_eq!(buffer.position(), 0);
    assert_eq!(buffer.packet(), 0);
    assert_eq!(buffer.remaining(), 16);
}
