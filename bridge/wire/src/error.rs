/// Error type for connect-payload codec operations.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The input ended before the field at `offset` could be read.
    #[error("payload truncated at offset {offset}")]
    Truncated { offset: usize },

    /// A length-prefixed field claims more bytes than the codec accepts.
    #[error("length-prefixed field of {len} bytes exceeds the {max} byte cap")]
    FieldTooLarge { len: u64, max: usize },

    /// A compact-size prefix used a wider encoding than its value requires.
    #[error("non-canonical compact-size prefix at offset {offset}")]
    NonCanonicalLength { offset: usize },

    /// Input continues past the end of a complete payload.
    #[error("{extra} trailing bytes after connect payload")]
    TrailingBytes { extra: usize },

    /// The embedded EVM block failed to decode.
    #[error("invalid EVM block RLP: {0}")]
    Rlp(#[from] alloy_rlp::Error),

    /// Bytes remain after the EVM block RLP item.
    #[error("{extra} trailing bytes after EVM block RLP")]
    TrailingRlp { extra: usize },
}

pub type Result<T> = std::result::Result<T, WireError>;
