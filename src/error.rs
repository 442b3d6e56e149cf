use thiserror::Error;

/// Errors produced while encoding or decoding bencode data.
#[derive(Debug, Error)]
pub enum BencodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("expected byte {expected:?}, got {found:?}")]
    UnexpectedByte { expected: char, found: char },

    #[error("no value can start with {0:?}")]
    UnexpectedChar(char),

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("minus zero is illegal")]
    MinusZero,

    #[error("negative string length")]
    NegativeLength,

    #[error("byte string is not valid utf-8")]
    InvalidUtf8,

    #[error("expected {expected} on the wire, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("cannot encode {0}")]
    UnsupportedKind(&'static str),

    #[error("dictionary key must be a byte string, found {0}")]
    KeyNotString(&'static str),

    #[error("duplicate field name {0:?}")]
    DuplicateFieldName(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
