use thiserror::Error;

/// Errors raised while decoding wire data.
///
/// Every variant means the incoming message is unusable. `Truncated` is kept
/// separate so callers can tell a short buffer apart from corrupt content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// Attempted to read past the end of the buffer
    #[error("Truncated input: needed {requested} bytes but only {remaining} remain")]
    Truncated { requested: usize, remaining: usize },

    /// A length prefix declared more bytes than the buffer holds
    #[error("Malformed data: length prefix declares {declared} bytes but only {remaining} remain")]
    LengthOverrun { declared: u64, remaining: usize },

    /// Text payload was not valid UTF-8
    #[error("Malformed data: text payload is not valid UTF-8")]
    InvalidUtf8,

    /// A byte held a value outside the encodable range of its type
    #[error("Malformed data: invalid {type_name} encoding {value:#04x}")]
    InvalidValue { type_name: &'static str, value: u8 },

    /// A variable-length integer ran over 64 bits
    #[error("Malformed data: variable-length integer overflows 64 bits")]
    VarIntOverflow,

    /// A null blob was found where a value is required
    #[error("Malformed data: null {type_name} where a value is required")]
    UnexpectedNull { type_name: &'static str },

    /// A count field exceeds the configured decode limit
    #[error("Malformed data: declared {declared} entries exceeds the limit of {limit}")]
    TooManyEntries { declared: u64, limit: usize },
}

impl SerdeErr {
    /// Whether this error came from running out of input rather than from
    /// inconsistent content
    pub fn is_truncated(&self) -> bool {
        matches!(self, SerdeErr::Truncated { .. })
    }
}
