use thiserror::Error;

/// An IGMP codec error result.
pub type Result<T> = std::result::Result<T, Error>;

/// An IGMP codec error.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// Attempting to create a packet with an insufficient buffer size.
    #[error("insufficient buffer for {0} packet, minimum={1}, provided={2}")]
    InsufficientPacketBuffer(String, usize, usize),
    /// The IP payload does not carry IGMP.
    #[error("payload is not IGMP, protocol number: {0}")]
    ProtocolMismatch(u8),
    /// The IGMP region is shorter than 8 bytes or not a multiple of 4.
    #[error("malformed IGMP message length, total_length={0}, header_size={1}")]
    MalformedLength(usize, usize),
    /// A type byte does not match any known code.
    #[error("unknown {0} value: {1:#04x}")]
    UnknownEnumValue(&'static str, u8),
    /// The type byte of a buffer does not match the requested message view.
    #[error("expected IGMP type {0:#04x}, found {1:#04x}")]
    TypeMismatch(u8, u8),
    /// A value is outside its legal domain.
    #[error("value out of range: {0}")]
    RangeError(String),
    /// The field is pinned by the protocol for this message.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}
