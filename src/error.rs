use std::io;

/// Reasons a datagram could not be turned into a mapped address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("message is shorter than the 20 byte STUN header")]
    TooShort,
    #[error("no XOR-MAPPED-ADDRESS attribute in response")]
    AttributeNotFound,
    #[error("response belongs to a different transaction")]
    TransactionMismatch,
    #[error("unexpected message type {0:#06x}")]
    UnexpectedMessageType(u16),
    #[error("unsupported address family {0:#04x}")]
    UnsupportedFamily(u8),
    #[error("attribute {attr_type:#06x} overruns the message")]
    Truncated { attr_type: u16 },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport failure")]
    Transport(#[from] io::Error),
    #[error("`{0}` did not resolve to an IPv4 address")]
    NoIpv4Address(String),
    #[error("no binding response after {attempts} attempt(s)")]
    TimedOut { attempts: u32 },
    #[error("invalid binding response")]
    Parse(#[from] ParseError),
}
