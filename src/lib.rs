use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

mod binding;
mod config;
mod error;

pub use binding::{Event, StunBinding, Transmit};
pub use config::{Config, ConfigError};
pub use error::{Error, ParseError};

/// Fixed value in every RFC 5389 header, also the XOR mask for mapped addresses.
pub const MAGIC_COOKIE: u32 = 0x2112A442;

pub const HEADER_LEN: usize = 20;

const BINDING_REQUEST: u16 = 0x0001;
const BINDING_RESPONSE: u16 = 0x0101;

const XOR_MAPPED_ADDRESS: u16 = 0x0020;
const ATTRIBUTE_HEADER_LEN: usize = 4;
const FAMILY_IPV4: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId([u8; 12]);

impl TransactionId {
    pub fn new(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Draws all 12 bytes from the thread-local CSPRNG.
    pub fn random() -> Self {
        Self(rand::random())
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }

        Ok(())
    }
}

/// An outstanding Binding Request.
///
/// Keeps the transaction ID around so the matching response can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingRequest {
    transaction_id: TransactionId,
}

impl BindingRequest {
    pub fn new(transaction_id: TransactionId) -> Self {
        Self { transaction_id }
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// Encodes the attribute-less 20 byte request in RFC 5389 layout: type,
    /// length, magic cookie at [4..8], transaction ID at [8..20].
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..2].copy_from_slice(&BINDING_REQUEST.to_be_bytes());
        buf[2..4].copy_from_slice(&0u16.to_be_bytes());
        buf[4..8].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        buf[8..20].copy_from_slice(self.transaction_id.as_bytes());

        buf
    }

    /// Parses `buf` as the success response to this request.
    pub fn parse_response(&self, buf: &[u8]) -> Result<SocketAddrV4, ParseError> {
        let header = buf.get(..HEADER_LEN).ok_or(ParseError::TooShort)?;

        let message_type = u16::from_be_bytes([header[0], header[1]]);
        if message_type != BINDING_RESPONSE {
            return Err(ParseError::UnexpectedMessageType(message_type));
        }
        if header[8..20] != self.transaction_id.0 {
            return Err(ParseError::TransactionMismatch);
        }

        parse_binding_response(buf)
    }
}

pub fn make_binding_request() -> BindingRequest {
    BindingRequest::new(TransactionId::random())
}

/// Extracts the XOR-MAPPED-ADDRESS from a Binding Response.
///
/// The header is not inspected; use [`BindingRequest::parse_response`] to also
/// check the message type and transaction ID.
pub fn parse_binding_response(buf: &[u8]) -> Result<SocketAddrV4, ParseError> {
    let mut attributes = buf.get(HEADER_LEN..).ok_or(ParseError::TooShort)?;

    while attributes.len() >= ATTRIBUTE_HEADER_LEN {
        let attr_type = u16::from_be_bytes([attributes[0], attributes[1]]);
        let attr_len = usize::from(u16::from_be_bytes([attributes[2], attributes[3]]));
        let rest = &attributes[ATTRIBUTE_HEADER_LEN..];

        let Some(value) = rest.get(..attr_len) else {
            return Err(ParseError::Truncated { attr_type });
        };

        if attr_type == XOR_MAPPED_ADDRESS {
            return decode_xor_mapped_address(value);
        }

        // No 4-byte padding is skipped, so a padded attribute ahead of
        // XOR-MAPPED-ADDRESS misaligns the walk.
        attributes = &rest[attr_len..];
    }

    Err(ParseError::AttributeNotFound)
}

fn decode_xor_mapped_address(value: &[u8]) -> Result<SocketAddrV4, ParseError> {
    let &[_reserved, family, p0, p1, a0, a1, a2, a3, ..] = value else {
        return Err(ParseError::Truncated {
            attr_type: XOR_MAPPED_ADDRESS,
        });
    };
    if family != FAMILY_IPV4 {
        return Err(ParseError::UnsupportedFamily(family));
    }

    let port = u16::from_be_bytes([p0, p1]) ^ (MAGIC_COOKIE >> 16) as u16;
    let ip = u32::from_be_bytes([a0, a1, a2, a3]) ^ MAGIC_COOKIE;

    Ok(SocketAddrV4::new(Ipv4Addr::from(ip), port))
}
