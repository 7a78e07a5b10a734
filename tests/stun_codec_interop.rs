//! Cross-checks the hand-written codec against the `stun_codec` crate.

use bytecodec::{DecodeExt, EncodeExt as _};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use stun_codec::rfc5389::{
    attributes::{Software, XorMappedAddress},
    methods::BINDING,
    Attribute,
};
use stun_codec::*;
use stun_public_addr::{make_binding_request, parse_binding_response, ParseError};

fn encode_success_response(transaction_id: [u8; 12], address: SocketAddrV4) -> Vec<u8> {
    let mut response = Message::<Attribute>::new(
        MessageClass::SuccessResponse,
        BINDING,
        TransactionId::new(transaction_id),
    );
    response.add_attribute(Attribute::XorMappedAddress(XorMappedAddress::new(
        SocketAddr::V4(address),
    )));

    MessageEncoder::<Attribute>::default()
        .encode_into_bytes(response)
        .unwrap()
}

#[test]
fn stun_codec_decodes_our_request() {
    let request = make_binding_request();

    let message = MessageDecoder::<Attribute>::default()
        .decode_from_bytes(&request.to_bytes())
        .unwrap()
        .unwrap();

    assert_eq!(message.class(), MessageClass::Request);
    assert_eq!(message.method(), BINDING);
    assert_eq!(
        message.transaction_id().as_bytes(),
        request.transaction_id().as_bytes()
    );
}

#[test]
fn parses_stun_codec_response() {
    let request = make_binding_request();
    let address = SocketAddrV4::new(Ipv4Addr::new(93, 184, 216, 34), 54321);

    let buf = encode_success_response(*request.transaction_id().as_bytes(), address);

    assert_eq!(parse_binding_response(&buf), Ok(address));
    assert_eq!(request.parse_response(&buf), Ok(address));
}

#[test]
fn rejects_stun_codec_response_for_other_request() {
    let request = make_binding_request();
    let other = make_binding_request();
    let address = SocketAddrV4::new(Ipv4Addr::new(203, 0, 113, 5), 1024);

    let buf = encode_success_response(*other.transaction_id().as_bytes(), address);

    assert_eq!(
        request.parse_response(&buf),
        Err(ParseError::TransactionMismatch)
    );
}

fn encode_with_software(description: &str, address: SocketAddrV4) -> Vec<u8> {
    let transaction_id = *make_binding_request().transaction_id().as_bytes();
    let mut response = Message::<Attribute>::new(
        MessageClass::SuccessResponse,
        BINDING,
        TransactionId::new(transaction_id),
    );
    response.add_attribute(Attribute::Software(
        Software::new(description.to_owned()).unwrap(),
    ));
    response.add_attribute(Attribute::XorMappedAddress(XorMappedAddress::new(
        SocketAddr::V4(address),
    )));

    MessageEncoder::<Attribute>::default()
        .encode_into_bytes(response)
        .unwrap()
}

#[test]
fn walks_past_word_aligned_attribute() {
    let address = SocketAddrV4::new(Ipv4Addr::new(93, 184, 216, 34), 54321);

    let buf = encode_with_software("abcd", address);

    assert_eq!(parse_binding_response(&buf), Ok(address));
}

#[test]
fn padded_attribute_before_mapped_address_is_not_skipped() {
    let address = SocketAddrV4::new(Ipv4Addr::new(93, 184, 216, 34), 54321);

    let buf = encode_with_software("abc", address);

    assert!(parse_binding_response(&buf).is_err());
}
