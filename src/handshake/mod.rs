use crate::error::{Error, Result};
use crate::tls::constants::RANDOM_LEN;
use crate::utils;
use std::fmt::Debug;

pub mod client_hello;
pub mod finished;
pub mod server_hello;

pub use client_hello::ClientHello;
pub use finished::Finished;
pub use server_hello::ServerHello;

pub const HANDSHAKE_HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeType {
    HelloRequest = 0,
    ClientHello = 1,
    ServerHello = 2,
    Finished = 20,
}

impl TryFrom<u8> for HandshakeType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(HandshakeType::HelloRequest),
            1 => Ok(HandshakeType::ClientHello),
            2 => Ok(HandshakeType::ServerHello),
            20 => Ok(HandshakeType::Finished),
            _ => Err(Error::ParseError(format!(
                "Invalid HandshakeType value: {}",
                value
            ))),
        }
    }
}

pub trait HandshakeMessage: Debug {
    fn message_type(&self) -> HandshakeType;
    fn serialize(&self) -> Result<Vec<u8>>;

    /// Body prefixed with the handshake header, as it enters the transcript.
    fn encode(&self) -> Result<Vec<u8>> {
        let body = self.serialize()?;
        let mut result = HandshakeMessageHeader::new(self.message_type(), body.len() as u32).serialize()?;
        result.extend_from_slice(&body);
        Ok(result)
    }
}

#[derive(Debug)]
pub struct HandshakeMessageHeader {
    pub msg_type: HandshakeType,
    pub length: u32,
}

impl HandshakeMessageHeader {
    pub fn new(msg_type: HandshakeType, length: u32) -> Self {
        Self { msg_type, length }
    }

    pub fn parse(data: &[u8], pos: &mut usize) -> Result<Self> {
        if *pos + HANDSHAKE_HEADER_LEN > data.len() {
            return Err(Error::ParseError(
                "Handshake message header too short".to_string(),
            ));
        }

        let msg_type = HandshakeType::try_from(utils::read_u8(data, pos)?)?;
        let length = utils::read_u24(data, pos)?;

        Ok(Self { msg_type, length })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut result = Vec::with_capacity(HANDSHAKE_HEADER_LEN);
        utils::write_u8(&mut result, self.msg_type as u8);
        utils::write_u24(&mut result, self.length)?;
        Ok(result)
    }
}

/// Server's request that the client start a new handshake. Empty body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloRequest;

impl HandshakeMessage for HelloRequest {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::HelloRequest
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakePayload {
    HelloRequest,
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    Finished(Finished),
}

pub struct HandshakeLayer;

impl HandshakeLayer {
    pub fn new() -> Self {
        Self
    }

    /// Parses one message; returns it with the number of bytes consumed,
    /// header included.
    pub fn parse_handshake_message(&self, data: &[u8]) -> Result<(HandshakePayload, usize)> {
        let mut pos = 0;
        let header = HandshakeMessageHeader::parse(data, &mut pos)?;

        if pos + header.length as usize > data.len() {
            return Err(Error::ParseError(
                "Handshake message length exceeds available data".to_string(),
            ));
        }

        let body = &data[pos..pos + header.length as usize];
        let mut body_pos = 0;

        let message = match header.msg_type {
            HandshakeType::HelloRequest => {
                if !body.is_empty() {
                    return Err(Error::ParseError("HelloRequest must be empty".to_string()));
                }
                HandshakePayload::HelloRequest
            }
            HandshakeType::ClientHello => {
                HandshakePayload::ClientHello(ClientHello::parse(body, &mut body_pos)?)
            }
            HandshakeType::ServerHello => {
                HandshakePayload::ServerHello(ServerHello::parse(body, &mut body_pos)?)
            }
            HandshakeType::Finished => {
                HandshakePayload::Finished(Finished::parse(body, &mut body_pos)?)
            }
        };

        Ok((message, pos + header.length as usize))
    }
}

impl Default for HandshakeLayer {
    fn default() -> Self {
        Self::new()
    }
}

fn hello_body(message: &[u8]) -> Result<&[u8]> {
    let mut pos = 0;
    let header = HandshakeMessageHeader::parse(message, &mut pos)?;
    match header.msg_type {
        HandshakeType::ClientHello | HandshakeType::ServerHello => {}
        other => {
            return Err(Error::ParseError(format!(
                "{:?} carries no version field",
                other
            )))
        }
    }
    utils::read_bytes(message, &mut pos, header.length as usize)
}

/// Version field of an encoded ClientHello or ServerHello.
pub fn read_hello_version_field(message: &[u8]) -> Result<u16> {
    let body = hello_body(message)?;
    utils::read_u16(body, &mut 0)
}

/// Random nonce of an encoded ClientHello or ServerHello.
pub fn read_random_nonce(message: &[u8]) -> Result<[u8; RANDOM_LEN]> {
    let body = hello_body(message)?;
    let mut pos = 2;
    let mut random = [0u8; RANDOM_LEN];
    random.copy_from_slice(utils::read_bytes(body, &mut pos, RANDOM_LEN)?);
    Ok(random)
}

/// Rewrites the version field of an encoded hello in place. Only adversarial
/// test doubles have a reason to call this.
pub fn overwrite_hello_version_field(message: &mut [u8], version: u16) -> Result<()> {
    let body_len = hello_body(message)?.len();
    if body_len < 2 {
        return Err(Error::ParseError("Hello too short for a version field".to_string()));
    }
    message[HANDSHAKE_HEADER_LEN..HANDSHAKE_HEADER_LEN + 2].copy_from_slice(&version.to_be_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_client_hello() -> ClientHello {
        ClientHello::new(0x0303, [0x11; RANDOM_LEN], vec![], vec![0x002F, 0x1301]).unwrap()
    }

    #[test]
    fn test_handshake_header_parsing() {
        let data = [
            0x01, // ClientHello
            0x00, 0x00, 0x03, // Length 3
            0xAA, 0xBB, 0xCC, // Dummy payload
        ];

        let mut pos = 0;
        let header = HandshakeMessageHeader::parse(&data, &mut pos).unwrap();

        assert_eq!(header.msg_type, HandshakeType::ClientHello);
        assert_eq!(header.length, 3);
        assert_eq!(pos, 4);
    }

    #[test]
    fn test_invalid_handshake_type() {
        let data = [0x30, 0x00, 0x00, 0x03, 0xAA, 0xBB, 0xCC];

        let mut pos = 0;
        assert!(HandshakeMessageHeader::parse(&data, &mut pos).is_err());
    }

    #[test]
    fn test_hello_request_encoding() {
        assert_eq!(HelloRequest.encode().unwrap(), [0x00, 0x00, 0x00, 0x00]);
        let (message, consumed) = HandshakeLayer::new()
            .parse_handshake_message(&[0x00, 0x00, 0x00, 0x00])
            .unwrap();
        assert_eq!(message, HandshakePayload::HelloRequest);
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_parse_reports_consumed_bytes() {
        let mut data = sample_client_hello().encode().unwrap();
        let len = data.len();
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let (message, consumed) = HandshakeLayer::new().parse_handshake_message(&data).unwrap();
        assert_eq!(consumed, len);
        assert_eq!(message, HandshakePayload::ClientHello(sample_client_hello()));
    }

    #[test]
    fn test_truncated_message() {
        let data = sample_client_hello().encode().unwrap();
        assert!(HandshakeLayer::new()
            .parse_handshake_message(&data[..data.len() - 1])
            .is_err());
    }

    #[test]
    fn test_version_field_accessors() {
        let mut data = sample_client_hello().encode().unwrap();
        assert_eq!(read_hello_version_field(&data).unwrap(), 0x0303);
        assert_eq!(read_random_nonce(&data).unwrap(), [0x11; RANDOM_LEN]);

        overwrite_hello_version_field(&mut data, 0x0301).unwrap();
        assert_eq!(read_hello_version_field(&data).unwrap(), 0x0301);

        let (message, _) = HandshakeLayer::new().parse_handshake_message(&data).unwrap();
        match message {
            HandshakePayload::ClientHello(hello) => assert_eq!(hello.version, 0x0301),
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_version_field_requires_hello() {
        let mut finished = Finished::new(vec![0; 12]).encode().unwrap();
        assert!(read_hello_version_field(&finished).is_err());
        assert!(overwrite_hello_version_field(&mut finished, 0x0303).is_err());
    }
}
