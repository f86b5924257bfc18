use crate::error::{Error, Result};
use crate::handshake::{HandshakeMessage, HandshakeType};
use crate::tls::constants::{MAX_SESSION_ID_LEN, RANDOM_LEN};
use crate::utils;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub version: u16,
    pub random: [u8; RANDOM_LEN],
    pub session_id_echo: Vec<u8>,
    pub cipher_suite: u16,
}

impl ServerHello {
    pub fn new(
        version: u16,
        random: [u8; RANDOM_LEN],
        session_id_echo: Vec<u8>,
        cipher_suite: u16,
    ) -> Result<Self> {
        if session_id_echo.len() > MAX_SESSION_ID_LEN {
            return Err(Error::ProtocolError("Session ID too long".to_string()));
        }
        Ok(Self {
            version,
            random,
            session_id_echo,
            cipher_suite,
        })
    }

    pub fn parse(data: &[u8], pos: &mut usize) -> Result<Self> {
        let version = utils::read_u16(data, pos)?;

        if *pos + RANDOM_LEN > data.len() {
            return Err(Error::ParseError("ServerHello random field truncated".to_string()));
        }

        let mut random = [0u8; RANDOM_LEN];
        random.copy_from_slice(utils::read_bytes(data, pos, RANDOM_LEN)?);

        let session_id_echo = utils::read_vector_u8(data, pos)?.to_vec();
        if session_id_echo.len() > MAX_SESSION_ID_LEN {
            return Err(Error::ParseError("ServerHello session ID too long".to_string()));
        }

        if *pos + 2 > data.len() {
            return Err(Error::ParseError("ServerHello cipher suite field truncated".to_string()));
        }
        let cipher_suite = utils::read_u16(data, pos)?;

        if *pos != data.len() {
            return Err(Error::ParseError("Trailing data after ServerHello".to_string()));
        }

        Ok(Self {
            version,
            random,
            session_id_echo,
            cipher_suite,
        })
    }
}

impl HandshakeMessage for ServerHello {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::ServerHello
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut result = Vec::new();

        utils::write_u16(&mut result, self.version);
        result.extend_from_slice(&self.random);
        utils::write_vector_u8(&mut result, &self.session_id_echo)?;
        utils::write_u16(&mut result, self.cipher_suite);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_hello_parsing() {
        let mut data = vec![0x03, 0x02]; // TLS 1.1
        data.extend_from_slice(&[
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
            0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10,
            0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18,
            0x44, 0x4F, 0x57, 0x4E, 0x47, 0x52, 0x44, 0x00, // DOWNGRD\0
        ]);
        data.extend_from_slice(&[
            0x00, // Empty session ID echo
            0x00, 0x2F, // Cipher suite
        ]);

        let mut pos = 0;
        let hello = ServerHello::parse(&data, &mut pos).unwrap();

        assert_eq!(hello.version, 0x0302);
        assert_eq!(hello.random[0], 0x01);
        assert_eq!(&hello.random[24..], b"DOWNGRD\x00");
        assert!(hello.session_id_echo.is_empty());
        assert_eq!(hello.cipher_suite, 0x002F);
        assert_eq!(hello.serialize().unwrap(), data);
    }

    #[test]
    fn test_truncated_random() {
        let data = [0x03, 0x03, 0x00, 0x01];
        assert!(ServerHello::parse(&data, &mut 0).is_err());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let hello = ServerHello::new(0x0303, [0; RANDOM_LEN], vec![1, 2], 0x1301).unwrap();
        let mut data = hello.serialize().unwrap();
        data.push(0xFF);
        assert!(ServerHello::parse(&data, &mut 0).is_err());
    }
}
