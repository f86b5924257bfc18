use crate::error::{Error, Result};
use crate::handshake::{HandshakeMessage, HandshakeType};
use crate::tls::constants::{MAX_SESSION_ID_LEN, RANDOM_LEN};
use crate::utils;

/// ClientHello reduced to the fields version negotiation looks at. The
/// version field carries the highest version the client offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub version: u16,
    pub random: [u8; RANDOM_LEN],
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<u16>,
}

impl ClientHello {
    pub fn new(
        version: u16,
        random: [u8; RANDOM_LEN],
        session_id: Vec<u8>,
        cipher_suites: Vec<u16>,
    ) -> Result<Self> {
        if session_id.len() > MAX_SESSION_ID_LEN {
            return Err(Error::ProtocolError("Session ID too long".to_string()));
        }
        if cipher_suites.is_empty() {
            return Err(Error::ProtocolError("ClientHello needs at least one cipher suite".to_string()));
        }
        Ok(Self {
            version,
            random,
            session_id,
            cipher_suites,
        })
    }

    pub fn parse(data: &[u8], pos: &mut usize) -> Result<Self> {
        let version = utils::read_u16(data, pos)?;

        if *pos + RANDOM_LEN > data.len() {
            return Err(Error::ParseError("ClientHello random field truncated".to_string()));
        }

        let mut random = [0u8; RANDOM_LEN];
        random.copy_from_slice(utils::read_bytes(data, pos, RANDOM_LEN)?);

        let session_id = utils::read_vector_u8(data, pos)?.to_vec();
        if session_id.len() > MAX_SESSION_ID_LEN {
            return Err(Error::ParseError("ClientHello session ID too long".to_string()));
        }

        let cipher_suites_bytes = utils::read_vector_u16(data, pos)?;
        if cipher_suites_bytes.is_empty() || cipher_suites_bytes.len() % 2 != 0 {
            return Err(Error::ParseError("Cipher suites length must be even and non-zero".to_string()));
        }

        let cipher_suites = cipher_suites_bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        if *pos != data.len() {
            return Err(Error::ParseError("Trailing data after ClientHello".to_string()));
        }

        Ok(Self {
            version,
            random,
            session_id,
            cipher_suites,
        })
    }
}

impl HandshakeMessage for ClientHello {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::ClientHello
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut result = Vec::new();

        utils::write_u16(&mut result, self.version);
        result.extend_from_slice(&self.random);
        utils::write_vector_u8(&mut result, &self.session_id)?;

        let mut suites = Vec::with_capacity(self.cipher_suites.len() * 2);
        for suite in &self.cipher_suites {
            utils::write_u16(&mut suites, *suite);
        }
        utils::write_vector_u16(&mut result, &suites)?;

        Ok(result)
    }
}
