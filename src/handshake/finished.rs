use crate::error::{Error, Result};
use crate::handshake::{HandshakeMessage, HandshakeType};
use crate::tls::constants::FINISHED_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub verify_data: Vec<u8>,
}

impl Finished {
    pub fn new(verify_data: Vec<u8>) -> Self {
        Self { verify_data }
    }

    pub fn parse(data: &[u8], pos: &mut usize) -> Result<Self> {
        if data.len().saturating_sub(*pos) != FINISHED_LEN {
            return Err(Error::ParseError(format!(
                "Finished verify data must be {} bytes, got {}",
                FINISHED_LEN,
                data.len().saturating_sub(*pos)
            )));
        }

        let verify_data = data[*pos..].to_vec();
        *pos = data.len();

        Ok(Self { verify_data })
    }
}

impl HandshakeMessage for Finished {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::Finished
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        Ok(self.verify_data.clone())
    }
}
