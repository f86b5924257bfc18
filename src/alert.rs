use crate::error::{Error, Result};
use crate::tls::types::{AlertDescription, AlertLevel};
use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl Alert {
    pub fn new(level: AlertLevel, description: AlertDescription) -> Self {
        Self { level, description }
    }

    pub fn fatal(description: AlertDescription) -> Self {
        Self::new(AlertLevel::Fatal, description)
    }

    pub fn warning(description: AlertDescription) -> Self {
        Self::new(AlertLevel::Warning, description)
    }

    pub fn parse(data: &[u8], pos: &mut usize) -> Result<Self> {
        if *pos + 2 > data.len() {
            return Err(Error::ParseError("Alert message truncated".to_string()));
        }

        let level = AlertLevel::try_from(utils::read_u8(data, pos)?)?;
        let description = AlertDescription::from(utils::read_u8(data, pos)?);

        Ok(Self { level, description })
    }

    pub fn serialize(&self) -> Vec<u8> {
        vec![self.level as u8, u8::from(self.description)]
    }

    pub fn is_fatal(&self) -> bool {
        self.level == AlertLevel::Fatal
    }
}
