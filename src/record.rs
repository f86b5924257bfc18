use crate::error::{Error, Result};
use crate::tls::constants::{
    DATAGRAM_RECORD_HEADER_LEN, MAX_FRAGMENT_LENGTH, RECORD_TYPE_ALERT,
    RECORD_TYPE_APPLICATION_DATA, RECORD_TYPE_CHANGE_CIPHER_SPEC, RECORD_TYPE_HANDSHAKE,
    STREAM_RECORD_HEADER_LEN,
};
use crate::tls::types::TransportVariant;
use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl TryFrom<u8> for ContentType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            RECORD_TYPE_CHANGE_CIPHER_SPEC => Ok(ContentType::ChangeCipherSpec),
            RECORD_TYPE_ALERT => Ok(ContentType::Alert),
            RECORD_TYPE_HANDSHAKE => Ok(ContentType::Handshake),
            RECORD_TYPE_APPLICATION_DATA => Ok(ContentType::ApplicationData),
            _ => Err(Error::ParseError(format!("Invalid ContentType value: {}", value))),
        }
    }
}

/// A plaintext record. `epoch` and `sequence` are only on the wire for
/// datagram transports and read as zero on streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsRecord<'a> {
    pub content_type: ContentType,
    pub version: u16,
    pub epoch: u16,
    pub sequence: u64,
    pub fragment: &'a [u8],
}

pub struct RecordLayer {
    variant: TransportVariant,
    max_fragment_length: usize,
    next_sequence: u64,
}

impl RecordLayer {
    pub fn new(variant: TransportVariant) -> Self {
        RecordLayer {
            variant,
            max_fragment_length: MAX_FRAGMENT_LENGTH,
            next_sequence: 0,
        }
    }

    pub fn variant(&self) -> TransportVariant {
        self.variant
    }

    fn header_len(&self) -> usize {
        match self.variant {
            TransportVariant::Stream => STREAM_RECORD_HEADER_LEN,
            TransportVariant::Datagram => DATAGRAM_RECORD_HEADER_LEN,
        }
    }

    pub fn parse_record<'a>(&self, data: &'a [u8]) -> Result<(TlsRecord<'a>, usize)> {
        let mut pos = 0;

        if data.len() < self.header_len() {
            return Err(Error::ParseError("Record too short".to_string()));
        }

        let content_type = ContentType::try_from(utils::read_u8(data, &mut pos)?)?;
        let version = utils::read_u16(data, &mut pos)?;
        let (epoch, sequence) = match self.variant {
            TransportVariant::Stream => (0, 0),
            TransportVariant::Datagram => (
                utils::read_u16(data, &mut pos)?,
                utils::read_u48(data, &mut pos)?,
            ),
        };
        let length = utils::read_u16(data, &mut pos)? as usize;

        if length > self.max_fragment_length {
            return Err(Error::ProtocolError(format!(
                "Record fragment length {} exceeds maximum allowed {}",
                length, self.max_fragment_length
            )));
        }

        let fragment = utils::read_bytes(data, &mut pos, length)?;

        Ok((
            TlsRecord {
                content_type,
                version,
                epoch,
                sequence,
                fragment,
            },
            pos,
        ))
    }

    pub fn process_records<'a>(&self, data: &'a [u8]) -> Result<Vec<TlsRecord<'a>>> {
        let mut records = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            let (record, consumed) = self.parse_record(&data[pos..])?;
            records.push(record);
            pos += consumed;
        }

        Ok(records)
    }

    /// Frames `fragment`, assigning the next sequence number on datagram
    /// transports.
    pub fn write_record(
        &mut self,
        content_type: ContentType,
        version: u16,
        fragment: &[u8],
    ) -> Result<Vec<u8>> {
        let record = TlsRecord {
            content_type,
            version,
            epoch: 0,
            sequence: self.next_sequence,
            fragment,
        };
        let bytes = self.serialize_record(&record)?;
        if self.variant == TransportVariant::Datagram {
            self.next_sequence += 1;
        }
        Ok(bytes)
    }

    pub fn serialize_record(&self, record: &TlsRecord<'_>) -> Result<Vec<u8>> {
        if record.fragment.len() > self.max_fragment_length {
            return Err(Error::ProtocolError(format!(
                "Record fragment length {} exceeds maximum allowed {}",
                record.fragment.len(),
                self.max_fragment_length
            )));
        }

        let mut result = Vec::with_capacity(self.header_len() + record.fragment.len());

        utils::write_u8(&mut result, record.content_type as u8);
        utils::write_u16(&mut result, record.version);
        if self.variant == TransportVariant::Datagram {
            utils::write_u16(&mut result, record.epoch);
            utils::write_u48(&mut result, record.sequence)?;
        }
        utils::write_vector_u16(&mut result, record.fragment)?;

        Ok(result)
    }

    pub fn set_max_fragment_length(&mut self, length: usize) -> Result<()> {
        if length > MAX_FRAGMENT_LENGTH {
            return Err(Error::ProtocolError("Max fragment length exceeds TLS limit".to_string()));
        }
        self.max_fragment_length = length;
        Ok(())
    }
}

impl Default for RecordLayer {
    fn default() -> Self {
        Self::new(TransportVariant::Stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_record_parsing() {
        let record_data = [
            22, // Handshake record type
            0x03, 0x03, // TLS 1.2
            0x00, 0x05, // Length 5
            0x01, 0x02, 0x03, 0x04, 0x05, // Fragment data
        ];

        let record_layer = RecordLayer::default();
        let (record, pos) = record_layer.parse_record(&record_data).unwrap();

        assert_eq!(record.content_type, ContentType::Handshake);
        assert_eq!(record.version, 0x0303);
        assert_eq!(record.fragment, &record_data[5..10]);
        assert_eq!(pos, 10);
    }

    #[test]
    fn test_datagram_record_serialization() {
        let mut record_layer = RecordLayer::new(TransportVariant::Datagram);
        let first = record_layer
            .write_record(ContentType::Alert, 0xFEFF, &[0x01, 0x70])
            .unwrap();
        let second = record_layer
            .write_record(ContentType::Alert, 0xFEFF, &[0x01, 0x70])
            .unwrap();

        let expected = [
            21, // Alert record type
            0xFE, 0xFF, // DTLS 1.0
            0x00, 0x00, // Epoch
            0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // Sequence
            0x00, 0x02, // Length
            0x01, 0x70, // Warning, unrecognized_name
        ];
        assert_eq!(second, expected);

        let (record, consumed) = record_layer.parse_record(&first).unwrap();
        assert_eq!(record.sequence, 0);
        assert_eq!(record.fragment, &[0x01, 0x70]);
        assert_eq!(consumed, first.len());
    }

    #[test]
    fn test_record_too_large() {
        let mut record_layer = RecordLayer::default();
        record_layer.set_max_fragment_length(10).unwrap();

        assert!(record_layer
            .write_record(ContentType::Handshake, 0x0303, &[0; 11])
            .is_err());
        assert!(record_layer.set_max_fragment_length(MAX_FRAGMENT_LENGTH + 1).is_err());
    }

    #[test]
    fn test_invalid_content_type() {
        let record_data = [25, 0x03, 0x03, 0x00, 0x01, 0x00];
        assert!(RecordLayer::default().parse_record(&record_data).is_err());
    }

    #[test]
    fn test_process_multiple_records() {
        let record_data = [
            // Record 1: Handshake
            22, 0x03, 0x03, 0x00, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05,
            // Record 2: Alert
            21, 0x03, 0x03, 0x00, 0x02, 0x01, 0x70,
        ];

        let records = RecordLayer::default().process_records(&record_data).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content_type, ContentType::Handshake);
        assert_eq!(records[0].fragment.len(), 5);
        assert_eq!(records[1].content_type, ContentType::Alert);
        assert_eq!(records[1].fragment.len(), 2);
    }

    #[test]
    fn test_partial_trailing_record() {
        let record_data = [21, 0x03, 0x03, 0x00, 0x02, 0x01, 0x70, 22, 0x03];
        assert!(RecordLayer::default().process_records(&record_data).is_err());
    }
}
