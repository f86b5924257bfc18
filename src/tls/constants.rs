// TLS / DTLS protocol constants

// Stream (TLS) wire versions
pub const SSL30: u16 = 0x0300;
pub const TLS10: u16 = 0x0301;
pub const TLS11: u16 = 0x0302;
pub const TLS12: u16 = 0x0303;
pub const TLS13: u16 = 0x0304;

// Datagram (DTLS) wire versions, one's complement of the TLS encoding
pub const DTLS10: u16 = 0xFEFF;
pub const DTLS12: u16 = 0xFEFD;
pub const DTLS13: u16 = 0xFEFC;

// Record types
pub const RECORD_TYPE_CHANGE_CIPHER_SPEC: u8 = 20;
pub const RECORD_TYPE_ALERT: u8 = 21;
pub const RECORD_TYPE_HANDSHAKE: u8 = 22;
pub const RECORD_TYPE_APPLICATION_DATA: u8 = 23;

// Limits
pub const MAX_FRAGMENT_LENGTH: usize = 16384;
pub const STREAM_RECORD_HEADER_LEN: usize = 5;
pub const DATAGRAM_RECORD_HEADER_LEN: usize = 13;
pub const RANDOM_LEN: usize = 32;
pub const MAX_SESSION_ID_LEN: usize = 32;
pub const FINISHED_LEN: usize = 12;

// Downgrade protection markers placed in the last 8 bytes of ServerHello.random
pub const DOWNGRADE_SENTINEL_LEN: usize = 8;
pub const DOWNGRADE_SENTINEL_TLS13: [u8; DOWNGRADE_SENTINEL_LEN] =
    [0x44, 0x4F, 0x57, 0x4E, 0x47, 0x52, 0x44, 0x01];
pub const DOWNGRADE_SENTINEL_TLS12: [u8; DOWNGRADE_SENTINEL_LEN] =
    [0x44, 0x4F, 0x57, 0x4E, 0x47, 0x52, 0x44, 0x00];

// Record version used before a version has been negotiated
pub const INITIAL_RECORD_VERSION_STREAM: u16 = TLS10;
pub const INITIAL_RECORD_VERSION_DATAGRAM: u16 = DTLS10;
