use thiserror::Error;

use crate::tls::types::AlertDescription;
use crate::version::ProtocolVersion;

/// Terminal outcome of a failed version decision.
///
/// Every variant ends the current handshake attempt. The alert a peer sees is
/// chosen by the guard; [`NegotiationFailure::alert`] gives the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NegotiationFailure {
    #[error("incompatible version range {min}..={max}")]
    IncompatibleRange {
        min: ProtocolVersion,
        max: ProtocolVersion,
    },

    #[error("unsupported protocol version {0:#06x}")]
    UnsupportedVersion(u16),

    #[error("no protocol version in common with peer")]
    NoCipherOverlap,

    // Reported as a malformed hello so an attacker cannot tell which defense fired.
    #[error("malformed server hello")]
    DowngradeDetected,

    #[error("renegotiation not allowed")]
    RenegotiationNotAllowed,

    #[error("illegal parameter")]
    IllegalParameter,
}

impl NegotiationFailure {
    pub fn alert(&self) -> AlertDescription {
        match self {
            NegotiationFailure::IncompatibleRange { .. } => AlertDescription::InternalError,
            NegotiationFailure::UnsupportedVersion(_) => AlertDescription::ProtocolVersion,
            NegotiationFailure::NoCipherOverlap => AlertDescription::HandshakeFailure,
            NegotiationFailure::DowngradeDetected => AlertDescription::IllegalParameter,
            NegotiationFailure::RenegotiationNotAllowed => AlertDescription::UnexpectedMessage,
            NegotiationFailure::IllegalParameter => AlertDescription::IllegalParameter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Crypto error: {0}")]
    CryptoError(String),

    #[error(transparent)]
    Negotiation(#[from] NegotiationFailure),

    #[error("handshake hash mismatch in peer finished message")]
    BadHandshakeHash,

    #[error("received fatal alert: {0:?}")]
    AlertReceived(AlertDescription),
}

pub type Result<T> = std::result::Result<T, Error>;
