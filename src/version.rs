use std::fmt;

use crate::error::NegotiationFailure;
use crate::tls::constants;
use crate::tls::types::TransportVariant;

/// A protocol version, ordered from oldest to newest.
///
/// The ordering is independent of the wire encoding, which differs between
/// TLS and DTLS (DTLS counts downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    Ssl30,
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 5] = [
        ProtocolVersion::Ssl30,
        ProtocolVersion::Tls10,
        ProtocolVersion::Tls11,
        ProtocolVersion::Tls12,
        ProtocolVersion::Tls13,
    ];

    /// Oldest version; may never share a range with [`ProtocolVersion::LATEST`].
    pub const LEGACY: ProtocolVersion = ProtocolVersion::Ssl30;
    pub const LATEST: ProtocolVersion = ProtocolVersion::Tls13;

    pub fn to_wire(self, variant: TransportVariant) -> Option<u16> {
        match variant {
            TransportVariant::Stream => Some(match self {
                ProtocolVersion::Ssl30 => constants::SSL30,
                ProtocolVersion::Tls10 => constants::TLS10,
                ProtocolVersion::Tls11 => constants::TLS11,
                ProtocolVersion::Tls12 => constants::TLS12,
                ProtocolVersion::Tls13 => constants::TLS13,
            }),
            TransportVariant::Datagram => match self {
                ProtocolVersion::Ssl30 | ProtocolVersion::Tls10 => None,
                ProtocolVersion::Tls11 => Some(constants::DTLS10),
                ProtocolVersion::Tls12 => Some(constants::DTLS12),
                ProtocolVersion::Tls13 => Some(constants::DTLS13),
            },
        }
    }

    /// Decodes a wire version. Unknown or reserved values yield `None`.
    pub fn from_wire(variant: TransportVariant, value: u16) -> Option<Self> {
        match (variant, value) {
            (TransportVariant::Stream, constants::SSL30) => Some(ProtocolVersion::Ssl30),
            (TransportVariant::Stream, constants::TLS10) => Some(ProtocolVersion::Tls10),
            (TransportVariant::Stream, constants::TLS11) => Some(ProtocolVersion::Tls11),
            (TransportVariant::Stream, constants::TLS12) => Some(ProtocolVersion::Tls12),
            (TransportVariant::Stream, constants::TLS13) => Some(ProtocolVersion::Tls13),
            (TransportVariant::Datagram, constants::DTLS10) => Some(ProtocolVersion::Tls11),
            (TransportVariant::Datagram, constants::DTLS12) => Some(ProtocolVersion::Tls12),
            (TransportVariant::Datagram, constants::DTLS13) => Some(ProtocolVersion::Tls13),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProtocolVersion::Ssl30 => "SSLv3",
            ProtocolVersion::Tls10 => "TLSv1.0",
            ProtocolVersion::Tls11 => "TLSv1.1",
            ProtocolVersion::Tls12 => "TLSv1.2",
            ProtocolVersion::Tls13 => "TLSv1.3",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive `[min, max]` interval of versions an endpoint will speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRange {
    min: ProtocolVersion,
    max: ProtocolVersion,
}

impl VersionRange {
    pub const DEFAULT_STREAM: VersionRange = VersionRange {
        min: ProtocolVersion::Tls10,
        max: ProtocolVersion::Tls13,
    };

    pub const DEFAULT_DATAGRAM: VersionRange = VersionRange {
        min: ProtocolVersion::Tls11,
        max: ProtocolVersion::Tls13,
    };

    pub fn new(min: ProtocolVersion, max: ProtocolVersion) -> Result<Self, NegotiationFailure> {
        if min > max {
            return Err(NegotiationFailure::IncompatibleRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub const fn single(version: ProtocolVersion) -> Self {
        Self {
            min: version,
            max: version,
        }
    }

    pub fn default_for(variant: TransportVariant) -> Self {
        match variant {
            TransportVariant::Stream => Self::DEFAULT_STREAM,
            TransportVariant::Datagram => Self::DEFAULT_DATAGRAM,
        }
    }

    pub fn min(&self) -> ProtocolVersion {
        self.min
    }

    pub fn max(&self) -> ProtocolVersion {
        self.max
    }

    pub fn contains(&self, version: ProtocolVersion) -> bool {
        self.min <= version && version <= self.max
    }

    pub fn intersection(&self, other: &VersionRange) -> Option<VersionRange> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        VersionRange::new(min, max).ok()
    }

    /// Highest version in the range that does not exceed `ceiling`.
    pub fn highest_at_most(&self, ceiling: ProtocolVersion) -> Option<ProtocolVersion> {
        if ceiling < self.min {
            None
        } else {
            Some(self.max.min(ceiling))
        }
    }

    /// SSL 3.0 records are categorically refused once TLS 1.3 is enabled.
    pub fn spans_legacy_and_latest(&self) -> bool {
        self.min <= ProtocolVersion::LEGACY && self.max >= ProtocolVersion::LATEST
    }

    pub fn representable_in(&self, variant: TransportVariant) -> bool {
        self.min.to_wire(variant).is_some() && self.max.to_wire(variant).is_some()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}
