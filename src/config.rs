use crate::error::NegotiationFailure;
use crate::tls::types::{Role, TransportVariant};
use crate::version::{ProtocolVersion, VersionRange};

/// Caller-facing knobs, validated into an [`EndpointConfig`].
#[derive(Debug, Clone, Copy)]
pub struct EndpointParams {
    pub role: Role,
    pub variant: TransportVariant,
    pub version_range: Option<VersionRange>,
    /// Highest version this endpoint ever expects to negotiate, configured out
    /// of band. Used to catch fallback retries that step below it.
    pub fallback_ceiling: Option<ProtocolVersion>,
}

impl Default for EndpointParams {
    fn default() -> Self {
        Self {
            role: Role::Client,
            variant: TransportVariant::Stream,
            version_range: None,
            fallback_ceiling: None,
        }
    }
}

/// Validated, immutable endpoint configuration.
///
/// A config that exists has already passed every range rule, so nothing
/// downstream re-checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    role: Role,
    variant: TransportVariant,
    range: VersionRange,
    fallback_ceiling: Option<ProtocolVersion>,
}

impl EndpointConfig {
    pub fn new(params: EndpointParams) -> Result<Self, NegotiationFailure> {
        let range = params
            .version_range
            .unwrap_or_else(|| VersionRange::default_for(params.variant));
        validate_range(params.variant, range)?;

        Ok(Self {
            role: params.role,
            variant: params.variant,
            range,
            fallback_ceiling: params.fallback_ceiling,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn variant(&self) -> TransportVariant {
        self.variant
    }

    pub fn version_range(&self) -> VersionRange {
        self.range
    }

    pub fn fallback_ceiling(&self) -> Option<ProtocolVersion> {
        self.fallback_ceiling
    }

    /// Returns a copy with a different range, validated against the same rules.
    pub fn with_version_range(&self, range: VersionRange) -> Result<Self, NegotiationFailure> {
        validate_range(self.variant, range)?;
        Ok(Self { range, ..*self })
    }
}

/// Builds a stream-transport config for `role`.
pub fn configure_version_range(
    role: Role,
    range: VersionRange,
    fallback_ceiling: Option<ProtocolVersion>,
) -> Result<EndpointConfig, NegotiationFailure> {
    EndpointConfig::new(EndpointParams {
        role,
        version_range: Some(range),
        fallback_ceiling,
        ..EndpointParams::default()
    })
}

fn validate_range(variant: TransportVariant, range: VersionRange) -> Result<(), NegotiationFailure> {
    if range.spans_legacy_and_latest() || !range.representable_in(variant) {
        log::warn!("Rejecting version range {} for {:?} transport", range, variant);
        return Err(NegotiationFailure::IncompatibleRange {
            min: range.min(),
            max: range.max(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ranges() {
        let stream = EndpointConfig::new(EndpointParams::default()).unwrap();
        assert_eq!(stream.version_range(), VersionRange::DEFAULT_STREAM);

        let datagram = EndpointConfig::new(EndpointParams {
            variant: TransportVariant::Datagram,
            ..EndpointParams::default()
        })
        .unwrap();
        assert_eq!(datagram.version_range(), VersionRange::DEFAULT_DATAGRAM);
    }

    #[test]
    fn test_ssl3_with_tls13_rejected_for_both_roles() {
        let range = VersionRange::new(ProtocolVersion::Ssl30, ProtocolVersion::Tls13).unwrap();
        for role in [Role::Client, Role::Server] {
            assert_eq!(
                configure_version_range(role, range, None),
                Err(NegotiationFailure::IncompatibleRange {
                    min: ProtocolVersion::Ssl30,
                    max: ProtocolVersion::Tls13,
                })
            );
        }
    }

    #[test]
    fn test_ssl3_without_tls13_accepted() {
        let range = VersionRange::new(ProtocolVersion::Ssl30, ProtocolVersion::Tls12).unwrap();
        let config = configure_version_range(Role::Server, range, None).unwrap();
        assert_eq!(config.version_range(), range);
        assert_eq!(config.role(), Role::Server);
    }

    #[test]
    fn test_datagram_rejects_tls10() {
        let range = VersionRange::new(ProtocolVersion::Tls10, ProtocolVersion::Tls12).unwrap();
        let result = EndpointConfig::new(EndpointParams {
            variant: TransportVariant::Datagram,
            version_range: Some(range),
            ..EndpointParams::default()
        });
        assert!(matches!(result, Err(NegotiationFailure::IncompatibleRange { .. })));
    }

    #[test]
    fn test_with_version_range_keeps_other_fields() {
        let config = configure_version_range(
            Role::Client,
            VersionRange::DEFAULT_STREAM,
            Some(ProtocolVersion::Tls13),
        )
        .unwrap();
        let narrowed = config
            .with_version_range(VersionRange::single(ProtocolVersion::Tls12))
            .unwrap();
        assert_eq!(narrowed.fallback_ceiling(), Some(ProtocolVersion::Tls13));
        assert_eq!(narrowed.role(), Role::Client);

        let bad = VersionRange::new(ProtocolVersion::Ssl30, ProtocolVersion::Tls13).unwrap();
        assert!(config.with_version_range(bad).is_err());
    }
}
