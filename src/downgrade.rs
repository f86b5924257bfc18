//! Downgrade protection carried in the server random.
//!
//! A server that negotiates below its own maximum overwrites the last eight
//! bytes of its random with a fixed marker naming the version it could have
//! used. A client that supports that version treats the marker as proof of
//! tampering. Independently, a client may carry a fallback ceiling: the
//! highest version it expects to reach, configured out of band.

use crate::state::HandshakeContext;
use crate::tls::constants::{
    DOWNGRADE_SENTINEL_LEN, DOWNGRADE_SENTINEL_TLS12, DOWNGRADE_SENTINEL_TLS13, RANDOM_LEN,
};
use crate::version::ProtocolVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DowngradeSentinel {
    advertised: ProtocolVersion,
}

impl DowngradeSentinel {
    /// Marker a server with `true_max` must send when it settles on `negotiated`.
    pub fn encode(true_max: ProtocolVersion, negotiated: ProtocolVersion) -> Option<Self> {
        if negotiated >= true_max {
            return None;
        }
        let advertised = if negotiated == ProtocolVersion::Tls12 {
            ProtocolVersion::Tls13
        } else if negotiated <= ProtocolVersion::Tls11 && true_max >= ProtocolVersion::Tls12 {
            ProtocolVersion::Tls12
        } else {
            return None;
        };
        Some(Self { advertised })
    }

    /// Recognises a marker in the trailing bytes of a random value.
    pub fn decode(random_tail: &[u8]) -> Option<Self> {
        if random_tail.len() < DOWNGRADE_SENTINEL_LEN {
            return None;
        }
        let tail = &random_tail[random_tail.len() - DOWNGRADE_SENTINEL_LEN..];
        if tail == DOWNGRADE_SENTINEL_TLS13 {
            Some(Self {
                advertised: ProtocolVersion::Tls13,
            })
        } else if tail == DOWNGRADE_SENTINEL_TLS12 {
            Some(Self {
                advertised: ProtocolVersion::Tls12,
            })
        } else {
            None
        }
    }

    /// Lowest version the sender claims to support.
    pub fn advertised_version(&self) -> ProtocolVersion {
        self.advertised
    }

    pub fn bytes(&self) -> [u8; DOWNGRADE_SENTINEL_LEN] {
        match self.advertised {
            ProtocolVersion::Tls13 => DOWNGRADE_SENTINEL_TLS13,
            _ => DOWNGRADE_SENTINEL_TLS12,
        }
    }

    pub fn stamp(&self, random: &mut [u8; RANDOM_LEN]) {
        random[RANDOM_LEN - DOWNGRADE_SENTINEL_LEN..].copy_from_slice(&self.bytes());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelVerdict {
    /// No known marker in the random.
    Absent,
    /// A marker is present but proves nothing for this client.
    Matched,
    /// The server could have reached a version we also support.
    Mismatched,
}

impl SentinelVerdict {
    pub fn is_downgrade(&self) -> bool {
        *self == SentinelVerdict::Mismatched
    }
}

/// Sentinel check against the client's own range maximum.
///
/// Clients whose maximum is TLS 1.1 or lower never see a marker they can act
/// on; tampering with them only surfaces through the Finished check.
pub fn check(
    negotiated: ProtocolVersion,
    local_max: ProtocolVersion,
    random_tail: &[u8],
) -> SentinelVerdict {
    match DowngradeSentinel::decode(random_tail) {
        None => SentinelVerdict::Absent,
        Some(sentinel) => {
            let advertised = sentinel.advertised_version();
            if advertised > negotiated && advertised <= local_max {
                SentinelVerdict::Mismatched
            } else {
                SentinelVerdict::Matched
            }
        }
    }
}

/// Fallback ceiling check: we settled below the version we expect to reach
/// and the server said it could do better.
pub fn violates_fallback_ceiling(
    negotiated: ProtocolVersion,
    ceiling: Option<ProtocolVersion>,
    random_tail: &[u8],
) -> bool {
    let Some(ceiling) = ceiling else {
        return false;
    };
    if negotiated >= ceiling {
        return false;
    }
    DowngradeSentinel::decode(random_tail)
        .map(|sentinel| sentinel.advertised_version() > negotiated)
        .unwrap_or(false)
}

/// Client-side downgrade verdict for the attempt in flight.
///
/// Runs the sentinel check and the fallback-ceiling check independently; either
/// firing yields [`SentinelVerdict::Mismatched`]. The verdict is recorded in
/// the context.
pub fn check_downgrade(ctx: &mut HandshakeContext, random_tail: &[u8]) -> SentinelVerdict {
    let Some(negotiated) = ctx.negotiated_version() else {
        log::warn!("Downgrade check requested before a version was negotiated");
        return SentinelVerdict::Absent;
    };

    let sentinel = check(negotiated, ctx.version_range().max(), random_tail);
    let fallback = violates_fallback_ceiling(negotiated, ctx.config().fallback_ceiling(), random_tail);

    let verdict = if fallback {
        log::warn!(
            "Negotiated {} below fallback ceiling {:?} while server signals more",
            negotiated,
            ctx.config().fallback_ceiling()
        );
        SentinelVerdict::Mismatched
    } else {
        sentinel
    };

    if verdict.is_downgrade() {
        log::warn!("Downgrade detected after negotiating {}", negotiated);
    } else {
        log::debug!("Downgrade sentinel verdict {:?} at {}", verdict, negotiated);
    }
    ctx.record_sentinel(verdict);
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::configure_version_range;
    use crate::tls::types::Role;
    use crate::version::VersionRange;
    use pretty_assertions::assert_eq;

    fn stamped(sentinel: Option<DowngradeSentinel>) -> [u8; RANDOM_LEN] {
        let mut random = [0xA5u8; RANDOM_LEN];
        if let Some(sentinel) = sentinel {
            sentinel.stamp(&mut random);
        }
        random
    }

    #[test]
    fn test_sentinel_bytes() {
        assert_eq!(hex::encode(DOWNGRADE_SENTINEL_TLS13), "444f574e47524401");
        assert_eq!(hex::encode(DOWNGRADE_SENTINEL_TLS12), "444f574e47524400");
        assert_eq!(&DOWNGRADE_SENTINEL_TLS13[..7], b"DOWNGRD");
    }

    #[test]
    fn test_encode_rules() {
        use ProtocolVersion::*;
        assert_eq!(DowngradeSentinel::encode(Tls13, Tls13), None);
        assert_eq!(
            DowngradeSentinel::encode(Tls13, Tls12).map(|s| s.advertised_version()),
            Some(Tls13)
        );
        assert_eq!(
            DowngradeSentinel::encode(Tls13, Tls11).map(|s| s.advertised_version()),
            Some(Tls12)
        );
        assert_eq!(
            DowngradeSentinel::encode(Tls12, Tls10).map(|s| s.advertised_version()),
            Some(Tls12)
        );
        assert_eq!(DowngradeSentinel::encode(Tls11, Tls10), None);
        assert_eq!(DowngradeSentinel::encode(Tls12, Tls12), None);
    }

    #[test]
    fn test_stamp_only_touches_tail() {
        let sentinel = DowngradeSentinel::encode(ProtocolVersion::Tls13, ProtocolVersion::Tls12);
        let random = stamped(sentinel);
        assert!(random[..RANDOM_LEN - DOWNGRADE_SENTINEL_LEN].iter().all(|b| *b == 0xA5));
        assert_eq!(DowngradeSentinel::decode(&random), sentinel);
    }

    #[test]
    fn test_decode_short_or_random_tail() {
        assert_eq!(DowngradeSentinel::decode(b"DOWNGR"), None);
        assert_eq!(DowngradeSentinel::decode(&[0u8; RANDOM_LEN]), None);
        assert_eq!(DowngradeSentinel::decode(b"DOWNGRD\x02"), None);
    }

    #[test]
    fn test_check_detects_intermediate_downgrade() {
        let random = stamped(DowngradeSentinel::encode(ProtocolVersion::Tls13, ProtocolVersion::Tls12));
        assert_eq!(
            check(ProtocolVersion::Tls12, ProtocolVersion::Tls13, &random),
            SentinelVerdict::Mismatched
        );
    }

    #[test]
    fn test_check_ignores_versions_client_cannot_use() {
        // A TLS 1.1 client cannot act on a TLS 1.2 marker.
        let random = stamped(DowngradeSentinel::encode(ProtocolVersion::Tls12, ProtocolVersion::Tls10));
        assert_eq!(
            check(ProtocolVersion::Tls10, ProtocolVersion::Tls11, &random),
            SentinelVerdict::Matched
        );
        assert_eq!(
            check(ProtocolVersion::Tls10, ProtocolVersion::Tls11, &stamped(None)),
            SentinelVerdict::Absent
        );
    }

    #[test]
    fn test_fallback_ceiling() {
        let tls12_marker = stamped(DowngradeSentinel::encode(ProtocolVersion::Tls12, ProtocolVersion::Tls11));
        assert!(violates_fallback_ceiling(
            ProtocolVersion::Tls11,
            Some(ProtocolVersion::Tls12),
            &tls12_marker
        ));
        assert!(!violates_fallback_ceiling(ProtocolVersion::Tls11, None, &tls12_marker));
        assert!(!violates_fallback_ceiling(
            ProtocolVersion::Tls12,
            Some(ProtocolVersion::Tls12),
            &tls12_marker
        ));
        assert!(!violates_fallback_ceiling(
            ProtocolVersion::Tls11,
            Some(ProtocolVersion::Tls13),
            &stamped(None)
        ));
    }

    #[test]
    fn test_check_downgrade_combines_both_checks() {
        // Client pinned to TLS 1.2 after a fallback retry, expecting TLS 1.3.
        let config = configure_version_range(
            Role::Client,
            VersionRange::single(ProtocolVersion::Tls12),
            Some(ProtocolVersion::Tls13),
        )
        .unwrap();
        let mut ctx = HandshakeContext::new(config);
        ctx.record_negotiated(ProtocolVersion::Tls12);

        let random = stamped(DowngradeSentinel::encode(ProtocolVersion::Tls13, ProtocolVersion::Tls12));
        // The range alone would not flag it.
        assert_eq!(
            check(ProtocolVersion::Tls12, ProtocolVersion::Tls12, &random),
            SentinelVerdict::Matched
        );
        assert_eq!(check_downgrade(&mut ctx, &random), SentinelVerdict::Mismatched);
        assert_eq!(ctx.last_sentinel(), Some(SentinelVerdict::Mismatched));
    }

    #[test]
    fn test_check_downgrade_without_negotiation() {
        let config = configure_version_range(Role::Client, VersionRange::DEFAULT_STREAM, None).unwrap();
        let mut ctx = HandshakeContext::new(config);
        assert_eq!(check_downgrade(&mut ctx, &DOWNGRADE_SENTINEL_TLS13), SentinelVerdict::Absent);
        assert_eq!(ctx.last_sentinel(), None);
    }
}
