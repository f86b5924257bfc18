//! Version selection.
//!
//! The selection rules are pure functions over explicit inputs; [`negotiate`]
//! is the only entry point that touches a [`HandshakeContext`].

use crate::error::NegotiationFailure;
use crate::state::HandshakeContext;
use crate::tls::types::{Role, TransportVariant};
use crate::version::{ProtocolVersion, VersionRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcome {
    Negotiated(ProtocolVersion),
    Failed(NegotiationFailure),
}

impl NegotiationOutcome {
    pub fn into_result(self) -> Result<ProtocolVersion, NegotiationFailure> {
        match self {
            NegotiationOutcome::Negotiated(version) => Ok(version),
            NegotiationOutcome::Failed(failure) => Err(failure),
        }
    }
}

impl From<Result<ProtocolVersion, NegotiationFailure>> for NegotiationOutcome {
    fn from(result: Result<ProtocolVersion, NegotiationFailure>) -> Self {
        match result {
            Ok(version) => NegotiationOutcome::Negotiated(version),
            Err(failure) => NegotiationOutcome::Failed(failure),
        }
    }
}

/// Server side: pick the highest local version not above the client's offer.
pub fn select_version(
    local: VersionRange,
    variant: TransportVariant,
    offered: u16,
) -> NegotiationOutcome {
    let Some(offered_version) = ProtocolVersion::from_wire(variant, offered) else {
        return NegotiationOutcome::Failed(NegotiationFailure::UnsupportedVersion(offered));
    };

    local
        .highest_at_most(offered_version)
        .ok_or(NegotiationFailure::NoCipherOverlap)
        .into()
}

/// Client side: accept the server's choice only if it falls inside our range.
pub fn accept_version(
    local: VersionRange,
    variant: TransportVariant,
    selected: u16,
) -> NegotiationOutcome {
    match ProtocolVersion::from_wire(variant, selected) {
        Some(version) if local.contains(version) => NegotiationOutcome::Negotiated(version),
        _ => NegotiationOutcome::Failed(NegotiationFailure::UnsupportedVersion(selected)),
    }
}

/// Runs the role-appropriate rule and records a successful result.
///
/// The context is only written on success, and only once per handshake
/// attempt; a second hello within the same attempt is an illegal parameter.
pub fn negotiate(ctx: &mut HandshakeContext, peer_version_field: u16) -> NegotiationOutcome {
    if let Some(existing) = ctx.negotiated_version() {
        log::warn!(
            "{:?} already negotiated {} in this attempt, refusing {:#06x}",
            ctx.role(),
            existing,
            peer_version_field
        );
        return NegotiationOutcome::Failed(NegotiationFailure::IllegalParameter);
    }

    let outcome = match ctx.role() {
        Role::Server => select_version(ctx.version_range(), ctx.variant(), peer_version_field),
        Role::Client => accept_version(ctx.version_range(), ctx.variant(), peer_version_field),
    };

    match outcome {
        NegotiationOutcome::Negotiated(version) => {
            log::debug!("{:?} negotiated {}", ctx.role(), version);
            ctx.record_negotiated(version);
        }
        NegotiationOutcome::Failed(failure) => {
            log::debug!(
                "{:?} failed to negotiate with peer version {:#06x}: {}",
                ctx.role(),
                peer_version_field,
                failure
            );
        }
    }
    outcome
}
