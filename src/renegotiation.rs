use crate::error::NegotiationFailure;
use crate::state::HandshakeContext;
use crate::tls::types::Role;
use crate::version::{ProtocolVersion, VersionRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenegotiationState {
    NotNegotiated,
    /// A handshake (initial or renegotiated) has completed.
    InitialHandshakeComplete,
    /// This side asked for a new handshake and is waiting for it to start.
    RenegotiationRequested,
    RenegotiationInProgress,
    Rejected,
}

/// Renegotiation is only defined for versions below TLS 1.3.
pub fn renegotiation_permitted(established: ProtocolVersion) -> bool {
    established < ProtocolVersion::LATEST
}

/// Locally initiated renegotiation.
///
/// Fails before anything is sent when the connection is on TLS 1.3, when no
/// handshake has completed yet, or when one is already under way. On success
/// the optional new range is installed and preliminary info is cleared.
pub fn request_renegotiation(
    ctx: &mut HandshakeContext,
    new_range: Option<VersionRange>,
) -> Result<(), NegotiationFailure> {
    if ctx.renegotiation_state() != RenegotiationState::InitialHandshakeComplete {
        log::warn!(
            "{:?} cannot renegotiate in state {:?}",
            ctx.role(),
            ctx.renegotiation_state()
        );
        return Err(NegotiationFailure::RenegotiationNotAllowed);
    }
    match ctx.established_version() {
        Some(version) if renegotiation_permitted(version) => {}
        other => {
            log::warn!("{:?} refusing to renegotiate on {:?}", ctx.role(), other);
            return Err(NegotiationFailure::RenegotiationNotAllowed);
        }
    }

    if let Some(range) = new_range {
        ctx.reconfigure(range)?;
    }
    ctx.reset_preliminary_info();
    ctx.set_renegotiation_state(RenegotiationState::RenegotiationRequested);
    Ok(())
}

/// Gate for a renegotiation started by the peer, or the peer's answer to our
/// own request.
pub fn guard_incoming_renegotiation(ctx: &mut HandshakeContext) -> Result<(), NegotiationFailure> {
    match ctx.renegotiation_state() {
        RenegotiationState::RenegotiationRequested => {
            ctx.set_renegotiation_state(RenegotiationState::RenegotiationInProgress);
            Ok(())
        }
        RenegotiationState::InitialHandshakeComplete => match ctx.established_version() {
            Some(version) if renegotiation_permitted(version) => {
                ctx.reset_preliminary_info();
                ctx.set_renegotiation_state(RenegotiationState::RenegotiationInProgress);
                Ok(())
            }
            other => {
                log::warn!(
                    "{:?} rejecting peer renegotiation on {:?}",
                    ctx.role(),
                    other
                );
                ctx.set_renegotiation_state(RenegotiationState::Rejected);
                Err(NegotiationFailure::RenegotiationNotAllowed)
            }
        },
        state => {
            log::warn!("{:?} unexpected renegotiation in state {:?}", ctx.role(), state);
            Err(NegotiationFailure::RenegotiationNotAllowed)
        }
    }
}

/// Post-hoc check of the version a renegotiation resolved to.
///
/// The server refuses to move the connection onto TLS 1.3. The client refuses
/// TLS 1.3 and any version above the one already established.
pub fn validate_renegotiated_version(
    role: Role,
    established: ProtocolVersion,
    renegotiated: ProtocolVersion,
    peer_field: u16,
) -> Result<(), NegotiationFailure> {
    match role {
        Role::Server if !renegotiation_permitted(renegotiated) => {
            Err(NegotiationFailure::RenegotiationNotAllowed)
        }
        Role::Client if !renegotiation_permitted(renegotiated) || renegotiated > established => {
            Err(NegotiationFailure::UnsupportedVersion(peer_field))
        }
        _ => Ok(()),
    }
}
