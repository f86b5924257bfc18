//! Per-message version decisions.
//!
//! The guard takes one parsed event at a time and tells the handshake engine
//! whether to carry on or abort, and with which alert. It never touches the
//! wire itself.

use crate::alert::Alert;
use crate::downgrade::{self, DowngradeSentinel};
use crate::error::NegotiationFailure;
use crate::negotiate::{negotiate, NegotiationOutcome};
use crate::renegotiation::{
    guard_incoming_renegotiation, validate_renegotiated_version, RenegotiationState,
};
use crate::state::HandshakeContext;
use crate::tls::types::{AlertDescription, Role};
use crate::version::ProtocolVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardEvent<'a> {
    ClientHello { version: u16 },
    ServerHello { version: u16, random: &'a [u8] },
    HelloRequest,
    Alert(Alert),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Proceed(ProtocolVersion),
    /// Not a version decision; hand the alert to the alert handler as is.
    Forward(Alert),
    /// The peer asked for a new handshake and policy allows it.
    Rehandshake,
    /// HelloRequest that arrived mid-handshake; drop it.
    Ignore,
    Abort(AlertDescription, NegotiationFailure),
}

impl Verdict {
    fn abort(failure: NegotiationFailure) -> Self {
        Verdict::Abort(failure.alert(), failure)
    }
}

pub struct HandshakeVersionGuard;

impl HandshakeVersionGuard {
    pub fn process(ctx: &mut HandshakeContext, event: GuardEvent<'_>) -> Verdict {
        match (ctx.role(), event) {
            (_, GuardEvent::Alert(alert)) => {
                log::debug!("{:?} forwarding {:?} alert {:?}", ctx.role(), alert.level, alert.description);
                Verdict::Forward(alert)
            }
            (Role::Server, GuardEvent::ClientHello { version }) => {
                let verdict = Self::on_client_hello(ctx, version);
                Self::discard_on_abort(ctx, verdict)
            }
            (Role::Client, GuardEvent::ServerHello { version, random }) => {
                let verdict = Self::on_server_hello(ctx, version, random);
                Self::discard_on_abort(ctx, verdict)
            }
            (Role::Client, GuardEvent::HelloRequest) => Self::on_hello_request(ctx),
            (role, event) => {
                log::warn!("{:?} received message meant for its peer: {:?}", role, event);
                Verdict::Abort(
                    AlertDescription::UnexpectedMessage,
                    NegotiationFailure::IllegalParameter,
                )
            }
        }
    }

    /// Sentinel the server must stamp into its random for the version it just
    /// selected, if any.
    pub fn server_sentinel(ctx: &HandshakeContext) -> Option<DowngradeSentinel> {
        let negotiated = ctx.negotiated_version()?;
        DowngradeSentinel::encode(ctx.version_range().max(), negotiated)
    }

    /// A version that failed a later check must not outlive the attempt.
    fn discard_on_abort(ctx: &mut HandshakeContext, verdict: Verdict) -> Verdict {
        if let Verdict::Abort(_, failure) = verdict {
            if let Some(version) = ctx.negotiated_version() {
                log::debug!("Discarding {} after {}", version, failure);
                ctx.discard_negotiated();
            }
        }
        verdict
    }

    fn on_client_hello(ctx: &mut HandshakeContext, offered: u16) -> Verdict {
        if ctx.renegotiation_state() != RenegotiationState::NotNegotiated {
            if let Err(failure) = guard_incoming_renegotiation(ctx) {
                return Verdict::abort(failure);
            }
        }

        let version = match negotiate(ctx, offered) {
            NegotiationOutcome::Negotiated(version) => version,
            // An unreadable offer means the client and we share nothing.
            NegotiationOutcome::Failed(failure @ NegotiationFailure::UnsupportedVersion(_)) => {
                return Verdict::Abort(AlertDescription::HandshakeFailure, failure)
            }
            NegotiationOutcome::Failed(failure) => return Verdict::abort(failure),
        };

        if ctx.is_renegotiating() {
            if let Some(established) = ctx.established_version() {
                if let Err(failure) =
                    validate_renegotiated_version(Role::Server, established, version, offered)
                {
                    log::warn!("Refusing renegotiation to {}", version);
                    return Verdict::abort(failure);
                }
            }
        }

        Verdict::Proceed(version)
    }

    fn on_server_hello(ctx: &mut HandshakeContext, selected: u16, random: &[u8]) -> Verdict {
        if ctx.renegotiation_state() == RenegotiationState::RenegotiationRequested {
            if let Err(failure) = guard_incoming_renegotiation(ctx) {
                return Verdict::abort(failure);
            }
        }

        let version = match negotiate(ctx, selected).into_result() {
            Ok(version) => version,
            Err(failure) => return Verdict::abort(failure),
        };

        if ctx.is_renegotiating() {
            if let Some(established) = ctx.established_version() {
                if let Err(failure) =
                    validate_renegotiated_version(Role::Client, established, version, selected)
                {
                    log::warn!("Server moved renegotiation from {} to {}", established, version);
                    return Verdict::Abort(AlertDescription::IllegalParameter, failure);
                }
            }
        }

        if downgrade::check_downgrade(ctx, random).is_downgrade() {
            return Verdict::abort(NegotiationFailure::DowngradeDetected);
        }

        Verdict::Proceed(version)
    }

    fn on_hello_request(ctx: &mut HandshakeContext) -> Verdict {
        match ctx.renegotiation_state() {
            RenegotiationState::InitialHandshakeComplete => match guard_incoming_renegotiation(ctx) {
                Ok(()) => Verdict::Rehandshake,
                Err(failure) => Verdict::abort(failure),
            },
            state => {
                log::debug!("Ignoring HelloRequest in state {:?}", state);
                Verdict::Ignore
            }
        }
    }
}
