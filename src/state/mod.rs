use crate::config::EndpointConfig;
use crate::downgrade::SentinelVerdict;
use crate::error::NegotiationFailure;
use crate::renegotiation::RenegotiationState;
use crate::tls::types::{Role, TransportVariant};
use crate::version::{ProtocolVersion, VersionRange};

/// Connection-scoped version state.
///
/// Owned by exactly one connection and mutated only by the negotiator and the
/// renegotiation policy; no locking.
#[derive(Debug, Clone)]
pub struct HandshakeContext {
    config: EndpointConfig,
    negotiated_version: Option<ProtocolVersion>,
    established_version: Option<ProtocolVersion>,
    cipher_suite: Option<u16>,
    renegotiation: RenegotiationState,
    last_sentinel: Option<SentinelVerdict>,
}

impl HandshakeContext {
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            negotiated_version: None,
            established_version: None,
            cipher_suite: None,
            renegotiation: RenegotiationState::NotNegotiated,
            last_sentinel: None,
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn role(&self) -> Role {
        self.config.role()
    }

    pub fn variant(&self) -> TransportVariant {
        self.config.variant()
    }

    pub fn version_range(&self) -> VersionRange {
        self.config.version_range()
    }

    /// Version chosen by the attempt in flight (or the last completed one).
    pub fn negotiated_version(&self) -> Option<ProtocolVersion> {
        self.negotiated_version
    }

    /// Version of the last handshake that ran to completion.
    pub fn established_version(&self) -> Option<ProtocolVersion> {
        self.established_version
    }

    pub fn cipher_suite(&self) -> Option<u16> {
        self.cipher_suite
    }

    pub fn set_cipher_suite(&mut self, suite: u16) {
        self.cipher_suite = Some(suite);
    }

    pub fn renegotiation_state(&self) -> RenegotiationState {
        self.renegotiation
    }

    pub fn last_sentinel(&self) -> Option<SentinelVerdict> {
        self.last_sentinel
    }

    pub fn is_renegotiating(&self) -> bool {
        matches!(
            self.renegotiation,
            RenegotiationState::RenegotiationRequested | RenegotiationState::RenegotiationInProgress
        )
    }

    /// Swaps in a new range between handshakes.
    pub fn reconfigure(&mut self, range: VersionRange) -> Result<(), NegotiationFailure> {
        self.config = self.config.with_version_range(range)?;
        log::debug!("{:?} version range now {}", self.role(), range);
        Ok(())
    }

    /// Marks the attempt in flight as finished and pins its version.
    pub fn complete_handshake(&mut self) {
        self.established_version = self.negotiated_version;
        self.renegotiation = RenegotiationState::InitialHandshakeComplete;
    }

    /// Drops everything learned by the previous attempt except the
    /// established version, so stale values cannot satisfy the next checks.
    pub fn reset_preliminary_info(&mut self) {
        self.negotiated_version = None;
        self.cipher_suite = None;
        self.last_sentinel = None;
    }

    /// Forgets the version and suite of an attempt that was aborted. The
    /// sentinel verdict stays readable as the reason for the abort.
    pub(crate) fn discard_negotiated(&mut self) {
        self.negotiated_version = None;
        self.cipher_suite = None;
    }

    pub(crate) fn record_negotiated(&mut self, version: ProtocolVersion) {
        self.negotiated_version = Some(version);
    }

    pub(crate) fn record_sentinel(&mut self, verdict: SentinelVerdict) {
        self.last_sentinel = Some(verdict);
    }

    pub(crate) fn set_renegotiation_state(&mut self, state: RenegotiationState) {
        log::debug!(
            "{:?} renegotiation state {:?} -> {:?}",
            self.role(),
            self.renegotiation,
            state
        );
        self.renegotiation = state;
    }
}
