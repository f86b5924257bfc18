//! Minimal handshake engine.
//!
//! Drives [`HandshakeVersionGuard`] over plaintext records so that version
//! negotiation, downgrade detection and renegotiation can be exercised end
//! to end. The flight structure is fixed: ClientHello, ServerHello, client
//! Finished, server Finished. Key exchange is replaced by a secret both
//! endpoints are given up front.

use ring::rand::SystemRandom;

use crate::alert::Alert;
use crate::config::EndpointConfig;
use crate::crypto::transcript::{CLIENT_FINISHED_LABEL, SERVER_FINISHED_LABEL};
use crate::crypto::{self, HandshakeSecret, TranscriptHash};
use crate::error::{Error, NegotiationFailure, Result};
use crate::guard::{GuardEvent, HandshakeVersionGuard, Verdict};
use crate::handshake::{
    ClientHello, Finished, HandshakeLayer, HandshakeMessage, HandshakePayload, HandshakeType,
    HelloRequest, ServerHello, read_hello_version_field, read_random_nonce,
};
use crate::record::{ContentType, RecordLayer};
use crate::renegotiation;
use crate::state::HandshakeContext;
use crate::tls::constants::{
    DOWNGRADE_SENTINEL_LEN, INITIAL_RECORD_VERSION_DATAGRAM, INITIAL_RECORD_VERSION_STREAM,
    RANDOM_LEN,
};
use crate::tls::types::{AlertDescription, Role, TransportVariant};
use crate::version::{ProtocolVersion, VersionRange};

/// Cipher suites offered by the client; the server takes the first.
pub const DEFAULT_CIPHER_SUITES: [u16; 2] = [0xC02F, 0x002F];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    Idle,
    AwaitClientHello,
    AwaitServerHello,
    AwaitClientFinished,
    AwaitServerFinished,
    Connected,
    Failed,
}

pub struct Endpoint {
    ctx: HandshakeContext,
    records: RecordLayer,
    handshake: HandshakeLayer,
    transcript: TranscriptHash,
    secret: HandshakeSecret,
    rng: SystemRandom,
    phase: HandshakePhase,
    outbound: Vec<u8>,
    error: Option<Error>,
}

impl Endpoint {
    pub fn new(config: EndpointConfig, secret: HandshakeSecret) -> Self {
        Self {
            records: RecordLayer::new(config.variant()),
            ctx: HandshakeContext::new(config),
            handshake: HandshakeLayer::new(),
            transcript: TranscriptHash::new(),
            secret,
            rng: SystemRandom::new(),
            phase: HandshakePhase::Idle,
            outbound: Vec::new(),
            error: None,
        }
    }

    pub fn role(&self) -> Role {
        self.ctx.role()
    }

    pub fn context(&self) -> &HandshakeContext {
        &self.ctx
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.phase == HandshakePhase::Connected
    }

    pub fn negotiated_version(&self) -> Option<ProtocolVersion> {
        self.ctx.negotiated_version()
    }

    /// First error that ended the connection, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Bytes queued for the peer since the last call.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }

    /// Begins the initial handshake. Clients queue their ClientHello.
    pub fn start(&mut self) -> Result<()> {
        if self.phase != HandshakePhase::Idle {
            return Err(Error::ProtocolError(format!(
                "Cannot start handshake in phase {:?}",
                self.phase
            )));
        }
        match self.role() {
            Role::Client => self.send_client_hello(),
            Role::Server => {
                self.phase = HandshakePhase::AwaitClientHello;
                Ok(())
            }
        }
    }

    /// Replaces the configured range. Only allowed between handshakes.
    pub fn set_version_range(&mut self, range: VersionRange) -> Result<()> {
        match self.phase {
            HandshakePhase::Idle | HandshakePhase::Connected => {
                self.ctx.reconfigure(range)?;
                Ok(())
            }
            phase => Err(Error::ProtocolError(format!(
                "Cannot change version range in phase {:?}",
                phase
            ))),
        }
    }

    /// Starts a renegotiation from this side.
    ///
    /// Fails without emitting anything when policy forbids it; the connection
    /// stays usable in that case.
    pub fn rehandshake(&mut self, new_range: Option<VersionRange>) -> Result<()> {
        if self.phase != HandshakePhase::Connected {
            return Err(Error::ProtocolError(format!(
                "Cannot renegotiate in phase {:?}",
                self.phase
            )));
        }
        renegotiation::request_renegotiation(&mut self.ctx, new_range)?;

        match self.role() {
            Role::Client => self.send_client_hello(),
            Role::Server => {
                self.send_handshake(&HelloRequest)?;
                self.phase = HandshakePhase::AwaitClientHello;
                Ok(())
            }
        }
    }

    pub fn receive(&mut self, data: &[u8]) -> Result<()> {
        if self.phase == HandshakePhase::Failed {
            return Err(self
                .error
                .clone()
                .unwrap_or_else(|| Error::ProtocolError("Connection failed".to_string())));
        }

        match self.process_records(data) {
            Ok(()) => Ok(()),
            Err(e) if self.phase == HandshakePhase::Failed => Err(e),
            Err(e) => Err(self.abort(AlertDescription::DecodeError, e)),
        }
    }

    fn process_records(&mut self, data: &[u8]) -> Result<()> {
        let records = self.records.process_records(data)?;

        for record in records {
            if self.phase == HandshakePhase::Failed {
                break;
            }
            match record.content_type {
                ContentType::Alert => {
                    let alert = Alert::parse(record.fragment, &mut 0)?;
                    self.handle_alert(alert)?;
                }
                ContentType::Handshake => {
                    let mut pos = 0;
                    while pos < record.fragment.len() && self.phase != HandshakePhase::Failed {
                        let (message, consumed) =
                            self.handshake.parse_handshake_message(&record.fragment[pos..])?;
                        let encoded = &record.fragment[pos..pos + consumed];
                        self.handle_handshake(message, encoded)?;
                        pos += consumed;
                    }
                }
                other => {
                    log::debug!("Ignoring {:?} record during handshake", other);
                }
            }
        }

        Ok(())
    }

    fn handle_alert(&mut self, alert: Alert) -> Result<()> {
        let alert = match HandshakeVersionGuard::process(&mut self.ctx, GuardEvent::Alert(alert)) {
            Verdict::Forward(alert) => alert,
            other => {
                return Err(Error::ProtocolError(format!(
                    "Unexpected verdict {:?} for alert",
                    other
                )))
            }
        };

        if !alert.is_fatal() {
            log::warn!("{:?} received warning alert {:?}", self.role(), alert.description);
            return Ok(());
        }

        let error = match alert.description {
            AlertDescription::HandshakeFailure | AlertDescription::ProtocolVersion
                if self.phase == HandshakePhase::AwaitServerHello =>
            {
                Error::Negotiation(NegotiationFailure::NoCipherOverlap)
            }
            AlertDescription::IllegalParameter => {
                Error::Negotiation(NegotiationFailure::IllegalParameter)
            }
            description => Error::AlertReceived(description),
        };
        log::warn!("{:?} received fatal alert {:?}", self.role(), alert.description);
        self.ctx.discard_negotiated();
        self.phase = HandshakePhase::Failed;
        self.error = Some(error.clone());
        Err(error)
    }

    fn handle_handshake(&mut self, message: HandshakePayload, encoded: &[u8]) -> Result<()> {
        match (self.role(), self.phase, message) {
            (Role::Server, HandshakePhase::AwaitClientHello | HandshakePhase::Connected, HandshakePayload::ClientHello(hello)) => {
                self.on_client_hello(hello, encoded)
            }
            (Role::Client, HandshakePhase::AwaitServerHello, HandshakePayload::ServerHello(hello)) => {
                self.on_server_hello(hello, encoded)
            }
            (Role::Server, HandshakePhase::AwaitClientFinished, HandshakePayload::Finished(finished)) => {
                self.on_client_finished(finished, encoded)
            }
            (Role::Client, HandshakePhase::AwaitServerFinished, HandshakePayload::Finished(finished)) => {
                self.on_server_finished(finished)
            }
            (Role::Client, _, HandshakePayload::HelloRequest) => {
                match HandshakeVersionGuard::process(&mut self.ctx, GuardEvent::HelloRequest) {
                    Verdict::Rehandshake => self.send_client_hello(),
                    Verdict::Abort(alert, failure) => Err(self.abort(alert, failure.into())),
                    _ => Ok(()),
                }
            }
            (role, phase, message) => Err(self.abort(
                AlertDescription::UnexpectedMessage,
                Error::ProtocolError(format!(
                    "{:?} got unexpected {:?} in phase {:?}",
                    role, message, phase
                )),
            )),
        }
    }

    fn on_client_hello(&mut self, hello: ClientHello, encoded: &[u8]) -> Result<()> {
        self.transcript = TranscriptHash::new();

        let event = GuardEvent::ClientHello {
            version: read_hello_version_field(encoded)?,
        };
        let version = match HandshakeVersionGuard::process(&mut self.ctx, event) {
            Verdict::Proceed(version) => version,
            Verdict::Abort(alert, failure) => return Err(self.abort(alert, failure.into())),
            other => {
                return Err(Error::ProtocolError(format!(
                    "Unexpected verdict {:?} for ClientHello",
                    other
                )))
            }
        };
        self.transcript.update(hello.message_type(), encoded);

        let suite = match hello.cipher_suites.first() {
            Some(suite) => *suite,
            None => {
                return Err(self.abort(
                    AlertDescription::HandshakeFailure,
                    Error::ProtocolError("ClientHello offered no cipher suites".to_string()),
                ))
            }
        };
        self.ctx.set_cipher_suite(suite);

        let mut random = crypto::random_nonce(&self.rng)?;
        if let Some(sentinel) = HandshakeVersionGuard::server_sentinel(&self.ctx) {
            log::debug!(
                "Stamping downgrade sentinel for {} into server random",
                sentinel.advertised_version()
            );
            sentinel.stamp(&mut random);
        }

        let server_hello = ServerHello::new(
            self.wire_version(version)?,
            random,
            hello.session_id,
            suite,
        )?;
        self.send_handshake(&server_hello)?;
        self.phase = HandshakePhase::AwaitClientFinished;
        Ok(())
    }

    fn on_server_hello(&mut self, hello: ServerHello, encoded: &[u8]) -> Result<()> {
        let random = read_random_nonce(encoded)?;
        let event = GuardEvent::ServerHello {
            version: read_hello_version_field(encoded)?,
            random: &random[RANDOM_LEN - DOWNGRADE_SENTINEL_LEN..],
        };
        match HandshakeVersionGuard::process(&mut self.ctx, event) {
            Verdict::Proceed(_) => {}
            Verdict::Abort(alert, failure) => return Err(self.abort(alert, failure.into())),
            other => {
                return Err(Error::ProtocolError(format!(
                    "Unexpected verdict {:?} for ServerHello",
                    other
                )))
            }
        }

        if !DEFAULT_CIPHER_SUITES.contains(&hello.cipher_suite) {
            return Err(self.abort(
                AlertDescription::IllegalParameter,
                Error::ProtocolError(format!(
                    "Server selected unoffered cipher suite {:#06x}",
                    hello.cipher_suite
                )),
            ));
        }
        self.ctx.set_cipher_suite(hello.cipher_suite);
        self.transcript.update(hello.message_type(), encoded);

        let verify_data = self
            .transcript
            .finished_verify_data(&self.secret, CLIENT_FINISHED_LABEL);
        self.send_handshake(&Finished::new(verify_data))?;
        self.phase = HandshakePhase::AwaitServerFinished;
        Ok(())
    }

    fn on_client_finished(&mut self, finished: Finished, encoded: &[u8]) -> Result<()> {
        if let Err(e) =
            self.transcript
                .verify_finished(&self.secret, CLIENT_FINISHED_LABEL, &finished.verify_data)
        {
            return Err(self.abort(AlertDescription::DecryptError, e));
        }
        self.transcript.update(finished.message_type(), encoded);

        let verify_data = self
            .transcript
            .finished_verify_data(&self.secret, SERVER_FINISHED_LABEL);
        self.send_handshake(&Finished::new(verify_data))?;
        self.complete();
        Ok(())
    }

    fn on_server_finished(&mut self, finished: Finished) -> Result<()> {
        if let Err(e) =
            self.transcript
                .verify_finished(&self.secret, SERVER_FINISHED_LABEL, &finished.verify_data)
        {
            return Err(self.abort(AlertDescription::DecryptError, e));
        }
        self.complete();
        Ok(())
    }

    fn complete(&mut self) {
        self.ctx.complete_handshake();
        self.phase = HandshakePhase::Connected;
        log::debug!(
            "{:?} handshake complete at {:?}",
            self.role(),
            self.ctx.established_version()
        );
    }

    fn send_client_hello(&mut self) -> Result<()> {
        self.transcript = TranscriptHash::new();

        let offered = self.wire_version(self.ctx.version_range().max())?;
        let random = crypto::random_nonce(&self.rng)?;
        let hello = ClientHello::new(offered, random, Vec::new(), DEFAULT_CIPHER_SUITES.to_vec())?;

        self.send_handshake(&hello)?;
        self.phase = HandshakePhase::AwaitServerHello;
        Ok(())
    }

    fn send_handshake<M: HandshakeMessage>(&mut self, message: &M) -> Result<()> {
        let encoded = message.encode()?;
        if !matches!(message.message_type(), HandshakeType::HelloRequest) {
            self.transcript.update(message.message_type(), &encoded);
        }
        let record = self
            .records
            .write_record(ContentType::Handshake, self.record_version(), &encoded)?;
        self.outbound.extend_from_slice(&record);
        Ok(())
    }

    fn send_alert(&mut self, alert: Alert) -> Result<()> {
        let record = self
            .records
            .write_record(ContentType::Alert, self.record_version(), &alert.serialize())?;
        self.outbound.extend_from_slice(&record);
        Ok(())
    }

    /// Sends a fatal alert and poisons the connection. The alert is framed
    /// before the failed attempt's version is discarded. Returns the error to
    /// report locally.
    fn abort(&mut self, alert: AlertDescription, error: Error) -> Error {
        log::warn!(
            "{:?} aborting handshake with {:?}: {}",
            self.role(),
            alert,
            error
        );
        if let Err(e) = self.send_alert(Alert::fatal(alert)) {
            log::warn!("Failed to queue {:?} alert: {}", alert, e);
        }
        self.ctx.discard_negotiated();
        self.phase = HandshakePhase::Failed;
        self.error = Some(error.clone());
        error
    }

    fn record_version(&self) -> u16 {
        let variant = self.ctx.variant();
        self.ctx
            .negotiated_version()
            .and_then(|version| version.to_wire(variant))
            .unwrap_or(match variant {
                TransportVariant::Stream => INITIAL_RECORD_VERSION_STREAM,
                TransportVariant::Datagram => INITIAL_RECORD_VERSION_DATAGRAM,
            })
    }

    fn wire_version(&self, version: ProtocolVersion) -> Result<u16> {
        version.to_wire(self.ctx.variant()).ok_or_else(|| {
            Error::ProtocolError(format!(
                "{} has no {:?} encoding",
                version,
                self.ctx.variant()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::configure_version_range;

    fn endpoint(role: Role) -> Endpoint {
        let config = configure_version_range(role, VersionRange::DEFAULT_STREAM, None).unwrap();
        Endpoint::new(config, HandshakeSecret::new(vec![7; 32]))
    }

    #[test]
    fn test_client_start_queues_hello() {
        let mut client = endpoint(Role::Client);
        client.start().unwrap();
        assert_eq!(client.phase(), HandshakePhase::AwaitServerHello);

        let output = client.take_output();
        assert_eq!(output[0], ContentType::Handshake as u8);
        assert!(client.take_output().is_empty());
        assert!(client.start().is_err());
    }

    #[test]
    fn test_server_start_waits() {
        let mut server = endpoint(Role::Server);
        server.start().unwrap();
        assert_eq!(server.phase(), HandshakePhase::AwaitClientHello);
        assert!(server.take_output().is_empty());
    }

    #[test]
    fn test_garbage_aborts_with_decode_error() {
        let mut server = endpoint(Role::Server);
        server.start().unwrap();
        assert!(server.receive(&[22, 0x03, 0x01, 0x00, 0x01, 0xFF]).is_err());
        assert_eq!(server.phase(), HandshakePhase::Failed);

        let output = server.take_output();
        assert_eq!(&output[output.len() - 2..], &[2, u8::from(AlertDescription::DecodeError)]);
        // Stays failed
        assert!(server.receive(&[]).is_err());
    }

    #[test]
    fn test_rehandshake_requires_connection() {
        let mut client = endpoint(Role::Client);
        assert!(matches!(
            client.rehandshake(None),
            Err(Error::ProtocolError(_))
        ));
    }
}
