use crate::crypto::secret::HandshakeSecret;
use crate::error::{Error, Result};
use crate::handshake::HandshakeType;
use crate::tls::constants::FINISHED_LEN;
use ring::digest::{Context, SHA256};
use ring::hmac;

pub const CLIENT_FINISHED_LABEL: &[u8] = b"client finished";
pub const SERVER_FINISHED_LABEL: &[u8] = b"server finished";

/// Running hash of every handshake message of one handshake attempt.
///
/// Each side hashes the bytes it actually sent or received, so a hello
/// rewritten in flight leaves the two transcripts different.
pub struct TranscriptHash {
    context: Context,
}

impl TranscriptHash {
    pub fn new() -> Self {
        Self {
            context: Context::new(&SHA256),
        }
    }

    /// Adds one encoded handshake message, header included.
    pub fn update(&mut self, message_type: HandshakeType, encoded: &[u8]) {
        log::trace!("Transcript += {:?} ({} bytes)", message_type, encoded.len());
        self.context.update(encoded);
    }

    pub fn get_current_hash(&self) -> Vec<u8> {
        let digest = self.context.clone().finish();
        digest.as_ref().to_vec()
    }

    /// `HMAC-SHA256(secret, label || transcript_hash)` truncated to the
    /// Finished length.
    pub fn finished_verify_data(&self, secret: &HandshakeSecret, label: &[u8]) -> Vec<u8> {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let tag = hmac::sign(&key, &self.mac_input(label));
        tag.as_ref()[..FINISHED_LEN].to_vec()
    }

    /// Checks the peer's Finished against our own view of the transcript.
    pub fn verify_finished(
        &self,
        secret: &HandshakeSecret,
        label: &[u8],
        received: &[u8],
    ) -> Result<()> {
        let expected = self.finished_verify_data(secret, label);
        if received.len() != expected.len() {
            return Err(Error::BadHandshakeHash);
        }
        // Constant-time comparison
        ring::constant_time::verify_slices_are_equal(&expected, received)
            .map_err(|_| Error::BadHandshakeHash)
    }

    fn mac_input(&self, label: &[u8]) -> Vec<u8> {
        let mut input = label.to_vec();
        input.extend_from_slice(&self.get_current_hash());
        input
    }
}

impl Default for TranscriptHash {
    fn default() -> Self {
        Self::new()
    }
}
