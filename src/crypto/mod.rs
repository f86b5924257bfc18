use crate::error::{Error, Result};
use crate::tls::constants::RANDOM_LEN;
use ring::rand::{SecureRandom, SystemRandom};

pub mod secret;
pub mod transcript;

pub use secret::HandshakeSecret;
pub use transcript::TranscriptHash;

/// Fresh hello random from the system generator.
pub fn random_nonce(rng: &SystemRandom) -> Result<[u8; RANDOM_LEN]> {
    let mut random = [0u8; RANDOM_LEN];
    rng.fill(&mut random)
        .map_err(|_| Error::CryptoError("Failed to generate hello random".to_string()))?;
    Ok(random)
}
