use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret both endpoints derive Finished keys from. Key exchange lives
/// elsewhere; this only holds its output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HandshakeSecret {
    bytes: Vec<u8>,
}

impl HandshakeSecret {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for HandshakeSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeSecret")
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_bytes() {
        let secret = HandshakeSecret::new(vec![0xAB; 16]);
        let rendered = format!("{:?}", secret);
        assert_eq!(rendered, "HandshakeSecret { len: 16 }");
    }

    #[test]
    fn test_zeroize() {
        let mut secret = HandshakeSecret::new(vec![0xAB; 16]);
        secret.zeroize();
        assert!(secret.as_bytes().is_empty());
    }
}
