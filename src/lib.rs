pub mod alert;
pub mod config;
pub mod connection;
pub mod crypto;
pub mod downgrade;
pub mod error;
pub mod guard;
pub mod handshake;
pub mod negotiate;
pub mod record;
pub mod renegotiation;
pub mod state;
pub mod tls;
pub mod utils;
pub mod version;

pub use alert::Alert;
pub use config::{configure_version_range, EndpointConfig, EndpointParams};
pub use connection::{Endpoint, HandshakePhase};
pub use crypto::HandshakeSecret;
pub use downgrade::{check_downgrade, DowngradeSentinel, SentinelVerdict};
pub use error::{Error, NegotiationFailure, Result};
pub use guard::{GuardEvent, HandshakeVersionGuard, Verdict};
pub use negotiate::{negotiate, NegotiationOutcome};
pub use renegotiation::{
    guard_incoming_renegotiation, request_renegotiation, validate_renegotiated_version,
    RenegotiationState,
};
pub use state::HandshakeContext;
pub use tls::types::{AlertDescription, AlertLevel, Role, TransportVariant};
pub use version::{ProtocolVersion, VersionRange};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn init_logging() {
    let _ = env_logger::builder().try_init();
}
