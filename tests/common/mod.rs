#![allow(dead_code)]

use tls_version_guard::handshake::overwrite_hello_version_field;
use tls_version_guard::record::{ContentType, RecordLayer};
use tls_version_guard::{
    Endpoint, EndpointConfig, EndpointParams, Error, HandshakeSecret, ProtocolVersion, Role,
    TransportVariant, VersionRange,
};

pub fn range(min: ProtocolVersion, max: ProtocolVersion) -> VersionRange {
    VersionRange::new(min, max).unwrap()
}

pub fn config(
    role: Role,
    variant: TransportVariant,
    version_range: Option<VersionRange>,
    fallback_ceiling: Option<ProtocolVersion>,
) -> EndpointConfig {
    tls_version_guard::init_logging();
    EndpointConfig::new(EndpointParams {
        role,
        variant,
        version_range,
        fallback_ceiling,
    })
    .unwrap()
}

/// Rewrites every client flight before the server sees it.
pub type Filter = Box<dyn FnMut(&[u8]) -> Vec<u8>>;

pub struct Pair {
    pub client: Endpoint,
    pub server: Endpoint,
    pub variant: TransportVariant,
    filter: Option<Filter>,
}

impl Pair {
    pub fn new(variant: TransportVariant) -> Self {
        Self::with_configs(
            config(Role::Client, variant, None, None),
            config(Role::Server, variant, None, None),
        )
    }

    pub fn with_ranges(variant: TransportVariant, client: VersionRange, server: VersionRange) -> Self {
        Self::with_configs(
            config(Role::Client, variant, Some(client), None),
            config(Role::Server, variant, Some(server), None),
        )
    }

    pub fn with_configs(client: EndpointConfig, server: EndpointConfig) -> Self {
        let secret = HandshakeSecret::new(b"shared handshake secret for tests".to_vec());
        let variant = client.variant();
        Self {
            client: Endpoint::new(client, secret.clone()),
            server: Endpoint::new(server, secret),
            variant,
            filter: None,
        }
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = Some(filter);
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    pub fn start(&mut self) {
        self.client.start().unwrap();
        self.server.start().unwrap();
    }

    /// Shuttles queued bytes between the two endpoints until both go quiet.
    /// Receive errors are left on the endpoints for the test to inspect.
    pub fn run(&mut self) {
        for _ in 0..16 {
            let mut to_server = self.client.take_output();
            if let Some(filter) = self.filter.as_mut() {
                if !to_server.is_empty() {
                    to_server = filter(&to_server);
                }
            }
            let to_client = self.server.take_output();
            if to_server.is_empty() && to_client.is_empty() {
                return;
            }
            if !to_server.is_empty() {
                let _ = self.server.receive(&to_server);
            }
            if !to_client.is_empty() {
                let _ = self.client.receive(&to_client);
            }
        }
        panic!("endpoints never went quiet");
    }

    pub fn connect(&mut self) {
        self.start();
        self.run();
    }

    pub fn assert_connected(&self, version: ProtocolVersion) {
        assert!(self.client.is_connected(), "client: {:?}", self.client.error());
        assert!(self.server.is_connected(), "server: {:?}", self.server.error());
        assert_eq!(self.client.negotiated_version(), Some(version));
        assert_eq!(self.server.negotiated_version(), Some(version));
    }

    pub fn client_error(&self) -> Option<Error> {
        self.client.error().cloned()
    }

    pub fn server_error(&self) -> Option<Error> {
        self.server.error().cloned()
    }
}

/// Filter that rewrites the version field of any ClientHello in a flight.
pub fn rewrite_client_hello_version(variant: TransportVariant, version: u16) -> Filter {
    Box::new(move |data: &[u8]| {
        let parser = RecordLayer::new(variant);
        let mut writer = RecordLayer::new(variant);
        let mut out = Vec::new();
        for record in parser.process_records(data).unwrap() {
            let mut fragment = record.fragment.to_vec();
            if record.content_type == ContentType::Handshake && fragment.first() == Some(&1) {
                overwrite_hello_version_field(&mut fragment, version).unwrap();
            }
            out.extend(
                writer
                    .write_record(record.content_type, record.version, &fragment)
                    .unwrap(),
            );
        }
        out
    })
}
