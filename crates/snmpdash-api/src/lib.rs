// snmpdash-api: Async Rust client for the snmpdash backend (REST pull + STOMP push)

pub mod channel;
pub mod envelope;
pub mod error;
pub mod http;
pub mod models;
pub mod reconnect;
pub mod stomp;
pub mod transport;

pub use channel::{ChannelConfig, StompChannel};
pub use envelope::{EnvelopeData, InboundEnvelope, MessageType, Topic};
pub use error::Error;
pub use http::MetricsClient;
pub use models::{SignUpRequest, TelemetryRecord};
pub use transport::{TlsMode, TransportConfig};
