mod forwarder;
pub mod models;
pub mod transport;

pub use forwarder::{BatchOutcome, Delivery, Forwarder, Resource};
pub use transport::{HttpMethod, HttpTransport, OutboundRequest, Transport, TransportResponse};
