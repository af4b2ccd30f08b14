pub mod gh;
pub mod graphql;
pub mod transport;

pub use gh::GhTransport;
pub use graphql::{extract_data, GraphQlRequest};
pub use transport::{Transport, TransportResponse};
