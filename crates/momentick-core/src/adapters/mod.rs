//! Quote gateway implementations.

mod static_gateway;
mod yahoo;

pub use static_gateway::StaticGateway;
pub use yahoo::YahooGateway;
