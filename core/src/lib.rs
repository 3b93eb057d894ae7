//! Conversation core of IETE Bot: bounded session history, request
//! composition, streamed answer aggregation and error classification.

mod aggregator;
pub mod config;
mod conversation;
pub mod error;
mod persona;
mod session;

pub use aggregator::StreamAggregator;
pub use aggregator::StreamResult;
pub use config::Config;
pub use config::ConfigOverrides;
pub use conversation::ComposedRequest;
pub use conversation::Conversation;
pub use conversation::UserInput;
pub use error::ChatError;
pub use persona::Persona;
pub use session::Session;

pub use iete_api::AspectRatio;
pub use iete_api::ReqwestTransport;
pub use iete_protocol::models::Citation;
pub use iete_protocol::models::Media;
pub use iete_protocol::models::Part;
pub use iete_protocol::models::Role;
pub use iete_protocol::models::Turn;
