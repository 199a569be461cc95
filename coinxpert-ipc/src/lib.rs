//! Request/response boundary for the CoinXpert selection engine
//!
//! Decodes selection requests, runs the comparison harness and encodes the
//! result together with a status code. Transport is left to the caller.

pub mod handler;
pub mod messages;

pub use handler::RequestHandler;
pub use messages::{ErrorResponse, SelectionRequest, SelectionResponse, ValueModel};
