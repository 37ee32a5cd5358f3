//! Client for the external content-scoring oracle.

pub mod client;
pub mod error;
pub mod types;

pub use client::OracleClient;
pub use error::OracleError;
pub use types::{ContentRequest, OracleScore};
