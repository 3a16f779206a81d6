//! # docserve-http
//!
//! Transport-independent HTTP types shared by the docserve handler and server.
//!
//! - [`Request`] / [`Response`] - owned request and response values
//! - [`Handler`] - the async trait every request handler implements
//! - [`Error`] - the error type a handler may return

pub mod error;
pub mod handler;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use handler::Handler;
pub use request::Request;
pub use response::Response;
