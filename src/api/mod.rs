//! Read-only query API over a minimal HTTP framing.
//!
//! [`responder::ApiResponder`] is transport-free and maps an
//! [`http::HttpRequest`] to an [`http::HttpResponse`]; [`server`] feeds it from
//! a TCP listener.

pub mod http;
pub mod openapi;
pub mod responder;
pub mod server;

pub use http::{HttpRequest, HttpResponse};
pub use responder::{clamp_limit, ApiResponder};
