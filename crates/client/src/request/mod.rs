//! Request helper.
//!
//! [`Transport`] is the HTTP seam. [`ApiClient`] encodes bodies, enforces
//! timeouts and normalizes failures into [`RequestError`]; [`Exchange`]
//! layers the success/failure/always contract, button locking and alert
//! routing on top.

use std::fmt::{Display, Formatter, Result as FmtResult};

use futures::future::LocalBoxFuture;
use mockall::automock;

mod body;
mod client;
mod error;

pub use body::*;
pub use client::*;
pub use error::*;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

/// A fully encoded request, ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,

    /// Explicit `Content-Type` header. Multipart bodies leave this to the
    /// transport, which has to add the boundary.
    pub content_type: Option<String>,

    pub body: EncodedBody,
}

/// What came back from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    /// A JSON response.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            body: body.to_string(),
        }
    }

    /// A plain text response.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    /// An empty `200 OK`.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: 200,
            content_type: None,
            body: String::new(),
        }
    }

    /// Whether the body should be read as JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|content_type| content_type.contains("json"))
    }
}

/// Sends one request and resolves with whatever status came back.
///
/// Non-200 statuses are not errors at this level; only a failure to get a
/// response at all is. The returned future must not borrow the transport.
#[automock]
pub trait Transport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, TransportError>>;
}
