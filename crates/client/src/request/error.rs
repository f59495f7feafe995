use serde::Deserialize;
use thiserror::Error;

use crate::request::HttpResponse;

/// Server error code for a message that duplicates the latest temporary one.
pub const SAME_AS_LAST_CODE: &str = "same-as-last";

/// The transport could not produce a response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Broad class of a failed request, used to pick a user-facing reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Duplicate of the most recent temporary message.
    SameAsLast,

    /// Wrong password or no session.
    Unauthorized,

    Other,
}

/// A failed request, normalized.
///
/// `Display` is the user-facing text placed into alerts.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("timeout")]
    Timeout,

    #[error("An error occurred during the transaction")]
    Network(#[source] TransportError),

    #[error("{}", status_line(*status, message))]
    Status {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("invalid response body")]
    Decode(#[source] serde_json::Error),

    #[error("cannot encode request body")]
    Encode(#[source] serde_json::Error),
}

fn status_line(status: u16, message: &str) -> String {
    if message.is_empty() {
        status.to_string()
    } else {
        format!("{status} {message}")
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,

    #[serde(default)]
    code: Option<String>,
}

impl RequestError {
    /// Error for a response whose status is not `200`.
    ///
    /// JSON bodies contribute their `message` and `code`; anything else is
    /// used verbatim.
    #[must_use]
    pub fn from_response(response: &HttpResponse) -> Self {
        let (message, code) = if response.is_json() {
            serde_json::from_str::<ErrorBody>(&response.body).map_or_else(
                |_| (response.body.trim().to_string(), None),
                |body| (body.message, body.code),
            )
        } else {
            (response.body.trim().to_string(), None)
        };

        Self::Status {
            status: response.status,
            message,
            code,
        }
    }

    /// HTTP status, when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Timeout | Self::Network(_) | Self::Decode(_) | Self::Encode(_) => None,
        }
    }

    /// Classify the failure.
    ///
    /// A structured `code` wins; servers that only send text are matched on
    /// the `same as last` phrase.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        let Self::Status {
            status,
            message,
            code,
        } = self
        else {
            return ErrorCode::Other;
        };

        if code.as_deref() == Some(SAME_AS_LAST_CODE) || message.contains("same as last") {
            ErrorCode::SameAsLast
        } else if *status == 401 {
            ErrorCode::Unauthorized
        } else {
            ErrorCode::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_error_uses_message_field() {
        let response = HttpResponse::json(400, &json!({"message": "bad id"}));
        let error = RequestError::from_response(&response);

        assert_eq!(error.to_string(), "400 bad id");
        assert_eq!(error.status(), Some(400));
        assert_eq!(error.code(), ErrorCode::Other);
    }

    #[test]
    fn text_error_uses_raw_body() {
        let response = HttpResponse::text(500, "database is locked\n");

        assert_eq!(
            RequestError::from_response(&response).to_string(),
            "500 database is locked"
        );
    }

    #[test]
    fn unauthorized_is_classified() {
        let response = HttpResponse::json(401, &json!({"message": "wrong password"}));

        assert_eq!(RequestError::from_response(&response).code(), ErrorCode::Unauthorized);
    }

    #[test]
    fn same_as_last_by_code_or_phrase() {
        let coded = HttpResponse::json(400, &json!({"message": "duplicate", "code": "same-as-last"}));
        let phrased = HttpResponse::json(400, &json!({"message": "the same as last message"}));

        assert_eq!(RequestError::from_response(&coded).code(), ErrorCode::SameAsLast);
        assert_eq!(RequestError::from_response(&phrased).code(), ErrorCode::SameAsLast);
    }

    #[test]
    fn fixed_messages() {
        assert_eq!(RequestError::Timeout.to_string(), "timeout");
        assert_eq!(
            RequestError::Network(TransportError::Network("offline".into())).to_string(),
            "An error occurred during the transaction"
        );
        assert_eq!(RequestError::Timeout.code(), ErrorCode::Other);
    }
}
