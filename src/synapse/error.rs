//! Transport errors

use thiserror::Error;

/// Failure of a single logical request against the homeserver.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the connection failed mid-flight
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status outside OK/Created/NoContent
    #[error("request to {url} returned unexpected status: {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read
    #[error("failed to read response body from {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The caller's deadline passed before the request completed
    #[error("request to {url} exceeded its deadline")]
    DeadlineExceeded { url: String },
}

impl TransportError {
    /// HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }
}

/// Format a transport error for display
/// Security: avoids echoing server error bodies or tokens back to the terminal
pub fn format_synapse_error(error: &TransportError) -> String {
    match error.status() {
        Some(401) => "Access token was rejected. Check SYNCLI_ACCESS_TOKEN.".to_string(),
        Some(403) => "Permission denied. The access token must belong to a server admin.".to_string(),
        Some(404) => "Resource not found.".to_string(),
        Some(429) => "Rate limit exceeded. Please try again later.".to_string(),
        Some(400) => "Invalid request. Check your parameters.".to_string(),
        Some(status) if status >= 500 => {
            "Homeserver temporarily unavailable. Please try again.".to_string()
        }
        Some(status) => format!("Request failed with status {}.", status),
        None if error.is_deadline_exceeded() => "Request timed out.".to_string(),
        None => "Request failed. Check your network connection and try again.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> TransportError {
        TransportError::Status {
            url: "https://matrix.example.org/_matrix/client/v3/publicRooms".to_string(),
            status: code,
        }
    }

    #[test]
    fn test_format_known_statuses() {
        assert!(format_synapse_error(&status(401)).contains("token"));
        assert!(format_synapse_error(&status(403)).contains("admin"));
        assert_eq!(format_synapse_error(&status(404)), "Resource not found.");
        assert!(format_synapse_error(&status(502)).contains("unavailable"));
        assert_eq!(
            format_synapse_error(&status(418)),
            "Request failed with status 418."
        );
    }

    #[test]
    fn test_format_deadline() {
        let err = TransportError::DeadlineExceeded {
            url: "https://matrix.example.org".to_string(),
        };
        assert!(err.is_deadline_exceeded());
        assert_eq!(err.status(), None);
        assert_eq!(format_synapse_error(&err), "Request timed out.");
    }

    #[test]
    fn test_display_does_not_include_body() {
        let msg = status(500).to_string();
        assert_eq!(
            msg,
            "request to https://matrix.example.org/_matrix/client/v3/publicRooms returned unexpected status: 500"
        );
    }
}
