use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

pub mod codes {
    pub const ENV_VAR: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const NETWORK_UNREACHABLE: i32 = 3;
    pub const UPSTREAM: i32 = 4;
    pub const UNEXPECTED: i32 = 5;

    pub const INVALID_INPUT: i32 = 101;
    pub const INVALID_ENDPOINT: i32 = 102;
    pub const NO_ROUTE_FOUND: i32 = 103;
    pub const NOT_FOUND: i32 = 104;

    pub const SENSOR_PERMISSION_DENIED: i32 = 110;
    pub const SENSOR_UNAVAILABLE: i32 = 111;
    pub const SENSOR_TIMEOUT: i32 = 112;
}

impl Error {
    pub fn is_sensor_permission_denied(&self) -> bool {
        self.code == codes::SENSOR_PERMISSION_DENIED
    }

    /// Sensor failures worth another attempt.
    pub fn is_transient_sensor_error(&self) -> bool {
        matches!(
            self.code,
            codes::SENSOR_UNAVAILABLE | codes::SENSOR_TIMEOUT
        )
    }

    pub fn is_invalid_endpoint(&self) -> bool {
        self.code == codes::INVALID_ENDPOINT
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        network_unreachable_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.code {
            1..=99 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            codes::NOT_FOUND => (StatusCode::NOT_FOUND, self.message.as_str()),
            codes::INVALID_ENDPOINT => (StatusCode::UNPROCESSABLE_ENTITY, self.message.as_str()),
            codes::SENSOR_PERMISSION_DENIED => (StatusCode::FORBIDDEN, self.message.as_str()),
            _ => (StatusCode::BAD_REQUEST, self.message.as_str()),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: codes::INVALID_INPUT,
        message: "invalid input".into(),
    }
}

pub fn invalid_endpoint_error() -> Error {
    Error {
        code: codes::INVALID_ENDPOINT,
        message: "invalid endpoint".into(),
    }
}

pub fn no_route_found_error() -> Error {
    Error {
        code: codes::NO_ROUTE_FOUND,
        message: "no route found".into(),
    }
}

pub fn not_found_error() -> Error {
    Error {
        code: codes::NOT_FOUND,
        message: "not found".into(),
    }
}

pub fn sensor_permission_denied_error() -> Error {
    Error {
        code: codes::SENSOR_PERMISSION_DENIED,
        message: "sensor permission denied".into(),
    }
}

pub fn sensor_unavailable_error() -> Error {
    Error {
        code: codes::SENSOR_UNAVAILABLE,
        message: "sensor unavailable".into(),
    }
}

pub fn sensor_timeout_error() -> Error {
    Error {
        code: codes::SENSOR_TIMEOUT,
        message: "sensor timeout".into(),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: codes::ENV_VAR,
        message: "environment variable error".into(),
    }
}

pub fn config_error(key: &str) -> Error {
    Error {
        code: codes::CONFIG,
        message: format!("invalid configuration value for {}", key),
    }
}

pub fn reqwest_error(_: reqwest::Error) -> Error {
    network_unreachable_error()
}

pub fn network_unreachable_error() -> Error {
    Error {
        code: codes::NETWORK_UNREACHABLE,
        message: "network unreachable".into(),
    }
}

pub fn upstream_error() -> Error {
    Error {
        code: codes::UPSTREAM,
        message: "upstream error".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: codes::UNEXPECTED,
        message: "unexpected error".into(),
    }
}

#[test]
fn sensor_error_classification() {
    assert!(sensor_timeout_error().is_transient_sensor_error());
    assert!(sensor_unavailable_error().is_transient_sensor_error());
    assert!(!sensor_permission_denied_error().is_transient_sensor_error());
    assert!(sensor_permission_denied_error().is_sensor_permission_denied());
    assert!(!network_unreachable_error().is_transient_sensor_error());
}
