//! Conversions from external infrastructure errors into domain errors.

use planora_domain::PlanoraError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PlanoraError);

impl From<InfraError> for PlanoraError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PlanoraError> for InfraError {
    fn from(value: PlanoraError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoPlanoraError {
    fn into_planora(self) -> PlanoraError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PlanoraError */
/* -------------------------------------------------------------------------- */

impl IntoPlanoraError for HttpError {
    fn into_planora(self) -> PlanoraError {
        if self.is_timeout() {
            return PlanoraError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return PlanoraError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let reason = status.canonical_reason().unwrap_or("unknown status");

            return match code {
                401 | 403 => PlanoraError::Auth(format!("HTTP {code} {reason}")),
                _ => PlanoraError::Status { status: code, body: reason.to_string() },
            };
        }

        if self.is_decode() {
            return PlanoraError::MalformedPayload(self.to_string());
        }

        if self.is_builder() {
            return PlanoraError::Config(format!("invalid HTTP request: {self}"));
        }

        PlanoraError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_planora())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → PlanoraError */
/* -------------------------------------------------------------------------- */

impl IntoPlanoraError for JsonError {
    fn into_planora(self) -> PlanoraError {
        if self.is_io() {
            return PlanoraError::Network(format!("failed reading response body: {self}"));
        }
        PlanoraError::MalformedPayload(format!(
            "response is not valid JSON (line {}, column {}): {self}",
            self.line(),
            self.column()
        ))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_planora())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
