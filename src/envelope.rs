use serde::{Deserialize, Serialize};

use crate::error::FetchFailure;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub status: u16,
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Uniform response wrapper of every content read.
///
/// `data` is `None` exactly when `error` is `Some`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub status: u16,
}

/// Wire shape of a Strapi response body before normalization.
#[derive(Debug, Deserialize)]
struct RawEnvelope<T> {
    data: Option<T>,
    error: Option<ApiError>,
    meta: Option<Meta>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, meta: Option<Meta>, status: u16) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta,
            status,
        }
    }

    pub fn err(error: ApiError) -> Self {
        Self {
            success: false,
            status: error.status,
            data: None,
            error: Some(error),
            meta: None,
        }
    }

    pub fn from_failure(failure: &FetchFailure) -> Self {
        let message = match failure {
            FetchFailure::Timeout { .. } => "The request timed out. Please try again.".to_owned(),
            FetchFailure::Network { message } => message.clone(),
        };
        Self::err(ApiError {
            status: failure.status().as_u16(),
            name: failure.name().to_owned(),
            message,
            details: None,
        })
    }

    pub fn fetch_error(message: impl Into<String>) -> Self {
        Self::from_failure(&FetchFailure::Network {
            message: message.into(),
        })
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(error)) => Err(error),
            (None, None) => Err(ApiError {
                status: self.status,
                name: "FetchError".to_owned(),
                message: "response carried neither data nor error".to_owned(),
                details: None,
            }),
        }
    }

    pub fn page_count(&self) -> Option<u32> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.pagination)
            .map(|pagination| pagination.page_count)
    }
}

impl<T: serde::de::DeserializeOwned> Envelope<T> {
    /// Normalizes a response body received with HTTP `status`.
    ///
    /// A structured remote error passes through unchanged. A body that cannot
    /// be parsed, or a success body without `data`, becomes a `FetchError`.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let raw: RawEnvelope<T> = match serde_json::from_slice(body) {
            Ok(raw) => raw,
            Err(err) => {
                return Self::fetch_error(format!("invalid response body (HTTP {status}): {err}"));
            }
        };

        if let Some(error) = raw.error {
            return Self::err(error);
        }

        if !(200..300).contains(&status) {
            return Self::err(ApiError {
                status,
                name: "FetchError".to_owned(),
                message: format!("unexpected HTTP status {status} without error body"),
                details: None,
            });
        }

        match raw.data {
            Some(data) => Self::ok(data, raw.meta, status),
            None => Self::fetch_error("response is missing `data`"),
        }
    }
}
