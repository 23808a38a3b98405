pub mod health;
pub mod metrics;
pub mod zipcode;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use zipcode::zip_code_handler;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;
use thiserror::Error;

use cep_gateway_domain::KeyFormatError;
use cep_gateway_resolver::ResolveError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid zip code: {0}")]
    InvalidZipCode(#[from] KeyFormatError),
    #[error(transparent)]
    Unresolved(#[from] ResolveError),
}

/// Stable machine-readable codes carried next to the human message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum ErrorCode {
    #[strum(serialize = "ERR_ZIPCODE_NOT_FORMATTED")]
    ZipCodeNotFormatted,
    #[strum(serialize = "ERR_ZIPCODE_NOT_FOUND")]
    ZipCodeNotFound,
    #[strum(serialize = "ERR_GET_ZIPCODE_TIMEOUT")]
    GetZipCodeTimeout,
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::InvalidZipCode(_) => ErrorCode::ZipCodeNotFormatted,
            ApiError::Unresolved(err) if err.is_timeout_flavored() => {
                ErrorCode::GetZipCodeTimeout
            }
            ApiError::Unresolved(_) => ErrorCode::ZipCodeNotFound,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidZipCode(_) => StatusCode::BAD_REQUEST,
            ApiError::Unresolved(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            code: self.code().as_ref().to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}
