use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use settlement_engine::MarketplaceApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The submission was rejected. {0}")]
    SubmissionRejected(String),
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::SubmissionRejected(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<MarketplaceApiError> for ServerError {
    fn from(e: MarketplaceApiError) -> Self {
        match e {
            MarketplaceApiError::InvalidPrice { .. } => Self::SubmissionRejected(e.to_string()),
            MarketplaceApiError::ListingNotFound(_) | MarketplaceApiError::OfferNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            MarketplaceApiError::ListingClosed { .. } | MarketplaceApiError::OfferAlreadyDecided(_) => {
                Self::Conflict(e.to_string())
            },
            MarketplaceApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn api_errors_map_to_the_right_status_codes() {
        let cases = [
            (
                MarketplaceApiError::InvalidPrice {
                    submitted: mkt_common::Money::from_units(1),
                    current: mkt_common::Money::from_units(2),
                },
                StatusCode::BAD_REQUEST,
            ),
            (MarketplaceApiError::ListingNotFound(1), StatusCode::NOT_FOUND),
            (MarketplaceApiError::OfferNotFound(1), StatusCode::NOT_FOUND),
            (
                MarketplaceApiError::ListingClosed { id: 1, status: "Closed".into() },
                StatusCode::CONFLICT,
            ),
            (MarketplaceApiError::OfferAlreadyDecided(1), StatusCode::CONFLICT),
            (MarketplaceApiError::DatabaseError("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ServerError::from(err).status_code(), expected);
        }
    }
}
