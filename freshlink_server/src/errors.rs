use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use freshlink_engine::OrderFlowError;
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
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Request failed validation")]
    ValidationFailed(Vec<String>),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            // Validation callers get the complete list of reasons in one response.
            Self::ValidationFailed(errors) => serde_json::json!({ "errors": errors }),
            other => serde_json::json!({ "error": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No fl_auth_token header was provided.")]
    MissingToken,
    #[error("Auth token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Auth token carries an unknown role. {0}")]
    UnknownRole(String),
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Validation(errors) => Self::ValidationFailed(errors.into_vec()),
            OrderFlowError::OrderNotFound(_) | OrderFlowError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::InsufficientStock { .. } | OrderFlowError::DuplicateOrderNumber(_) => {
                Self::Conflict(e.to_string())
            },
            OrderFlowError::AlreadyRated(_) => Self::Conflict(e.to_string()),
            // Illegal transitions and missing reasons are bad requests: the caller must re-derive the input, not
            // retry it.
            OrderFlowError::IllegalTransition { .. } | OrderFlowError::ReasonRequired(_) => {
                Self::ValidationFailed(vec![e.to_string()])
            },
            OrderFlowError::RatingNotAllowed(_) => Self::ValidationFailed(vec![e.to_string()]),
            OrderFlowError::NotPermitted(_) => Self::InsufficientPermissions(e.to_string()),
            OrderFlowError::Internal(_) => Self::BackendError(e.to_string()),
        }
    }
}
