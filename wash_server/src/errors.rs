use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use thiserror::Error;
use wash_engine::{CatalogApiError, LedgerError, MessagingError, PaymentError};

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
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Conflict. {0}")]
    Conflict(String),
    #[error("Invalid state. {0}")]
    InvalidState(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("The payment gateway failed. {0}")]
    PaymentGatewayFailure(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::PaymentGatewayFailure(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Database details never leave the process; the caller gets a sanitized message.
        let message = match self {
            Self::BackendError(_) | Self::Unspecified(_) | Self::IOError(_) | Self::InitializeError(_) => {
                log::error!("💥️ Internal error: {self}");
                "An internal error occurred.".to_string()
            },
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": message }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("Login token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Login token has expired.")]
    TokenExpired,
    #[error("Login token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ReservationNotFound(_) |
            LedgerError::ServiceNotFound(_) |
            LedgerError::VehicleNotFound(_) => Self::NoRecordFound(e.to_string()),
            LedgerError::VehicleNotOwned(_) |
            LedgerError::NotAssignedWasher(_) |
            LedgerError::NotYourReservation(_) => Self::InsufficientPermissions(e.to_string()),
            LedgerError::AlreadyClaimed(_) | LedgerError::NotClaimable(_, _) | LedgerError::AlreadyRated(_) => {
                Self::Conflict(e.to_string())
            },
            LedgerError::InvalidState(_) => Self::InvalidState(e.to_string()),
            LedgerError::InvalidStars(_) | LedgerError::EditNoOp => Self::ValidationError(e.to_string()),
            LedgerError::CatalogError(CatalogApiError::UserNotFound(_)) => Self::NoRecordFound(e.to_string()),
            LedgerError::DatabaseError(_) | LedgerError::CatalogError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<PaymentError> for ServerError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::PaymentNotFound(_) |
            PaymentError::UnknownProcessorRef(_) |
            PaymentError::ReservationNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentError::InvalidStatus(_) => Self::InvalidState(e.to_string()),
            PaymentError::MissingProcessorRef => Self::ValidationError(e.to_string()),
            PaymentError::ProcessorError(_) => Self::PaymentGatewayFailure(e.to_string()),
            PaymentError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<MessagingError> for ServerError {
    fn from(e: MessagingError) -> Self {
        match e {
            MessagingError::NotificationNotFound(_) |
            MessagingError::MessageNotFound(_) |
            MessagingError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            MessagingError::EmptyContent => Self::ValidationError(e.to_string()),
            MessagingError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}
