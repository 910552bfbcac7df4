//! Request payloads accepted by the API and their conversion into domain values.

use thiserror::Error;
use validator::ValidationErrors;

pub mod chat;
pub mod leads;
pub mod notes;
pub mod statuses;
pub mod team;
pub mod trading;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid name")]
    InvalidName,

    #[error("invalid lead id")]
    InvalidLeadId,

    #[error("invalid user id")]
    InvalidUserId,

    #[error("invalid status label")]
    InvalidStatus,

    #[error("invalid color, expected #RRGGBB")]
    InvalidColor,

    #[error("invalid kyc status")]
    InvalidKycStatus,

    #[error("invalid role")]
    InvalidRole,

    #[error("invalid source folder")]
    InvalidSourceFolder,

    #[error("message is empty")]
    EmptyContent,

    #[error("invalid message id")]
    InvalidMessageId,

    #[error("invalid amount")]
    InvalidAmount,

    #[error("invalid transfer kind")]
    InvalidTransferKind,

    #[error("invalid account id")]
    InvalidAccountId,

    #[error("invalid csv: {0}")]
    Csv(String),
}

impl From<csv::Error> for FormError {
    fn from(err: csv::Error) -> Self {
        FormError::Csv(err.to_string())
    }
}
