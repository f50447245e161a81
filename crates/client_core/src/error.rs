use shared::{
    domain::TransactionId,
    error::{ErrorCode, UserFacingError, ValidationErrors},
};
use thiserror::Error;

/// A persisted document that could not be decoded. Never surfaced to the user:
/// readers log it and carry on as if the document were absent.
#[derive(Debug, Error)]
#[error("stored document '{key}' is unreadable: {source}")]
pub struct ParseError {
    pub key: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("wallet is not connected")]
    WalletNotConnected,
    #[error("no storage content id is available to mint")]
    MissingContentId,
    #[error("no finalized submission is available to mint")]
    MissingSubmission,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("wallet transaction failed: {diagnostics}")]
pub struct TransactionError {
    pub diagnostics: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MintError {
    #[error("cannot mint: {0}")]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error("a mint for this submission is already in flight")]
    AlreadyInFlight,
    #[error("submission was already minted in transaction {0}")]
    AlreadyMinted(TransactionId),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("storage API key is not configured")]
    MissingApiKey,
    #[error("invalid storage endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("storage service rejected upload with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("storage service response carried no content id")]
    MissingContentId,
    #[error("failed to encode metadata document: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no draft in progress")]
    NoDraft,
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Mint(#[from] MintError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("local storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ClientError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::NoDraft => ErrorCode::Precondition,
            ClientError::Validation(_) => ErrorCode::Validation,
            ClientError::Mint(MintError::Transaction(_)) => ErrorCode::Transaction,
            ClientError::Mint(_) => ErrorCode::Precondition,
            ClientError::Upload(_) => ErrorCode::Upload,
            ClientError::Storage(_) => ErrorCode::Storage,
        }
    }

    pub fn to_user_facing(&self) -> UserFacingError {
        UserFacingError::new(self.code(), self.to_string())
    }
}

impl From<PreconditionError> for ClientError {
    fn from(value: PreconditionError) -> Self {
        ClientError::Mint(MintError::Precondition(value))
    }
}
