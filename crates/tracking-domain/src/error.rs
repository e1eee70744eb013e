use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid tracking message: {0}")]
    InvalidTrackingMessage(String),

    #[error("Invalid shipment ID: {0}")]
    InvalidShipmentId(String),

    #[error("Shipment not found: {0}")]
    ShipmentNotFound(String),

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
