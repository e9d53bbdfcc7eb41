//! Error handling for the FreshControl backend
//!
//! Provides consistent error responses in English and Spanish

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::LedgerError;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Ledger errors
    #[error("Product not found for SKU {0}")]
    ProductNotFound(String),

    #[error("Batch not found: {0}")]
    BatchNotFound(Uuid),

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Database errors; the surrounding transaction has been rolled back
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: &str, message: &str, message_es: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_es: message_es.to_string(),
        }
    }

    /// Amount missing to satisfy a FIFO request
    pub fn shortfall(&self) -> Option<Decimal> {
        match self {
            AppError::InsufficientStock {
                requested,
                available,
            } => Some(*requested - *available),
            _ => None,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidQuantity(msg) => AppError::InvalidQuantity(msg),
            LedgerError::InsufficientStock {
                requested,
                available,
            } => AppError::InsufficientStock {
                requested,
                available,
            },
            overflow @ LedgerError::Overflow(_) => AppError::Internal(overflow.to_string()),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<Decimal>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::ProductNotFound(sku) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "PRODUCT_NOT_FOUND".to_string(),
                    message_en: format!("No product with SKU {}", sku),
                    message_es: format!("No existe un producto con SKU {}", sku),
                    field: Some("sku".to_string()),
                    shortfall: None,
                },
            ),
            AppError::BatchNotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "BATCH_NOT_FOUND".to_string(),
                    message_en: format!("Batch {} does not exist or is already empty", id),
                    message_es: format!("El lote {} no existe o ya está agotado", id),
                    field: None,
                    shortfall: None,
                },
            ),
            AppError::InsufficientStock {
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: format!(
                        "Requested {} but only {} is in stock",
                        requested, available
                    ),
                    message_es: format!(
                        "Se solicitaron {} pero solo hay {} en stock",
                        requested, available
                    ),
                    field: Some("quantity".to_string()),
                    shortfall: self.shortfall(),
                },
            ),
            AppError::InvalidQuantity(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_QUANTITY".to_string(),
                    message_en: msg.clone(),
                    message_es: format!("Cantidad inválida: {}", msg),
                    field: Some("quantity".to_string()),
                    shortfall: None,
                },
            ),
            AppError::Validation {
                field,
                message,
                message_es,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_es: message_es.clone(),
                    field: Some(field.clone()),
                    shortfall: None,
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message_en: format!("A record with this {} already exists", field),
                    message_es: format!("Ya existe un registro con este {}", field),
                    field: Some(field.clone()),
                    shortfall: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_es: format!("No se encontró {}", resource),
                    field: None,
                    shortfall: None,
                },
            ),
            AppError::DatabaseError(_) | AppError::Migration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "PERSISTENCE_FAILURE".to_string(),
                    message_en: "The operation could not be saved and was not applied".to_string(),
                    message_es: "La operación no se pudo guardar y no fue aplicada".to_string(),
                    field: None,
                    shortfall: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_es: "Error interno del servidor".to_string(),
                    field: None,
                    shortfall: None,
                },
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for services and handlers
pub type AppResult<T> = Result<T, AppError>;
