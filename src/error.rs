use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// AppError
///
/// The error taxonomy shared by every layer. Repository, lifecycle and access
/// checks all return it; the JSON boundary renders it through `IntoResponse`
/// and the web boundary wraps it in `flash::WebError`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Autenticação necessária.")]
    Unauthenticated,

    #[error("Acesso negado. Você precisa ser um administrador para acessar esta área.")]
    PermissionDenied,

    #[error("{0} não encontrado(a).")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Evento lotado.")]
    CapacityExceeded,

    #[error("Este evento não requer inscrição.")]
    RegistrationNotRequired,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias used by handlers, repositories and rules.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::RegistrationNotRequired => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::CapacityExceeded => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Stable machine-readable code, returned next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::Unauthenticated => "unauthenticated",
            AppError::PermissionDenied => "permission_denied",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::CapacityExceeded => "full",
            AppError::RegistrationNotRequired => "not_required",
            AppError::Storage(_) | AppError::Database(_) | AppError::Internal(_) => "internal_error",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Storage(_) | AppError::Database(_) | AppError::Internal(_)
        )
    }

    /// Message safe to show to a client. Internal failures are logged and masked.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            tracing::error!("internal error: {}", self);
            "Erro interno do servidor.".to_string()
        } else {
            self.to_string()
        }
    }

    /// from_write
    ///
    /// Translates constraint violations raised by an INSERT/UPDATE into the
    /// taxonomy: unique violations become `Conflict`, broken references and
    /// CHECK failures become `Validation`. Anything else stays a database error.
    pub fn from_write(err: sqlx::Error, entity: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(format!("{entity} com este slug ou nome já existe."));
            }
            if db_err.is_foreign_key_violation() {
                return AppError::Validation(format!(
                    "{entity} referencia um registro inexistente."
                ));
            }
            if db_err.is_check_violation() {
                return AppError::Validation(format!("{entity} contém valores inválidos."));
            }
        }
        AppError::Database(err)
    }

    /// Same as `from_write`, for deletes: a row still referenced is a conflict.
    pub fn from_delete(err: sqlx::Error, entity: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation() {
                return AppError::Conflict(format!("{entity} está em uso e não pode ser excluído(a)."));
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.public_message(),
            "code": self.code(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
