use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Solicitação de coleta não encontrada")]
    CollectionRequestNotFound,

    #[error("Pedido não encontrado")]
    OrderNotFound,

    #[error("Entregador não encontrado")]
    RiderNotFound,

    // Outro entregador assumiu a coleta primeiro
    #[error("Solicitação de coleta já foi assumida por outro entregador")]
    AlreadyClaimed,

    #[error("Pré-condição inválida: {0}")]
    InvalidPrecondition(String),

    #[error("Apenas o entregador responsável pode concluir esta coleta")]
    NotAssignedRider,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro no Redis: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::CollectionRequestNotFound
            | AppError::OrderNotFound
            | AppError::RiderNotFound => StatusCode::NOT_FOUND,
            AppError::AlreadyClaimed => StatusCode::CONFLICT,
            AppError::InvalidPrecondition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotAssignedRider => StatusCode::FORBIDDEN,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": "Um ou mais campos são inválidos.",
                "details": details,
            }));
            return (status, body).into_response();
        }

        let error_message = if status.is_server_error() {
            // Detalhes internos ficam só no log
            tracing::error!("Erro Interno do Servidor: {}", self);
            "Ocorreu um erro inesperado.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
