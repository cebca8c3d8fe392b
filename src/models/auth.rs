// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Representa um entregador vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rider {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: Option<String>,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Login aceita e-mail ou nome de usuário no mesmo campo
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRiderPayload {
    #[validate(length(min = 1, message = "Informe o e-mail ou o nome de usuário."))]
    #[schema(example = "joao.entregas")]
    pub input: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // ID do entregador
    pub exp: usize,
    pub iat: usize,
}
