// src/services/auth.rs

use bcrypt::verify;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RiderRepository,
    models::auth::{Claims, Rider},
};

#[derive(Clone)]
pub struct AuthService {
    rider_repo: RiderRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(rider_repo: RiderRepository, jwt_secret: String) -> Self {
        Self { rider_repo, jwt_secret }
    }

    pub async fn login_rider(&self, input: &str, password: &str) -> Result<String, AppError> {
        let rider = self.rider_repo
            .find_by_username_or_email(input.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Entregador sem senha cadastrada não consegue entrar
        let password_hash = rider.password_hash.clone().ok_or(AppError::InvalidCredentials)?;
        let password_clone = password.to_owned();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        ?;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(rider_id = %rider.id, "Entregador autenticado");
        create_token(&self.jwt_secret, rider.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<Rider, AppError> {
        let rider_id = decode_token(&self.jwt_secret, token)?;

        self.rider_repo
            .find_by_id(rider_id)
            .await?
            .ok_or(AppError::RiderNotFound)
    }
}

fn create_token(secret: &str, rider_id: Uuid) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::days(7);

    let claims = Claims {
        sub: rider_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

fn decode_token(secret: &str, token: &str) -> Result<Uuid, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;

    Ok(token_data.claims.sub)
}
