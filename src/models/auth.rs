// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Cliente,
    Duenio,
    Admin,
}

// Estrutura de dados ("claims") dentro do JWT.
// O provedor de identidade legado emite `id`, `rol` e `restaurante_id`; aceitamos ambos os nomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(alias = "id")]
    pub sub: Uuid, // Subject (ID do usuário)
    pub email: String,
    #[serde(alias = "rol")]
    pub role: Role,
    #[serde(default, alias = "restaurante_id", skip_serializing_if = "Option::is_none")]
    pub business_id: Option<i64>,
    pub exp: usize, // Expiration time (quando o token expira)
    #[serde(default)]
    pub iat: usize, // Issued At (quando o token foi criado)
}

/// Identidade do chamador, extraída de um token válido. Nunca é persistida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaim {
    pub subject_id: Uuid,
    pub email: String,
    pub role: Role,
    pub business_id: Option<i64>,
}

impl IdentityClaim {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<Claims> for IdentityClaim {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub,
            email: claims.email,
            role: claims.role,
            business_id: claims.business_id,
        }
    }
}
