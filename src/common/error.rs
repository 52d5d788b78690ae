use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::orders::OrderStatus;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada variante pertence a uma das classes da taxonomia (ver `ErrorClass`).
#[derive(Debug, Error)]
pub enum AppError {
    // --- Autenticação (401) ---
    #[error("Token de autenticação ausente")]
    MissingCredential,

    #[error("Token de autenticação inválido ou expirado")]
    InvalidCredential,

    // --- Autorização (403) ---
    #[error("Acesso negado")]
    Forbidden,

    // --- Não encontrado (404) ---
    #[error("Produto {0} não encontrado")]
    ProductNotFound(i64),

    #[error("Carrinho não encontrado")]
    CartNotFound,

    #[error("Item {0} não está no carrinho")]
    ItemNotFound(i64),

    #[error("Pedido {0} não encontrado")]
    OrderNotFound(Uuid),

    #[error("Endereço {0} não encontrado")]
    AddressNotFound(Uuid),

    // --- Validação (400) ---
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Pedido inválido: {0}")]
    InvalidOrder(String),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    // --- Conflito (409) ---
    #[error("Conflito de escrita: {0}")]
    Conflict(String),

    #[error("Transição de status inválida: {from:?} -> {to:?}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    // --- Upstream (502) ---
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Falha no armazenamento: {0}")]
    Upstream(String),

    // --- Interno (500) ---
    // `orphaned` indica que a compensação também falhou e o cabeçalho ficou no banco.
    #[error("Falha ao criar o pedido {order_id} (órfão: {orphaned})")]
    OrderCreationFailed { order_id: Uuid, orphaned: bool },

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

/// Classe do erro na taxonomia exposta aos clientes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Authentication,
    Authorization,
    NotFound,
    Validation,
    Conflict,
    Upstream,
    Internal,
}

impl AppError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::MissingCredential | AppError::InvalidCredential => ErrorClass::Authentication,
            AppError::Forbidden => ErrorClass::Authorization,
            AppError::ProductNotFound(_)
            | AppError::CartNotFound
            | AppError::ItemNotFound(_)
            | AppError::OrderNotFound(_)
            | AppError::AddressNotFound(_) => ErrorClass::NotFound,
            AppError::ValidationError(_) | AppError::InvalidOrder(_) | AppError::InvalidInput(_) => {
                ErrorClass::Validation
            }
            AppError::Conflict(_) | AppError::InvalidStatusTransition { .. } => ErrorClass::Conflict,
            AppError::DatabaseError(_) | AppError::Upstream(_) => ErrorClass::Upstream,
            AppError::OrderCreationFailed { .. } | AppError::InternalServerError(_) => ErrorClass::Internal,
        }
    }

    /// Tag estável, legível por máquina, enviada no campo `error` da resposta.
    pub fn tag(&self) -> &'static str {
        match self {
            AppError::MissingCredential => "missing_credential",
            AppError::InvalidCredential => "invalid_credential",
            AppError::Forbidden => "forbidden",
            AppError::ProductNotFound(_) => "product_not_found",
            AppError::CartNotFound => "cart_not_found",
            AppError::ItemNotFound(_) => "item_not_found",
            AppError::OrderNotFound(_) => "order_not_found",
            AppError::AddressNotFound(_) => "address_not_found",
            AppError::ValidationError(_) => "validation_error",
            AppError::InvalidOrder(_) => "invalid_order",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidStatusTransition { .. } => "invalid_status_transition",
            AppError::DatabaseError(_) | AppError::Upstream(_) => "upstream_error",
            AppError::OrderCreationFailed { .. } => "order_creation_failed",
            AppError::InternalServerError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.class() {
            ErrorClass::Authentication => StatusCode::UNAUTHORIZED,
            ErrorClass::Authorization => StatusCode::FORBIDDEN,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Validation => StatusCode::BAD_REQUEST,
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::Upstream => StatusCode::BAD_GATEWAY,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Mensagem para o cliente. Erros de infraestrutura nunca vazam detalhes internos.
    fn public_message(&self) -> String {
        match self {
            AppError::MissingCredential => "Token de autenticação ausente.".into(),
            AppError::InvalidCredential => "Token de autenticação inválido ou expirado.".into(),
            AppError::Forbidden => "Você não tem permissão para realizar esta ação.".into(),
            AppError::CartNotFound => "Carrinho não encontrado.".into(),
            AppError::DatabaseError(_) | AppError::Upstream(_) => {
                "O serviço de dados está indisponível.".into()
            }
            AppError::OrderCreationFailed { .. } => "Não foi possível criar o pedido.".into(),
            AppError::InternalServerError(_) => "Ocorreu um erro inesperado.".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Retornar todos os detalhes da validação.
        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "success": false,
                "error": self.tag(),
                "message": "Um ou mais campos são inválidos.",
                "details": details,
            }));
            return (status, body).into_response();
        }

        match self.class() {
            ErrorClass::Upstream | ErrorClass::Internal => {
                tracing::error!(error = %self, tag = self.tag(), "Erro Interno do Servidor");
            }
            _ => tracing::debug!(error = %self, tag = self.tag(), "requisição rejeitada"),
        }

        let body = Json(json!({
            "success": false,
            "error": self.tag(),
            "message": self.public_message(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn authentication_and_authorization_have_distinct_status() {
        assert_eq!(AppError::MissingCredential.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidCredential.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn taxonomy_classes() {
        assert_eq!(AppError::CartNotFound.class(), ErrorClass::NotFound);
        assert_eq!(AppError::InvalidOrder("x".into()).class(), ErrorClass::Validation);
        assert_eq!(
            AppError::InvalidStatusTransition {
                from: OrderStatus::Entregado,
                to: OrderStatus::Pendiente
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::Upstream("down".into()).status_code(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_detail() {
        let resp = AppError::Upstream("connection refused on 10.0.0.7".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "upstream_error");
        assert!(!body["message"].as_str().unwrap().contains("10.0.0.7"));
    }

    #[tokio::test]
    async fn not_found_body_carries_tag_and_message() {
        let resp = AppError::ProductNotFound(7).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "product_not_found");
        assert!(body["message"].as_str().unwrap().contains('7'));
    }
}
