// src/db/cart_repo.rs

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use crate::{
    common::error::AppError,
    models::cart::{CartRecord, LineItem},
};

/// Acesso aos carrinhos. Um registro por e-mail.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Carrinho atual: o de maior `updated_at` (desempate por `id`).
    async fn find_current(&self, owner_email: &str) -> Result<Option<CartRecord>, AppError>;

    /// Grava os itens com controle otimista de concorrência.
    ///
    /// `expected_version` é a versão lida pelo chamador; `None` significa que ele não
    /// viu nenhum carrinho e um novo registro deve ser inserido. Se o estado no banco
    /// não corresponder, retorna `AppError::Conflict` sem gravar nada.
    async fn save(
        &self,
        owner_email: &str,
        items: &[LineItem],
        expected_version: Option<i64>,
    ) -> Result<CartRecord, AppError>;

    /// Remove todos os registros do dono. Retorna quantos foram apagados.
    async fn delete_all(&self, owner_email: &str) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn find_current(&self, owner_email: &str) -> Result<Option<CartRecord>, AppError> {
        let cart = sqlx::query_as::<_, CartRecord>(
            r#"
            SELECT id, owner_email, items, version, updated_at
            FROM carts
            WHERE owner_email = $1
            ORDER BY updated_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(owner_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cart)
    }

    async fn save(
        &self,
        owner_email: &str,
        items: &[LineItem],
        expected_version: Option<i64>,
    ) -> Result<CartRecord, AppError> {
        let saved = match expected_version {
            // Primeiro carrinho: o índice único em owner_email decide quem chega primeiro.
            None => {
                sqlx::query_as::<_, CartRecord>(
                    r#"
                    INSERT INTO carts (owner_email, items, version, updated_at)
                    VALUES ($1, $2, 1, NOW())
                    ON CONFLICT (owner_email) DO NOTHING
                    RETURNING id, owner_email, items, version, updated_at
                    "#,
                )
                .bind(owner_email)
                .bind(Json(items))
                .fetch_optional(&self.pool)
                .await?
            }
            Some(version) => {
                sqlx::query_as::<_, CartRecord>(
                    r#"
                    UPDATE carts
                    SET items = $2, version = version + 1, updated_at = NOW()
                    WHERE owner_email = $1 AND version = $3
                    RETURNING id, owner_email, items, version, updated_at
                    "#,
                )
                .bind(owner_email)
                .bind(Json(items))
                .bind(version)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        saved.ok_or_else(|| {
            AppError::Conflict(format!("carrinho de {} alterado concorrentemente", owner_email))
        })
    }

    async fn delete_all(&self, owner_email: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM carts WHERE owner_email = $1")
            .bind(owner_email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
