// src/db/address_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::addresses::{Address, AddressChanges, AddressFields},
};

const ADDRESS_COLUMNS: &str = "id, owner_id, label, street_address, notes, latitude, longitude, is_default, created_at, updated_at";

/// Endereços de entrega. Cada operação que mexe no padrão (limpar + marcar) é uma
/// unidade: nunca deixa dois endereços padrão para o mesmo dono.
#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// Padrão primeiro, depois os mais recentes.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Address>, AppError>;

    async fn find_by_id(&self, address_id: Uuid) -> Result<Option<Address>, AppError>;

    async fn create(&self, owner_id: Uuid, fields: &AddressFields) -> Result<Address, AppError>;

    /// `None` quando o endereço não existe mais.
    async fn update(&self, address_id: Uuid, changes: &AddressChanges) -> Result<Option<Address>, AppError>;

    async fn set_default(&self, address_id: Uuid) -> Result<Option<Address>, AppError>;

    /// `true` se algo foi apagado. Não promove outro endereço a padrão.
    async fn delete(&self, address_id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgAddressRepository {
    pool: PgPool,
}

impl PgAddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Primeiro passo das operações em dois passos: tira o padrão dos outros endereços.
    async fn clear_defaults<'e, E>(executor: E, owner_id: Uuid, except: Option<Uuid>) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE addresses
            SET is_default = FALSE, updated_at = NOW()
            WHERE owner_id = $1 AND is_default AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(owner_id)
        .bind(except)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    async fn lock_by_id<'e, E>(executor: E, address_id: Uuid) -> Result<Option<Address>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 FOR UPDATE");
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(address_id)
            .fetch_optional(executor)
            .await?;
        Ok(address)
    }
}

// O índice único parcial (owner_id) WHERE is_default transforma a corrida entre
// duas transações em violação de unicidade, reportada como conflito.
fn map_default_conflict(err: AppError) -> AppError {
    if let AppError::DatabaseError(db) = &err {
        if let Some(db_err) = db.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::Conflict("outro endereço foi marcado como padrão ao mesmo tempo".into());
            }
        }
    }
    err
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Address>, AppError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE owner_id = $1 ORDER BY is_default DESC, created_at DESC"
        );
        let addresses = sqlx::query_as::<_, Address>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(addresses)
    }

    async fn find_by_id(&self, address_id: Uuid) -> Result<Option<Address>, AppError> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1");
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(address_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(address)
    }

    async fn create(&self, owner_id: Uuid, fields: &AddressFields) -> Result<Address, AppError> {
        let mut tx = self.pool.begin().await?;

        if fields.is_default {
            Self::clear_defaults(&mut *tx, owner_id, None).await?;
        }

        let sql = format!(
            r#"
            INSERT INTO addresses (owner_id, label, street_address, notes, latitude, longitude, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ADDRESS_COLUMNS}
            "#
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(owner_id)
            .bind(&fields.label)
            .bind(&fields.street_address)
            .bind(fields.notes.as_deref())
            .bind(fields.latitude)
            .bind(fields.longitude)
            .bind(fields.is_default)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_default_conflict(e.into()))?;

        tx.commit().await?;
        Ok(address)
    }

    async fn update(&self, address_id: Uuid, changes: &AddressChanges) -> Result<Option<Address>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(mut address) = Self::lock_by_id(&mut *tx, address_id).await? else {
            return Ok(None);
        };

        if changes.is_default == Some(true) {
            Self::clear_defaults(&mut *tx, address.owner_id, Some(address_id)).await?;
        }

        changes.apply_to(&mut address);

        let sql = format!(
            r#"
            UPDATE addresses
            SET label = $2, street_address = $3, notes = $4, latitude = $5, longitude = $6,
                is_default = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {ADDRESS_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Address>(&sql)
            .bind(address_id)
            .bind(&address.label)
            .bind(&address.street_address)
            .bind(address.notes.as_deref())
            .bind(address.latitude)
            .bind(address.longitude)
            .bind(address.is_default)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_default_conflict(e.into()))?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn set_default(&self, address_id: Uuid) -> Result<Option<Address>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(address) = Self::lock_by_id(&mut *tx, address_id).await? else {
            return Ok(None);
        };

        Self::clear_defaults(&mut *tx, address.owner_id, None).await?;

        let sql = format!(
            "UPDATE addresses SET is_default = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {ADDRESS_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Address>(&sql)
            .bind(address_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_default_conflict(e.into()))?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete(&self, address_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(address_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
