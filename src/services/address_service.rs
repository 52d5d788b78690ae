// src/services/address_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AddressRepository,
    middleware::ownership::{authorize, AddressOwner},
    models::{
        addresses::{Address, AddressChanges, AddressFields},
        auth::IdentityClaim,
    },
};

#[derive(Clone)]
pub struct AddressService {
    repo: Arc<dyn AddressRepository>,
}

impl AddressService {
    pub fn new(repo: Arc<dyn AddressRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, claim: &IdentityClaim, owner_id: Uuid) -> Result<Vec<Address>, AppError> {
        authorize(claim, &AddressOwner(owner_id))?;
        self.repo.list_by_owner(owner_id).await
    }

    pub async fn get(&self, claim: &IdentityClaim, owner_id: Uuid, address_id: Uuid) -> Result<Address, AppError> {
        authorize(claim, &AddressOwner(owner_id))?;

        self.repo
            .find_by_id(address_id)
            .await?
            .filter(|a| a.owner_id == owner_id)
            .ok_or(AppError::AddressNotFound(address_id))
    }

    /// Se o novo endereço for padrão, os outros do mesmo dono deixam de ser.
    pub async fn create(&self, claim: &IdentityClaim, owner_id: Uuid, fields: AddressFields) -> Result<Address, AppError> {
        authorize(claim, &AddressOwner(owner_id))?;

        let address = self.repo.create(owner_id, &fields).await?;
        tracing::info!(address_id = %address.id, %owner_id, is_default = address.is_default, "endereço criado");
        Ok(address)
    }

    // A propriedade vem do registro gravado, nunca de um dono informado pelo chamador.
    pub async fn update(&self, claim: &IdentityClaim, address_id: Uuid, changes: AddressChanges) -> Result<Address, AppError> {
        self.load_owned(claim, address_id).await?;

        self.repo
            .update(address_id, &changes)
            .await?
            .ok_or(AppError::AddressNotFound(address_id))
    }

    pub async fn set_default(&self, claim: &IdentityClaim, address_id: Uuid) -> Result<Address, AppError> {
        self.load_owned(claim, address_id).await?;

        let address = self
            .repo
            .set_default(address_id)
            .await?
            .ok_or(AppError::AddressNotFound(address_id))?;
        tracing::info!(%address_id, owner_id = %address.owner_id, "endereço padrão alterado");
        Ok(address)
    }

    /// Apagar o endereço padrão não promove nenhum outro.
    pub async fn delete(&self, claim: &IdentityClaim, address_id: Uuid) -> Result<(), AppError> {
        let address = self.load_owned(claim, address_id).await?;

        if !self.repo.delete(address_id).await? {
            return Err(AppError::AddressNotFound(address_id));
        }
        if address.is_default {
            tracing::info!(%address_id, owner_id = %address.owner_id, "endereço padrão removido; dono fica sem padrão");
        }
        Ok(())
    }

    async fn load_owned(&self, claim: &IdentityClaim, address_id: Uuid) -> Result<Address, AppError> {
        let address = self
            .repo
            .find_by_id(address_id)
            .await?
            .ok_or(AppError::AddressNotFound(address_id))?;
        authorize(claim, &address)?;
        Ok(address)
    }
}
