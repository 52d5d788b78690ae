// src/services/cart_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{CartRepository, ProductRepository},
    middleware::ownership::{authorize, CartOwner},
    models::{
        auth::IdentityClaim,
        cart::{LineItem, LineItemOptions},
    },
};

// Tentativas do ciclo ler-modificar-escrever antes de desistir com conflito.
pub const MAX_CART_WRITE_ATTEMPTS: usize = 3;

// O que fazer quando o dono ainda não tem carrinho.
#[derive(Debug, Clone, Copy)]
enum OnMissingCart {
    StartEmpty,
    NotFound,
}

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { carts, products }
    }

    pub async fn get_current_cart(&self, claim: &IdentityClaim, owner_email: &str) -> Result<Vec<LineItem>, AppError> {
        authorize(claim, &CartOwner(owner_email))?;

        let cart = self.carts.find_current(owner_email).await?;
        Ok(cart.map(|c| c.items).unwrap_or_default())
    }

    pub async fn add_item(
        &self,
        claim: &IdentityClaim,
        owner_email: &str,
        product_id: i64,
        quantity: i32,
        options: LineItemOptions,
    ) -> Result<Vec<LineItem>, AppError> {
        authorize(claim, &CartOwner(owner_email))?;

        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(AppError::ProductNotFound(product_id))?;

        self.write_with_retry(owner_email, OnMissingCart::StartEmpty, |mut items| {
            match items.iter_mut().find(|item| item.product_id == product.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.checked_add(quantity).ok_or_else(|| {
                        AppError::InvalidInput(format!("quantidade acumulada grande demais para o produto {}", product.id))
                    })?;
                }
                None => items.push(LineItem::from_product(&product, quantity, options.clone())),
            }
            Ok(items)
        })
        .await
    }

    /// Sobrescreve a quantidade. Não há mínimo: 0 ou negativo é aceito como veio.
    pub async fn update_item_quantity(
        &self,
        claim: &IdentityClaim,
        owner_email: &str,
        product_id: i64,
        quantity: i32,
    ) -> Result<Vec<LineItem>, AppError> {
        authorize(claim, &CartOwner(owner_email))?;

        if quantity < 1 {
            tracing::warn!(owner_email, product_id, quantity, "quantidade não positiva aceita no carrinho");
        }

        self.write_with_retry(owner_email, OnMissingCart::NotFound, |mut items| {
            let item = items
                .iter_mut()
                .find(|item| item.product_id == product_id)
                .ok_or(AppError::ItemNotFound(product_id))?;
            item.quantity = quantity;
            Ok(items)
        })
        .await
    }

    /// Idempotente para o item: remover um produto ausente não é erro. Sem carrinho, 404.
    pub async fn remove_item(
        &self,
        claim: &IdentityClaim,
        owner_email: &str,
        product_id: i64,
    ) -> Result<Vec<LineItem>, AppError> {
        authorize(claim, &CartOwner(owner_email))?;

        self.write_with_retry(owner_email, OnMissingCart::NotFound, |mut items| {
            items.retain(|item| item.product_id != product_id);
            Ok(items)
        })
        .await
    }

    /// Apaga todos os registros de carrinho do dono, não só o atual.
    pub async fn clear(&self, claim: &IdentityClaim, owner_email: &str) -> Result<Vec<LineItem>, AppError> {
        authorize(claim, &CartOwner(owner_email))?;

        let removed = self.carts.delete_all(owner_email).await?;
        tracing::info!(owner_email, removed, "carrinho limpo");
        Ok(Vec::new())
    }

    // Ler, aplicar a mutação e gravar com a versão lida. Em conflito, relê e reaplica.
    async fn write_with_retry<F>(
        &self,
        owner_email: &str,
        on_missing: OnMissingCart,
        apply: F,
    ) -> Result<Vec<LineItem>, AppError>
    where
        F: Fn(Vec<LineItem>) -> Result<Vec<LineItem>, AppError> + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            let current = self.carts.find_current(owner_email).await?;

            let (items, expected_version) = match (current, on_missing) {
                (Some(cart), _) => (cart.items, Some(cart.version)),
                (None, OnMissingCart::StartEmpty) => (Vec::new(), None),
                (None, OnMissingCart::NotFound) => return Err(AppError::CartNotFound),
            };

            let updated = apply(items)?;

            match self.carts.save(owner_email, &updated, expected_version).await {
                Ok(saved) => return Ok(saved.items),
                Err(AppError::Conflict(reason)) if attempt < MAX_CART_WRITE_ATTEMPTS => {
                    tracing::debug!(owner_email, attempt, %reason, "versão do carrinho desatualizada; repetindo");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
