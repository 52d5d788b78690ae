// src/services/order_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrderRepository,
    middleware::ownership::{authorize, CartOwner},
    models::{
        auth::{IdentityClaim, Role},
        cart::LineItemOptions,
        orders::{
            within_amount_limit, NewOrder, NewOrderLine, Order, OrderDetail, OrderFilter, OrderPage,
            OrderStatus, Pagination, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
        },
    },
};

/// Item pedido pelo cliente. O subtotal nunca vem dele.
#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub options: LineItemOptions,
}

#[derive(Debug, Clone)]
pub struct PlaceOrderInput {
    pub owner_email: String,
    pub business_id: i64,
    pub delivery_address: Option<String>,
    pub items: Vec<OrderItemInput>,
    // Total informado pelo cliente; só usado para registrar divergência.
    pub client_total: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    // --- CRIAÇÃO ---

    pub async fn place_order(&self, claim: &IdentityClaim, input: PlaceOrderInput) -> Result<OrderDetail, AppError> {
        // O pedido pertence ao e-mail informado, com as mesmas regras do carrinho.
        authorize(claim, &CartOwner(&input.owner_email))?;

        if input.items.is_empty() {
            return Err(AppError::InvalidOrder("o pedido precisa de pelo menos um item".into()));
        }
        if let Some(bad) = input.items.iter().find(|i| i.quantity < 1) {
            return Err(AppError::InvalidOrder(format!(
                "quantidade inválida para o produto {}",
                bad.product_id
            )));
        }

        let mut lines = Vec::with_capacity(input.items.len());
        for item in input.items {
            let product_id = item.product_id;
            let line = NewOrderLine::try_new(product_id, item.quantity, item.unit_price, item.options)
                .ok_or_else(|| AppError::InvalidOrder(format!("subtotal fora do limite para o produto {product_id}")))?;
            lines.push(line);
        }

        let total = lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.subtotal))
            .filter(|total| within_amount_limit(*total))
            .ok_or_else(|| AppError::InvalidOrder("total do pedido fora do limite".into()))?;

        if let Some(client_total) = input.client_total {
            if client_total != total {
                tracing::warn!(
                    owner_email = %input.owner_email,
                    %client_total,
                    %total,
                    "total enviado pelo cliente diverge; usando o calculado no servidor"
                );
            }
        }

        let new_order = NewOrder {
            owner_email: input.owner_email,
            business_id: input.business_id,
            delivery_address: input.delivery_address,
            total,
            notes: input.notes,
        };

        let detail = self.repo.create_with_lines(&new_order, &lines).await?;
        tracing::info!(order_id = %detail.header.id, lines = detail.lines.len(), %total, "pedido criado");
        Ok(detail)
    }

    // --- CONSULTAS ---

    pub async fn get_order(&self, claim: &IdentityClaim, order_id: Uuid) -> Result<OrderDetail, AppError> {
        let header = self.find(order_id).await?;
        authorize(claim, &header)?;

        let lines = self.repo.list_lines(&[order_id]).await?;
        Ok(OrderDetail { header, lines })
    }

    pub async fn list_orders(&self, claim: &IdentityClaim, filter: OrderFilter) -> Result<OrderPage, AppError> {
        let filter = scope_filter(claim, filter)?;

        let headers = self.repo.list(&filter).await?;
        let total = self.repo.count(&filter).await?;
        let ids: Vec<Uuid> = headers.iter().map(|o| o.id).collect();

        let mut lines_by_order: HashMap<Uuid, Vec<_>> = HashMap::new();
        for line in self.repo.list_lines(&ids).await? {
            lines_by_order.entry(line.order_id).or_default().push(line);
        }

        let orders = headers
            .into_iter()
            .map(|header| {
                let lines = lines_by_order.remove(&header.id).unwrap_or_default();
                OrderDetail { header, lines }
            })
            .collect();

        Ok(OrderPage {
            orders,
            pagination: Pagination { page: filter.page, limit: filter.limit, total },
        })
    }

    // --- TRANSIÇÃO ---

    pub async fn update_status(
        &self,
        claim: &IdentityClaim,
        order_id: Uuid,
        next: OrderStatus,
    ) -> Result<Order, AppError> {
        let order = self.find(order_id).await?;
        authorize_status_change(claim, &order, next)?;

        if !order.status.can_transition_to(next) {
            return Err(AppError::InvalidStatusTransition { from: order.status, to: next });
        }

        // Compare-and-set: se outro pedido de transição chegou antes, não sobrescrevemos.
        match self.repo.update_status(order_id, order.status, next).await? {
            Some(updated) => {
                tracing::info!(%order_id, from = ?order.status, to = ?next, terminal = next.is_terminal(), "status do pedido atualizado");
                Ok(updated)
            }
            None => match self.repo.find_by_id(order_id).await? {
                None => Err(AppError::OrderNotFound(order_id)),
                Some(current) => Err(AppError::Conflict(format!(
                    "o status do pedido mudou para {:?} durante a atualização",
                    current.status
                ))),
            },
        }
    }

    async fn find(&self, order_id: Uuid) -> Result<Order, AppError> {
        self.repo
            .find_by_id(order_id)
            .await?
            .ok_or(AppError::OrderNotFound(order_id))
    }
}

// Admin e o dono do negócio movem o pedido livremente (pela tabela);
// o cliente dono do pedido só pode cancelar.
fn authorize_status_change(claim: &IdentityClaim, order: &Order, next: OrderStatus) -> Result<(), AppError> {
    let is_business_owner = claim.role == Role::Duenio && claim.business_id == Some(order.business_id);
    let is_customer = claim.email == order.owner_email;

    if claim.is_admin() || is_business_owner || (is_customer && next == OrderStatus::Cancelado) {
        return Ok(());
    }
    Err(AppError::Forbidden)
}

// Restringe a listagem ao que o chamador pode ver e normaliza a paginação.
fn scope_filter(claim: &IdentityClaim, mut filter: OrderFilter) -> Result<OrderFilter, AppError> {
    filter.page = filter.page.max(1);
    filter.limit = match filter.limit {
        l if l < 1 => DEFAULT_PAGE_SIZE,
        l => l.min(MAX_PAGE_SIZE),
    };

    match claim.role {
        Role::Admin => {}
        Role::Duenio if filter.owner_email.is_none() => {
            match (filter.business_id, claim.business_id) {
                (Some(requested), Some(own)) if requested != own => return Err(AppError::Forbidden),
                (_, Some(own)) => filter.business_id = Some(own),
                (_, None) => filter.owner_email = Some(claim.email.clone()),
            }
        }
        Role::Duenio | Role::Cliente => {
            if let Some(email) = &filter.owner_email {
                authorize(claim, &CartOwner(email))?;
            }
            filter.owner_email = Some(claim.email.clone());
        }
    }

    Ok(filter)
}
