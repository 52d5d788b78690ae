// src/models/orders.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::cart::LineItemOptions;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pendiente,
    Confirmado,
    Preparando,
    EnCamino,
    Entregado,
    Cancelado,
}

impl OrderStatus {
    /// Tabela de transições permitidas. `Entregado` e `Cancelado` são terminais.
    pub fn allowed_next(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pendiente => &[Confirmado, Cancelado],
            Confirmado => &[Preparando, Cancelado],
            Preparando => &[EnCamino, Cancelado],
            EnCamino => &[Entregado],
            Entregado | Cancelado => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }
}

// --- Structs de Pedido ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(example = "a@x.com")]
    pub owner_email: String,
    #[schema(example = 3)]
    pub business_id: i64,
    #[schema(example = "Av. Siempre Viva 742")]
    pub delivery_address: Option<String>,
    #[schema(example = "25.00")]
    pub total: Decimal,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    #[schema(example = 7)]
    pub product_id: i64,
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(example = "12.50")]
    pub unit_price: Decimal,
    #[schema(example = "25.00")]
    pub subtotal: Decimal,
    #[sqlx(json)]
    pub options: LineItemOptions,
}

// Cabeçalho + linhas. Um pedido nunca é exposto sem as suas linhas.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub header: Order,
    pub lines: Vec<OrderLine>,
}

// --- Dados de escrita ---

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub owner_email: String,
    pub business_id: i64,
    pub delivery_address: Option<String>,
    pub total: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub options: LineItemOptions,
}

/// Maior valor que cabe em `NUMERIC(12, 2)`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

pub fn within_amount_limit(amount: Decimal) -> bool {
    amount <= MAX_AMOUNT
}

impl NewOrderLine {
    // O subtotal é sempre calculado no servidor. `None` se não couber na coluna.
    pub fn try_new(product_id: i64, quantity: i32, unit_price: Decimal, options: LineItemOptions) -> Option<Self> {
        let subtotal = unit_price.checked_mul(Decimal::from(quantity)).filter(|s| within_amount_limit(*s))?;
        Some(Self {
            product_id,
            quantity,
            unit_price,
            subtotal,
            options,
        })
    }
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub owner_email: Option<String>,
    pub business_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub page: i64,
    pub limit: i64,
}

impl OrderFilter {
    // Satura em vez de estourar: uma página absurda vira uma página vazia.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit.max(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    /// Pedidos que casam com os filtros, somando todas as páginas.
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<OrderDetail>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn happy_path_transitions() {
        assert!(Pendiente.can_transition_to(Confirmado));
        assert!(Confirmado.can_transition_to(Preparando));
        assert!(Preparando.can_transition_to(EnCamino));
        assert!(EnCamino.can_transition_to(Entregado));
    }

    #[test]
    fn terminal_states_and_skips_are_rejected() {
        assert!(Entregado.is_terminal());
        assert!(Cancelado.is_terminal());
        assert!(!Pendiente.can_transition_to(Entregado));
        assert!(!EnCamino.can_transition_to(Cancelado));
        assert!(!Pendiente.can_transition_to(Pendiente));
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_value(EnCamino).unwrap(), "en_camino");
        assert_eq!(serde_json::from_str::<OrderStatus>("\"pendiente\"").unwrap(), Pendiente);
        assert!(serde_json::from_str::<OrderStatus>("\"enviado\"").is_err());
    }

    #[test]
    fn subtotal_is_price_times_quantity() {
        let line = NewOrderLine::try_new(7, 3, Decimal::new(1250, 2), LineItemOptions::default()).unwrap();
        assert_eq!(line.subtotal, Decimal::new(3750, 2));
    }

    #[test]
    fn subtotal_outside_the_column_range_is_refused() {
        assert_eq!(MAX_AMOUNT.to_string(), "9999999999.99");
        let huge = Decimal::from_str_exact("70000000000000000000000000000").unwrap();
        assert!(NewOrderLine::try_new(7, 2, huge, LineItemOptions::default()).is_none());
        assert!(NewOrderLine::try_new(7, 2, MAX_AMOUNT, LineItemOptions::default()).is_none());
        assert!(NewOrderLine::try_new(7, 1, MAX_AMOUNT, LineItemOptions::default()).is_some());
    }

    #[test]
    fn filter_offset() {
        let filter = OrderFilter { page: 3, limit: 20, ..Default::default() };
        assert_eq!(filter.offset(), 40);
        let filter = OrderFilter { page: 0, limit: 20, ..Default::default() };
        assert_eq!(filter.offset(), 0);
        let filter = OrderFilter { page: i64::MAX, limit: 100, ..Default::default() };
        assert_eq!(filter.offset(), i64::MAX);
    }
}
