// src/models/catalog.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Produto do catálogo. Somente leitura para este serviço.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = "Pizza Margherita")]
    pub name: String,
    #[schema(example = "12.50")]
    pub price: Decimal,
    #[schema(example = 3)]
    pub business_id: i64,
}
