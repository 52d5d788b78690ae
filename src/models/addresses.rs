// src/models/addresses.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Casa")]
    pub label: String,
    #[schema(example = "Av. Siempre Viva 742")]
    pub street_address: String,
    #[schema(example = "Portão azul")]
    pub notes: Option<String>,
    #[schema(example = -34.6037)]
    pub latitude: Option<f64>,
    #[schema(example = -58.3816)]
    pub longitude: Option<f64>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Campos de criação, já validados na fronteira.
#[derive(Debug, Clone, Default)]
pub struct AddressFields {
    pub label: String,
    pub street_address: String,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_default: bool,
}

// Atualização parcial: `None` mantém o valor atual.
#[derive(Debug, Clone, Default)]
pub struct AddressChanges {
    pub label: Option<String>,
    pub street_address: Option<String>,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_default: Option<bool>,
}

impl AddressChanges {
    pub fn apply_to(&self, address: &mut Address) {
        if let Some(label) = &self.label {
            address.label = label.clone();
        }
        if let Some(street) = &self.street_address {
            address.street_address = street.clone();
        }
        if let Some(notes) = &self.notes {
            address.notes = Some(notes.clone());
        }
        if let Some(lat) = self.latitude {
            address.latitude = Some(lat);
        }
        if let Some(lng) = self.longitude {
            address.longitude = Some(lng);
        }
        if let Some(is_default) = self.is_default {
            address.is_default = is_default;
        }
    }
}
