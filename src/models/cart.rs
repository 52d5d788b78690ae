// src/models/cart.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidationError;

use crate::models::catalog::Product;

pub const MAX_OPTIONS: usize = 20;
pub const MAX_OPTION_TEXT_LEN: usize = 200;

// --- Opções do item ---

/// Valor de uma opção escolhida pelo cliente (ex.: "tamanho": "grande", "extraQueijo": true).
/// Qualquer escalar JSON ou lista de textos; objetos aninhados são recusados.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Choices(Vec<String>),
    Null,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(example = json!({"tamanho": "grande", "extraQueijo": true}))]
pub struct LineItemOptions(pub BTreeMap<String, OptionValue>);

/// Validação de fronteira para o mapa de opções (usada via `#[validate(custom(...))]`).
pub fn validate_options(options: &LineItemOptions) -> Result<(), ValidationError> {
    if options.0.len() > MAX_OPTIONS {
        return Err(ValidationError::new("too_many_options")
            .with_message(format!("No máximo {} opções por item.", MAX_OPTIONS).into()));
    }

    for (key, value) in &options.0 {
        if key.trim().is_empty() {
            return Err(ValidationError::new("empty_option_name")
                .with_message("O nome da opção não pode ser vazio.".into()));
        }
        let too_long = match value {
            OptionValue::Text(text) => text.len() > MAX_OPTION_TEXT_LEN,
            OptionValue::Choices(choices) => choices.iter().any(|c| c.len() > MAX_OPTION_TEXT_LEN),
            OptionValue::Flag(_) | OptionValue::Integer(_) | OptionValue::Number(_) | OptionValue::Null => false,
        };
        if too_long {
            return Err(ValidationError::new("option_too_long")
                .with_message(format!("A opção '{}' excede {} caracteres.", key, MAX_OPTION_TEXT_LEN).into()));
        }
    }

    Ok(())
}

// --- Itens ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[schema(example = 7)]
    pub product_id: i64,
    #[schema(example = "Pizza Margherita")]
    pub name: String,
    #[schema(example = "12.50")]
    pub unit_price: Decimal,
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(example = 3)]
    pub business_id: i64,
    #[serde(default)]
    pub options: LineItemOptions,
}

impl LineItem {
    /// Fotografia do produto no momento em que entrou no carrinho.
    pub fn from_product(product: &Product, quantity: i32, options: LineItemOptions) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
            business_id: product.business_id,
            options,
        }
    }
}

// Um registro por e-mail (índice único). `version` protege o ciclo ler-modificar-escrever.
#[derive(Debug, Clone, FromRow)]
pub struct CartRecord {
    pub id: Uuid,
    pub owner_email: String,
    #[sqlx(json)]
    pub items: Vec<LineItem>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_accept_mixed_values() {
        let options: LineItemOptions = serde_json::from_value(json!({
            "tamanho": "grande",
            "extraQueijo": true,
            "fatias": 8,
            "molhos": ["alho", "pimenta"]
        }))
        .unwrap();

        assert_eq!(options.0.get("extraQueijo"), Some(&OptionValue::Flag(true)));
        assert_eq!(options.0.get("fatias"), Some(&OptionValue::Integer(8)));
        assert!(validate_options(&options).is_ok());
    }

    #[test]
    fn options_accept_fractions_and_null() {
        let options: LineItemOptions = serde_json::from_value(json!({ "extra": 1.5, "nada": null })).unwrap();

        assert_eq!(options.0.get("extra"), Some(&OptionValue::Number(1.5)));
        assert_eq!(options.0.get("nada"), Some(&OptionValue::Null));
        assert!(validate_options(&options).is_ok());
        assert_eq!(serde_json::to_value(&options).unwrap(), json!({ "extra": 1.5, "nada": null }));
    }

    #[test]
    fn options_reject_nested_objects() {
        let parsed = serde_json::from_value::<LineItemOptions>(json!({ "x": { "y": 1 } }));
        assert!(parsed.is_err());
    }

    #[test]
    fn options_reject_blank_names_and_long_text() {
        let mut options = LineItemOptions::default();
        options.0.insert(" ".into(), OptionValue::Flag(true));
        assert_eq!(validate_options(&options).unwrap_err().code, "empty_option_name");

        let mut options = LineItemOptions::default();
        options.0.insert("nota".into(), OptionValue::Text("a".repeat(MAX_OPTION_TEXT_LEN + 1)));
        assert_eq!(validate_options(&options).unwrap_err().code, "option_too_long");
    }

    #[test]
    fn line_item_serializes_camel_case() {
        let product = Product {
            id: 7,
            name: "Pizza".into(),
            price: Decimal::new(1250, 2),
            business_id: 3,
        };
        let value = serde_json::to_value(LineItem::from_product(&product, 2, LineItemOptions::default())).unwrap();
        assert_eq!(value["productId"], 7);
        assert_eq!(value["businessId"], 3);
        assert_eq!(value["quantity"], 2);
    }
}
