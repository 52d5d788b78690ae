// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        AddressRepository, CartRepository, OrderRepository, PgAddressRepository, PgCartRepository,
        PgOrderRepository, PgProductRepository, ProductRepository,
    },
    services::{
        address_service::AddressService, auth::TokenVerifier, cart_service::CartService,
        order_service::OrderService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {raw}"))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            db_max_connections,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub token_verifier: TokenVerifier,
    pub cart_service: CartService,
    pub order_service: OrderService,
    pub address_service: AddressService,
}

impl AppState {
    // --- Monta o gráfico de dependências sobre o PostgreSQL ---
    pub fn from_pool(pool: PgPool, jwt_secret: &str) -> Self {
        Self::from_repos(
            TokenVerifier::new(jwt_secret),
            Arc::new(PgCartRepository::new(pool.clone())),
            Arc::new(PgProductRepository::new(pool.clone())),
            Arc::new(PgOrderRepository::new(pool.clone())),
            Arc::new(PgAddressRepository::new(pool)),
        )
    }

    pub fn from_repos(
        token_verifier: TokenVerifier,
        carts: Arc<dyn CartRepository>,
        products: Arc<dyn ProductRepository>,
        orders: Arc<dyn OrderRepository>,
        addresses: Arc<dyn AddressRepository>,
    ) -> Self {
        Self {
            token_verifier,
            cart_service: CartService::new(carts, products),
            order_service: OrderService::new(orders),
            address_service: AddressService::new(addresses),
        }
    }
}
