//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_support;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let pool = config.connect().await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app_state = AppState::from_pool(pool, &config.jwt_secret);
    let app = build_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    let cart_routes = Router::new()
        .route("/add", post(handlers::cart::add_item))
        .route("/update", put(handlers::cart::update_item))
        .route("/remove", delete(handlers::cart::remove_item))
        .route("/clear/{owner_email}", delete(handlers::cart::clear_cart))
        .route("/{owner_email}", get(handlers::cart::get_cart));

    let order_routes = Router::new()
        .route(
            "/",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/{order_id}", get(handlers::orders::get_order))
        .route("/{order_id}/status", put(handlers::orders::update_order_status));

    let address_routes = Router::new()
        .route("/", post(handlers::addresses::create_address))
        .route("/user/{owner_id}", get(handlers::addresses::list_addresses))
        .route("/user/{owner_id}/{address_id}", get(handlers::addresses::get_address))
        .route(
            "/{address_id}",
            put(handlers::addresses::update_address).delete(handlers::addresses::delete_address),
        )
        .route("/{address_id}/default", put(handlers::addresses::set_default_address));

    // Tudo abaixo exige um token Bearer válido.
    let protected_routes = Router::new()
        .nest("/cart", cart_routes)
        .nest("/orders", order_routes)
        .nest("/addresses", address_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", protected_routes)
        .with_state(app_state)
}
