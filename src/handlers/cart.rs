// src/handlers/cart.rs

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::ApiResponse,
    middleware::auth::AuthenticatedUser,
    models::cart::{LineItem, LineItemOptions},
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "a@x.com")]
    pub owner_email: String,

    #[schema(example = 7)]
    pub product_id: i64,

    #[validate(range(min = 1, message = "quantity_must_be_positive"))]
    #[schema(example = 2)]
    pub quantity: i32,

    #[serde(default)]
    #[validate(custom(function = "crate::models::cart::validate_options"))]
    pub options: LineItemOptions,
}

// A quantidade sobrescreve a atual, sem mínimo.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "a@x.com")]
    pub owner_email: String,

    #[schema(example = 7)]
    pub item_id: i64,

    #[schema(example = 5)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "a@x.com")]
    pub owner_email: String,

    #[schema(example = 7)]
    pub item_id: i64,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// GET /api/cart/{owner_email}
#[utoipa::path(
    get,
    path = "/api/cart/{owner_email}",
    tag = "Cart",
    responses(
        (status = 200, description = "Itens do carrinho atual (vazio se não houver)", body = [LineItem]),
        (status = 403, description = "O carrinho pertence a outro usuário")
    ),
    params(("owner_email" = String, Path, description = "E-mail do dono do carrinho")),
    security(("api_jwt" = []))
)]
pub async fn get_cart(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Path(owner_email): Path<String>,
) -> Result<Json<ApiResponse<Vec<LineItem>>>, AppError> {
    let items = app_state.cart_service.get_current_cart(&claim, &owner_email).await?;
    Ok(Json(ApiResponse::ok(items)))
}

// POST /api/cart/add
#[utoipa::path(
    post,
    path = "/api/cart/add",
    tag = "Cart",
    request_body = AddItemPayload,
    responses(
        (status = 200, description = "Item adicionado; retorna o carrinho", body = [LineItem]),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Json(payload): Json<AddItemPayload>,
) -> Result<Json<ApiResponse<Vec<LineItem>>>, AppError> {
    payload.validate()?;

    let items = app_state
        .cart_service
        .add_item(&claim, &payload.owner_email, payload.product_id, payload.quantity, payload.options)
        .await?;

    Ok(Json(ApiResponse::with_message("Produto adicionado ao carrinho", items)))
}

// PUT /api/cart/update
#[utoipa::path(
    put,
    path = "/api/cart/update",
    tag = "Cart",
    request_body = UpdateItemPayload,
    responses(
        (status = 200, description = "Quantidade atualizada", body = [LineItem]),
        (status = 404, description = "Carrinho ou item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<Json<ApiResponse<Vec<LineItem>>>, AppError> {
    payload.validate()?;

    let items = app_state
        .cart_service
        .update_item_quantity(&claim, &payload.owner_email, payload.item_id, payload.quantity)
        .await?;

    Ok(Json(ApiResponse::with_message("Carrinho atualizado", items)))
}

// DELETE /api/cart/remove
#[utoipa::path(
    delete,
    path = "/api/cart/remove",
    tag = "Cart",
    request_body = RemoveItemPayload,
    responses((status = 200, description = "Item removido (idempotente)", body = [LineItem])),
    security(("api_jwt" = []))
)]
pub async fn remove_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Json(payload): Json<RemoveItemPayload>,
) -> Result<Json<ApiResponse<Vec<LineItem>>>, AppError> {
    payload.validate()?;

    let items = app_state
        .cart_service
        .remove_item(&claim, &payload.owner_email, payload.item_id)
        .await?;

    Ok(Json(ApiResponse::with_message("Produto removido do carrinho", items)))
}

// DELETE /api/cart/clear/{owner_email}
#[utoipa::path(
    delete,
    path = "/api/cart/clear/{owner_email}",
    tag = "Cart",
    responses((status = 200, description = "Carrinho esvaziado", body = [LineItem])),
    params(("owner_email" = String, Path, description = "E-mail do dono do carrinho")),
    security(("api_jwt" = []))
)]
pub async fn clear_cart(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Path(owner_email): Path<String>,
) -> Result<Json<ApiResponse<Vec<LineItem>>>, AppError> {
    let items = app_state.cart_service.clear(&claim, &owner_email).await?;
    Ok(Json(ApiResponse::with_message("Carrinho esvaziado", items)))
}
