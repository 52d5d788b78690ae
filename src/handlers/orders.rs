// src/handlers/orders.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::ApiResponse,
    middleware::auth::AuthenticatedUser,
    models::{
        cart::LineItemOptions,
        orders::{
            within_amount_limit, Order, OrderDetail, OrderFilter, OrderStatus, Pagination, DEFAULT_PAGE_SIZE,
            MAX_AMOUNT,
        },
    },
    services::order_service::{OrderItemInput, PlaceOrderInput},
};

fn validate_unit_price(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O preço unitário não pode ser negativo.".into());
        return Err(err);
    }
    if !within_amount_limit(*val) {
        let mut err = ValidationError::new("range");
        err.add_param("max".into(), &MAX_AMOUNT.to_string());
        err.message = Some(format!("O preço unitário não pode passar de {MAX_AMOUNT}.").into());
        return Err(err);
    }
    Ok(())
}

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    #[schema(example = 7)]
    pub product_id: i64,

    #[validate(range(min = 1, message = "quantity_must_be_positive"))]
    #[schema(example = 2)]
    pub quantity: i32,

    #[validate(custom(function = "validate_unit_price"))]
    #[schema(example = "12.50")]
    pub unit_price: Decimal,

    #[serde(default)]
    #[validate(custom(function = "crate::models::cart::validate_options"))]
    pub options: LineItemOptions,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "a@x.com")]
    pub owner_email: String,

    #[schema(example = 3)]
    pub business_id: i64,

    #[validate(length(max = 300))]
    #[schema(example = "Av. Siempre Viva 742")]
    pub delivery_address: Option<String>,

    // Lista vazia é rejeitada pelo serviço como pedido inválido.
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<OrderItemPayload>,

    /// Ignorado: o total é sempre recalculado no servidor.
    #[schema(example = "25.00")]
    pub total: Option<Decimal>,

    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusPayload {
    #[schema(example = "confirmado")]
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListOrdersQuery {
    pub owner_email: Option<String>,
    pub business_id: Option<i64>,
    pub status: Option<OrderStatus>,
    /// Começa em 1.
    pub page: Option<i64>,
    /// Padrão 20, máximo 100.
    pub limit: Option<i64>,
}

impl From<ListOrdersQuery> for OrderFilter {
    fn from(query: ListOrdersQuery) -> Self {
        OrderFilter {
            owner_email: query.owner_email,
            business_id: query.business_id,
            status: query.status,
            page: query.page.unwrap_or(1),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

// Listagem paginada: `data` traz a página, `pagination` o total para montar a navegação.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub success: bool,
    pub data: Vec<OrderDetail>,
    pub pagination: Pagination,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado com as suas linhas", body = OrderDetail),
        (status = 400, description = "Pedido sem itens ou com dados inválidos"),
        (status = 500, description = "Falha ao gravar as linhas do pedido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<(StatusCode, Json<ApiResponse<OrderDetail>>), AppError> {
    payload.validate()?;

    let input = PlaceOrderInput {
        owner_email: payload.owner_email,
        business_id: payload.business_id,
        delivery_address: payload.delivery_address,
        items: payload
            .items
            .into_iter()
            .map(|item| OrderItemInput {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                options: item.options,
            })
            .collect(),
        client_total: payload.total,
        notes: payload.notes,
    };

    let order = app_state.order_service.place_order(&claim, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message("Pedido criado com sucesso", order))))
}

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(ListOrdersQuery),
    responses((status = 200, description = "Pedidos visíveis ao chamador, mais recentes primeiro", body = OrderListResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<OrderListResponse>, AppError> {
    let page = app_state.order_service.list_orders(&claim, query.into()).await?;
    Ok(Json(OrderListResponse {
        success: true,
        data: page.orders,
        pagination: page.pagination,
    }))
}

// GET /api/orders/{order_id}
#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    tag = "Orders",
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido com as suas linhas", body = OrderDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderDetail>>, AppError> {
    let order = app_state.order_service.get_order(&claim, order_id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

// PUT /api/orders/{order_id}/status
#[utoipa::path(
    put,
    path = "/api/orders/{order_id}/status",
    tag = "Orders",
    request_body = UpdateStatusPayload,
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Status atualizado", body = Order),
        (status = 409, description = "Transição de status não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let order = app_state
        .order_service
        .update_status(&claim, order_id, payload.status)
        .await?;
    Ok(Json(ApiResponse::with_message("Status do pedido atualizado", order)))
}
