// src/handlers/addresses.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{ApiResponse, MessageResponse},
    middleware::auth::AuthenticatedUser,
    models::addresses::{Address, AddressChanges, AddressFields},
};

fn coordinate_in(val: f64, limit: f64, field: &str) -> Result<(), ValidationError> {
    if !(-limit..=limit).contains(&val) {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &-limit);
        err.add_param("max".into(), &limit);
        err.message = Some(format!("A {field} deve estar entre -{limit} e {limit}.").into());
        return Err(err);
    }
    Ok(())
}

fn validate_latitude(val: f64) -> Result<(), ValidationError> {
    coordinate_in(val, 90.0, "latitude")
}

fn validate_longitude(val: f64) -> Result<(), ValidationError> {
    coordinate_in(val, 180.0, "longitude")
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressPayload {
    pub owner_id: Uuid,

    #[validate(length(min = 1, max = 50, message = "required"))]
    #[schema(example = "Casa")]
    pub label: String,

    #[validate(length(min = 1, max = 300, message = "required"))]
    #[schema(example = "Av. Siempre Viva 742")]
    pub street_address: String,

    #[validate(length(max = 500))]
    pub notes: Option<String>,

    #[validate(custom(function = "validate_latitude"))]
    #[schema(example = -34.6037)]
    pub latitude: Option<f64>,

    #[validate(custom(function = "validate_longitude"))]
    #[schema(example = -58.3816)]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub is_default: bool,
}

// Atualização parcial: campos ausentes ficam como estão.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressPayload {
    #[validate(length(min = 1, max = 50))]
    pub label: Option<String>,

    #[validate(length(min = 1, max = 300))]
    pub street_address: Option<String>,

    #[validate(length(max = 500))]
    pub notes: Option<String>,

    #[validate(custom(function = "validate_latitude"))]
    pub latitude: Option<f64>,

    #[validate(custom(function = "validate_longitude"))]
    pub longitude: Option<f64>,

    pub is_default: Option<bool>,
}

// POST /api/addresses
#[utoipa::path(
    post,
    path = "/api/addresses",
    tag = "Addresses",
    request_body = CreateAddressPayload,
    responses(
        (status = 201, description = "Endereço criado", body = Address),
        (status = 409, description = "Outro endereço padrão foi gravado ao mesmo tempo")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_address(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Json(payload): Json<CreateAddressPayload>,
) -> Result<(StatusCode, Json<ApiResponse<Address>>), AppError> {
    payload.validate()?;

    let fields = AddressFields {
        label: payload.label,
        street_address: payload.street_address,
        notes: payload.notes,
        latitude: payload.latitude,
        longitude: payload.longitude,
        is_default: payload.is_default,
    };

    let address = app_state.address_service.create(&claim, payload.owner_id, fields).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message("Endereço criado", address))))
}

// GET /api/addresses/user/{owner_id}
#[utoipa::path(
    get,
    path = "/api/addresses/user/{owner_id}",
    tag = "Addresses",
    params(("owner_id" = Uuid, Path, description = "ID do usuário dono dos endereços")),
    responses((status = 200, description = "Endereços do usuário, padrão primeiro", body = [Address])),
    security(("api_jwt" = []))
)]
pub async fn list_addresses(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Address>>>, AppError> {
    let addresses = app_state.address_service.list(&claim, owner_id).await?;
    Ok(Json(ApiResponse::ok(addresses)))
}

// GET /api/addresses/user/{owner_id}/{address_id}
#[utoipa::path(
    get,
    path = "/api/addresses/user/{owner_id}/{address_id}",
    tag = "Addresses",
    params(
        ("owner_id" = Uuid, Path, description = "ID do usuário"),
        ("address_id" = Uuid, Path, description = "ID do endereço")
    ),
    responses(
        (status = 200, description = "Endereço", body = Address),
        (status = 404, description = "Endereço não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_address(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Path((owner_id, address_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Address>>, AppError> {
    let address = app_state.address_service.get(&claim, owner_id, address_id).await?;
    Ok(Json(ApiResponse::ok(address)))
}

// PUT /api/addresses/{address_id}
#[utoipa::path(
    put,
    path = "/api/addresses/{address_id}",
    tag = "Addresses",
    request_body = UpdateAddressPayload,
    params(("address_id" = Uuid, Path, description = "ID do endereço")),
    responses((status = 200, description = "Endereço atualizado", body = Address)),
    security(("api_jwt" = []))
)]
pub async fn update_address(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Path(address_id): Path<Uuid>,
    Json(payload): Json<UpdateAddressPayload>,
) -> Result<Json<ApiResponse<Address>>, AppError> {
    payload.validate()?;

    let changes = AddressChanges {
        label: payload.label,
        street_address: payload.street_address,
        notes: payload.notes,
        latitude: payload.latitude,
        longitude: payload.longitude,
        is_default: payload.is_default,
    };

    let address = app_state.address_service.update(&claim, address_id, changes).await?;
    Ok(Json(ApiResponse::with_message("Endereço atualizado", address)))
}

// DELETE /api/addresses/{address_id}
#[utoipa::path(
    delete,
    path = "/api/addresses/{address_id}",
    tag = "Addresses",
    params(("address_id" = Uuid, Path, description = "ID do endereço")),
    responses(
        (status = 200, description = "Endereço removido", body = MessageResponse),
        (status = 404, description = "Endereço não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_address(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Path(address_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.address_service.delete(&claim, address_id).await?;
    Ok(Json(MessageResponse::new("Endereço removido com sucesso")))
}

// PUT /api/addresses/{address_id}/default
#[utoipa::path(
    put,
    path = "/api/addresses/{address_id}/default",
    tag = "Addresses",
    params(("address_id" = Uuid, Path, description = "ID do endereço")),
    responses((status = 200, description = "Endereço marcado como padrão", body = Address)),
    security(("api_jwt" = []))
)]
pub async fn set_default_address(
    State(app_state): State<AppState>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Path(address_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Address>>, AppError> {
    let address = app_state.address_service.set_default(&claim, address_id).await?;
    Ok(Json(ApiResponse::with_message("Endereço padrão atualizado", address)))
}
