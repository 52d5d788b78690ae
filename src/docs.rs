// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Cart ---
        handlers::cart::get_cart,
        handlers::cart::add_item,
        handlers::cart::update_item,
        handlers::cart::remove_item,
        handlers::cart::clear_cart,

        // --- Orders ---
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_order_status,

        // --- Addresses ---
        handlers::addresses::create_address,
        handlers::addresses::list_addresses,
        handlers::addresses::get_address,
        handlers::addresses::update_address,
        handlers::addresses::delete_address,
        handlers::addresses::set_default_address,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::IdentityClaim,
            handlers::MessageResponse,

            // --- Cart ---
            models::cart::OptionValue,
            models::cart::LineItemOptions,
            models::cart::LineItem,
            handlers::cart::AddItemPayload,
            handlers::cart::UpdateItemPayload,
            handlers::cart::RemoveItemPayload,

            // --- Orders ---
            models::orders::OrderStatus,
            models::orders::Order,
            models::orders::OrderLine,
            models::orders::OrderDetail,
            models::orders::Pagination,
            handlers::orders::OrderListResponse,
            handlers::orders::OrderItemPayload,
            handlers::orders::CreateOrderPayload,
            handlers::orders::UpdateStatusPayload,

            // --- Addresses ---
            models::addresses::Address,
            handlers::addresses::CreateAddressPayload,
            handlers::addresses::UpdateAddressPayload,
        )
    ),
    tags(
        (name = "Cart", description = "Carrinho de compras por e-mail"),
        (name = "Orders", description = "Criação, consulta e status de pedidos"),
        (name = "Addresses", description = "Endereços de entrega do usuário")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
