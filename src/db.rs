pub mod address_repo;
pub use address_repo::{AddressRepository, PgAddressRepository};
pub mod cart_repo;
pub use cart_repo::{CartRepository, PgCartRepository};
pub mod order_repo;
pub use order_repo::{OrderRepository, PgOrderRepository};
pub mod product_repo;
pub use product_repo::{PgProductRepository, ProductRepository};

#[cfg(test)]
pub mod memory;
