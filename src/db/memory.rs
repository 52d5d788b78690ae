// src/db/memory.rs
//
// Armazenamento em memória usado pelos testes. Implementa todos os repositórios e
// permite injetar falhas nos passos de escrita do pedido.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AddressRepository, CartRepository, OrderRepository, ProductRepository},
    models::{
        addresses::{Address, AddressChanges, AddressFields},
        cart::{CartRecord, LineItem},
        catalog::Product,
        orders::{NewOrder, NewOrderLine, Order, OrderFilter, OrderLine, OrderStatus},
    },
};

#[derive(Default)]
struct Tables {
    products: Vec<Product>,
    carts: Vec<CartRecord>,
    orders: Vec<Order>,
    order_lines: Vec<OrderLine>,
    addresses: Vec<Address>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pub fail_line_inserts: AtomicBool,
    pub fail_header_deletes: AtomicBool,
    // Quantas gravações de carrinho ainda devem ser rejeitadas com conflito.
    pub forced_cart_conflicts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_product(&self, id: i64, name: &str, price: rust_decimal::Decimal, business_id: i64) {
        self.tables.lock().await.products.push(Product {
            id,
            name: name.to_string(),
            price,
            business_id,
        });
    }

    pub async fn cart_records(&self, owner_email: &str) -> usize {
        self.tables.lock().await.carts.iter().filter(|c| c.owner_email == owner_email).count()
    }

    pub async fn order_headers(&self) -> Vec<Order> {
        self.tables.lock().await.orders.clone()
    }

    pub async fn order_line_count(&self) -> usize {
        self.tables.lock().await.order_lines.len()
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn find_by_id(&self, product_id: i64) -> Result<Option<Product>, AppError> {
        Ok(self.tables.lock().await.products.iter().find(|p| p.id == product_id).cloned())
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find_current(&self, owner_email: &str) -> Result<Option<CartRecord>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .carts
            .iter()
            .filter(|c| c.owner_email == owner_email)
            .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn save(
        &self,
        owner_email: &str,
        items: &[LineItem],
        expected_version: Option<i64>,
    ) -> Result<CartRecord, AppError> {
        let forced = self
            .forced_cart_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            return Err(AppError::Conflict("conflito injetado".into()));
        }

        let mut tables = self.tables.lock().await;
        let existing = tables.carts.iter_mut().find(|c| c.owner_email == owner_email);

        match (existing, expected_version) {
            (None, None) => {
                let record = CartRecord {
                    id: Uuid::new_v4(),
                    owner_email: owner_email.to_string(),
                    items: items.to_vec(),
                    version: 1,
                    updated_at: Utc::now(),
                };
                tables.carts.push(record.clone());
                Ok(record)
            }
            (Some(record), Some(version)) if record.version == version => {
                record.items = items.to_vec();
                record.version += 1;
                record.updated_at = Utc::now();
                Ok(record.clone())
            }
            _ => Err(AppError::Conflict(format!("carrinho de {} alterado concorrentemente", owner_email))),
        }
    }

    async fn delete_all(&self, owner_email: &str) -> Result<u64, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.carts.len();
        tables.carts.retain(|c| c.owner_email != owner_email);
        Ok((before - tables.carts.len()) as u64)
    }
}

// Sem override de `create_with_lines`: exercita o caminho compensatório padrão.
fn matches_filter(order: &Order, filter: &OrderFilter) -> bool {
    filter.owner_email.as_ref().is_none_or(|e| &order.owner_email == e)
        && filter.business_id.is_none_or(|b| order.business_id == b)
        && filter.status.is_none_or(|s| order.status == s)
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_header(&self, new_order: &NewOrder) -> Result<Order, AppError> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            owner_email: new_order.owner_email.clone(),
            business_id: new_order.business_id,
            delivery_address: new_order.delivery_address.clone(),
            total: new_order.total,
            notes: new_order.notes.clone(),
            status: OrderStatus::Pendiente,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.orders.push(order.clone());
        Ok(order)
    }

    async fn insert_lines(&self, order_id: Uuid, lines: &[NewOrderLine]) -> Result<Vec<OrderLine>, AppError> {
        if self.fail_line_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("falha injetada em order_lines".into()));
        }

        let inserted: Vec<OrderLine> = lines
            .iter()
            .map(|line| OrderLine {
                id: Uuid::new_v4(),
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
                options: line.options.clone(),
            })
            .collect();
        self.tables.lock().await.order_lines.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn delete_header(&self, order_id: Uuid) -> Result<(), AppError> {
        if self.fail_header_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("falha injetada ao apagar pedido".into()));
        }

        let mut tables = self.tables.lock().await;
        tables.orders.retain(|o| o.id != order_id);
        tables.order_lines.retain(|l| l.order_id != order_id);
        Ok(())
    }

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self.tables.lock().await.orders.iter().find(|o| o.id == order_id).cloned())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, AppError> {
        let tables = self.tables.lock().await;
        let mut orders: Vec<Order> = tables.orders.iter().filter(|o| matches_filter(o, filter)).cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(orders
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &OrderFilter) -> Result<i64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.orders.iter().filter(|o| matches_filter(o, filter)).count() as i64)
    }

    async fn list_lines(&self, order_ids: &[Uuid]) -> Result<Vec<OrderLine>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .order_lines
            .iter()
            .filter(|l| order_ids.contains(&l.order_id))
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        order_id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .orders
            .iter_mut()
            .find(|o| o.id == order_id && o.status == expected)
            .map(|order| {
                order.status = next;
                order.updated_at = Utc::now();
                order.clone()
            }))
    }
}

#[async_trait]
impl AddressRepository for MemoryStore {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Address>, AppError> {
        let tables = self.tables.lock().await;
        let mut addresses: Vec<Address> =
            tables.addresses.iter().filter(|a| a.owner_id == owner_id).cloned().collect();
        addresses.sort_by(|a, b| b.is_default.cmp(&a.is_default).then(b.created_at.cmp(&a.created_at)));
        Ok(addresses)
    }

    async fn find_by_id(&self, address_id: Uuid) -> Result<Option<Address>, AppError> {
        Ok(self.tables.lock().await.addresses.iter().find(|a| a.id == address_id).cloned())
    }

    async fn create(&self, owner_id: Uuid, fields: &AddressFields) -> Result<Address, AppError> {
        let mut tables = self.tables.lock().await;
        if fields.is_default {
            clear_defaults(&mut tables.addresses, owner_id, None);
        }

        let now = Utc::now();
        let address = Address {
            id: Uuid::new_v4(),
            owner_id,
            label: fields.label.clone(),
            street_address: fields.street_address.clone(),
            notes: fields.notes.clone(),
            latitude: fields.latitude,
            longitude: fields.longitude,
            is_default: fields.is_default,
            created_at: now,
            updated_at: now,
        };
        tables.addresses.push(address.clone());
        Ok(address)
    }

    async fn update(&self, address_id: Uuid, changes: &AddressChanges) -> Result<Option<Address>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(owner_id) = tables.addresses.iter().find(|a| a.id == address_id).map(|a| a.owner_id) else {
            return Ok(None);
        };

        if changes.is_default == Some(true) {
            clear_defaults(&mut tables.addresses, owner_id, Some(address_id));
        }

        Ok(tables.addresses.iter_mut().find(|a| a.id == address_id).map(|address| {
            changes.apply_to(address);
            address.updated_at = Utc::now();
            address.clone()
        }))
    }

    async fn set_default(&self, address_id: Uuid) -> Result<Option<Address>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(owner_id) = tables.addresses.iter().find(|a| a.id == address_id).map(|a| a.owner_id) else {
            return Ok(None);
        };

        clear_defaults(&mut tables.addresses, owner_id, None);

        Ok(tables.addresses.iter_mut().find(|a| a.id == address_id).map(|address| {
            address.is_default = true;
            address.updated_at = Utc::now();
            address.clone()
        }))
    }

    async fn delete(&self, address_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.addresses.len();
        tables.addresses.retain(|a| a.id != address_id);
        Ok(tables.addresses.len() < before)
    }
}

fn clear_defaults(addresses: &mut [Address], owner_id: Uuid, except: Option<Uuid>) {
    for address in addresses
        .iter_mut()
        .filter(|a| a.owner_id == owner_id && a.is_default && Some(a.id) != except)
    {
        address.is_default = false;
        address.updated_at = Utc::now();
    }
}
