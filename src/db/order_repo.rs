// src/db/order_repo.rs

use async_trait::async_trait;
use sqlx::{types::Json, Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::orders::{NewOrder, NewOrderLine, Order, OrderDetail, OrderFilter, OrderLine, OrderStatus},
};

const ORDER_COLUMNS: &str =
    "id, owner_email, business_id, delivery_address, total, notes, status, created_at, updated_at";
const LINE_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price, subtotal, options";

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Passo 1: cabeçalho com status `pendiente`.
    async fn insert_header(&self, new_order: &NewOrder) -> Result<Order, AppError>;

    /// Passo 2: todas as linhas do pedido.
    async fn insert_lines(&self, order_id: Uuid, lines: &[NewOrderLine]) -> Result<Vec<OrderLine>, AppError>;

    /// Escrita compensatória usada quando o passo 2 falha.
    async fn delete_header(&self, order_id: Uuid) -> Result<(), AppError>;

    /// Cria cabeçalho e linhas como uma unidade.
    ///
    /// A implementação padrão serve para armazenamentos sem transação: se as linhas
    /// falharem, o cabeçalho é apagado uma única vez. Se até a compensação falhar, o
    /// erro sai com `orphaned: true` e um evento `reconciliation` é registrado.
    async fn create_with_lines(
        &self,
        new_order: &NewOrder,
        lines: &[NewOrderLine],
    ) -> Result<OrderDetail, AppError> {
        let header = self.insert_header(new_order).await?;

        let cause = match self.insert_lines(header.id, lines).await {
            Ok(lines) => return Ok(OrderDetail { header, lines }),
            Err(cause) => cause,
        };

        tracing::warn!(order_id = %header.id, error = %cause, "Falha ao gravar as linhas; compensando o cabeçalho");

        match self.delete_header(header.id).await {
            Ok(()) => Err(AppError::OrderCreationFailed { order_id: header.id, orphaned: false }),
            Err(compensation_error) => {
                tracing::error!(
                    target: "reconciliation",
                    order_id = %header.id,
                    owner_email = %header.owner_email,
                    error = %compensation_error,
                    "Cabeçalho de pedido órfão: a compensação falhou"
                );
                Err(AppError::OrderCreationFailed { order_id: header.id, orphaned: true })
            }
        }
    }

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, AppError>;

    /// Cabeçalhos filtrados, mais recentes primeiro, paginados por intervalo.
    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, AppError>;

    /// Total de pedidos que casam com os filtros, ignorando a página.
    async fn count(&self, filter: &OrderFilter) -> Result<i64, AppError>;

    async fn list_lines(&self, order_ids: &[Uuid]) -> Result<Vec<OrderLine>, AppError>;

    /// Compare-and-set: só altera se o status atual ainda for `expected`.
    async fn update_status(
        &self,
        order_id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, AppError>;
}

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_header_with<'e, E>(executor: E, new_order: &NewOrder) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO orders (owner_email, business_id, delivery_address, total, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(&new_order.owner_email)
            .bind(new_order.business_id)
            .bind(new_order.delivery_address.as_deref())
            .bind(new_order.total)
            .bind(new_order.notes.as_deref())
            .bind(OrderStatus::Pendiente)
            .fetch_one(executor)
            .await?;

        Ok(order)
    }

    async fn insert_lines_with<'e, E>(
        executor: E,
        order_id: Uuid,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if lines.is_empty() {
            return Err(AppError::InvalidOrder("pedido sem itens".into()));
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO order_lines (order_id, product_id, quantity, unit_price, subtotal, options) ",
        );
        builder.push_values(lines, |mut row, line| {
            row.push_bind(order_id)
                .push_bind(line.product_id)
                .push_bind(line.quantity)
                .push_bind(line.unit_price)
                .push_bind(line.subtotal)
                .push_bind(Json(line.options.clone()));
        });
        builder.push(format!(" RETURNING {LINE_COLUMNS}"));

        let inserted = builder.build_query_as::<OrderLine>().fetch_all(executor).await?;
        Ok(inserted)
    }
}

// Mesmos filtros para a página e para a contagem.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    if let Some(email) = &filter.owner_email {
        builder.push(" AND owner_email = ").push_bind(email.clone());
    }
    if let Some(business_id) = filter.business_id {
        builder.push(" AND business_id = ").push_bind(business_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert_header(&self, new_order: &NewOrder) -> Result<Order, AppError> {
        Self::insert_header_with(&self.pool, new_order).await
    }

    async fn insert_lines(&self, order_id: Uuid, lines: &[NewOrderLine]) -> Result<Vec<OrderLine>, AppError> {
        Self::insert_lines_with(&self.pool, order_id, lines).await
    }

    async fn delete_header(&self, order_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // No Postgres usamos uma transação de verdade: se as linhas falharem, o cabeçalho
    // sofre rollback automático ao sair do escopo (drop). O erro externo é o mesmo.
    async fn create_with_lines(
        &self,
        new_order: &NewOrder,
        lines: &[NewOrderLine],
    ) -> Result<OrderDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let header = Self::insert_header_with(&mut *tx, new_order).await?;

        let lines = match Self::insert_lines_with(&mut *tx, header.id, lines).await {
            Ok(lines) => lines,
            Err(cause) => {
                tracing::warn!(order_id = %header.id, error = %cause, "Falha ao gravar as linhas; rollback da transação");
                return Err(AppError::OrderCreationFailed { order_id: header.id, orphaned: false });
            }
        };

        tx.commit().await?;
        Ok(OrderDetail { header, lines })
    }

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE TRUE"));
        push_filters(&mut builder, filter);

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let orders = builder.build_query_as::<Order>().fetch_all(&self.pool).await?;
        Ok(orders)
    }

    async fn count(&self, filter: &OrderFilter) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders WHERE TRUE");
        push_filters(&mut builder, filter);

        let total: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn list_lines(&self, order_ids: &[Uuid]) -> Result<Vec<OrderLine>, AppError> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ANY($1) ORDER BY position");
        let lines = sqlx::query_as::<_, OrderLine>(&sql)
            .bind(order_ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    async fn update_status(
        &self,
        order_id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, AppError> {
        let sql = format!(
            r#"
            UPDATE orders
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(next)
            .bind(order_id)
            .bind(expected)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }
}
