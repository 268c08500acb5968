//! Postgres-backed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use uuid::Uuid;

use super::{MarketStore, StoreError, StoreResult, UserProfile};
use crate::config::Config;
use crate::domain::{
    DeliveryAddress, LineItem, Money, Order, OrderStatus, PaymentStatus, Product, ProductPatch, Quantity,
};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid, farmer_id: Uuid, name: String, description: String, price: Decimal, quantity: i32,
    unit: String, category: String, images: Vec<String>, is_available: bool,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid, consumer_id: Uuid, farmer_id: Uuid, total_amount: Decimal, status: String, payment_status: String,
    payment_method: String, street: String, city: String, pincode: String,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow { order_id: Uuid, product_id: Uuid, quantity: i32, price: Decimal }

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow { id: Uuid, name: String, email: String, phone: String, role: String, farm_name: Option<String> }

fn corrupt(id: Uuid, reason: impl ToString) -> StoreError {
    StoreError::Corrupt { id, reason: reason.to_string() }
}

fn quantity(id: Uuid, raw: i32) -> StoreResult<Quantity> {
    u32::try_from(raw).map(Quantity::new).map_err(|_| corrupt(id, format!("negative quantity {raw}")))
}

fn money(id: Uuid, raw: Decimal) -> StoreResult<Money> {
    Money::new(raw).map_err(|e| corrupt(id, e))
}

fn stock_param(qty: Quantity) -> StoreResult<i32> {
    i32::try_from(qty.value()).map_err(|_| corrupt(Uuid::nil(), format!("quantity {qty} out of range")))
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;
    fn try_from(r: ProductRow) -> StoreResult<Self> {
        Ok(Product {
            price: money(r.id, r.price)?,
            quantity: quantity(r.id, r.quantity)?,
            unit: r.unit.parse().map_err(|e| corrupt(r.id, e))?,
            category: r.category.parse().map_err(|e| corrupt(r.id, e))?,
            id: r.id, farmer_id: r.farmer_id, name: r.name, description: r.description,
            images: r.images, is_available: r.is_available, created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItemRow>) -> StoreResult<Order> {
        let id = self.id;
        let items = items
            .into_iter()
            .map(|i| -> StoreResult<LineItem> {
                Ok(LineItem { product_id: i.product_id, quantity: quantity(id, i.quantity)?, price: money(id, i.price)? })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Order {
            id,
            consumer_id: self.consumer_id,
            farmer_id: self.farmer_id,
            items,
            total_amount: money(id, self.total_amount)?,
            status: self.status.parse().map_err(|e| corrupt(id, e))?,
            payment_status: self.payment_status.parse().map_err(|e| corrupt(id, e))?,
            delivery_address: DeliveryAddress { street: self.street, city: self.city, pincode: self.pincode },
            payment_method: self.payment_method.parse().map_err(|e| corrupt(id, e))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Owns the connection pool for the lifetime of the process.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_id, product_id, quantity, price FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let mut by_order: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }
        rows.into_iter()
            .map(|r| {
                let items = by_order.remove(&r.id).unwrap_or_default();
                r.into_order(items)
            })
            .collect()
    }

    async fn attach_one(&self, row: Option<OrderRow>) -> StoreResult<Option<Order>> {
        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MarketStore for PgStore {
    async fn insert_product(&self, p: &Product) -> StoreResult<()> {
        sqlx::query("INSERT INTO products (id, farmer_id, name, description, price, quantity, unit, category, images, is_available, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
            .bind(p.id).bind(p.farmer_id).bind(&p.name).bind(&p.description).bind(p.price.amount())
            .bind(stock_param(p.quantity)?).bind(p.unit.as_str()).bind(p.category.as_str()).bind(&p.images)
            .bind(p.is_available).bind(p.created_at).bind(p.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?
            .map(Product::try_from).transpose()
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool).await?
            .into_iter().map(Product::try_from).collect()
    }

    async fn list_products_by_farmer(&self, farmer_id: Uuid) -> StoreResult<Vec<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE farmer_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(farmer_id).fetch_all(&self.pool).await?
            .into_iter().map(Product::try_from).collect()
    }

    async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Option<Product>> {
        let quantity = patch.quantity.map(stock_param).transpose()?;
        sqlx::query_as::<_, ProductRow>(
            "UPDATE products SET \
               name = COALESCE($2, name), description = COALESCE($3, description), price = COALESCE($4, price), \
               quantity = COALESCE($5, quantity), unit = COALESCE($6, unit), category = COALESCE($7, category), \
               images = COALESCE($8, images), is_available = COALESCE($9, is_available), updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(patch.description.as_deref())
        .bind(patch.price.map(|p| p.amount()))
        .bind(quantity)
        .bind(patch.unit.map(|u| u.as_str()))
        .bind(patch.category.map(|c| c.as_str()))
        .bind(patch.images.as_ref())
        .bind(patch.is_available)
        .fetch_optional(&self.pool).await?
        .map(Product::try_from).transpose()
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() == 1)
    }

    async fn reserve_stock(&self, product_id: Uuid, qty: Quantity) -> StoreResult<bool> {
        let done = sqlx::query("UPDATE products SET quantity = quantity - $2, updated_at = NOW() WHERE id = $1 AND quantity >= $2")
            .bind(product_id).bind(stock_param(qty)?)
            .execute(&self.pool).await?;
        Ok(done.rows_affected() == 1)
    }

    async fn restore_stock(&self, product_id: Uuid, qty: Quantity) -> StoreResult<()> {
        sqlx::query("UPDATE products SET quantity = quantity + $2, updated_at = NOW() WHERE id = $1")
            .bind(product_id).bind(stock_param(qty)?)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_order(&self, o: &Order) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO orders (id, consumer_id, farmer_id, total_amount, status, payment_status, payment_method, street, city, pincode, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
            .bind(o.id).bind(o.consumer_id).bind(o.farmer_id).bind(o.total_amount.amount())
            .bind(o.status.as_str()).bind(o.payment_status.as_str()).bind(o.payment_method.as_str())
            .bind(&o.delivery_address.street).bind(&o.delivery_address.city).bind(&o.delivery_address.pincode)
            .bind(o.created_at).bind(o.updated_at)
            .execute(&mut *tx).await?;
        for (position, item) in o.items.iter().enumerate() {
            sqlx::query("INSERT INTO order_items (order_id, position, product_id, quantity, price) VALUES ($1, $2, $3, $4, $5)")
                .bind(o.id).bind(position as i32).bind(item.product_id).bind(stock_param(item.quantity)?).bind(item.price.amount())
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?;
        self.attach_one(row).await
    }

    async fn list_orders_by_consumer(&self, consumer_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE consumer_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(consumer_id).fetch_all(&self.pool).await?;
        self.attach_items(rows).await
    }

    async fn list_orders_by_farmer(&self, farmer_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE farmer_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(farmer_id).fetch_all(&self.pool).await?;
        self.attach_items(rows).await
    }

    async fn transition_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>("UPDATE orders SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2 RETURNING *")
            .bind(id).bind(from.as_str()).bind(to.as_str()).bind(at)
            .fetch_optional(&self.pool).await?;
        self.attach_one(row).await
    }

    async fn set_payment_status(&self, id: Uuid, status: PaymentStatus, at: DateTime<Utc>) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>("UPDATE orders SET payment_status = $2, updated_at = $3 WHERE id = $1 RETURNING *")
            .bind(id).bind(status.as_str()).bind(at)
            .fetch_optional(&self.pool).await?;
        self.attach_one(row).await
    }

    async fn find_profile(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT id, name, email, phone, role, farm_name FROM users WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?;
        row.map(|r| -> StoreResult<UserProfile> {
            Ok(UserProfile {
                role: r.role.parse().map_err(|e| corrupt(r.id, e))?,
                id: r.id, name: r.name, email: r.email, phone: r.phone, farm_name: r.farm_name,
            })
        })
        .transpose()
    }
}
