use async_trait::async_trait;
use chrono::Utc;
use common::{
    Address, Cart, CartLineItem, IdentityKey, Money, Order, OrderId, OrderLineItem, Product,
    ProductId, User, UserId, Wishlist,
};
use sqlx::{PgPool, Row, postgres::PgRow, types::Json};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{
        CartRepository, CatalogStore, OrderRepository, StockDecrement, UserRepository,
        WishlistRepository,
    },
};

const PRODUCT_COLUMNS: &str = "id, sku, name, slug, description, brand, category, price, \
    discount_price, stock, main_image, images, status, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, order_number, user_id, items, subtotal, discount, shipping, \
    tax, total, status, payment_method, shipping_method, shipping_address, tracking_code, \
    created_at, updated_at";

const USER_COLUMNS: &str = "id, email, mobile, name, password_hash, role, created_at";

/// PostgreSQL-backed storefront store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let Json(images): Json<Vec<String>> = row.try_get("images")?;
        let status: String = row.try_get("status")?;

        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            brand: row.try_get("brand")?,
            category: row.try_get("category")?,
            price: Money::new(row.try_get("price")?),
            discount_price: row
                .try_get::<Option<i64>, _>("discount_price")?
                .map(Money::new),
            stock: to_u32(row.try_get("stock")?)?,
            main_image: row.try_get("main_image")?,
            images,
            status: status.parse().map_err(StoreError::Corrupt)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let Json(items): Json<Vec<OrderLineItem>> = row.try_get("items")?;
        let Json(shipping_address): Json<Address> = row.try_get("shipping_address")?;
        let status: String = row.try_get("status")?;
        let payment_method: String = row.try_get("payment_method")?;
        let shipping_method: String = row.try_get("shipping_method")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_number: row.try_get("order_number")?,
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            items,
            subtotal: Money::new(row.try_get("subtotal")?),
            discount: Money::new(row.try_get("discount")?),
            shipping: Money::new(row.try_get("shipping")?),
            tax: Money::new(row.try_get("tax")?),
            total: Money::new(row.try_get("total")?),
            status: status.parse().map_err(StoreError::Corrupt)?,
            payment_method: payment_method.parse().map_err(StoreError::Corrupt)?,
            shipping_method: shipping_method.parse().map_err(StoreError::Corrupt)?,
            shipping_address,
            tracking_code: row.try_get("tracking_code")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        let role: String = row.try_get("role")?;

        Ok(User {
            id: UserId::new(row.try_get::<String, _>("id")?),
            email: row.try_get("email")?,
            mobile: row.try_get("mobile")?,
            name: row.try_get("name")?,
            password_hash: row.try_get("password_hash")?,
            role: role.parse().map_err(StoreError::Corrupt)?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn fetch_orders(&self, sql: &str, user_id: Option<&UserId>) -> Result<Vec<Order>> {
        let mut query = sqlx::query(sql);
        if let Some(user_id) = user_id {
            query = query.bind(user_id.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }
}

fn to_u32(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative stock: {value}")))
}

fn to_i32(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("quantity out of range: {value}")))
}

fn count_to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// Maps a unique constraint violation to `UniqueViolation`, naming the field.
fn map_unique(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        let field = match db_err.constraint() {
            Some("users_email_key") => "email",
            Some("users_mobile_key") => "mobile",
            Some("products_sku_key") => "sku",
            Some("orders_order_number_key") => "order_number",
            _ => "id",
        };
        return StoreError::UniqueViolation {
            field: field.to_string(),
        };
    }
    StoreError::Database(err)
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn list_published(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE status = 'published' \
             ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, slug, description, brand, category, price,
                                  discount_price, stock, main_image, images, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(product.price.amount())
        .bind(product.discount_price.map(|m| m.amount()))
        .bind(to_i32(product.stock)?)
        .bind(&product.main_image)
        .bind(Json(&product.images))
        .bind(product.status.as_str())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;

        Ok(())
    }

    async fn update_product(&self, product: Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET sku = $2, name = $3, slug = $4, description = $5, brand = $6, category = $7,
                price = $8, discount_price = $9, stock = $10, main_image = $11, images = $12,
                status = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(product.price.amount())
        .bind(product.discount_price.map(|m| m.amount()))
        .bind(to_i32(product.stock)?)
        .bind(&product.main_image)
        .bind(Json(&product.images))
        .bind(product.status.as_str())
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "Product",
                id: product.id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn try_decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<StockDecrement> {
        let quantity = to_i32(quantity)?;

        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(id.as_str())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(remaining) = remaining {
            return Ok(StockDecrement::Applied {
                remaining: to_u32(remaining)?,
            });
        }

        // The conditional update matched nothing: either the product is gone
        // or it had too little stock.
        let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match available {
            Some(available) => Ok(StockDecrement::Insufficient {
                available: to_u32(available)?,
            }),
            None => Ok(StockDecrement::Missing),
        }
    }

    async fn count_products(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count_to_u64(count))
    }
}

#[async_trait]
impl CartRepository for PostgresStore {
    async fn load_cart(&self, identity: &IdentityKey) -> Result<Option<Cart>> {
        let row = sqlx::query("SELECT items FROM carts WHERE identity_key = $1")
            .bind(identity.storage_key())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(items): Json<Vec<CartLineItem>> = row.try_get("items")?;
                Ok(Some(Cart {
                    identity: identity.clone(),
                    items,
                }))
            }
            None => Ok(None),
        }
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (identity_key, items, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (identity_key) DO UPDATE SET
                items = EXCLUDED.items,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(cart.identity.storage_key())
        .bind(Json(&cart.items))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn evict_cart(&self, identity: &IdentityKey) -> Result<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE identity_key = $1")
            .bind(identity.storage_key())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl WishlistRepository for PostgresStore {
    async fn load_wishlist(&self, user_id: &UserId) -> Result<Option<Wishlist>> {
        let row = sqlx::query("SELECT items FROM wishlists WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(items): Json<Vec<ProductId>> = row.try_get("items")?;
                Ok(Some(Wishlist {
                    user_id: user_id.clone(),
                    items,
                }))
            }
            None => Ok(None),
        }
    }

    async fn save_wishlist(&self, wishlist: &Wishlist) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wishlists (user_id, items, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                items = EXCLUDED.items,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(wishlist.user_id.as_str())
        .bind(Json(&wishlist.items))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn save_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, user_id, items, subtotal, discount, shipping, tax,
                                total, status, payment_method, shipping_method, shipping_address,
                                tracking_code, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                tracking_code = EXCLUDED.tracking_code,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.user_id.as_str())
        .bind(Json(&order.items))
        .bind(order.subtotal.amount())
        .bind(order.discount.amount())
        .bind(order.shipping.amount())
        .bind(order.tax.amount())
        .bind(order.total.amount())
        .bind(order.status.as_str())
        .bind(order.payment_method.as_str())
        .bind(order.shipping_method.as_str())
        .bind(Json(&order.shipping_address))
        .bind(&order.tracking_code)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;

        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        self.fetch_orders(
            &format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
            ),
            Some(user_id),
        )
        .await
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.fetch_orders(
            &format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"),
            None,
        )
        .await
    }

    async fn count_orders(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count_to_u64(count))
    }

    async fn total_revenue(&self) -> Result<Money> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total), 0)::BIGINT FROM orders WHERE status <> 'cancelled'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(Money::new(total))
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, mobile, name, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.mobile)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;

        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_user_by_mobile(&self, mobile: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE mobile = $1"))
            .bind(mobile)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn count_users(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count_to_u64(count))
    }
}
