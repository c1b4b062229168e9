//! Seed the database with demo users and the base catalog.
//!
//! User rows are upserted by email so the command is safe to re-run. The
//! catalog is rebuilt from scratch: order items, orders and products are
//! deleted in FK order inside one transaction before the products are
//! inserted again.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::info;

use licorera_core::types::Role;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

struct SeedProduct {
    name: &'static str,
    price: i64,
    stock: i32,
    description: &'static str,
    category: &'static str,
    image_seed: &'static str,
}

const BASE_CATALOG: &[SeedProduct] = &[
    SeedProduct { name: "Club Colombia Dorada 330ml", price: 4500, stock: 100, description: "Cerveza dorada", category: "Cerveza", image_seed: "club" },
    SeedProduct { name: "Poker Lata 330ml", price: 3500, stock: 120, description: "Cerveza lager", category: "Cerveza", image_seed: "poker" },
    SeedProduct { name: "Corona 355ml", price: 6500, stock: 60, description: "Cerveza mexicana", category: "Cerveza", image_seed: "corona" },
    SeedProduct { name: "Concha y Toro Reservado Cabernet 750ml", price: 42000, stock: 20, description: "Cabernet", category: "Vino", image_seed: "cabernet" },
    SeedProduct { name: "Gato Negro Merlot 750ml", price: 38000, stock: 18, description: "Merlot", category: "Vino", image_seed: "merlot" },
    SeedProduct { name: "Ron Medellín Añejo 750ml", price: 56000, stock: 25, description: "Añejo", category: "Ron", image_seed: "medellin" },
    SeedProduct { name: "Ron Viejo de Caldas 8 años 750ml", price: 69000, stock: 15, description: "8 años", category: "Ron", image_seed: "caldas" },
    SeedProduct { name: "Aguardiente Antioqueño sin azúcar 750ml", price: 48000, stock: 30, description: "Sin azúcar", category: "Aguardiente", image_seed: "antioqueno" },
    SeedProduct { name: "Old Parr 12 750ml", price: 135_000, stock: 12, description: "12 años", category: "Whisky", image_seed: "oldparr" },
    SeedProduct { name: "Buchanans 12 750ml", price: 149_000, stock: 10, description: "12 años", category: "Whisky", image_seed: "buchanans" },
    SeedProduct { name: "Papas Margarita Limón 25g", price: 1800, stock: 200, description: "Snack", category: "Snacks", image_seed: "margarita" },
    SeedProduct { name: "Maní La Especial 100g", price: 3500, stock: 150, description: "Snack", category: "Snacks", image_seed: "mani" },
    SeedProduct { name: "Detergente Ariel 1kg", price: 12000, stock: 80, description: "Aseo", category: "Aseo", image_seed: "ariel" },
    SeedProduct { name: "Suavitel 1L", price: 11000, stock: 70, description: "Aseo", category: "Aseo", image_seed: "suavitel" },
];

const DEMO_CATEGORIES: &[&str] = &[
    "Cerveza",
    "Vino",
    "Ron",
    "Aguardiente",
    "Whisky",
    "Snacks",
    "Aseo",
];

/// Seed demo users and the base catalog.
///
/// `demo_items` adds 60 generated products on top of the base catalog,
/// used to exercise pagination and sorting in the storefront.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing or any statement fails.
pub async fn run(demo_items: bool) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| SeedError::MissingEnvVar("DATABASE_URL"))?;

    info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    upsert_user(&pool, "admin@expolicores.com", "Admin", Role::Admin).await?;
    upsert_user(&pool, "cliente1@example.com", "Cliente Uno", Role::Cliente).await?;
    info!("Demo users ready");

    let mut tx = pool.begin().await?;

    // Respect FK order: items before orders before products.
    sqlx::query("DELETE FROM order_items").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM orders").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM products").execute(&mut *tx).await?;

    let mut count = 0_u32;
    for p in BASE_CATALOG {
        insert_product(
            &mut tx,
            p.name,
            p.price,
            p.stock,
            p.description,
            p.category,
            &format!("https://picsum.photos/seed/{}/400/400", p.image_seed),
        )
        .await?;
        count += 1;
    }

    if demo_items {
        for i in 1..=60_i64 {
            let category = DEMO_CATEGORIES[(i as usize) % DEMO_CATEGORIES.len()];
            insert_product(
                &mut tx,
                &format!("Producto {i}"),
                1000 + i * 137,
                5 + (i as i32) % 30,
                &format!("Demo #{i}"),
                category,
                &format!("https://picsum.photos/seed/p{i}/400/400"),
            )
            .await?;
            count += 1;
        }
    }

    tx.commit().await?;
    info!(products = count, "Seed complete");
    Ok(())
}

async fn upsert_user(pool: &PgPool, email: &str, name: &str, role: Role) -> Result<(), SeedError> {
    sqlx::query(
        r"
        INSERT INTO users (email, name, role, phone)
        VALUES ($1, $2, $3, '0000000000')
        ON CONFLICT (email) DO UPDATE
        SET name = EXCLUDED.name,
            role = EXCLUDED.role,
            updated_at = now()
        ",
    )
    .bind(email)
    .bind(name)
    .bind(role.as_token())
    .execute(pool)
    .await?;
    Ok(())
}

async fn insert_product(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    name: &str,
    price: i64,
    stock: i32,
    description: &str,
    category: &str,
    image_url: &str,
) -> Result<(), SeedError> {
    sqlx::query(
        r"
        INSERT INTO products (name, price, stock, description, category, image_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(name)
    .bind(price)
    .bind(stock)
    .bind(description)
    .bind(category)
    .bind(image_url)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
