use menu_ordering_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&pool).await?;

    let owner_id = ensure_user(&pool, "owner@example.com", "owner1234").await?;
    let customer_id = ensure_user(&pool, "customer@example.com", "customer1234").await?;
    let restaurant_id = seed_restaurant(&pool, "Corner Diner", owner_id).await?;

    println!(
        "Seed completed. Owner ID: {owner_id}, Customer ID: {customer_id}, Restaurant ID: {restaurant_id}"
    );
    Ok(())
}

async fn ensure_user(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email}");
    Ok(user_id)
}

async fn seed_restaurant(
    pool: &sqlx::PgPool,
    name: &str,
    owner_id: Uuid,
) -> anyhow::Result<Uuid> {
    let created: Option<(Uuid,)> = sqlx::query_as(
        "INSERT INTO restaurants (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_optional(pool)
    .await?;

    let restaurant_id = match created {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM restaurants WHERE name = $1")
                .bind(name)
                .fetch_one(pool)
                .await?;
            println!("Restaurant {name} already seeded");
            return Ok(existing.0);
        }
    };

    let mut tx = pool.begin().await?;
    sqlx::query("INSERT INTO restaurant_staff (restaurant_id, user_id) VALUES ($1, $2)")
        .bind(restaurant_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

    let section_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO menu_sections (id, restaurant_id, name, position) VALUES ($1, $2, $3, 0)",
    )
    .bind(section_id)
    .bind(restaurant_id)
    .bind("Mains")
    .execute(&mut *tx)
    .await?;

    let items = [
        ("Burger", "Beef patty, cheddar, pickles", 800_i64, vec![]),
        (
            "Fries",
            "Hand-cut, sea salt",
            250,
            vec![("Regular", 250_i64, true), ("Large", 350, false)],
        ),
        ("Lemonade", "Freshly squeezed", 300, vec![]),
    ];

    for (position, (item_name, description, price, points)) in items.into_iter().enumerate() {
        let item_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, restaurant_id, section_id, name, description, price, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item_id)
        .bind(restaurant_id)
        .bind(section_id)
        .bind(item_name)
        .bind(description)
        .bind(price)
        .bind(position as i32)
        .execute(&mut *tx)
        .await?;

        for (pp_position, (label, pp_price, is_default)) in points.into_iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO price_points (id, menu_item_id, label, price, is_default, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(item_id)
            .bind(label)
            .bind(pp_price)
            .bind(is_default)
            .bind(pp_position as i32)
            .execute(&mut *tx)
            .await?;
        }
    }
    tx.commit().await?;

    println!("Seeded restaurant {name} with menu");
    Ok(restaurant_id)
}
