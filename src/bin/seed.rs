use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use storefront::{
    db::{create_orm_conn, run_migrations},
    entity::{Items, items, users},
    repo::user_by_email,
    services::auth_service::hash_password,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "Admin", "admin@example.com", "admin123", true).await?;
    let user_id = ensure_user(&orm, "Shopper", "user@example.com", "user123", false).await?;
    seed_items(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    admin: bool,
) -> anyhow::Result<i32> {
    if let Some(existing) = user_by_email(orm, email).await? {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = users::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        phone: Set("0000000000".to_string()),
        password_hash: Set(password_hash),
        admin: Set(admin),
        email_confirmed: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Ensured user {email} (admin={admin})");
    Ok(user.id)
}

async fn seed_items(orm: &DatabaseConnection) -> anyhow::Result<()> {
    // Price ids must exist in the Stripe account the app talks to.
    let catalog = [
        ("Axum Hoodie", 55.0, "apparel", "Warm hoodie for Rustaceans", "price_hoodie"),
        ("Ferris Mug", 12.0, "kitchen", "Coffee tastes better with Ferris", "price_mug"),
        ("Rust Sticker Pack", 5.0, "accessories", "Decorate your laptop", "price_stickers"),
        ("E-book: Async Rust", 25.0, "books", "Learn async Rust patterns", "price_ebook"),
    ];

    for (name, price, category, details, price_id) in catalog {
        let exists = Items::find()
            .filter(items::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        items::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            price: Set(price),
            category: Set(category.to_string()),
            image: Set("/static/uploads/placeholder.png".to_string()),
            details: Set(details.to_string()),
            price_id: Set(price_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded items");
    Ok(())
}
