//! Development seeder: admin + sample user, three curated themes, and a
//! sample project so a fresh database is immediately usable.

use chrono::Utc;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use themeforge::auth::password;
use themeforge::db;
use themeforge::models::User;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt().init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Seeding database");

    let admin = upsert_user(&pool, "admin@themeforge.local", "admin123", "Admin", "admin").await?;
    let user = upsert_user(&pool, "user@example.com", "password123", "Sample User", "user").await?;

    let corporate = upsert_theme(
        &pool,
        admin.id,
        "Corporate Professional",
        "Clean and professional theme for corporate websites",
        json!({
            "colors": {
                "primary": "#2563eb", "secondary": "#64748b", "accent": "#0ea5e9",
                "background": "#ffffff", "text": "#1e293b", "border": "#e2e8f0"
            },
            "typography": { "fontFamily": "Inter", "headingSize": "2xl", "bodySize": "base" },
            "layout": { "containerWidth": "1200px", "sectionSpacing": "80px", "borderRadius": "8px" },
            "components": {
                "button": { "style": "solid", "size": "medium" },
                "card": { "shadow": "medium", "border": true }
            }
        }),
    )
    .await?;

    upsert_theme(
        &pool,
        admin.id,
        "Creative Portfolio",
        "Bold and artistic theme for creative professionals",
        json!({
            "colors": {
                "primary": "#ec4899", "secondary": "#8b5cf6", "accent": "#f59e0b",
                "background": "#0f172a", "text": "#f1f5f9", "border": "#334155"
            },
            "typography": { "fontFamily": "Poppins", "headingSize": "3xl", "bodySize": "lg" },
            "layout": { "containerWidth": "1400px", "sectionSpacing": "96px", "borderRadius": "16px" },
            "components": {
                "button": { "style": "gradient", "size": "large" },
                "card": { "shadow": "large", "border": false }
            }
        }),
    )
    .await?;

    upsert_theme(
        &pool,
        admin.id,
        "Vietnam Coffee Export",
        "Business theme for coffee export companies with warm coffee colors",
        json!({
            "colors": {
                "primary": "#8B4513", "secondary": "#D2691E", "accent": "#FFD700",
                "background": "#F5F5DC", "text": "#2D3748", "border": "#E2E8F0"
            },
            "typography": { "fontFamily": "Inter", "headingSize": "2xl", "bodySize": "base", "lineHeight": "1.7" },
            "layout": { "containerWidth": "1200px", "sectionSpacing": "80px", "borderRadius": "8px" },
            "components": {
                "button": { "style": "solid", "size": "medium", "rounded": true },
                "card": { "shadow": "medium", "border": true }
            },
            "content": {
                "header": { "title": "Vietnam Coffee Export", "subtitle": "From our highlands to your cup" },
                "hero": {
                    "title": "Premium Robusta & Arabica",
                    "description": "Direct-trade coffee from Vietnamese highland farms",
                    "ctaText": "Request a quote"
                }
            }
        }),
    )
    .await?;

    // Sample paid payment puts the user on the standard tier.
    seed_payment(&pool, user.id, 299_000).await?;

    // Sample project with its seed version.
    let existing = db::projects::list(&pool, user.id).await?;
    if existing.is_empty() {
        let project = db::projects::create(&pool, user.id, corporate.id, "My Corporate Website")
            .await?;
        let theme = db::themes::find_by_id(&pool, corporate.id).await?.expect("theme");
        db::versions::append(&pool, project.id, &theme.default_params).await?;
        tracing::info!("Created sample project {}", project.id);
    }

    tracing::info!("Seed complete");
    tracing::info!("Admin login: admin@themeforge.local / admin123");
    tracing::info!("User login:  user@example.com / password123");

    Ok(())
}

async fn upsert_user(
    pool: &PgPool,
    email: &str,
    password: &str,
    name: &str,
    role: &str,
) -> Result<User, Box<dyn std::error::Error>> {
    if let Some(user) = db::users::find_by_email(pool, email).await? {
        return Ok(user);
    }
    let hash = password::hash(password).map_err(std::io::Error::other)?;
    let user = db::users::create(pool, email, &hash, name, role).await?;
    Ok(user)
}

async fn upsert_theme(
    pool: &PgPool,
    created_by: Uuid,
    name: &str,
    description: &str,
    default_params: serde_json::Value,
) -> Result<themeforge::models::Theme, Box<dyn std::error::Error>> {
    let existing = db::themes::list(pool).await?;
    if let Some(theme) = existing.into_iter().find(|t| t.name == name) {
        return Ok(theme);
    }
    let theme = db::themes::create(pool, name, description, None, &default_params, created_by)
        .await?;
    Ok(theme)
}

async fn seed_payment(
    pool: &PgPool,
    user_id: Uuid,
    amount: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let bank_txn_id = "TXN_SEED_0001";
    if db::payments::find_by_bank_txn_id(pool, bank_txn_id).await?.is_some() {
        return Ok(());
    }
    let payment = db::payments::create(pool, user_id, amount, "VND", bank_txn_id).await?;
    db::payments::mark_paid(pool, payment.id, Utc::now()).await?;
    Ok(())
}
