//! Operator tool: `make-admin [email]` promotes the named user, or the earliest
//! registered user when no email is given.

use anyhow::Context;
use blogsmith::store::{PgStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let store = PgStore::connect(&database_url).await?;

    let user = match std::env::args().nth(1) {
        Some(email) => store
            .find_user_by_email(&email.trim().to_lowercase())
            .await?
            .with_context(|| format!("no user with email {email}"))?,
        None => store
            .earliest_user()
            .await?
            .context("no users registered yet")?,
    };

    if user.is_admin {
        tracing::info!(email = %user.email, "user is already an admin");
        return Ok(());
    }

    let user = store
        .set_admin(user.id, true)
        .await?
        .context("user disappeared before promotion")?;
    tracing::info!(user_id = %user.id, email = %user.email, name = %user.name, "user promoted to admin");
    Ok(())
}
