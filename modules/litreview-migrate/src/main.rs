//! Runs pending database migrations, then exits.
//!
//! Migrations are embedded at compile time via `sqlx::migrate!()`, so no
//! migration files are needed at runtime. Used as a deploy step before
//! starting the API or worker.

use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    tracing::info!("running database migrations");

    let pool = PgPoolOptions::new().max_connections(2).connect(&database_url).await?;

    litreview_persistence::run_migrations(&pool).await?;

    tracing::info!("migrations completed successfully");
    Ok(())
}
