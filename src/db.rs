use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{analysis::repo::AnalysisRepo, config::DatabaseConfig, users::repo::UserRepo};

/// The persistence interface handlers talk to.
pub trait Store: UserRepo + AnalysisRepo {}

impl<T> Store for T where T: UserRepo + AnalysisRepo {}

pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let options = cfg.connect_options()?;
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(pool)
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}
