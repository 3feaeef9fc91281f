#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod config;
mod database;
mod db;
mod env;
mod error;
mod models;
mod normalize;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use api::{
    api_enroll, api_error, api_get_application, api_list_applications, api_update_status,
    health,
};
use auth::{dashboard, login_page, logout, process_login, unauthorized, unauthorized_api};
use config::{AppConfig, ConfigError};
use error::AppError;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use telemetry::{TelemetryFairing, init_tracing};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Env(#[from] dotenvy::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
    #[error("{0}")]
    Launch(#[from] rocket::Error),
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    let env_files = env::load_environment()?;
    let config = AppConfig::from_env()?;

    init_tracing(&config.telemetry);
    for env_file in &env_files {
        env_file.log();
    }

    let pool = connect(&config.database_url).await?;
    database::run_migrations(&pool).await?;

    let _rocket = init_rocket(pool, config).launch().await?;
    Ok(())
}

async fn connect(database_url: &str) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    info!(database_url = %database_url, "Connecting to SQLite database");
    Ok(SqlitePoolOptions::new().connect_with(options).await?)
}

pub fn init_rocket(pool: SqlitePool, config: AppConfig) -> Rocket<Build> {
    info!("Starting enrollment intake service");

    let mut figment = rocket::Config::figment();
    if let Some(secret_key) = &config.secret_key {
        figment = figment.merge(("secret_key", secret_key.as_str()));
    }

    rocket::custom(figment)
        .manage(pool)
        .manage(config.admin)
        .mount(
            "/api",
            routes![
                health,
                api_enroll,
                api_list_applications,
                api_get_application,
                api_update_status,
            ],
        )
        .mount("/admin", routes![dashboard, login_page, process_login, logout])
        .register("/api", catchers![unauthorized_api, api_error])
        .register("/admin", catchers![unauthorized])
        .attach(Template::fairing())
        .attach(TelemetryFairing)
}
