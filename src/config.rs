use anyhow::Context;
use clap::{Args, ValueEnum};
use sqlx::postgres::{PgPool, PgPoolOptions};

#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    pub database_url: Option<String>,
    #[arg(
        long,
        env = "STUDENT_PERF_DB_MAX_CONNECTIONS",
        default_value_t = 5,
        global = true
    )]
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let database_url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set to a Postgres instance")?;

        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct LogConfig {
    /// Log line format; verbosity comes from RUST_LOG
    #[arg(long, env = "STUDENT_PERF_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
}
