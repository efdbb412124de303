use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::types::Json;
use tokio::sync::OnceCell;

use crate::config::RouteSettings;
use crate::pipeline::{Configurable, PayloadRecord, PayloadSaver, PipelineError};

pub const DEFAULT_LAYOUT: &str = "INSERT INTO payload(ts, remote, meta, payload) VALUES ($1, $2, $3, $4)";

const MAX_CONNECTIONS: u32 = 5;

/// Inserts each payload as one row.
///
/// The statement receives `$1` timestamp, `$2` remote address, `$3` headers as
/// JSON and `$4` the payload text. The pool is created on first use.
#[derive(Default)]
pub struct DatabaseSaver {
    options: Option<PgConnectOptions>,
    layout: String,
    pool: OnceCell<PgPool>,
}

impl DatabaseSaver {
    pub const NAME: &'static str = "DatabaseSaver";

    pub fn layout(&self) -> &str {
        &self.layout
    }

    async fn pool(&self) -> Result<&PgPool, PipelineError> {
        let options = self.options.as_ref().ok_or_else(|| PipelineError::InvalidSetting {
            field: "sql_connection_string",
            reason: "saver is not configured".to_string(),
        })?;
        Ok(self
            .pool
            .get_or_init(|| async {
                PgPoolOptions::new()
                    .max_connections(MAX_CONNECTIONS)
                    .connect_lazy_with(options.clone())
            })
            .await)
    }
}

impl Configurable for DatabaseSaver {
    fn configure(&mut self, settings: &RouteSettings) -> Result<(), PipelineError> {
        if settings.sql_driver != "postgres" {
            return Err(PipelineError::InvalidSetting {
                field: "sql_driver",
                reason: format!("unsupported driver {:?}, only postgres is available", settings.sql_driver),
            });
        }
        self.options = Some(settings.sql_connection_string.parse::<PgConnectOptions>()?);
        self.layout = if settings.sql_layout.is_empty() {
            DEFAULT_LAYOUT.to_string()
        } else {
            settings.sql_layout.clone()
        };
        Ok(())
    }
}

#[async_trait]
impl PayloadSaver for DatabaseSaver {
    async fn save(&self, payload: Option<&PayloadRecord>) -> Result<(), PipelineError> {
        let payload = payload.ok_or(PipelineError::MissingPayload)?;
        let pool = self.pool().await?;

        sqlx::query(&self.layout)
            .bind(payload.timestamp)
            .bind(payload.remote.clone())
            .bind(Json(payload.meta.clone()))
            .bind(payload.payload.clone())
            .execute(pool)
            .await?;
        Ok(())
    }
}
