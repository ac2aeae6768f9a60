use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use praetor_core::config::DatabaseConfig;

use crate::db::DbProvider;
use crate::error::DbResult;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection<'pool> = PooledConnection<'pool, AsyncPgConnection>;

/// ## Summary
/// Creates the connection pool shared by request handlers and the privilege
/// cache refresh.
///
/// Connections are opened on first use. A checkout that cannot be served
/// within `connect_timeout_secs` fails with `DbError::PoolError` instead of
/// waiting indefinitely.
///
/// ## Errors
/// Returns an error if the pool cannot be built from `config`.
#[tracing::instrument(skip_all, fields(max_connections = config.max_connections))]
pub async fn create_pool(config: &DatabaseConfig) -> anyhow::Result<DbPool> {
    config.validate()?;

    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.as_str());

    let pool = Pool::builder()
        .max_size(u32::from(config.max_connections))
        .min_idle(None)
        .connection_timeout(config.connect_timeout())
        .build(manager)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        connect_timeout_secs = config.connect_timeout_secs,
        "Database connection pool ready"
    );

    Ok(pool)
}

impl DbProvider for DbPool {
    #[tracing::instrument(skip(self))]
    fn get_connection<'a>(
        &'a self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = DbResult<DbConnection<'a>>> + Send + 'a>>
    {
        Box::pin(async move { Ok(self.get().await?) })
    }
}
