use std::path::Path;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;

use crate::error::{Result, SelfCareError};

const BUSY_TIMEOUT_PRAGMA: &str = "PRAGMA busy_timeout = 5000";

pub type SqliteAsyncConn = SyncConnectionWrapper<SqliteConnection>;
pub type SqlitePool = Pool<SqliteAsyncConn>;
pub type SqlitePooledConn<'a> = PooledConnection<'a, SqliteAsyncConn>;

pub fn open_connection_sync(database_url: &str) -> Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)
        .map_err(|e| SelfCareError::Storage(e.to_string()))?;
    diesel::RunQueryDsl::execute(diesel::sql_query(BUSY_TIMEOUT_PRAGMA), &mut conn)
        .map_err(|e| SelfCareError::Storage(e.to_string()))?;
    Ok(conn)
}

pub async fn build_pool(database_url: &str) -> Result<SqlitePool> {
    let manager = AsyncDieselConnectionManager::<SqliteAsyncConn>::new(database_url);
    Pool::builder()
        .build(manager)
        .await
        .map_err(|e| SelfCareError::Storage(e.to_string()))
}

pub async fn checkout(pool: &SqlitePool) -> Result<SqlitePooledConn<'_>> {
    let mut conn = pool
        .get()
        .await
        .map_err(|e| SelfCareError::Storage(e.to_string()))?;
    diesel_async::RunQueryDsl::execute(diesel::sql_query(BUSY_TIMEOUT_PRAGMA), &mut conn)
        .await
        .map_err(|e| SelfCareError::Storage(e.to_string()))?;
    Ok(conn)
}

pub fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| SelfCareError::Storage(e.to_string()))?;
        }
    }
    Ok(())
}

/// Runs a batch of DDL statements on a dedicated blocking connection.
pub async fn run_schema(database_url: &str, sql: &'static str) -> Result<()> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = open_connection_sync(&database_url)?;
        diesel::connection::SimpleConnection::batch_execute(&mut conn, sql)
            .map_err(|e| SelfCareError::Storage(e.to_string()))?;
        Ok::<_, SelfCareError>(())
    })
    .await
    .map_err(|e| SelfCareError::Runtime(e.to_string()))??;
    Ok(())
}
