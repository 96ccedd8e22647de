//! PostgreSQL fixtures for clarity integration tests.
//!
//! One PostgreSQL instance is shared across the test binary; every test
//! gets its own freshly-migrated database inside it, so tests can run
//! concurrently without seeing each other's rows.
//!
//! Set `CLARITY_TEST_PG_URL` to a server-root URL (no database path) to
//! reuse an already-running PostgreSQL instead of starting a container.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use clarity_db::pool;

/// Server-root URL plus the container handle that keeps it alive (`None`
/// when pointing at an external server).
static SHARED: OnceCell<(String, Option<ContainerAsync<Postgres>>)> = OnceCell::const_new();

async fn server_url() -> &'static str {
    let (url, _container) = SHARED
        .get_or_init(|| async {
            if let Ok(url) = std::env::var("CLARITY_TEST_PG_URL") {
                return (url, None);
            }

            let container = Postgres::default()
                .with_tag("18")
                .start()
                .await
                .expect("failed to start PostgreSQL container");
            let host = container
                .get_host()
                .await
                .expect("failed to get container host");
            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("failed to get mapped port");

            (
                format!("postgresql://postgres:postgres@{host}:{port}"),
                Some(container),
            )
        })
        .await;
    url
}

async fn connect(url: &str, max_connections: u32) -> PgPool {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to {url}: {e}"))
}

/// Pool onto the `postgres` maintenance database, for CREATE/DROP DATABASE.
async fn admin_pool() -> PgPool {
    let base = server_url().await;
    connect(&format!("{base}/postgres"), 1).await
}

/// Create a migrated throwaway database and connect a pool to it.
///
/// Returns `(pool, db_name)`; pass `db_name` to [`drop_test_db`] at the end
/// of the test.
pub async fn create_test_db() -> (PgPool, String) {
    let db_name = format!("clarity_test_{}", Uuid::new_v4().simple());

    let admin = admin_pool().await;
    admin
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create database {db_name}: {e}"));
    admin.close().await;

    let base = server_url().await;
    let db_pool = connect(&format!("{base}/{db_name}"), 5).await;
    pool::run_migrations(&db_pool)
        .await
        .expect("migrations should succeed");

    (db_pool, db_name)
}

/// Drop a database created by [`create_test_db`], severing any connections
/// still attached to it. Safe to call for an already-dropped database.
pub async fn drop_test_db(db_name: &str) {
    let admin = admin_pool().await;

    let terminate = format!(
        "SELECT pg_terminate_backend(pid) \
         FROM pg_stat_activity \
         WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
    );
    let _ = admin.execute(terminate.as_str()).await;
    let _ = admin
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;

    admin.close().await;
}
