//! Database layer
//!
//! SQLite is the default backend (single file next to the binary); MySQL is
//! available for hosted deployments. The driver is selected by configuration
//! and hidden behind the [`DatabasePool`] trait.
//!
//! ```ignore
//! let pool = create_pool(&config.database).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, require_mysql, require_sqlite, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};
