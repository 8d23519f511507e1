/// Database layer
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: embedded migration runner
///
/// Models live in the crate-level `models` module.

pub mod migrations;
pub mod pool;
