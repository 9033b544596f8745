/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded schema migrations
///
/// Row types and their queries live in [`crate::models`]; the transactional
/// units live in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
