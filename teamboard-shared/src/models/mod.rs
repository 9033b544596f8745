/// Database models for Teamboard
///
/// Each model owns its row type, its input types and the SQL that reads and
/// writes it. Query functions are generic over [`sqlx::PgExecutor`] so the
/// same call works on the pool or inside a transaction.
///
/// # Models
///
/// - `user`: accounts from the identity store (read-mostly here)
/// - `project`: projects and their owner
/// - `membership`: user-project membership with role
/// - `invitation`: pending/resolved offers to join a project
/// - `task`: the task columns membership operations depend on

pub mod invitation;
pub mod membership;
pub mod project;
pub mod task;
pub mod user;
