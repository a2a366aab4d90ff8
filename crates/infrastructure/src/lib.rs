//! 基础设施适配器。
//!
//! PostgreSQL 消息存储和 JWT 身份验证器，分别实现应用层的
//! `MessageStore` 和 `IdentityVerifier` 契约。

pub mod auth;
pub mod repository;

pub use auth::JwtIdentityVerifier;
pub use repository::{create_pg_pool, PgMessageStore};
