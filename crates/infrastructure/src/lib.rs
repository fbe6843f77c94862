//! 基础设施层实现。
//!
//! 提供 Postgres 仓储、查询计划到 SQL 的渲染以及数据库迁移，实现应用层定义的端口。

pub mod builder;
pub mod migrations;
pub mod query;
pub mod repository;

pub use builder::{Infrastructure, InfrastructureConfig, InfrastructureError};
pub use migrations::MIGRATOR;
pub use repository::{
    create_pg_pool, PgBlogPostRepository, PgCommentRepository, PgFollowRepository,
    PgJobApplicationRepository, PgLikeRepository, PgStorage,
};
