//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的用例服务。

mod auth;
mod error;
mod extract;
mod rate_limit;
mod routes;
mod state;

pub use auth::{Claims, JwtService};
pub use config::JwtConfig;
pub use error::ApiError;
pub use extract::{ApiJson, ApiPath};
pub use rate_limit::client_identity;
pub use routes::{cors_layer, router};
pub use state::AppState;
