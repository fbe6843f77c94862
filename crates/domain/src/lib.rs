//! 求职跟踪与博客系统核心领域模型
//!
//! 包含求职申请、备注、博客文章、评论、点赞与关注等实体，统计结果，列表请求与分页结果，以及领域错误。

pub mod analytics;
pub mod blog;
pub mod errors;
pub mod job_application;
pub mod listing;
pub mod social;
pub mod value_objects;

// 重新导出常用类型
pub use analytics::*;
pub use blog::*;
pub use errors::*;
pub use job_application::*;
pub use listing::*;
pub use social::*;
pub use value_objects::*;
