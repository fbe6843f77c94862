//! 应用层实现。
//!
//! 这里提供列表查询计划、slug 解析、评论树组装与客户端限流，
//! 以及围绕领域模型的用例服务（申请与备注、统计、博客与点赞、关注与主页）和仓储端口。

pub mod cancellation;
pub mod clock;
pub mod comment_tree;
pub mod error;
pub mod listing;
pub mod query_spec;
pub mod rate_limiter;
pub mod repository;
pub mod services;
pub mod slug;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cancellation::cancellable;
pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock, SystemMonotonicClock};
pub use comment_tree::assemble_comment_tree;
pub use error::ApplicationError;
pub use listing::list_page;
pub use query_spec::{EntityListConfig, QueryPlan, Scope, APPLICATION_LIST, POST_LIST};
pub use rate_limiter::{ClientRateLimiter, RateLimitSettings, TokenBucket};
pub use repository::{
    AnalyticsRepository, ApplicationNoteRepository, BlogPostRepository, CommentRepository,
    FollowRepository, JobApplicationRepository, LikeRepository, PagedRepository, SlugLookup,
};
pub use services::{
    AddCommentRequest, AnalyticsService, AnalyticsServiceDependencies, BlogService,
    BlogServiceDependencies, CreatePostRequest, JobApplicationService,
    JobApplicationServiceDependencies, ProfileService, ProfileServiceDependencies,
    SaveApplicationRequest,
};
pub use slug::{resolve_slug, slugify};
