mod analytics_service;
mod blog_service;
mod job_application_service;
mod profile_service;

#[cfg(test)]
mod job_application_service_tests;

pub use analytics_service::{AnalyticsService, AnalyticsServiceDependencies};
pub use blog_service::{
    AddCommentRequest, BlogService, BlogServiceDependencies, CreatePostRequest, MAX_SLUG_ATTEMPTS,
};
pub use job_application_service::{
    JobApplicationService, JobApplicationServiceDependencies, SaveApplicationRequest,
};
pub use profile_service::{ProfileService, ProfileServiceDependencies};
