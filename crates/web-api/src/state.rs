use std::sync::Arc;

use application::{
    AnalyticsService, BlogService, ClientRateLimiter, JobApplicationService, ProfileService,
};

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub application_service: Arc<JobApplicationService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub blog_service: Arc<BlogService>,
    pub profile_service: Arc<ProfileService>,
    pub rate_limiter: Arc<ClientRateLimiter>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        application_service: Arc<JobApplicationService>,
        analytics_service: Arc<AnalyticsService>,
        blog_service: Arc<BlogService>,
        profile_service: Arc<ProfileService>,
        rate_limiter: Arc<ClientRateLimiter>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            application_service,
            analytics_service,
            blog_service,
            profile_service,
            rate_limiter,
            jwt_service,
        }
    }
}
