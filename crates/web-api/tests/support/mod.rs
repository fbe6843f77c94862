#![allow(dead_code)]

use std::sync::Arc;

use application::testing::{
    InMemoryBlogPostRepository, InMemoryCommentRepository, InMemoryFollowRepository,
    InMemoryJobApplicationRepository, InMemoryLikeRepository,
};
use application::{
    AnalyticsService, AnalyticsServiceDependencies, BlogService, BlogServiceDependencies,
    ClientRateLimiter, JobApplicationService, JobApplicationServiceDependencies, ManualClock,
    ProfileService, ProfileServiceDependencies, RateLimitSettings, SystemClock, APPLICATION_LIST,
    POST_LIST,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use domain::{UserId, MAX_COMMENT_DEPTH};
use serde_json::Value;
use tower::ServiceExt;
use web_api::{router, AppState, JwtConfig, JwtService};

pub struct TestApp {
    pub router: Router,
    pub jwt: Arc<JwtService>,
    pub limiter_clock: Arc<ManualClock>,
}

impl TestApp {
    /// 桶足够大，功能测试不会触发限流
    pub fn new() -> Self {
        Self::with_rate_limit(RateLimitSettings {
            burst: 1_000,
            ..RateLimitSettings::default()
        })
    }

    /// 内存仓储 + 手动时钟驱动的限流器，不启动后台清扫
    pub fn with_rate_limit(settings: RateLimitSettings) -> Self {
        let applications = Arc::new(InMemoryJobApplicationRepository::new());
        let posts = Arc::new(InMemoryBlogPostRepository::new());

        let application_service = JobApplicationService::new(JobApplicationServiceDependencies {
            repository: applications.clone(),
            note_repository: applications.clone(),
            clock: Arc::new(SystemClock),
            list_config: APPLICATION_LIST,
        });
        let analytics_service = AnalyticsService::new(AnalyticsServiceDependencies {
            repository: applications,
        });
        let blog_service = BlogService::new(BlogServiceDependencies {
            post_repository: posts.clone(),
            comment_repository: Arc::new(InMemoryCommentRepository::new()),
            like_repository: Arc::new(InMemoryLikeRepository::new()),
            clock: Arc::new(SystemClock),
            list_config: POST_LIST,
            max_comment_depth: MAX_COMMENT_DEPTH,
        });
        let profile_service = ProfileService::new(ProfileServiceDependencies {
            follow_repository: Arc::new(InMemoryFollowRepository::new()),
            post_repository: posts,
            clock: Arc::new(SystemClock),
            list_config: POST_LIST,
        });

        let limiter_clock = Arc::new(ManualClock::new());
        let rate_limiter = Arc::new(ClientRateLimiter::new(settings, limiter_clock.clone()));

        let jwt = Arc::new(JwtService::new(JwtConfig {
            secret: "router-tests-secret-at-least-thirty-two-bytes".into(),
            expiration_hours: 1,
        }));

        let state = AppState::new(
            Arc::new(application_service),
            Arc::new(analytics_service),
            Arc::new(blog_service),
            Arc::new(profile_service),
            rate_limiter,
            jwt.clone(),
        );

        Self {
            router: router(state),
            jwt,
            limiter_clock,
        }
    }

    pub fn token_for(&self, user: UserId) -> String {
        self.jwt.generate_token(user).expect("token")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send_from(method, uri, token, body, "198.51.100.10").await
    }

    /// 以指定来源地址发请求，限流按 `X-Forwarded-For` 区分客户端
    pub async fn send_from(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        client: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", client);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.dispatch(request).await
    }

    /// 发送原样的请求体，用于构造无法解析的 JSON
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: &str,
        content_type: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "198.51.100.10");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body.to_string())).expect("request");
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
