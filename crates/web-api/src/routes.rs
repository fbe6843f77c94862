use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use application::{AddCommentRequest, CreatePostRequest, SaveApplicationRequest};
use domain::{
    ApplicationId, ApplicationNote, BlogPost, Comment, CommentNode, DashboardAnalytics,
    JobApplication, LikeStatus, LikeTarget, ListRequest, Page, PostId, UserId, UserProfile,
};

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath},
    rate_limit::enforce_rate_limit,
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationPayload {
    company_name: String,
    role_title: String,
    status: String,
    date_applied: String,
}

impl ApplicationPayload {
    fn into_request(self, user_id: UserId) -> SaveApplicationRequest {
        SaveApplicationRequest {
            user_id,
            company_name: self.company_name,
            role_title: self.role_title,
            status: self.status,
            date_applied: self.date_applied,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostPayload {
    title: String,
    content_md: String,
    #[serde(default)]
    is_public: bool,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCommentPayload {
    content: String,
    parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct AddNotePayload {
    content: String,
}

pub fn router(state: AppState) -> Router {
    let api = api_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        enforce_rate_limit,
    ));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `*` 或空列表表示放开所有来源
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/applications",
            get(list_applications).post(create_application),
        )
        .route("/applications/search", post(search_applications))
        .route(
            "/applications/{application_id}",
            get(get_application)
                .put(update_application)
                .delete(delete_application),
        )
        .route(
            "/applications/{application_id}/notes",
            get(list_notes).post(add_note),
        )
        .route("/dashboard/analytics", get(dashboard_analytics))
        .route("/posts", get(list_posts).post(create_post))
        .route("/users/{user_id}/posts/{slug}", get(get_post))
        .route(
            "/posts/{post_id}/comments",
            get(list_comments).post(add_comment),
        )
        .route("/likes", post(toggle_like))
        .route("/users/{user_id}/follow", post(follow).delete(unfollow))
        .route("/users/{user_id}/profile", get(user_profile))
}

/// 每个请求一个取消令牌；客户端断开时 axum 丢弃 handler future，守卫随之取消令牌
fn request_scope() -> (CancellationToken, DropGuard) {
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    (cancel, guard)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_applications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<JobApplication>>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let request = ListRequest::from_query(&params);
    let (cancel, _guard) = request_scope();

    let page = state
        .application_service
        .list(user_id, &request, &cancel)
        .await?;
    Ok(Json(page))
}

async fn search_applications(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<ListRequest>,
) -> Result<Json<Page<JobApplication>>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let page = state
        .application_service
        .list(user_id, &request, &cancel)
        .await?;
    Ok(Json(page))
}

async fn create_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<ApplicationPayload>,
) -> Result<(StatusCode, Json<JobApplication>), ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let application = state
        .application_service
        .create(payload.into_request(user_id), &cancel)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

async fn get_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(application_id): ApiPath<Uuid>,
) -> Result<Json<JobApplication>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let application = state
        .application_service
        .get(ApplicationId::from(application_id), user_id, &cancel)
        .await?;
    Ok(Json(application))
}

async fn update_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(application_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ApplicationPayload>,
) -> Result<Json<JobApplication>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let application = state
        .application_service
        .update(
            ApplicationId::from(application_id),
            payload.into_request(user_id),
            &cancel,
        )
        .await?;
    Ok(Json(application))
}

async fn delete_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(application_id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    state
        .application_service
        .delete(ApplicationId::from(application_id), user_id, &cancel)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<BlogPost>>, ApiError> {
    let request = ListRequest::from_query(&params);
    let (cancel, _guard) = request_scope();

    let page = state.blog_service.list_public_posts(&request, &cancel).await?;
    Ok(Json(page))
}

async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreatePostPayload>,
) -> Result<(StatusCode, Json<BlogPost>), ApiError> {
    let author_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let post = state
        .blog_service
        .create_post(
            CreatePostRequest {
                author_id,
                title: payload.title,
                content_md: payload.content_md,
                is_public: payload.is_public,
                tags: payload.tags,
            },
            &cancel,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath((user_id, slug)): ApiPath<(Uuid, String)>,
) -> Result<Json<BlogPost>, ApiError> {
    let viewer = state.jwt_service.optional_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let post = state
        .blog_service
        .get_post(UserId::from(user_id), &slug, viewer, &cancel)
        .await?;
    Ok(Json(post))
}

async fn list_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(post_id): ApiPath<Uuid>,
) -> Result<Json<Vec<CommentNode>>, ApiError> {
    let viewer = state.jwt_service.optional_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let tree = state
        .blog_service
        .comments_for_post(PostId::from(post_id), viewer, &cancel)
        .await?;
    Ok(Json(tree))
}

async fn add_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(post_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddCommentPayload>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let author_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let comment = state
        .blog_service
        .add_comment(
            AddCommentRequest {
                post_id: PostId::from(post_id),
                author_id,
                parent_id: payload.parent_id.map(Into::into),
                content: payload.content,
            },
            &cancel,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn add_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(application_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddNotePayload>,
) -> Result<(StatusCode, Json<ApplicationNote>), ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let note = state
        .application_service
        .add_note(
            ApplicationId::from(application_id),
            user_id,
            &payload.content,
            &cancel,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn list_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(application_id): ApiPath<Uuid>,
) -> Result<Json<Vec<ApplicationNote>>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let notes = state
        .application_service
        .list_notes(ApplicationId::from(application_id), user_id, &cancel)
        .await?;
    Ok(Json(notes))
}

async fn dashboard_analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardAnalytics>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let analytics = state.analytics_service.dashboard(user_id, &cancel).await?;
    Ok(Json(analytics))
}

async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(target): ApiJson<LikeTarget>,
) -> Result<Json<LikeStatus>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    let status = state
        .blog_service
        .toggle_like(user_id, target, &cancel)
        .await?;
    Ok(Json(status))
}

async fn follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let follower = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    state
        .profile_service
        .follow(follower, UserId::from(user_id), &cancel)
        .await?;
    Ok(StatusCode::CREATED)
}

async fn unfollow(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let follower = state.jwt_service.extract_user_from_headers(&headers)?;
    let (cancel, _guard) = request_scope();

    state
        .profile_service
        .unfollow(follower, UserId::from(user_id), &cancel)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn user_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<UserProfile>, ApiError> {
    let viewer = state.jwt_service.optional_user_from_headers(&headers)?;
    let request = ListRequest::from_query(&params);
    let (cancel, _guard) = request_scope();

    let profile = state
        .profile_service
        .profile(UserId::from(user_id), viewer, &request, &cancel)
        .await?;
    Ok(Json(profile))
}
