use application::ApplicationError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, RepositoryError, POST_SLUG_CONSTRAINT};
use serde::Serialize;
use tracing::error;

/// 客户端在响应前断开连接（nginx 约定的 499）
const CLIENT_CLOSED_REQUEST: u16 = 499;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn too_many_requests() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", "Too many requests")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.body.code
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use ApplicationError as AppErr;

        match error {
            AppErr::Domain(DomainError::InvalidArgument { field, reason }) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_ARGUMENT",
                format!("{}: {}", field, reason),
            ),
            AppErr::Domain(DomainError::CommentDepthExceeded { max }) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "COMMENT_DEPTH_EXCEEDED",
                format!("maximum comment depth of {max} reached"),
            ),
            AppErr::Domain(DomainError::ParentCommentNotFound) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "PARENT_COMMENT_NOT_FOUND",
                "parent comment not found",
            ),
            AppErr::Domain(DomainError::ParentCommentMismatch) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "PARENT_COMMENT_MISMATCH",
                "parent comment belongs to a different post",
            ),
            AppErr::Domain(DomainError::CannotFollowSelf) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "CANNOT_FOLLOW_SELF",
                "users cannot follow themselves",
            ),
            AppErr::Domain(DomainError::AlreadyFollowing) => ApiError::new(
                StatusCode::CONFLICT,
                "ALREADY_FOLLOWING",
                "already following this user",
            ),
            AppErr::NotFound(what) => {
                ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{what} not found"))
            }
            AppErr::Canceled => ApiError::new(
                StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::REQUEST_TIMEOUT),
                "REQUEST_CANCELED",
                "request canceled",
            ),
            AppErr::Repository(repo_err) => match repo_err {
                RepositoryError::NotFound => ApiError::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "requested resource not found",
                ),
                RepositoryError::Conflict { constraint }
                    if constraint == POST_SLUG_CONSTRAINT =>
                {
                    ApiError::new(StatusCode::CONFLICT, "CONFLICT", "title in use, try again")
                }
                RepositoryError::Conflict { .. } => {
                    ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
                }
                RepositoryError::Unavailable { message } => {
                    error!(error = %message, "storage unavailable");
                    ApiError::new(
                        StatusCode::SERVICE_UNAVAILABLE,
                        "STORE_UNAVAILABLE",
                        "storage temporarily unavailable",
                    )
                }
            },
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApplicationError::from(error).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                ApiError::new(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", err.body_text())
            }
            JsonRejection::JsonSyntaxError(err) => {
                ApiError::new(StatusCode::BAD_REQUEST, "MALFORMED_JSON", err.body_text())
            }
            JsonRejection::MissingJsonContentType(err) => {
                ApiError::new(err.status(), "UNSUPPORTED_MEDIA_TYPE", err.body_text())
            }
            other => ApiError::new(other.status(), "BAD_REQUEST", other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        let status = rejection.status();
        let code = if status.is_server_error() {
            "INTERNAL"
        } else {
            "INVALID_PATH"
        };
        ApiError::new(status, code, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canceled_is_not_a_server_error() {
        let err = ApiError::from(ApplicationError::Canceled);
        assert_eq!(err.status().as_u16(), 499);
        assert!(!err.status().is_server_error());
    }

    #[test]
    fn conflict_reads_as_retryable_title_clash() {
        let err = ApiError::from(ApplicationError::from(RepositoryError::conflict(
            "blog_posts_user_id_slug_key",
        )));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.body.message, "title in use, try again");
    }

    #[test]
    fn other_conflicts_do_not_mention_titles() {
        let err = ApiError::from(ApplicationError::from(RepositoryError::conflict(
            "follows_follower_id_followee_id_key",
        )));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.body.message, "resource already exists");
    }

    #[test]
    fn follow_errors_have_their_own_codes() {
        let err = ApiError::from(DomainError::AlreadyFollowing);
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "ALREADY_FOLLOWING");

        let err = ApiError::from(DomainError::CannotFollowSelf);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unavailable_store_maps_to_503() {
        let err = ApiError::from(ApplicationError::from(RepositoryError::unavailable(
            "pool timed out",
        )));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.body.message.contains("pool"));
    }

    #[test]
    fn validation_maps_to_400() {
        let err = ApiError::from(DomainError::invalid_argument("title", "is required"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }
}
