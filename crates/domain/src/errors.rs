//! 领域模型错误定义
//!
//! 校验失败归入 `DomainError`，存储层失败统一归入 `RepositoryError`。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 参数校验失败
    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 回复层级超过上限
    #[error("maximum comment depth of {max} reached")]
    CommentDepthExceeded { max: u32 },

    /// 父评论不存在
    #[error("parent comment not found")]
    ParentCommentNotFound,

    /// 父评论属于其他文章
    #[error("parent comment belongs to a different post")]
    ParentCommentMismatch,

    #[error("users cannot follow themselves")]
    CannotFollowSelf,

    #[error("already following this user")]
    AlreadyFollowing,
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 存储层错误，按类型原样向上传递。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    /// 唯一约束冲突
    #[error("unique constraint `{constraint}` violated")]
    Conflict { constraint: String },

    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
}

impl RepositoryError {
    pub fn conflict(constraint: impl Into<String>) -> Self {
        Self::Conflict {
            constraint: constraint.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
