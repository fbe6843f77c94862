use domain::{DomainError, RepositoryError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    /// 请求在完成前被取消
    #[error("request canceled")]
    Canceled,
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl ApplicationError {
    /// 是否为指定唯一约束上的冲突
    pub fn is_conflict_on(&self, name: &str) -> bool {
        matches!(
            self,
            ApplicationError::Repository(RepositoryError::Conflict { constraint }) if constraint == name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_matches_only_the_named_constraint() {
        let err = ApplicationError::from(RepositoryError::conflict("blog_posts_user_id_slug_key"));
        assert!(err.is_conflict_on("blog_posts_user_id_slug_key"));
        assert!(!err.is_conflict_on("blog_posts_pkey"));
        assert!(!ApplicationError::from(RepositoryError::unavailable("down"))
            .is_conflict_on("blog_posts_user_id_slug_key"));
    }
}
