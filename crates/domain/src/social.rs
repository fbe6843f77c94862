//! 点赞与关注

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blog::BlogPost;
use crate::errors::{DomainError, DomainResult};
use crate::listing::Page;
use crate::value_objects::{CommentId, PostId, Timestamp, UserId};

/// 关注关系唯一约束的名称
pub const FOLLOW_CONSTRAINT: &str = "follows_follower_id_followee_id_key";

/// 可被点赞的内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Post,
    Comment,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 点赞目标：文章或评论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeTarget {
    pub content_type: ContentType,
    pub content_id: Uuid,
}

impl LikeTarget {
    pub fn post(id: PostId) -> Self {
        Self {
            content_type: ContentType::Post,
            content_id: id.0,
        }
    }

    pub fn comment(id: CommentId) -> Self {
        Self {
            content_type: ContentType::Comment,
            content_id: id.0,
        }
    }
}

/// 切换点赞后的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub is_liked: bool,
    pub like_count: u64,
}

/// 关注关系
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub follower_id: UserId,
    pub followee_id: UserId,
    pub created_at: Timestamp,
}

impl Follow {
    pub fn new(follower_id: UserId, followee_id: UserId, now: Timestamp) -> DomainResult<Self> {
        if follower_id == followee_id {
            return Err(DomainError::CannotFollowSelf);
        }
        Ok(Self {
            follower_id,
            followee_id,
            created_at: now,
        })
    }
}

/// 用户主页：公开文章与关注计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: UserId,
    pub posts: Page<BlogPost>,
    pub follower_count: u64,
    pub following_count: u64,
    /// 匿名访问或查看自己主页时为 `false`
    pub is_following: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn following_yourself_is_rejected() {
        let user = UserId::generate();
        assert_eq!(
            Follow::new(user, user, Utc::now()).unwrap_err(),
            DomainError::CannotFollowSelf
        );
    }

    #[test]
    fn like_target_reads_camel_case_body() {
        let id = Uuid::new_v4();
        let target: LikeTarget =
            serde_json::from_value(json!({ "contentType": "comment", "contentId": id })).unwrap();
        assert_eq!(target, LikeTarget::comment(CommentId::from(id)));
    }

    #[test]
    fn unknown_content_type_is_rejected() {
        let body = json!({ "contentType": "profile", "contentId": Uuid::new_v4() });
        assert!(serde_json::from_value::<LikeTarget>(body).is_err());
    }
}
