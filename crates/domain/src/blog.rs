//! 博客文章与评论实体定义

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{CommentId, PostId, Timestamp, UserId};

/// 评论嵌套层级上限（根评论为 0 层）
pub const MAX_COMMENT_DEPTH: u32 = 5;
/// 摘要截取的字符数
pub const EXCERPT_LEN: usize = 150;
pub const MAX_TITLE_LEN: usize = 255;
/// 同一作者下 slug 唯一约束的名称
pub const POST_SLUG_CONSTRAINT: &str = "blog_posts_user_id_slug_key";

/// 从 Markdown 正文生成摘要：超过长度时在最后一个空格处截断并追加 `...`。
pub fn make_excerpt(content_md: &str) -> String {
    let content = content_md.trim();
    match content.char_indices().nth(EXCERPT_LEN) {
        None => content.to_string(),
        Some((cut, _)) => {
            let head = &content[..cut];
            let head = match head.rfind(' ') {
                Some(space) if space > 0 => &head[..space],
                _ => head,
            };
            format!("{}...", head.trim_end())
        }
    }
}

/// 新文章提交的字段，已经过校验。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content_md: String,
    pub is_public: bool,
    pub tags: Vec<String>,
}

impl PostDraft {
    pub fn parse(
        title: &str,
        content_md: &str,
        is_public: bool,
        tags: Vec<String>,
    ) -> DomainResult<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::invalid_argument("title", "is required"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(DomainError::invalid_argument(
                "title",
                format!("must be at most {MAX_TITLE_LEN} characters"),
            ));
        }
        if content_md.trim().is_empty() {
            return Err(DomainError::invalid_argument("contentMd", "is required"));
        }

        let tags = tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();

        Ok(Self {
            title: title.to_string(),
            content_md: content_md.to_string(),
            is_public,
            tags,
        })
    }
}

/// 博客文章实体，slug 在同一作者范围内唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: PostId,
    pub user_id: UserId,
    pub title: String,
    pub slug: String,
    pub content_md: String,
    pub excerpt: String,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BlogPost {
    pub fn new(author: UserId, slug: String, draft: PostDraft, now: Timestamp) -> Self {
        let excerpt = make_excerpt(&draft.content_md);
        Self {
            id: PostId::generate(),
            user_id: author,
            title: draft.title,
            slug,
            content_md: draft.content_md,
            excerpt,
            is_public: draft.is_public,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
        }
    }

    /// 公开文章对所有人可见，草稿只对作者可见
    pub fn is_visible_to(&self, viewer: Option<UserId>) -> bool {
        self.is_public || viewer == Some(self.user_id)
    }
}

/// 扁平存储的评论
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub parent_id: Option<CommentId>,
    pub depth: u32,
    pub content: String,
    pub created_at: Timestamp,
}

impl Comment {
    /// 顶层评论
    pub fn root(
        post_id: PostId,
        author_id: UserId,
        content: &str,
        now: Timestamp,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: CommentId::generate(),
            post_id,
            author_id,
            parent_id: None,
            depth: 0,
            content: Self::validate_content(content)?,
            created_at: now,
        })
    }

    /// 回复某条评论，层级为父评论层级加一
    pub fn reply(
        parent: &Comment,
        post_id: PostId,
        author_id: UserId,
        content: &str,
        max_depth: u32,
        now: Timestamp,
    ) -> DomainResult<Self> {
        if parent.post_id != post_id {
            return Err(DomainError::ParentCommentMismatch);
        }
        if parent.depth >= max_depth {
            return Err(DomainError::CommentDepthExceeded { max: max_depth });
        }

        Ok(Self {
            id: CommentId::generate(),
            post_id,
            author_id,
            parent_id: Some(parent.id),
            depth: parent.depth + 1,
            content: Self::validate_content(content)?,
            created_at: now,
        })
    }

    fn validate_content(content: &str) -> DomainResult<String> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::invalid_argument("content", "is required"));
        }
        Ok(content.to_string())
    }
}

/// 评论树节点，回复由节点自身持有
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub parent_id: Option<CommentId>,
    pub depth: u32,
    pub content: String,
    pub created_at: Timestamp,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// 子树中的节点总数（含自身）
    pub fn subtree_len(&self) -> usize {
        1 + self.replies.iter().map(CommentNode::subtree_len).sum::<usize>()
    }
}

impl From<Comment> for CommentNode {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            parent_id: comment.parent_id,
            depth: comment.depth,
            content: comment.content,
            created_at: comment.created_at,
            replies: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn short_content_is_used_verbatim() {
        assert_eq!(make_excerpt("  hello world  "), "hello world");
    }

    #[test]
    fn long_content_is_cut_at_last_space() {
        let content = format!("{} tail", "word ".repeat(40));
        let excerpt = make_excerpt(&content);
        assert!(excerpt.ends_with("..."));
        assert!(!excerpt.contains("wor..."));
        assert!(excerpt.chars().count() <= EXCERPT_LEN + 3);
    }

    #[test]
    fn excerpt_respects_multibyte_boundaries() {
        let content = "文".repeat(200);
        let excerpt = make_excerpt(&content);
        assert_eq!(excerpt.chars().count(), EXCERPT_LEN + 3);
    }

    #[test]
    fn reply_increments_depth() {
        let post = PostId::generate();
        let author = UserId::generate();
        let root = Comment::root(post, author, "first", Utc::now()).unwrap();
        let reply = Comment::reply(&root, post, author, "second", MAX_COMMENT_DEPTH, Utc::now())
            .unwrap();
        assert_eq!(reply.depth, 1);
        assert_eq!(reply.parent_id, Some(root.id));
    }

    #[test]
    fn reply_at_max_depth_is_rejected() {
        let post = PostId::generate();
        let author = UserId::generate();
        let mut parent = Comment::root(post, author, "deep", Utc::now()).unwrap();
        parent.depth = MAX_COMMENT_DEPTH;
        let err = Comment::reply(&parent, post, author, "too deep", MAX_COMMENT_DEPTH, Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::CommentDepthExceeded {
                max: MAX_COMMENT_DEPTH
            }
        );
    }

    #[test]
    fn reply_to_other_post_is_rejected() {
        let author = UserId::generate();
        let parent = Comment::root(PostId::generate(), author, "elsewhere", Utc::now()).unwrap();
        let err = Comment::reply(
            &parent,
            PostId::generate(),
            author,
            "hi",
            MAX_COMMENT_DEPTH,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::ParentCommentMismatch);
    }

    #[test]
    fn drafts_are_only_visible_to_author() {
        let author = UserId::generate();
        let draft = PostDraft::parse("Hidden", "body", false, vec![]).unwrap();
        let post = BlogPost::new(author, "hidden".into(), draft, Utc::now());
        assert!(post.is_visible_to(Some(author)));
        assert!(!post.is_visible_to(Some(UserId::generate())));
        assert!(!post.is_visible_to(None));
    }
}
