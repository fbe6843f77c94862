use std::sync::Arc;

use domain::{
    BlogPost, Comment, CommentId, CommentNode, ContentType, DomainError, LikeStatus, LikeTarget,
    ListRequest, Page, PostDraft, PostId, UserId, POST_SLUG_CONSTRAINT,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    cancellation::cancellable,
    clock::Clock,
    comment_tree::assemble_comment_tree,
    error::ApplicationError,
    listing::list_page,
    query_spec::{EntityListConfig, Scope},
    repository::{BlogPostRepository, CommentRepository, LikeRepository},
    slug::resolve_slug,
};

/// slug 冲突后重新解析的次数上限
pub const MAX_SLUG_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct CreatePostRequest {
    pub author_id: UserId,
    pub title: String,
    pub content_md: String,
    pub is_public: bool,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AddCommentRequest {
    pub post_id: PostId,
    pub author_id: UserId,
    pub parent_id: Option<CommentId>,
    pub content: String,
}

pub struct BlogServiceDependencies {
    pub post_repository: Arc<dyn BlogPostRepository>,
    pub comment_repository: Arc<dyn CommentRepository>,
    pub like_repository: Arc<dyn LikeRepository>,
    pub clock: Arc<dyn Clock>,
    pub list_config: EntityListConfig,
    pub max_comment_depth: u32,
}

pub struct BlogService {
    deps: BlogServiceDependencies,
}

impl BlogService {
    pub fn new(deps: BlogServiceDependencies) -> Self {
        Self { deps }
    }

    /// 创建文章；slug 的预检查与插入之间可能被并发请求抢占，
    /// 收到唯一约束冲突时重新解析 slug 再插入。
    pub async fn create_post(
        &self,
        request: CreatePostRequest,
        cancel: &CancellationToken,
    ) -> Result<BlogPost, ApplicationError> {
        let draft = PostDraft::parse(
            &request.title,
            &request.content_md,
            request.is_public,
            request.tags,
        )?;

        let mut attempt = 1;
        loop {
            let slug = resolve_slug(
                self.deps.post_repository.as_ref(),
                &draft.title,
                request.author_id,
                cancel,
            )
            .await?;
            let post = BlogPost::new(request.author_id, slug, draft.clone(), self.deps.clock.now());

            match cancellable(cancel, self.deps.post_repository.create(post)).await {
                Ok(stored) => {
                    info!(post_id = %stored.id, slug = %stored.slug, "blog post created");
                    return Ok(stored);
                }
                Err(err)
                    if err.is_conflict_on(POST_SLUG_CONSTRAINT) && attempt < MAX_SLUG_ATTEMPTS =>
                {
                    warn!(attempt, author_id = %request.author_id, "slug taken concurrently, resolving again");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// 按作者和 slug 读取文章；草稿只有作者本人可见
    pub async fn get_post(
        &self,
        owner: UserId,
        slug: &str,
        viewer: Option<UserId>,
        cancel: &CancellationToken,
    ) -> Result<BlogPost, ApplicationError> {
        cancellable(cancel, self.deps.post_repository.find_by_slug(owner, slug))
            .await?
            .filter(|post| post.is_visible_to(viewer))
            .ok_or(ApplicationError::NotFound("blog post"))
    }

    pub async fn list_public_posts(
        &self,
        request: &ListRequest,
        cancel: &CancellationToken,
    ) -> Result<Page<BlogPost>, ApplicationError> {
        list_page(
            self.deps.post_repository.as_ref(),
            request,
            &self.deps.list_config,
            Scope::Public,
            cancel,
        )
        .await
    }

    pub async fn add_comment(
        &self,
        request: AddCommentRequest,
        cancel: &CancellationToken,
    ) -> Result<Comment, ApplicationError> {
        self.visible_post(request.post_id, Some(request.author_id), cancel)
            .await?;

        let now = self.deps.clock.now();
        let comment = match request.parent_id {
            None => Comment::root(request.post_id, request.author_id, &request.content, now)?,
            Some(parent_id) => {
                let parent = cancellable(
                    cancel,
                    self.deps.comment_repository.find_by_id(parent_id),
                )
                .await?
                .ok_or(DomainError::ParentCommentNotFound)?;

                Comment::reply(
                    &parent,
                    request.post_id,
                    request.author_id,
                    &request.content,
                    self.deps.max_comment_depth,
                    now,
                )?
            }
        };

        cancellable(cancel, self.deps.comment_repository.create(comment)).await
    }

    /// 文章的评论树
    pub async fn comments_for_post(
        &self,
        post_id: PostId,
        viewer: Option<UserId>,
        cancel: &CancellationToken,
    ) -> Result<Vec<CommentNode>, ApplicationError> {
        self.visible_post(post_id, viewer, cancel).await?;
        let flat = cancellable(cancel, self.deps.comment_repository.list_for_post(post_id)).await?;
        Ok(assemble_comment_tree(flat))
    }

    /// 切换点赞：已点赞则取消，否则点赞。目标文章（或评论所在文章）必须对用户可见。
    pub async fn toggle_like(
        &self,
        user_id: UserId,
        target: LikeTarget,
        cancel: &CancellationToken,
    ) -> Result<LikeStatus, ApplicationError> {
        match target.content_type {
            ContentType::Post => {
                self.visible_post(PostId::from(target.content_id), Some(user_id), cancel)
                    .await?;
            }
            ContentType::Comment => {
                let comment = cancellable(
                    cancel,
                    self.deps
                        .comment_repository
                        .find_by_id(CommentId::from(target.content_id)),
                )
                .await?
                .ok_or(ApplicationError::NotFound("comment"))?;
                self.visible_post(comment.post_id, Some(user_id), cancel)
                    .await?;
            }
        }

        let likes = &self.deps.like_repository;
        let removed = cancellable(cancel, likes.delete(user_id, target)).await?;
        if !removed {
            cancellable(cancel, likes.insert(user_id, target, self.deps.clock.now())).await?;
        }
        let like_count = cancellable(cancel, likes.count(target)).await?;

        info!(
            user_id = %user_id,
            content_type = %target.content_type,
            content_id = %target.content_id,
            is_liked = !removed,
            "like toggled"
        );
        Ok(LikeStatus {
            is_liked: !removed,
            like_count,
        })
    }

    async fn visible_post(
        &self,
        post_id: PostId,
        viewer: Option<UserId>,
        cancel: &CancellationToken,
    ) -> Result<BlogPost, ApplicationError> {
        cancellable(cancel, self.deps.post_repository.find_by_id(post_id))
            .await?
            .filter(|post| post.is_visible_to(viewer))
            .ok_or(ApplicationError::NotFound("blog post"))
    }
}
