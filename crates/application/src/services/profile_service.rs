use std::sync::Arc;

use domain::{
    BlogPost, DomainError, Follow, ListRequest, Page, UserId, UserProfile, FOLLOW_CONSTRAINT,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    cancellation::cancellable,
    clock::Clock,
    error::ApplicationError,
    listing::list_page,
    query_spec::{EntityListConfig, Scope},
    repository::{BlogPostRepository, FollowRepository},
};

pub struct ProfileServiceDependencies {
    pub follow_repository: Arc<dyn FollowRepository>,
    pub post_repository: Arc<dyn BlogPostRepository>,
    pub clock: Arc<dyn Clock>,
    pub list_config: EntityListConfig,
}

/// 关注关系与用户主页
pub struct ProfileService {
    deps: ProfileServiceDependencies,
}

impl ProfileService {
    pub fn new(deps: ProfileServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn follow(
        &self,
        follower: UserId,
        followee: UserId,
        cancel: &CancellationToken,
    ) -> Result<Follow, ApplicationError> {
        let follow = Follow::new(follower, followee, self.deps.clock.now())?;
        let follows = &self.deps.follow_repository;
        if cancellable(cancel, follows.exists(follower, followee)).await? {
            return Err(DomainError::AlreadyFollowing.into());
        }

        match cancellable(cancel, follows.create(follow)).await {
            Ok(stored) => {
                info!(follower = %follower, followee = %followee, "user followed");
                Ok(stored)
            }
            // 与另一个相同请求并发时由唯一约束兜底
            Err(err) if err.is_conflict_on(FOLLOW_CONSTRAINT) => {
                Err(DomainError::AlreadyFollowing.into())
            }
            Err(err) => Err(err),
        }
    }

    /// 未关注时也视为成功
    pub async fn unfollow(
        &self,
        follower: UserId,
        followee: UserId,
        cancel: &CancellationToken,
    ) -> Result<(), ApplicationError> {
        let removed =
            cancellable(cancel, self.deps.follow_repository.delete(follower, followee)).await?;
        if removed {
            info!(follower = %follower, followee = %followee, "user unfollowed");
        }
        Ok(())
    }

    /// 用户主页：公开文章分页与关注计数；`is_following` 只对其他已登录用户有意义
    pub async fn profile(
        &self,
        user_id: UserId,
        viewer: Option<UserId>,
        request: &ListRequest,
        cancel: &CancellationToken,
    ) -> Result<UserProfile, ApplicationError> {
        let posts = self.public_posts(user_id, request, cancel).await?;

        let follows = &self.deps.follow_repository;
        let follower_count = cancellable(cancel, follows.follower_count(user_id)).await?;
        let following_count = cancellable(cancel, follows.following_count(user_id)).await?;
        let is_following = match viewer {
            Some(viewer) if viewer != user_id => {
                cancellable(cancel, follows.exists(viewer, user_id)).await?
            }
            _ => false,
        };

        Ok(UserProfile {
            user_id,
            posts,
            follower_count,
            following_count,
            is_following,
        })
    }

    async fn public_posts(
        &self,
        author: UserId,
        request: &ListRequest,
        cancel: &CancellationToken,
    ) -> Result<Page<BlogPost>, ApplicationError> {
        let mut request = request.clone();
        request
            .filters
            .insert("userId".to_string(), author.to_string());
        list_page(
            self.deps.post_repository.as_ref(),
            &request,
            &self.deps.list_config,
            Scope::Public,
            cancel,
        )
        .await
    }
}
