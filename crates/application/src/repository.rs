use async_trait::async_trait;
use domain::{
    ApplicationId, ApplicationNote, BlogPost, Comment, CommentId, CompanyId, Follow,
    JobApplication, LikeTarget, MonthlyCount, PostId, RepositoryError, RoleId, StatusCount,
    Timestamp, UserId,
};

use crate::query_spec::QueryPlan;

/// 分页列表端口：计数与取页共用同一个查询计划
#[async_trait]
pub trait PagedRepository<T: Send>: Send + Sync {
    async fn count(&self, plan: &QueryPlan) -> Result<u64, RepositoryError>;
    async fn fetch_page(&self, plan: &QueryPlan) -> Result<Vec<T>, RepositoryError>;
}

/// slug 占用检查，作用域为作者
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SlugLookup: Send + Sync {
    async fn slug_exists(&self, slug: &str, owner: UserId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait JobApplicationRepository: PagedRepository<JobApplication> {
    /// 按归一化名称查找公司，不存在时创建
    async fn find_or_create_company(
        &self,
        name: &str,
        normalized_name: &str,
    ) -> Result<CompanyId, RepositoryError>;
    async fn find_or_create_role(
        &self,
        company_id: CompanyId,
        title: &str,
    ) -> Result<RoleId, RepositoryError>;
    async fn create(&self, application: JobApplication)
        -> Result<JobApplication, RepositoryError>;
    async fn update(&self, application: JobApplication)
        -> Result<JobApplication, RepositoryError>;
    async fn find_by_id(
        &self,
        id: ApplicationId,
        owner: UserId,
    ) -> Result<Option<JobApplication>, RepositoryError>;
    /// 返回是否删除了记录
    async fn delete(&self, id: ApplicationId, owner: UserId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait BlogPostRepository: PagedRepository<BlogPost> + SlugLookup {
    /// (作者, slug) 冲突时返回 `RepositoryError::Conflict`
    async fn create(&self, post: BlogPost) -> Result<BlogPost, RepositoryError>;
    async fn find_by_slug(
        &self,
        owner: UserId,
        slug: &str,
    ) -> Result<Option<BlogPost>, RepositoryError>;
    async fn find_by_id(&self, id: PostId) -> Result<Option<BlogPost>, RepositoryError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: Comment) -> Result<Comment, RepositoryError>;
    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError>;
    /// 按创建时间升序返回文章的全部评论
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepositoryError>;
}

#[async_trait]
pub trait ApplicationNoteRepository: Send + Sync {
    async fn create(&self, note: ApplicationNote) -> Result<ApplicationNote, RepositoryError>;
    /// 只返回 `owner` 自己申请下的备注，按创建时间倒序
    async fn list_for_application(
        &self,
        application_id: ApplicationId,
        owner: UserId,
    ) -> Result<Vec<ApplicationNote>, RepositoryError>;
}

/// 申请统计查询，作用域为所有者
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn counts_by_status(&self, owner: UserId) -> Result<Vec<StatusCount>, RepositoryError>;
    /// 按 `date_applied` 的年月分组
    async fn counts_by_month(&self, owner: UserId) -> Result<Vec<MonthlyCount>, RepositoryError>;
}

#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// 已点赞时不重复插入，返回是否新增了记录
    async fn insert(
        &self,
        user_id: UserId,
        target: LikeTarget,
        now: Timestamp,
    ) -> Result<bool, RepositoryError>;
    /// 返回是否删除了记录
    async fn delete(&self, user_id: UserId, target: LikeTarget) -> Result<bool, RepositoryError>;
    async fn count(&self, target: LikeTarget) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn exists(&self, follower: UserId, followee: UserId) -> Result<bool, RepositoryError>;
    /// 关系已存在时返回 `RepositoryError::Conflict`
    async fn create(&self, follow: Follow) -> Result<Follow, RepositoryError>;
    async fn delete(&self, follower: UserId, followee: UserId) -> Result<bool, RepositoryError>;
    async fn follower_count(&self, user_id: UserId) -> Result<u64, RepositoryError>;
    async fn following_count(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}
