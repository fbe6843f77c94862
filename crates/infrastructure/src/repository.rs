use std::sync::Arc;

use application::{
    query_spec::QueryPlan, AnalyticsRepository, ApplicationNoteRepository, BlogPostRepository,
    CommentRepository, FollowRepository, JobApplicationRepository, LikeRepository,
    PagedRepository, SlugLookup,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use domain::{
    ApplicationId, ApplicationNote, BlogPost, Comment, CommentId, CompanyId, Follow,
    JobApplication, LikeTarget, MonthlyCount, NoteId, PostId, RepositoryError, RoleId,
    StatusCount, Timestamp, UserId,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::query::{count_query, page_query};

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::conflict(db.constraint().unwrap_or("unique"))
        }
        // 引用的行已被删除
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepositoryError::NotFound,
        _ => RepositoryError::unavailable(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::unavailable(message)
}

fn to_total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

#[derive(Debug, FromRow)]
struct ApplicationRecord {
    id: Uuid,
    user_id: Uuid,
    company_id: Uuid,
    role_id: Uuid,
    company_name: String,
    role_title: String,
    date_applied: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ApplicationRecord> for JobApplication {
    fn from(value: ApplicationRecord) -> Self {
        JobApplication {
            id: ApplicationId::from(value.id),
            user_id: UserId::from(value.user_id),
            company_id: CompanyId::from(value.company_id),
            role_id: RoleId::from(value.role_id),
            company_name: value.company_name,
            role_title: value.role_title,
            date_applied: value.date_applied,
            status: value.status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct BlogPostRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    slug: String,
    content_md: String,
    excerpt: String,
    is_public: bool,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BlogPostRecord> for BlogPost {
    fn from(value: BlogPostRecord) -> Self {
        BlogPost {
            id: PostId::from(value.id),
            user_id: UserId::from(value.user_id),
            title: value.title,
            slug: value.slug,
            content_md: value.content_md,
            excerpt: value.excerpt,
            is_public: value.is_public,
            tags: value.tags,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CommentRecord {
    id: Uuid,
    post_id: Uuid,
    user_id: Uuid,
    parent_comment_id: Option<Uuid>,
    depth_level: i32,
    content_md: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRecord> for Comment {
    type Error = RepositoryError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        let depth = u32::try_from(value.depth_level)
            .map_err(|_| invalid_data(format!("negative comment depth {}", value.depth_level)))?;

        Ok(Comment {
            id: CommentId::from(value.id),
            post_id: PostId::from(value.post_id),
            author_id: UserId::from(value.user_id),
            parent_id: value.parent_comment_id.map(CommentId::from),
            depth,
            content: value.content_md,
            created_at: value.created_at,
        })
    }
}

const APPLICATION_FROM: &str = "applications a";
const APPLICATION_SELECT: &str = r#"SELECT a.id, a.user_id, a.company_id, a.role_id,
    (SELECT co.name FROM companies co WHERE co.id = a.company_id) AS company_name,
    (SELECT ro.title FROM roles ro WHERE ro.id = a.role_id) AS role_title,
    a.date_applied, a.status, a.created_at, a.updated_at
    FROM applications a"#;

#[derive(Clone)]
pub struct PgJobApplicationRepository {
    pool: PgPool,
}

impl PgJobApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PagedRepository<JobApplication> for PgJobApplicationRepository {
    async fn count(&self, plan: &QueryPlan) -> Result<u64, RepositoryError> {
        let mut builder = count_query(APPLICATION_FROM, plan);
        let total: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(to_total(total))
    }

    async fn fetch_page(&self, plan: &QueryPlan) -> Result<Vec<JobApplication>, RepositoryError> {
        let mut builder = page_query(APPLICATION_SELECT, plan);
        let records = builder
            .build_query_as::<ApplicationRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(records.into_iter().map(JobApplication::from).collect())
    }
}

#[async_trait]
impl JobApplicationRepository for PgJobApplicationRepository {
    async fn find_or_create_company(
        &self,
        name: &str,
        normalized_name: &str,
    ) -> Result<CompanyId, RepositoryError> {
        let inserted: Option<Uuid> = sqlx::query_scalar::<_, Uuid>(
            r#"
            WITH existing AS (
                SELECT id FROM companies WHERE normalized_name = $1
            ), created AS (
                INSERT INTO companies (id, name, normalized_name)
                SELECT $3, $2, $1
                WHERE NOT EXISTS (SELECT 1 FROM existing)
                ON CONFLICT (normalized_name) DO NOTHING
                RETURNING id
            )
            SELECT id FROM created
            UNION ALL
            SELECT id FROM existing
            LIMIT 1
            "#,
        )
        .bind(normalized_name)
        .bind(name)
        .bind(Uuid::new_v4())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let id = match inserted {
            Some(id) => id,
            // 并发插入时 CTE 快照看不到对方的行，再查一次
            None => sqlx::query_scalar::<_, Uuid>("SELECT id FROM companies WHERE normalized_name = $1")
                .bind(normalized_name)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_err)?,
        };
        Ok(CompanyId::from(id))
    }

    async fn find_or_create_role(
        &self,
        company_id: CompanyId,
        title: &str,
    ) -> Result<RoleId, RepositoryError> {
        let inserted: Option<Uuid> = sqlx::query_scalar::<_, Uuid>(
            r#"
            WITH existing AS (
                SELECT id FROM roles WHERE company_id = $1 AND title = $2
            ), created AS (
                INSERT INTO roles (id, company_id, title)
                SELECT $3, $1, $2
                WHERE NOT EXISTS (SELECT 1 FROM existing)
                ON CONFLICT (company_id, title) DO NOTHING
                RETURNING id
            )
            SELECT id FROM created
            UNION ALL
            SELECT id FROM existing
            LIMIT 1
            "#,
        )
        .bind(Uuid::from(company_id))
        .bind(title)
        .bind(Uuid::new_v4())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let id = match inserted {
            Some(id) => id,
            None => sqlx::query_scalar::<_, Uuid>("SELECT id FROM roles WHERE company_id = $1 AND title = $2")
                .bind(Uuid::from(company_id))
                .bind(title)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_err)?,
        };
        Ok(RoleId::from(id))
    }

    async fn create(&self, application: JobApplication) -> Result<JobApplication, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO applications
                (id, user_id, company_id, role_id, date_applied, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::from(application.id))
        .bind(Uuid::from(application.user_id))
        .bind(Uuid::from(application.company_id))
        .bind(Uuid::from(application.role_id))
        .bind(application.date_applied)
        .bind(&application.status)
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(application)
    }

    async fn update(&self, application: JobApplication) -> Result<JobApplication, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET company_id = $1, role_id = $2, date_applied = $3, status = $4, updated_at = $5
            WHERE id = $6 AND user_id = $7
            "#,
        )
        .bind(Uuid::from(application.company_id))
        .bind(Uuid::from(application.role_id))
        .bind(application.date_applied)
        .bind(&application.status)
        .bind(application.updated_at)
        .bind(Uuid::from(application.id))
        .bind(Uuid::from(application.user_id))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(application)
    }

    async fn find_by_id(
        &self,
        id: ApplicationId,
        owner: UserId,
    ) -> Result<Option<JobApplication>, RepositoryError> {
        let record = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "{APPLICATION_SELECT} WHERE a.id = $1 AND a.user_id = $2"
        ))
        .bind(Uuid::from(id))
        .bind(Uuid::from(owner))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(JobApplication::from))
    }

    async fn delete(&self, id: ApplicationId, owner: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1 AND user_id = $2")
            .bind(Uuid::from(id))
            .bind(Uuid::from(owner))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, FromRow)]
struct NoteRecord {
    id: Uuid,
    application_id: Uuid,
    user_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<NoteRecord> for ApplicationNote {
    fn from(value: NoteRecord) -> Self {
        ApplicationNote {
            id: NoteId::from(value.id),
            application_id: ApplicationId::from(value.application_id),
            user_id: UserId::from(value.user_id),
            content: value.content,
            created_at: value.created_at,
        }
    }
}

#[async_trait]
impl ApplicationNoteRepository for PgJobApplicationRepository {
    async fn create(&self, note: ApplicationNote) -> Result<ApplicationNote, RepositoryError> {
        let record = sqlx::query_as::<_, NoteRecord>(
            r#"
            INSERT INTO application_notes (id, application_id, user_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, application_id, user_id, content, created_at
            "#,
        )
        .bind(Uuid::from(note.id))
        .bind(Uuid::from(note.application_id))
        .bind(Uuid::from(note.user_id))
        .bind(&note.content)
        .bind(note.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(ApplicationNote::from(record))
    }

    async fn list_for_application(
        &self,
        application_id: ApplicationId,
        owner: UserId,
    ) -> Result<Vec<ApplicationNote>, RepositoryError> {
        let records = sqlx::query_as::<_, NoteRecord>(
            r#"
            SELECT n.id, n.application_id, n.user_id, n.content, n.created_at
            FROM application_notes n
            JOIN applications a ON a.id = n.application_id
            WHERE n.application_id = $1 AND a.user_id = $2
            ORDER BY n.created_at DESC, n.id DESC
            "#,
        )
        .bind(Uuid::from(application_id))
        .bind(Uuid::from(owner))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(ApplicationNote::from).collect())
    }
}

#[async_trait]
impl AnalyticsRepository for PgJobApplicationRepository {
    async fn counts_by_status(&self, owner: UserId) -> Result<Vec<StatusCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM applications
            WHERE user_id = $1
            GROUP BY status
            ORDER BY count DESC, status ASC
            "#,
        )
        .bind(Uuid::from(owner))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| StatusCount {
                status,
                count: to_total(count),
            })
            .collect())
    }

    async fn counts_by_month(&self, owner: UserId) -> Result<Vec<MonthlyCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT to_char(date_applied, 'YYYY-MM') AS month, COUNT(*) AS count
            FROM applications
            WHERE user_id = $1
            GROUP BY month
            ORDER BY month ASC
            "#,
        )
        .bind(Uuid::from(owner))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(rows
            .into_iter()
            .map(|(month, count)| MonthlyCount {
                month,
                count: to_total(count),
            })
            .collect())
    }
}

const POST_FROM: &str = "blog_posts p";
const POST_SELECT: &str = r#"SELECT p.id, p.user_id, p.title, p.slug, p.content_md, p.excerpt,
    p.is_public, p.tags, p.created_at, p.updated_at
    FROM blog_posts p"#;

#[derive(Clone)]
pub struct PgBlogPostRepository {
    pool: PgPool,
}

impl PgBlogPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PagedRepository<BlogPost> for PgBlogPostRepository {
    async fn count(&self, plan: &QueryPlan) -> Result<u64, RepositoryError> {
        let mut builder = count_query(POST_FROM, plan);
        let total: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(to_total(total))
    }

    async fn fetch_page(&self, plan: &QueryPlan) -> Result<Vec<BlogPost>, RepositoryError> {
        let mut builder = page_query(POST_SELECT, plan);
        let records = builder
            .build_query_as::<BlogPostRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(records.into_iter().map(BlogPost::from).collect())
    }
}

#[async_trait]
impl SlugLookup for PgBlogPostRepository {
    async fn slug_exists(&self, slug: &str, owner: UserId) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM blog_posts WHERE slug = $1 AND user_id = $2)",
        )
        .bind(slug)
        .bind(Uuid::from(owner))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)
    }
}

#[async_trait]
impl BlogPostRepository for PgBlogPostRepository {
    async fn create(&self, post: BlogPost) -> Result<BlogPost, RepositoryError> {
        let record = sqlx::query_as::<_, BlogPostRecord>(
            r#"
            INSERT INTO blog_posts
                (id, user_id, title, slug, content_md, excerpt, is_public, tags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, user_id, title, slug, content_md, excerpt, is_public, tags, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(post.id))
        .bind(Uuid::from(post.user_id))
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content_md)
        .bind(&post.excerpt)
        .bind(post.is_public)
        .bind(&post.tags)
        .bind(post.created_at)
        .bind(post.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        debug!(post_id = %record.id, slug = %record.slug, "blog post stored");
        Ok(BlogPost::from(record))
    }

    async fn find_by_slug(
        &self,
        owner: UserId,
        slug: &str,
    ) -> Result<Option<BlogPost>, RepositoryError> {
        let record = sqlx::query_as::<_, BlogPostRecord>(&format!(
            "{POST_SELECT} WHERE p.user_id = $1 AND p.slug = $2"
        ))
        .bind(Uuid::from(owner))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(BlogPost::from))
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<BlogPost>, RepositoryError> {
        let record = sqlx::query_as::<_, BlogPostRecord>(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(record.map(BlogPost::from))
    }
}

#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, comment: Comment) -> Result<Comment, RepositoryError> {
        let depth = i32::try_from(comment.depth)
            .map_err(|_| invalid_data(format!("comment depth {} out of range", comment.depth)))?;

        let record = sqlx::query_as::<_, CommentRecord>(
            r#"
            INSERT INTO comments (id, post_id, user_id, parent_comment_id, depth_level, content_md, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, post_id, user_id, parent_comment_id, depth_level, content_md, created_at
            "#,
        )
        .bind(Uuid::from(comment.id))
        .bind(Uuid::from(comment.post_id))
        .bind(Uuid::from(comment.author_id))
        .bind(comment.parent_id.map(Uuid::from))
        .bind(depth)
        .bind(&comment.content)
        .bind(comment.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Comment::try_from(record)
    }

    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let record = sqlx::query_as::<_, CommentRecord>(
            r#"
            SELECT id, post_id, user_id, parent_comment_id, depth_level, content_md, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Comment::try_from).transpose()
    }

    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepositoryError> {
        let records = sqlx::query_as::<_, CommentRecord>(
            r#"
            SELECT id, post_id, user_id, parent_comment_id, depth_level, content_md, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(Uuid::from(post_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Comment::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgLikeRepository {
    pool: PgPool,
}

impl PgLikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for PgLikeRepository {
    async fn insert(
        &self,
        user_id: UserId,
        target: LikeTarget,
        now: Timestamp,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO likes (user_id, content_type, content_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, content_type, content_id) DO NOTHING
            "#,
        )
        .bind(Uuid::from(user_id))
        .bind(target.content_type.as_str())
        .bind(target.content_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, user_id: UserId, target: LikeTarget) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM likes WHERE user_id = $1 AND content_type = $2 AND content_id = $3",
        )
        .bind(Uuid::from(user_id))
        .bind(target.content_type.as_str())
        .bind(target.content_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, target: LikeTarget) -> Result<u64, RepositoryError> {
        let total: i64 = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM likes WHERE content_type = $1 AND content_id = $2",
        )
        .bind(target.content_type.as_str())
        .bind(target.content_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(to_total(total))
    }
}

#[derive(Clone)]
pub struct PgFollowRepository {
    pool: PgPool,
}

impl PgFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_where(&self, column: &str, user_id: UserId) -> Result<u64, RepositoryError> {
        let total: i64 =
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM follows WHERE {column} = $1"))
                .bind(Uuid::from(user_id))
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        Ok(to_total(total))
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    async fn exists(&self, follower: UserId, followee: UserId) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(Uuid::from(follower))
        .bind(Uuid::from(followee))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)
    }

    async fn create(&self, follow: Follow) -> Result<Follow, RepositoryError> {
        sqlx::query("INSERT INTO follows (follower_id, followee_id, created_at) VALUES ($1, $2, $3)")
            .bind(Uuid::from(follow.follower_id))
            .bind(Uuid::from(follow.followee_id))
            .bind(follow.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        debug!(follower = %follow.follower_id, followee = %follow.followee_id, "follow stored");
        Ok(follow)
    }

    async fn delete(&self, follower: UserId, followee: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(Uuid::from(follower))
            .bind(Uuid::from(followee))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn follower_count(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        self.count_where("followee_id", user_id).await
    }

    async fn following_count(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        self.count_where("follower_id", user_id).await
    }
}

/// 共享同一连接池的全部仓储
#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    /// 同时提供申请备注与统计查询
    pub application_repository: Arc<PgJobApplicationRepository>,
    pub post_repository: Arc<PgBlogPostRepository>,
    pub comment_repository: Arc<PgCommentRepository>,
    pub like_repository: Arc<PgLikeRepository>,
    pub follow_repository: Arc<PgFollowRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            application_repository: Arc::new(PgJobApplicationRepository::new(pool.clone())),
            post_repository: Arc::new(PgBlogPostRepository::new(pool.clone())),
            comment_repository: Arc::new(PgCommentRepository::new(pool.clone())),
            like_repository: Arc::new(PgLikeRepository::new(pool.clone())),
            follow_repository: Arc::new(PgFollowRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert_eq!(map_sqlx_err(sqlx::Error::RowNotFound), RepositoryError::NotFound);
    }

    #[test]
    fn pool_failures_map_to_unavailable() {
        assert!(matches!(
            map_sqlx_err(sqlx::Error::PoolTimedOut),
            RepositoryError::Unavailable { .. }
        ));
    }

    #[test]
    fn negative_depth_is_rejected() {
        let record = CommentRecord {
            id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            parent_comment_id: None,
            depth_level: -1,
            content_md: "broken".into(),
            created_at: Utc::now(),
        };
        assert!(Comment::try_from(record).is_err());
    }
}
