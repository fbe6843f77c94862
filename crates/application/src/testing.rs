//! 内存仓储实现，供服务测试与路由测试使用。
//!
//! 按 `QueryPlan` 中的列名解释谓词和排序，行为与 Postgres 实现保持一致。

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use domain::{
    ApplicationId, ApplicationNote, BlogPost, Comment, CommentId, CompanyId, Follow,
    JobApplication, LikeTarget, MonthlyCount, PostId, RepositoryError, RoleId, SortOrder,
    StatusCount, Timestamp, UserId, FOLLOW_CONSTRAINT, POST_SLUG_CONSTRAINT,
};

use crate::query_spec::{BindValue, Predicate, QueryPlan};
use crate::repository::{
    AnalyticsRepository, ApplicationNoteRepository, BlogPostRepository, CommentRepository,
    FollowRepository, JobApplicationRepository, LikeRepository, PagedRepository, SlugLookup,
};

/// 能按列名取值的行
trait PlanRow {
    fn column_text(&self, column: &str) -> Option<String>;
}

fn timestamp_text(at: &Timestamp) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.9f").to_string()
}

fn bind_text(value: &BindValue) -> String {
    match value {
        BindValue::Uuid(id) => id.to_string(),
        BindValue::Text(text) => text.clone(),
        BindValue::Bool(flag) => flag.to_string(),
    }
}

/// 还原 LIKE 模式中的字面搜索词
fn like_term(pattern: &str) -> String {
    let inner = pattern
        .strip_prefix('%')
        .and_then(|rest| rest.strip_suffix('%'))
        .unwrap_or(pattern);
    let mut term = String::with_capacity(inner.len());
    let mut escaped = false;
    for ch in inner.chars() {
        if ch == '\\' && !escaped {
            escaped = true;
            continue;
        }
        escaped = false;
        term.push(ch);
    }
    term
}

fn matches_plan<R: PlanRow>(row: &R, plan: &QueryPlan) -> bool {
    plan.predicates.iter().all(|predicate| match predicate {
        Predicate::Equals { column, value } => {
            row.column_text(column).as_deref() == Some(bind_text(value).as_str())
        }
        Predicate::ContainsAny { columns, pattern } => {
            let term = like_term(pattern);
            columns.iter().any(|column| {
                row.column_text(column)
                    .map(|text| text.to_lowercase().contains(&term))
                    .unwrap_or(false)
            })
        }
    })
}

fn apply_plan<R: PlanRow + Clone>(rows: &[R], plan: &QueryPlan) -> Vec<R> {
    let mut selected: Vec<R> = rows
        .iter()
        .filter(|row| matches_plan(*row, plan))
        .cloned()
        .collect();

    let order = plan.order_by;
    selected.sort_by(|a, b| {
        let primary = a.column_text(order.column).cmp(&b.column_text(order.column));
        let ordering = match primary {
            Ordering::Equal => a.column_text(order.tiebreak).cmp(&b.column_text(order.tiebreak)),
            other => other,
        };
        match order.direction {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    selected
        .into_iter()
        .skip(plan.offset as usize)
        .take(plan.limit as usize)
        .collect()
}

fn count_plan<R: PlanRow>(rows: &[R], plan: &QueryPlan) -> u64 {
    rows.iter().filter(|row| matches_plan(*row, plan)).count() as u64
}

impl PlanRow for JobApplication {
    fn column_text(&self, column: &str) -> Option<String> {
        match column {
            "a.id" => Some(self.id.to_string()),
            "a.user_id" => Some(self.user_id.to_string()),
            "a.status" => Some(self.status.clone()),
            "a.date_applied" => Some(self.date_applied.to_string()),
            "c.name" => Some(self.company_name.clone()),
            "r.title" => Some(self.role_title.clone()),
            _ => None,
        }
    }
}

impl PlanRow for BlogPost {
    fn column_text(&self, column: &str) -> Option<String> {
        match column {
            "p.id" => Some(self.id.to_string()),
            "p.user_id::text" => Some(self.user_id.to_string()),
            "p.is_public" => Some(self.is_public.to_string()),
            "p.title" => Some(self.title.clone()),
            "p.content_md" => Some(self.content_md.clone()),
            "p.created_at" => Some(timestamp_text(&self.created_at)),
            "p.updated_at" => Some(timestamp_text(&self.updated_at)),
            _ => None,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct ApplicationTables {
    companies: HashMap<String, CompanyId>,
    roles: HashMap<(CompanyId, String), RoleId>,
    applications: Vec<JobApplication>,
    notes: Vec<ApplicationNote>,
}

#[derive(Default)]
pub struct InMemoryJobApplicationRepository {
    tables: Mutex<ApplicationTables>,
}

impl InMemoryJobApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn company_count(&self) -> usize {
        lock(&self.tables).companies.len()
    }
}

#[async_trait]
impl PagedRepository<JobApplication> for InMemoryJobApplicationRepository {
    async fn count(&self, plan: &QueryPlan) -> Result<u64, RepositoryError> {
        Ok(count_plan(&lock(&self.tables).applications, plan))
    }

    async fn fetch_page(&self, plan: &QueryPlan) -> Result<Vec<JobApplication>, RepositoryError> {
        Ok(apply_plan(&lock(&self.tables).applications, plan))
    }
}

#[async_trait]
impl JobApplicationRepository for InMemoryJobApplicationRepository {
    async fn find_or_create_company(
        &self,
        _name: &str,
        normalized_name: &str,
    ) -> Result<CompanyId, RepositoryError> {
        let mut tables = lock(&self.tables);
        Ok(*tables
            .companies
            .entry(normalized_name.to_string())
            .or_insert_with(CompanyId::generate))
    }

    async fn find_or_create_role(
        &self,
        company_id: CompanyId,
        title: &str,
    ) -> Result<RoleId, RepositoryError> {
        let mut tables = lock(&self.tables);
        Ok(*tables
            .roles
            .entry((company_id, title.to_string()))
            .or_insert_with(RoleId::generate))
    }

    async fn create(&self, application: JobApplication) -> Result<JobApplication, RepositoryError> {
        lock(&self.tables).applications.push(application.clone());
        Ok(application)
    }

    async fn update(&self, application: JobApplication) -> Result<JobApplication, RepositoryError> {
        let mut tables = lock(&self.tables);
        let slot = tables
            .applications
            .iter_mut()
            .find(|existing| existing.id == application.id && existing.user_id == application.user_id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = application.clone();
        Ok(application)
    }

    async fn find_by_id(
        &self,
        id: ApplicationId,
        owner: UserId,
    ) -> Result<Option<JobApplication>, RepositoryError> {
        Ok(lock(&self.tables)
            .applications
            .iter()
            .find(|application| application.id == id && application.user_id == owner)
            .cloned())
    }

    async fn delete(&self, id: ApplicationId, owner: UserId) -> Result<bool, RepositoryError> {
        let mut tables = lock(&self.tables);
        let before = tables.applications.len();
        tables
            .applications
            .retain(|application| !(application.id == id && application.user_id == owner));
        Ok(tables.applications.len() != before)
    }
}

#[async_trait]
impl ApplicationNoteRepository for InMemoryJobApplicationRepository {
    async fn create(&self, note: ApplicationNote) -> Result<ApplicationNote, RepositoryError> {
        let mut tables = lock(&self.tables);
        if !tables
            .applications
            .iter()
            .any(|application| application.id == note.application_id)
        {
            return Err(RepositoryError::NotFound);
        }
        tables.notes.push(note.clone());
        Ok(note)
    }

    async fn list_for_application(
        &self,
        application_id: ApplicationId,
        owner: UserId,
    ) -> Result<Vec<ApplicationNote>, RepositoryError> {
        let tables = lock(&self.tables);
        let owned = tables
            .applications
            .iter()
            .any(|application| application.id == application_id && application.user_id == owner);
        if !owned {
            return Ok(Vec::new());
        }
        let mut notes: Vec<ApplicationNote> = tables
            .notes
            .iter()
            .filter(|note| note.application_id == application_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryJobApplicationRepository {
    async fn counts_by_status(&self, owner: UserId) -> Result<Vec<StatusCount>, RepositoryError> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for application in lock(&self.tables).applications.iter() {
            if application.user_id == owner {
                *counts.entry(application.status.clone()).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }

    async fn counts_by_month(&self, owner: UserId) -> Result<Vec<MonthlyCount>, RepositoryError> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for application in lock(&self.tables).applications.iter() {
            if application.user_id == owner {
                let month = application.date_applied.format("%Y-%m").to_string();
                *counts.entry(month).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(month, count)| MonthlyCount { month, count })
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryBlogPostRepository {
    posts: Mutex<Vec<BlogPost>>,
    stale_slug_checks: AtomicU32,
    create_attempts: AtomicU32,
    failing_creates: Mutex<Option<RepositoryError>>,
}

impl InMemoryBlogPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, post: BlogPost) {
        lock(&self.posts).push(post);
    }

    /// 接下来的 `n` 次 slug 检查一律返回未占用，模拟与并发插入的竞争
    pub fn answer_stale_slug_checks(&self, n: u32) {
        self.stale_slug_checks.store(n, AtomicOrdering::SeqCst);
    }

    /// 之后的每次插入都返回 `err`
    pub fn fail_creates_with(&self, err: RepositoryError) {
        *lock(&self.failing_creates) = Some(err);
    }

    /// 调用 `create` 的次数，包括失败的插入
    pub fn create_attempts(&self) -> u32 {
        self.create_attempts.load(AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl PagedRepository<BlogPost> for InMemoryBlogPostRepository {
    async fn count(&self, plan: &QueryPlan) -> Result<u64, RepositoryError> {
        Ok(count_plan(&lock(&self.posts), plan))
    }

    async fn fetch_page(&self, plan: &QueryPlan) -> Result<Vec<BlogPost>, RepositoryError> {
        Ok(apply_plan(&lock(&self.posts), plan))
    }
}

#[async_trait]
impl SlugLookup for InMemoryBlogPostRepository {
    async fn slug_exists(&self, slug: &str, owner: UserId) -> Result<bool, RepositoryError> {
        let stale = self
            .stale_slug_checks
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale {
            return Ok(false);
        }
        Ok(lock(&self.posts)
            .iter()
            .any(|post| post.user_id == owner && post.slug == slug))
    }
}

#[async_trait]
impl BlogPostRepository for InMemoryBlogPostRepository {
    async fn create(&self, post: BlogPost) -> Result<BlogPost, RepositoryError> {
        self.create_attempts.fetch_add(1, AtomicOrdering::SeqCst);
        if let Some(err) = lock(&self.failing_creates).clone() {
            return Err(err);
        }
        let mut posts = lock(&self.posts);
        if posts
            .iter()
            .any(|existing| existing.user_id == post.user_id && existing.slug == post.slug)
        {
            return Err(RepositoryError::conflict(POST_SLUG_CONSTRAINT));
        }
        posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_slug(
        &self,
        owner: UserId,
        slug: &str,
    ) -> Result<Option<BlogPost>, RepositoryError> {
        Ok(lock(&self.posts)
            .iter()
            .find(|post| post.user_id == owner && post.slug == slug)
            .cloned())
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<BlogPost>, RepositoryError> {
        Ok(lock(&self.posts).iter().find(|post| post.id == id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCommentRepository {
    comments: Mutex<Vec<Comment>>,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, comment: Comment) {
        lock(&self.comments).push(comment);
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create(&self, comment: Comment) -> Result<Comment, RepositoryError> {
        lock(&self.comments).push(comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        Ok(lock(&self.comments)
            .iter()
            .find(|comment| comment.id == id)
            .cloned())
    }

    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepositoryError> {
        let mut comments: Vec<Comment> = lock(&self.comments)
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|comment| comment.created_at);
        Ok(comments)
    }
}

#[derive(Default)]
pub struct InMemoryLikeRepository {
    likes: Mutex<HashSet<(UserId, LikeTarget)>>,
}

impl InMemoryLikeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LikeRepository for InMemoryLikeRepository {
    async fn insert(
        &self,
        user_id: UserId,
        target: LikeTarget,
        _now: Timestamp,
    ) -> Result<bool, RepositoryError> {
        Ok(lock(&self.likes).insert((user_id, target)))
    }

    async fn delete(&self, user_id: UserId, target: LikeTarget) -> Result<bool, RepositoryError> {
        Ok(lock(&self.likes).remove(&(user_id, target)))
    }

    async fn count(&self, target: LikeTarget) -> Result<u64, RepositoryError> {
        Ok(lock(&self.likes)
            .iter()
            .filter(|(_, liked)| *liked == target)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryFollowRepository {
    follows: Mutex<Vec<Follow>>,
}

impl InMemoryFollowRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FollowRepository for InMemoryFollowRepository {
    async fn exists(&self, follower: UserId, followee: UserId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.follows)
            .iter()
            .any(|follow| follow.follower_id == follower && follow.followee_id == followee))
    }

    async fn create(&self, follow: Follow) -> Result<Follow, RepositoryError> {
        let mut follows = lock(&self.follows);
        if follows.iter().any(|existing| {
            existing.follower_id == follow.follower_id && existing.followee_id == follow.followee_id
        }) {
            return Err(RepositoryError::conflict(FOLLOW_CONSTRAINT));
        }
        follows.push(follow.clone());
        Ok(follow)
    }

    async fn delete(&self, follower: UserId, followee: UserId) -> Result<bool, RepositoryError> {
        let mut follows = lock(&self.follows);
        let before = follows.len();
        follows.retain(|follow| !(follow.follower_id == follower && follow.followee_id == followee));
        Ok(follows.len() != before)
    }

    async fn follower_count(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        Ok(lock(&self.follows)
            .iter()
            .filter(|follow| follow.followee_id == user_id)
            .count() as u64)
    }

    async fn following_count(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        Ok(lock(&self.follows)
            .iter()
            .filter(|follow| follow.follower_id == user_id)
            .count() as u64)
    }
}
