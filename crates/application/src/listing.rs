//! 通用列表门面：一次构建查询计划，先计数再取页。

use domain::{ListRequest, Page};
use tokio_util::sync::CancellationToken;

use crate::cancellation::cancellable;
use crate::error::ApplicationError;
use crate::query_spec::{EntityListConfig, QueryPlan, Scope};
use crate::repository::PagedRepository;

pub async fn list_page<T, R>(
    repository: &R,
    request: &ListRequest,
    config: &EntityListConfig,
    scope: Scope,
    cancel: &CancellationToken,
) -> Result<Page<T>, ApplicationError>
where
    T: Send,
    R: PagedRepository<T> + ?Sized,
{
    let plan = QueryPlan::build(request, config, scope);

    let total = cancellable(cancel, repository.count(&plan)).await?;
    let items = if total == 0 || plan.offset >= total {
        Vec::new()
    } else {
        cancellable(cancel, repository.fetch_page(&plan)).await?
    };

    Ok(Page::new(items, total, plan.page, plan.limit))
}
