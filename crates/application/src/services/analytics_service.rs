use std::sync::Arc;

use domain::{DashboardAnalytics, UserId};
use tokio_util::sync::CancellationToken;

use crate::{cancellation::cancellable, error::ApplicationError, repository::AnalyticsRepository};

pub struct AnalyticsServiceDependencies {
    pub repository: Arc<dyn AnalyticsRepository>,
}

/// 求职仪表盘统计
pub struct AnalyticsService {
    deps: AnalyticsServiceDependencies,
}

impl AnalyticsService {
    pub fn new(deps: AnalyticsServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn dashboard(
        &self,
        owner: UserId,
        cancel: &CancellationToken,
    ) -> Result<DashboardAnalytics, ApplicationError> {
        let by_status = cancellable(cancel, self.deps.repository.counts_by_status(owner)).await?;
        let over_time = cancellable(cancel, self.deps.repository.counts_by_month(owner)).await?;
        Ok(DashboardAnalytics::new(by_status, over_time))
    }
}
