//! 求职申请统计结果

use serde::{Deserialize, Serialize};

/// 某一状态下的申请数量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

/// 按申请月份（`YYYY-MM`）统计的数量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCount {
    pub month: String,
    pub count: u64,
}

/// 仪表盘统计：按状态数量降序，按月份升序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    pub applications_by_status: Vec<StatusCount>,
    pub applications_over_time: Vec<MonthlyCount>,
}

impl DashboardAnalytics {
    pub fn new(mut by_status: Vec<StatusCount>, mut over_time: Vec<MonthlyCount>) -> Self {
        // 数量相同的状态按名称排序，保证输出稳定
        by_status.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.status.cmp(&b.status)));
        over_time.sort_by(|a, b| a.month.cmp(&b.month));
        Self {
            applications_by_status: by_status,
            applications_over_time: over_time,
        }
    }

    pub fn total_applications(&self) -> u64 {
        self.applications_by_status.iter().map(|row| row.count).sum()
    }
}
