//! 求职申请实体定义

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{ApplicationId, CompanyId, NoteId, RoleId, Timestamp, UserId};

/// 公司名与职位名的最大长度
pub const MAX_NAME_LEN: usize = 255;
/// 申请状态的最大长度
pub const MAX_STATUS_LEN: usize = 50;
/// 备注正文的最大长度
pub const MAX_NOTE_LEN: usize = 10_000;
/// 申请日期格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 公司名归一化：去掉首尾空白并转小写，用于查找或创建公司。
pub fn normalize_company_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// 创建或更新申请时提交的字段，已经过校验。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDetails {
    pub company_name: String,
    pub role_title: String,
    pub status: String,
    pub date_applied: NaiveDate,
}

impl ApplicationDetails {
    pub fn parse(
        company_name: &str,
        role_title: &str,
        status: &str,
        date_applied: &str,
    ) -> DomainResult<Self> {
        let company_name = required("companyName", company_name, MAX_NAME_LEN)?;
        let role_title = required("roleTitle", role_title, MAX_NAME_LEN)?;
        let status = required("status", status, MAX_STATUS_LEN)?;
        let date_applied = NaiveDate::parse_from_str(date_applied.trim(), DATE_FORMAT)
            .map_err(|_| DomainError::invalid_argument("dateApplied", "expected YYYY-MM-DD"))?;

        Ok(Self {
            company_name,
            role_title,
            status,
            date_applied,
        })
    }

    pub fn normalized_company_name(&self) -> String {
        normalize_company_name(&self.company_name)
    }
}

fn required(field: &str, value: &str, max_len: usize) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::invalid_argument(field, "is required"));
    }
    if value.chars().count() > max_len {
        return Err(DomainError::invalid_argument(
            field,
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(value.to_string())
}

/// 求职申请实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: ApplicationId,
    /// 申请所属用户
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub role_id: RoleId,
    pub company_name: String,
    pub role_title: String,
    pub date_applied: NaiveDate,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JobApplication {
    /// 用已解析的公司和职位创建新申请
    pub fn new(
        user_id: UserId,
        company_id: CompanyId,
        role_id: RoleId,
        details: ApplicationDetails,
        now: Timestamp,
    ) -> Self {
        Self {
            id: ApplicationId::generate(),
            user_id,
            company_id,
            role_id,
            company_name: details.company_name,
            role_title: details.role_title,
            date_applied: details.date_applied,
            status: details.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// 覆盖可编辑字段，保留 id、所有者和创建时间
    pub fn apply(
        &mut self,
        company_id: CompanyId,
        role_id: RoleId,
        details: ApplicationDetails,
        now: Timestamp,
    ) {
        self.company_id = company_id;
        self.role_id = role_id;
        self.company_name = details.company_name;
        self.role_title = details.role_title;
        self.date_applied = details.date_applied;
        self.status = details.status;
        self.updated_at = now;
    }
}

/// 申请备注，只有申请所有者可以读写
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationNote {
    pub id: NoteId,
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: Timestamp,
}

impl ApplicationNote {
    pub fn new(
        application_id: ApplicationId,
        author: UserId,
        content: &str,
        now: Timestamp,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: NoteId::generate(),
            application_id,
            user_id: author,
            content: required("content", content, MAX_NOTE_LEN)?,
            created_at: now,
        })
    }
}
