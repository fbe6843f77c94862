//! 列表查询请求与分页结果

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 排序方向，非 `ASC` 的取值一律视为 `DESC`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// 未经规范化的列表请求。
///
/// `page`/`limit` 保留原始值，非正数在构建查询计划时被替换为默认值。
/// 作为 JSON 请求体时，分页和排序字段宽松处理；`search` 与 `filters` 中的值必须是字符串。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(deserialize_with = "lenient_number")]
    pub page: i64,
    #[serde(deserialize_with = "lenient_number")]
    pub limit: i64,
    #[serde(deserialize_with = "lenient_text")]
    pub sort_by: Option<String>,
    #[serde(deserialize_with = "lenient_sort_order")]
    pub sort_order: SortOrder,
    pub search: Option<String>,
    pub filters: BTreeMap<String, String>,
}

const RESERVED_KEYS: [&str; 5] = ["page", "limit", "sortBy", "sortOrder", "search"];

impl ListRequest {
    /// 从查询字符串构建，无法解析的数字按未设置处理，其余键作为过滤条件
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let number = |key: &str| {
            params
                .get(key)
                .and_then(|value| value.trim().parse::<i64>().ok())
                .unwrap_or(0)
        };

        let filters = params
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            page: number("page"),
            limit: number("limit"),
            sort_by: params.get("sortBy").cloned(),
            sort_order: SortOrder::parse_lenient(params.get("sortOrder").map(String::as_str)),
            search: params.get("search").cloned(),
            filters,
        }
    }
}

/// 分页字段宽松解析：数字或数字字符串，其余取值按未设置处理
fn lenient_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_sort_order<'de, D>(deserializer: D) -> Result<SortOrder, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(SortOrder::parse_lenient(lenient_text(deserializer)?.as_deref()))
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(mut items: Vec<T>, total_items: u64, current_page: u32, page_size: u32) -> Self {
        items.truncate(page_size as usize);
        let total_pages = if page_size == 0 {
            0
        } else {
            total_items.div_ceil(u64::from(page_size))
        };

        Self {
            items,
            total_items,
            total_pages,
            current_page,
            page_size,
        }
    }
}
