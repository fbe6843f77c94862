//! 列表查询计划构建器
//!
//! 把不可信的分页、排序、搜索与过滤参数转换为 `QueryPlan`。
//! 只有实体配置中声明的列名会进入查询文本，所有取值都以绑定参数传递。
//! 构建过程是纯函数，永不失败：非法的分页参数被静默修正，未知排序字段回退到默认列。

use domain::{ListRequest, SortOrder, UserId};
use tracing::debug;
use uuid::Uuid;

/// 可排序字段：对外名称 → 列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortColumn {
    pub name: &'static str,
    pub column: &'static str,
    /// 列位于关联表上，排序时需要附加关联子句
    pub joined: bool,
}

/// 可过滤字段：对外名称 → 列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterColumn {
    pub name: &'static str,
    pub column: &'static str,
}

/// 单个实体的声明式列表配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityListConfig {
    /// 所有权或可见性谓词作用的列
    pub scope_column: &'static str,
    pub sort_columns: &'static [SortColumn],
    pub default_sort: &'static str,
    /// 排序相同时的次级排序列，保证翻页稳定
    pub tiebreak_column: &'static str,
    pub filter_columns: &'static [FilterColumn],
    /// 搜索覆盖的所有列（可以位于关联表上）
    pub search_columns: &'static [&'static str],
    /// 搜索或按关联列排序时附加的关联子句
    pub join_clause: Option<&'static str>,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl EntityListConfig {
    pub fn with_page_sizes(mut self, default_page_size: u32, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size.max(1);
        self.default_page_size = default_page_size.clamp(1, self.max_page_size);
        self
    }

    fn sort_column(&self, name: Option<&str>) -> SortColumn {
        let by_name = |wanted: &str| {
            self.sort_columns
                .iter()
                .copied()
                .find(|candidate| candidate.name == wanted)
        };

        name.map(str::trim)
            .and_then(by_name)
            .or_else(|| by_name(self.default_sort))
            .unwrap_or(SortColumn {
                name: self.default_sort,
                column: self.tiebreak_column,
                joined: false,
            })
    }
}

/// 求职申请列表：按所有者限定，搜索公司名与职位名
pub const APPLICATION_LIST: EntityListConfig = EntityListConfig {
    scope_column: "a.user_id",
    sort_columns: &[
        SortColumn {
            name: "dateApplied",
            column: "a.date_applied",
            joined: false,
        },
        SortColumn {
            name: "status",
            column: "a.status",
            joined: false,
        },
        SortColumn {
            name: "company",
            column: "c.name",
            joined: true,
        },
        SortColumn {
            name: "role",
            column: "r.title",
            joined: true,
        },
    ],
    default_sort: "dateApplied",
    tiebreak_column: "a.id",
    filter_columns: &[FilterColumn {
        name: "status",
        column: "a.status",
    }],
    search_columns: &["c.name", "r.title"],
    join_clause: Some("JOIN companies c ON c.id = a.company_id JOIN roles r ON r.id = a.role_id"),
    default_page_size: 10,
    max_page_size: 100,
};

/// 公开文章列表：只返回公开文章，搜索标题与正文
pub const POST_LIST: EntityListConfig = EntityListConfig {
    scope_column: "p.is_public",
    sort_columns: &[
        SortColumn {
            name: "createdAt",
            column: "p.created_at",
            joined: false,
        },
        SortColumn {
            name: "updatedAt",
            column: "p.updated_at",
            joined: false,
        },
        SortColumn {
            name: "title",
            column: "p.title",
            joined: false,
        },
    ],
    default_sort: "createdAt",
    tiebreak_column: "p.id",
    filter_columns: &[FilterColumn {
        name: "userId",
        column: "p.user_id::text",
    }],
    search_columns: &["p.title", "p.content_md"],
    join_clause: None,
    default_page_size: 10,
    max_page_size: 100,
};

/// 查询范围：总是作为第一个谓词
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// 只看某个用户拥有的记录
    OwnedBy(UserId),
    /// 只看公开记录
    Public,
}

/// 绑定参数值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
}

/// 查询谓词，多个谓词以 AND 连接
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `column = $n`
    Equals {
        column: &'static str,
        value: BindValue,
    },
    /// `(LOWER(c1) LIKE $n OR LOWER(c2) LIKE $m ...)`，模式已转小写并转义
    ContainsAny {
        columns: &'static [&'static str],
        pattern: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: SortOrder,
    pub tiebreak: &'static str,
}

/// 计数查询与分页查询共享的查询计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub predicates: Vec<Predicate>,
    pub order_by: OrderBy,
    pub join: Option<&'static str>,
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
}

impl QueryPlan {
    pub fn build(request: &ListRequest, config: &EntityListConfig, scope: Scope) -> Self {
        let limit = normalize_limit(request.limit, config);
        let page = normalize_page(request.page);
        let offset = u64::from(page - 1) * u64::from(limit);

        let mut predicates = Vec::with_capacity(2 + config.filter_columns.len());
        predicates.push(match scope {
            Scope::OwnedBy(user_id) => Predicate::Equals {
                column: config.scope_column,
                value: BindValue::Uuid(user_id.into()),
            },
            Scope::Public => Predicate::Equals {
                column: config.scope_column,
                value: BindValue::Bool(true),
            },
        });

        let search = request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty() && !config.search_columns.is_empty());
        if let Some(term) = search {
            predicates.push(Predicate::ContainsAny {
                columns: config.search_columns,
                pattern: format!("%{}%", escape_like(&term.to_lowercase())),
            });
        }

        for filter in config.filter_columns {
            if let Some(value) = request.filters.get(filter.name) {
                let value = value.trim();
                if !value.is_empty() {
                    predicates.push(Predicate::Equals {
                        column: filter.column,
                        value: BindValue::Text(value.to_string()),
                    });
                }
            }
        }

        let sort = config.sort_column(request.sort_by.as_deref());
        let needs_join = search.is_some() || sort.joined;
        let join = config.join_clause.filter(|_| needs_join);

        debug!(
            sort = sort.column,
            page,
            limit,
            predicates = predicates.len(),
            joined = join.is_some(),
            "list query plan built"
        );

        Self {
            predicates,
            order_by: OrderBy {
                column: sort.column,
                direction: request.sort_order,
                tiebreak: config.tiebreak_column,
            },
            join,
            page,
            limit,
            offset,
        }
    }
}

fn normalize_page(raw: i64) -> u32 {
    if raw <= 0 {
        1
    } else {
        u32::try_from(raw).unwrap_or(u32::MAX)
    }
}

fn normalize_limit(raw: i64, config: &EntityListConfig) -> u32 {
    if raw <= 0 {
        config.default_page_size
    } else {
        u32::try_from(raw)
            .unwrap_or(u32::MAX)
            .min(config.max_page_size)
    }
}

/// 转义 LIKE 模式中的通配符，使搜索词按字面匹配
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ListRequest {
        ListRequest::default()
    }

    #[test]
    fn non_positive_paging_falls_back_to_defaults() {
        let mut req = request();
        req.page = 0;
        req.limit = -5;
        let plan = QueryPlan::build(&req, &APPLICATION_LIST, Scope::OwnedBy(UserId::generate()));
        assert_eq!(plan.page, 1);
        assert_eq!(plan.limit, 10);
        assert_eq!(plan.offset, 0);
    }

    #[test]
    fn limit_is_capped_and_offset_follows_page() {
        let mut req = request();
        req.page = 3;
        req.limit = 1_000;
        let config = APPLICATION_LIST.with_page_sizes(10, 50);
        let plan = QueryPlan::build(&req, &config, Scope::Public);
        assert_eq!(plan.limit, 50);
        assert_eq!(plan.offset, 100);
    }

    #[test]
    fn unknown_sort_uses_default_column() {
        let mut req = request();
        req.sort_by = Some("password_hash; DROP TABLE users".into());
        let plan = QueryPlan::build(&req, &APPLICATION_LIST, Scope::OwnedBy(UserId::generate()));
        assert_eq!(plan.order_by.column, "a.date_applied");
        assert_eq!(plan.order_by.direction, SortOrder::Desc);
        assert!(plan.join.is_none());
    }

    #[test]
    fn scope_predicate_comes_first() {
        let owner = UserId::generate();
        let mut req = request();
        req.search = Some("Rust".into());
        req.filters.insert("status".into(), "Applied".into());
        let plan = QueryPlan::build(&req, &APPLICATION_LIST, Scope::OwnedBy(owner));

        assert_eq!(
            plan.predicates[0],
            Predicate::Equals {
                column: "a.user_id",
                value: BindValue::Uuid(owner.into()),
            }
        );
        assert_eq!(
            plan.predicates[1],
            Predicate::ContainsAny {
                columns: &["c.name", "r.title"],
                pattern: "%rust%".into(),
            }
        );
        assert_eq!(
            plan.predicates[2],
            Predicate::Equals {
                column: "a.status",
                value: BindValue::Text("Applied".into()),
            }
        );
    }

    #[test]
    fn search_or_joined_sort_attaches_join() {
        let mut req = request();
        req.sort_by = Some("company".into());
        let plan = QueryPlan::build(&req, &APPLICATION_LIST, Scope::OwnedBy(UserId::generate()));
        assert_eq!(plan.order_by.column, "c.name");
        assert!(plan.join.is_some());

        let mut req = request();
        req.search = Some("acme".into());
        let plan = QueryPlan::build(&req, &APPLICATION_LIST, Scope::OwnedBy(UserId::generate()));
        assert!(plan.join.is_some());
    }

    #[test]
    fn blank_search_and_unknown_filters_are_ignored() {
        let mut req = request();
        req.search = Some("   ".into());
        req.filters.insert("is_admin".into(), "true".into());
        req.filters.insert("status".into(), "".into());
        let plan = QueryPlan::build(&req, &APPLICATION_LIST, Scope::OwnedBy(UserId::generate()));
        assert_eq!(plan.predicates.len(), 1);
        assert!(plan.join.is_none());
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let mut req = request();
        req.search = Some("100%_Done".into());
        let plan = QueryPlan::build(&req, &POST_LIST, Scope::Public);
        assert_eq!(
            plan.predicates[1],
            Predicate::ContainsAny {
                columns: &["p.title", "p.content_md"],
                pattern: "%100\\%\\_done%".into(),
            }
        );
    }

    #[test]
    fn public_scope_binds_true() {
        let plan = QueryPlan::build(&request(), &POST_LIST, Scope::Public);
        assert_eq!(
            plan.predicates[0],
            Predicate::Equals {
                column: "p.is_public",
                value: BindValue::Bool(true),
            }
        );
        assert_eq!(plan.order_by.column, "p.created_at");
    }
}
