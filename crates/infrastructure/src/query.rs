//! `QueryPlan` 渲染为参数化 SQL。
//!
//! 计数查询与分页查询共用同一段 JOIN/WHERE 渲染，列名只来自实体配置，取值全部绑定。

use application::query_spec::{BindValue, Predicate, QueryPlan};
use sqlx::{Postgres, QueryBuilder};

/// `SELECT COUNT(*) FROM <from> [JOIN ...] WHERE ...`
pub fn count_query<'args>(from: &str, plan: &QueryPlan) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {from}"));
    push_filters(&mut builder, plan);
    builder
}

/// `<select> [JOIN ...] WHERE ... ORDER BY ... LIMIT $n OFFSET $m`
pub fn page_query<'args>(select: &str, plan: &QueryPlan) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(select);
    push_filters(&mut builder, plan);

    let order = plan.order_by;
    let direction = order.direction.as_sql();
    builder
        .push(" ORDER BY ")
        .push(order.column)
        .push(" ")
        .push(direction);
    if order.tiebreak != order.column {
        builder
            .push(", ")
            .push(order.tiebreak)
            .push(" ")
            .push(direction);
    }

    builder
        .push(" LIMIT ")
        .push_bind(i64::from(plan.limit))
        .push(" OFFSET ")
        .push_bind(i64::try_from(plan.offset).unwrap_or(i64::MAX));
    builder
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, plan: &QueryPlan) {
    if let Some(join) = plan.join {
        builder.push(" ").push(join);
    }

    for (index, predicate) in plan.predicates.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::Equals { column, value } => {
                builder.push(*column).push(" = ");
                match value {
                    BindValue::Uuid(id) => builder.push_bind(*id),
                    BindValue::Text(text) => builder.push_bind(text.clone()),
                    BindValue::Bool(flag) => builder.push_bind(*flag),
                };
            }
            Predicate::ContainsAny { columns, pattern } => {
                builder.push("(");
                for (position, column) in columns.iter().enumerate() {
                    if position > 0 {
                        builder.push(" OR ");
                    }
                    builder
                        .push("LOWER(")
                        .push(*column)
                        .push(") LIKE ")
                        .push_bind(pattern.clone());
                }
                builder.push(")");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use application::query_spec::{Scope, APPLICATION_LIST, POST_LIST};
    use domain::{ListRequest, SortOrder, UserId};

    const FROM: &str = "applications a";

    #[test]
    fn plain_listing_has_no_join() {
        let plan = QueryPlan::build(
            &ListRequest::default(),
            &APPLICATION_LIST,
            Scope::OwnedBy(UserId::generate()),
        );
        let builder = count_query(FROM, &plan);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM applications a WHERE a.user_id = $1"
        );
    }

    #[test]
    fn search_and_filter_share_numbering_with_the_count() {
        let mut request = ListRequest {
            search: Some("Rust".into()),
            ..ListRequest::default()
        };
        request.filters.insert("status".into(), "Applied".into());
        let plan = QueryPlan::build(
            &request,
            &APPLICATION_LIST,
            Scope::OwnedBy(UserId::generate()),
        );

        assert_eq!(
            count_query(FROM, &plan).sql(),
            "SELECT COUNT(*) FROM applications a \
             JOIN companies c ON c.id = a.company_id JOIN roles r ON r.id = a.role_id \
             WHERE a.user_id = $1 AND (LOWER(c.name) LIKE $2 OR LOWER(r.title) LIKE $3) \
             AND a.status = $4"
        );
        assert_eq!(
            page_query("SELECT a.id FROM applications a", &plan).sql(),
            "SELECT a.id FROM applications a \
             JOIN companies c ON c.id = a.company_id JOIN roles r ON r.id = a.role_id \
             WHERE a.user_id = $1 AND (LOWER(c.name) LIKE $2 OR LOWER(r.title) LIKE $3) \
             AND a.status = $4 ORDER BY a.date_applied DESC, a.id DESC LIMIT $5 OFFSET $6"
        );
    }

    #[test]
    fn hostile_sort_never_reaches_the_query() {
        let request = ListRequest {
            sort_by: Some("title; DROP TABLE blog_posts".into()),
            sort_order: SortOrder::Asc,
            ..ListRequest::default()
        };
        let plan = QueryPlan::build(&request, &POST_LIST, Scope::Public);
        let builder = page_query("SELECT p.id FROM blog_posts p", &plan);
        assert_eq!(
            builder.sql(),
            "SELECT p.id FROM blog_posts p WHERE p.is_public = $1 \
             ORDER BY p.created_at ASC, p.id ASC LIMIT $2 OFFSET $3"
        );
    }
}
