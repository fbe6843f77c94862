//! slug 生成与去重
//!
//! 先检查再插入不是原子的；并发创建由存储层唯一约束兜底，
//! 调用方在收到冲突后重新调用 `resolve_slug`。

use domain::UserId;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cancellation::cancellable;
use crate::error::ApplicationError;
use crate::repository::SlugLookup;

/// 标题中没有任何字母数字时使用的基础 slug
pub const FALLBACK_SLUG: &str = "post";

/// 转小写，连续的非字母数字字符折叠为一个 `-`，去掉首尾的 `-`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// 为作者找到第一个未被占用的 slug：`base`、`base-1`、`base-2` ...
pub async fn resolve_slug<L>(
    lookup: &L,
    title: &str,
    owner: UserId,
    cancel: &CancellationToken,
) -> Result<String, ApplicationError>
where
    L: SlugLookup + ?Sized,
{
    let base = match slugify(title) {
        slug if slug.is_empty() => FALLBACK_SLUG.to_string(),
        slug => slug,
    };

    if !cancellable(cancel, lookup.slug_exists(&base, owner)).await? {
        return Ok(base);
    }

    let mut counter: u64 = 1;
    loop {
        let candidate = format!("{base}-{counter}");
        if !cancellable(cancel, lookup.slug_exists(&candidate, owner)).await? {
            debug!(%owner, slug = %candidate, attempts = counter + 1, "slug resolved with suffix");
            return Ok(candidate);
        }
        counter += 1;
    }
}
