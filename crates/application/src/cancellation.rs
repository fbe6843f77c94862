//! 请求取消信号
//!
//! 每次存储调用都与请求的 `CancellationToken` 竞争，取消后不再发出新的调用。

use std::future::Future;

use domain::RepositoryError;
use tokio_util::sync::CancellationToken;

use crate::error::ApplicationError;

/// 执行一次存储调用；请求已取消或在等待期间被取消时返回 `Canceled`。
pub async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T, ApplicationError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    if cancel.is_cancelled() {
        return Err(ApplicationError::Canceled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ApplicationError::Canceled),
        result = call => result.map_err(ApplicationError::from),
    }
}
