use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::MonotonicClock;

/// 客户端限流参数
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSettings {
    /// 每秒补充的令牌数
    pub rate_per_second: f64,
    /// 桶容量
    pub burst: u32,
    /// 空闲超过该时长的客户端在下次清扫时被移除
    pub idle_eviction_threshold: Duration,
    pub sweep_interval: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            rate_per_second: 5.0,
            burst: 10,
            idle_eviction_threshold: Duration::from_secs(180),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// 令牌桶
#[derive(Debug)]
pub struct TokenBucket {
    rate_per_second: f64,
    capacity: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// 新建的桶是满的
    pub fn new(rate_per_second: f64, burst: u32, now: Instant) -> Self {
        let capacity = f64::from(burst);
        Self {
            rate_per_second: rate_per_second.max(0.0),
            capacity,
            tokens: capacity,
            last_refill: now,
        }
    }

    /// 有令牌时消耗一个并返回 true
    pub fn allow(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn available(&self) -> f64 {
        self.tokens
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed.is_zero() {
            return;
        }
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.rate_per_second).min(self.capacity);
        self.last_refill = now;
    }
}

struct ClientEntry {
    bucket: Arc<Mutex<TokenBucket>>,
    last_seen: Instant,
}

struct Sweeper {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// 按客户端身份限流的令牌桶注册表
///
/// 注册表的锁只覆盖查找、插入与刷新 `last_seen`，令牌计算在各自桶的锁内进行。
/// 后台清扫任务随 `start` 启动，随 `shutdown` 或注册表被释放而停止。
pub struct ClientRateLimiter {
    settings: RateLimitSettings,
    clock: Arc<dyn MonotonicClock>,
    clients: Mutex<HashMap<String, ClientEntry>>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl ClientRateLimiter {
    /// 不带后台清扫任务的注册表，清扫需手动调用 `sweep_idle`
    pub fn new(settings: RateLimitSettings, clock: Arc<dyn MonotonicClock>) -> Self {
        Self {
            settings,
            clock,
            clients: Mutex::new(HashMap::new()),
            sweeper: Mutex::new(None),
        }
    }

    /// 创建注册表并启动后台清扫任务，需要在 tokio 运行时内调用
    pub fn start(settings: RateLimitSettings, clock: Arc<dyn MonotonicClock>) -> Arc<Self> {
        let limiter = Arc::new(Self::new(settings, clock));
        limiter.spawn_sweeper();
        limiter
    }

    /// 首次出现的客户端获得满桶；之后复用同一个桶并刷新最近访问时间
    pub fn allow(&self, identity: &str) -> bool {
        let now = self.clock.now();

        let bucket = {
            let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
            match clients.get_mut(identity) {
                Some(entry) => {
                    entry.last_seen = now;
                    Arc::clone(&entry.bucket)
                }
                None => {
                    let bucket = Arc::new(Mutex::new(TokenBucket::new(
                        self.settings.rate_per_second,
                        self.settings.burst,
                        now,
                    )));
                    clients.insert(
                        identity.to_string(),
                        ClientEntry {
                            bucket: Arc::clone(&bucket),
                            last_seen: now,
                        },
                    );
                    bucket
                }
            }
        };

        let allowed = bucket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .allow(now);
        if !allowed {
            debug!(client = identity, "request rate limited");
        }
        allowed
    }

    /// 移除空闲超过阈值的客户端，返回移除数量
    pub fn sweep_idle(&self) -> usize {
        let now = self.clock.now();
        let threshold = self.settings.idle_eviction_threshold;
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let before = clients.len();
        clients.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= threshold);
        before - clients.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 停止后台清扫任务并等待其退出
    pub async fn shutdown(&self) {
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(sweeper) = sweeper {
            sweeper.cancel.cancel();
            if let Err(err) = sweeper.task.await {
                warn!(error = %err, "rate limiter sweep task ended abnormally");
            }
        }
    }

    fn spawn_sweeper(self: &Arc<Self>) {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let registry = Arc::downgrade(self);
        let period = self.settings.sweep_interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // 第一次 tick 立即完成
            ticker.tick().await;

            info!(interval_ms = period.as_millis() as u64, "rate limiter sweep started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(registry) = registry.upgrade() else { break };
                        let evicted = registry.sweep_idle();
                        if evicted > 0 {
                            debug!(evicted, remaining = registry.tracked_clients(), "idle clients evicted");
                        }
                    }
                }
            }
            info!("rate limiter sweep stopped");
        });

        let mut slot = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Sweeper { cancel, task });
    }
}

impl Drop for ClientRateLimiter {
    fn drop(&mut self) {
        let slot = self.sweeper.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(sweeper) = slot.as_ref() {
            sweeper.cancel.cancel();
        }
    }
}
