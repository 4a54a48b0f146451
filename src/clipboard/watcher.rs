use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::error::AppError;
use crate::history::{ClipContent, ClipKind, IngestOutcome, SharedHistory};
use crate::settings::Settings;

use super::{ChangeDetector, ClipboardSource, DetectorHandle};

const RETRY_PAUSE_MAX_MS: u64 = 2_000;

/// 轮询参数
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// 两次轮询之间的间隔
    pub poll_interval: Duration,
    /// 单次读取允许的最长时间，超过视为剪贴板卡死
    pub read_timeout: Duration,
    /// 单次轮询内的最大读取次数（含首次）
    pub read_attempts: u32,
    /// 重试基准间隔，按指数退避
    pub retry_pause: Duration,
    /// 是否收录 HTML 格式
    pub capture_html: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for WatcherConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            read_timeout: Duration::from_millis(settings.read_timeout_ms),
            read_attempts: settings.read_attempts,
            retry_pause: Duration::from_millis(settings.retry_pause_ms),
            capture_html: settings.capture_html,
        }
    }
}

/// 读取进行中标志的 RAII 守卫
///
/// 随阻塞闭包一起移动到线程池，读取真正返回（或闭包 panic）时才清除标志。
/// 超时只是放弃等待，标志仍保持，后续尝试不会再叠加新的阻塞读取。
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(Self(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn compute_retry_pause_ms(base_ms: u64, attempt: u32) -> u64 {
    let exp = 1_u64 << attempt.saturating_sub(1).min(6);
    base_ms.saturating_mul(exp).min(RETRY_PAUSE_MAX_MS)
}

/// 剪贴板轮询器
///
/// 按固定间隔读取系统剪贴板，把检测到的变化交给历史记录。
/// 读取在阻塞线程池中执行；超时的读取会被放弃（线程本身无法中止，只是不再等待）。
/// 同一时刻至多有一个阻塞读取，上一次读取卡住期间的尝试直接按超时处理。
pub struct ClipboardWatcher<S> {
    source: Arc<S>,
    reading: Arc<AtomicBool>,
    detector: DetectorHandle,
    history: SharedHistory,
    config: WatcherConfig,
}

impl<S: ClipboardSource> ClipboardWatcher<S> {
    pub fn new(source: Arc<S>, history: SharedHistory, config: WatcherConfig) -> Self {
        let detector = DetectorHandle::new(ChangeDetector::new(config.capture_html));
        Self {
            source,
            reading: Arc::new(AtomicBool::new(false)),
            detector,
            history,
            config,
        }
    }

    /// 供菜单写回剪贴板前登记自身写入。
    pub fn detector(&self) -> DetectorHandle {
        self.detector.clone()
    }

    /// 执行一次轮询。
    ///
    /// - `Ok(None)`：剪贴板没有新内容
    /// - `Ok(Some(outcome))`：新内容已交给历史记录（可能是重复或被忽略）
    /// - `Err(_)`：重试耗尽仍读取失败
    pub async fn poll_once(&self) -> Result<Option<IngestOutcome>, AppError> {
        let Some((content, kind)) = self.read_with_retry().await? else {
            return Ok(None);
        };
        Ok(Some(self.history.ingest(content, kind)))
    }

    async fn read_with_retry(&self) -> Result<Option<(ClipContent, ClipKind)>, AppError> {
        let attempts = self.config.read_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.read_once().await {
                Ok(change) => return Ok(change),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    let pause_ms =
                        compute_retry_pause_ms(self.config.retry_pause.as_millis() as u64, attempt);
                    log::warn!(
                        "📋 读取剪贴板失败（attempt={}/{}），{}ms 后重试: {}",
                        attempt,
                        attempts,
                        pause_ms,
                        err
                    );
                    tokio::time::sleep(Duration::from_millis(pause_ms)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn read_once(&self) -> Result<Option<(ClipContent, ClipKind)>, AppError> {
        let Some(guard) = InFlightGuard::acquire(&self.reading) else {
            return Err(AppError::Timeout("上一次剪贴板读取仍未返回".to_string()));
        };
        let source = Arc::clone(&self.source);
        let task = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            source.read_all()
        });

        let reading = match tokio::time::timeout(self.config.read_timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_err)) => {
                return Err(AppError::Clipboard(format!("剪贴板读取任务异常: {}", join_err)));
            }
            Err(_) => {
                return Err(AppError::Timeout(format!(
                    "读取剪贴板超过 {}ms",
                    self.config.read_timeout.as_millis()
                )));
            }
        };
        Ok(self.detector.observe(reading))
    }

    /// 持续轮询，直到 `shutdown` 变为 `true` 或发送端被丢弃。
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!(
            "📋 剪贴板轮询已启动（间隔 {}ms）",
            self.config.poll_interval.as_millis()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.poll_once().await {
                        log::warn!("📋 本轮剪贴板读取放弃: {}", err);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        log::info!("📋 剪贴板轮询已停止");
    }
}
