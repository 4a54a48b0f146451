//! # 剪贴板历史工具：应用入口
//!
//! 本文件只负责参数解析、日志初始化与任务编排。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::watch;

use clip_tray::clipboard::{ArboardClipboard, ClipboardSink, ClipboardWatcher, WatcherConfig};
use clip_tray::console::Console;
use clip_tray::error::AppError;
use clip_tray::history::SharedHistory;
use clip_tray::menu::MenuOptions;
use clip_tray::settings::{self, Settings};
use clip_tray::storage;

#[derive(Parser, Debug)]
#[command(name = "clip-tray", version)]
#[command(about = "Clipboard history with pinning", long_about = None)]
struct Cli {
    /// Write log lines to stdout instead of the log file
    #[arg(long)]
    stdout: bool,
    /// Settings file (default: settings.json in the data directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let code = match run(Cli::parse()).await {
        Ok(()) => 0,
        Err(err) => {
            log::error!("退出: {err}");
            eprintln!("clip-tray: {err}");
            1
        }
    };
    // 阻塞中的 stdin / 剪贴板读取无法取消，直接退出进程，不等运行时回收
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let settings_path = match cli.config {
        Some(path) => path,
        None => storage::settings_path(&storage::resolve_data_dir(None)?),
    };
    let settings = settings::load_settings(&settings_path)?;
    let data_dir = storage::resolve_data_dir(settings.data_dir.as_deref())?;
    init_logging(cli.stdout || settings.log_to_stdout, &data_dir)?;
    log::info!("启动: settings={}", settings_path.display());
    match settings::ensure_settings_file(&settings_path, &settings) {
        Ok(true) => log::info!("已写出默认设置"),
        Ok(false) => {}
        Err(err) => log::warn!("写出默认设置失败: {err}"),
    }

    let history = SharedHistory::with_capacity(settings.history_capacity);
    let clipboard = Arc::new(ArboardClipboard::new());
    if settings.clear_clipboard_on_start {
        if let Err(err) = clipboard.clear() {
            log::warn!("启动时清空剪贴板失败: {err}");
        }
    }

    let watcher = ClipboardWatcher::new(
        Arc::clone(&clipboard),
        history.clone(),
        WatcherConfig::from(&settings),
    );
    let mut console = console_for(&settings, history, clipboard, &watcher);
    match storage::reset_icon_dir(&data_dir) {
        Ok(dir) => console = console.with_icon_dir(dir),
        Err(err) => log::warn!("缩略图目录不可用，菜单不显示图标: {err}"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let watcher_task = tokio::spawn(watcher.run(shutdown_rx));

    let stdin = BufReader::new(tokio::io::stdin());
    let result = tokio::select! {
        result = console.run(stdin, tokio::io::stdout()) => result,
        signal = shutdown_signal() => {
            log::info!("收到退出信号");
            signal
        }
    };

    let _ = shutdown_tx.send(true);
    if let Err(err) = watcher_task.await {
        log::warn!("剪贴板轮询任务异常结束: {err}");
    }
    result
}

fn console_for(
    settings: &Settings,
    history: SharedHistory,
    clipboard: Arc<ArboardClipboard>,
    watcher: &ClipboardWatcher<ArboardClipboard>,
) -> Console<ArboardClipboard> {
    let options = MenuOptions {
        title_max_chars: settings.menu_title_max_chars,
    };
    Console::new(
        history,
        clipboard,
        watcher.detector(),
        options,
        settings.promote_on_select,
    )
}

fn init_logging(to_stdout: bool, data_dir: &Path) -> Result<(), AppError> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if to_stdout {
        builder.target(env_logger::Target::Stdout);
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(storage::log_file_path(data_dir))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<(), AppError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<(), AppError> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
