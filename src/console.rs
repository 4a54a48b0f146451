//! 控制台菜单
//!
//! 以行命令代替托盘菜单：每次输出菜单时给条目编号，后续命令用编号指代条目。
//! 编号在内部映射为稳定的 `EntryId`，监控任务在两次输出之间插入新条目不会让编号错位。
//! 设置了图标目录时，图片条目的缩略图写成 `<id>.png`，路径附在该行末尾。

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::clipboard::{ClipboardSink, DetectorHandle};
use crate::error::AppError;
use crate::history::{ClipContent, ClipboardSnapshot, EntryId, SharedHistory};
use crate::menu::{self, MenuAction, MenuOptions, MenuRow};

const HELP: &str = "\
commands:
  ls           show the menu again
  copy N       copy row N back to the clipboard
  pin N        keep row N above the history
  unpin N      return row N to the history
  rm N         delete row N
  clear        delete unpinned rows
  clear all    delete everything and empty the clipboard
  help         show this text
  quit         exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    List,
    Copy(usize),
    Pin(usize),
    Unpin(usize),
    Remove(usize),
    Clear,
    ClearAll,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("'{0}' needs a row number")]
    MissingRow(&'static str),
    #[error("'{0}' is not a row number")]
    BadRow(String),
    #[error("no row {0} in the last menu")]
    NoSuchRow(usize),
}

/// 解析一行输入。
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Command::List);
    };
    let rest: Vec<&str> = words.collect();

    let row = |name: &'static str| -> Result<usize, CommandError> {
        let raw = rest.first().ok_or(CommandError::MissingRow(name))?;
        match raw.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(CommandError::BadRow((*raw).to_string())),
        }
    };

    match head.to_ascii_lowercase().as_str() {
        "ls" | "list" => Ok(Command::List),
        "copy" | "c" => row("copy").map(Command::Copy),
        "pin" => row("pin").map(Command::Pin),
        "unpin" => row("unpin").map(Command::Unpin),
        "rm" | "remove" => row("rm").map(Command::Remove),
        "clear" if rest.first().is_some_and(|w| w.eq_ignore_ascii_case("all")) => {
            Ok(Command::ClearAll)
        }
        "clear" => Ok(Command::Clear),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Print(String),
    Quit,
}

pub struct Console<K> {
    history: SharedHistory,
    sink: Arc<K>,
    detector: DetectorHandle,
    options: MenuOptions,
    promote_on_select: bool,
    icon_dir: Option<PathBuf>,
    rows: Vec<EntryId>,
}

impl<K: ClipboardSink> Console<K> {
    pub fn new(
        history: SharedHistory,
        sink: Arc<K>,
        detector: DetectorHandle,
        options: MenuOptions,
        promote_on_select: bool,
    ) -> Self {
        Self {
            history,
            sink,
            detector,
            options,
            promote_on_select,
            icon_dir: None,
            rows: Vec::new(),
        }
    }

    /// 图片条目的缩略图写到 `dir`，目录需已存在。
    pub fn with_icon_dir(mut self, dir: PathBuf) -> Self {
        self.icon_dir = Some(dir);
        self
    }

    /// 生成菜单文本并记住本次编号。
    pub fn render(&mut self) -> String {
        let view = self.history.view();
        let rows = menu::build_menu(&view, &self.options);
        let icons: HashMap<EntryId, PathBuf> = view
            .iter()
            .filter_map(|snapshot| Some((snapshot.id(), self.icon_for(snapshot)?)))
            .collect();

        self.rows.clear();
        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            match row {
                MenuRow::Item(item) => {
                    self.rows.push(item.id);
                    let marker = if item.pinned { "📌 " } else { "" };
                    let copied_at = item.created_at.with_timezone(&Local).format("%H:%M");
                    let mut line = format!(
                        "{:>3}. {}{}  ({})",
                        self.rows.len(),
                        marker,
                        item.title,
                        copied_at
                    );
                    if let Some(icon) = icons.get(&item.id) {
                        line.push_str(&format!("  🖼 {}", icon.display()));
                    }
                    lines.push(line);
                }
                MenuRow::Separator => lines.push("     ─────────".to_string()),
                MenuRow::Action(action) => {
                    lines.push(format!("     [{}] {}", action_command(action), action.label()));
                }
            }
        }
        lines.join("\n")
    }

    /// 图片条目的缩略图路径；同一条目只生成一次。
    fn icon_for(&self, snapshot: &ClipboardSnapshot) -> Option<PathBuf> {
        let dir = self.icon_dir.as_ref()?;
        let ClipContent::Image(image) = snapshot.content() else {
            return None;
        };
        let path = dir.join(format!("{}.png", snapshot.id().get()));
        if !path.exists() {
            if let Err(err) = menu::write_icon(image, &path) {
                log::warn!("🖼️ 条目 {} 缩略图生成失败: {}", snapshot.id(), err);
                return None;
            }
        }
        Some(path)
    }

    fn entry(&self, row: usize) -> Result<EntryId, CommandError> {
        row.checked_sub(1)
            .and_then(|index| self.rows.get(index))
            .copied()
            .ok_or(CommandError::NoSuchRow(row))
    }

    /// 执行一条命令；条目相关的失败转为提示文字，不中断会话。
    pub fn execute(&mut self, command: Command) -> Reply {
        match self.try_execute(command) {
            Ok(reply) => reply,
            Err(err) => {
                log::debug!("控制台命令失败 {:?}: {}", command, err);
                Reply::Print(err.to_string())
            }
        }
    }

    fn try_execute(&mut self, command: Command) -> Result<Reply, AppError> {
        let refreshed = match command {
            Command::List => true,
            Command::Help => return Ok(Reply::Print(HELP.to_string())),
            Command::Quit => return Ok(Reply::Quit),
            Command::Copy(row) => {
                let id = self.entry(row).map_err(to_app_error)?;
                self.copy(id)?;
                self.promote_on_select
            }
            Command::Pin(row) => {
                self.history.pin(self.entry(row).map_err(to_app_error)?)?;
                true
            }
            Command::Unpin(row) => {
                self.history.unpin(self.entry(row).map_err(to_app_error)?)?;
                true
            }
            Command::Remove(row) => {
                self.history.remove(self.entry(row).map_err(to_app_error)?)?;
                true
            }
            Command::Clear => {
                self.history.clear();
                true
            }
            Command::ClearAll => {
                self.history.clear_all();
                self.sink.clear()?;
                true
            }
        };

        if refreshed {
            Ok(Reply::Print(self.render()))
        } else {
            Ok(Reply::Print("copied".to_string()))
        }
    }

    /// 写回剪贴板，并登记为自身写入，避免下一次轮询重复收录。
    ///
    /// 登记先于写入，轮询落在两者之间也不会收录；写入失败时撤销登记。
    fn copy(&self, id: EntryId) -> Result<(), AppError> {
        let snapshot = self.history.select(id)?;
        self.detector.ignore_own_write(snapshot.kind(), snapshot.content());
        if let Err(err) = self.sink.write(snapshot.kind(), snapshot.content()) {
            self.detector.cancel_own_write();
            return Err(err);
        }
        log::info!("📋 已复制条目 {} ({})", id, snapshot.kind());

        if self.promote_on_select && !snapshot.is_pinned() {
            self.history.promote(id)?;
        }
        Ok(())
    }

    /// 逐行读取命令直到 `quit` 或输入结束。
    pub async fn run<R, W>(mut self, input: R, mut output: W) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let menu = self.render();
        write_block(&mut output, &menu).await?;

        while let Some(line) = lines.next_line().await? {
            let reply = match parse_command(&line) {
                Ok(command) => self.execute(command),
                Err(err) => Reply::Print(err.to_string()),
            };
            match reply {
                Reply::Quit => break,
                Reply::Print(text) => write_block(&mut output, &text).await?,
            }
        }
        log::info!("控制台已退出");
        Ok(())
    }
}

fn action_command(action: MenuAction) -> &'static str {
    match action {
        MenuAction::ClearKeepPinned => "clear",
        MenuAction::ClearEverything => "clear all",
        MenuAction::Quit => "quit",
    }
}

fn to_app_error(err: CommandError) -> AppError {
    AppError::Console(err.to_string())
}

async fn write_block<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<(), AppError> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n> ").await?;
    output.flush().await?;
    Ok(())
}
