//! # Story Player
//!
//! 无界面的故事播放器：充当页面容器，驱动 story-runtime 翻页，
//! 旁白与页面状态输出到日志。
//!
//! ## 用法
//!
//! ```bash
//! # 自动翻页播放内置故事
//! cargo run -p story-player
//!
//! # 交互模式，从第 3 页开始
//! cargo run -p story-player -- --interactive --start-page 3
//!
//! # 播放自定义故事
//! cargo run -p story-player -- --story my_story.json --dwell 5
//!
//! # 导出内置故事作为编写模板
//! cargo run -p story-player -- --export story.json
//! ```

mod command;
mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;
use tokio::time;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use command::{HELP, PlayerCommand};
use config::AppConfig;
use story_runtime::{LogDriver, PageLifecycleCoordinator, StoryPlayer, Storybook, SystemClock};

#[derive(Parser, Debug)]
#[command(name = "story-player")]
#[command(about = "分页旁白动画故事播放器")]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 故事文件（JSON），默认使用内置故事
    #[arg(short, long)]
    story: Option<PathBuf>,

    /// 起始页
    #[arg(long)]
    start_page: Option<usize>,

    /// 自动翻页时每页停留秒数
    #[arg(long)]
    dwell: Option<f64>,

    /// 交互模式：从标准输入读取翻页命令
    #[arg(short, long)]
    interactive: bool,

    /// 日志过滤器
    #[arg(long)]
    log: Option<String>,

    /// 把内置故事导出为 JSON 后退出
    #[arg(long)]
    export: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(story) = &self.story {
            config.story_path = Some(story.clone());
        }
        if let Some(start_page) = self.start_page {
            config.start_page = start_page;
        }
        if let Some(dwell) = self.dwell {
            config.page_dwell_seconds = dwell;
        }
        if let Some(filter) = &self.log {
            config.log_filter = filter.clone();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = AppConfig::load(&cli.config);
    let mut config = loaded.clone().unwrap_or_default();
    cli.apply(&mut config);

    init_tracing(&config.log_filter);
    match &loaded {
        Ok(_) => info!(path = ?cli.config, "配置文件加载成功"),
        Err(e) => warn!(error = %e, "配置文件不可用，使用默认配置"),
    }
    config.validate().context("配置无效")?;

    if let Some(path) = &cli.export {
        let json = Storybook::hackathon().to_json()?;
        std::fs::write(path, json).with_context(|| format!("写入 {path:?} 失败"))?;
        info!(path = ?path, "内置故事已导出");
        return Ok(());
    }

    let mut book = match &config.story_path {
        Some(path) => Storybook::load(path).with_context(|| format!("加载故事 {path:?} 失败"))?,
        None => Storybook::hackathon(),
    };
    let overridden = config.apply_countdown_override(&mut book);
    if overridden > 0 {
        debug!(pages = overridden, "已覆盖倒计时目标");
    }
    info!(title = %book.title, pages = book.len(), "故事已加载");

    let coordinator = PageLifecycleCoordinator::new(
        Arc::new(LogDriver),
        Arc::new(SystemClock),
        config.narration.clone(),
        Handle::current(),
    );
    let mut player = StoryPlayer::new(book, coordinator);
    player.go_to(config.start_page)?;

    let result = if cli.interactive {
        run_interactive(&mut player).await
    } else {
        run_auto(&mut player, config.page_dwell()).await
    };

    player.shutdown()?;
    info!("播放结束");
    result
}

fn init_tracing(config_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// 自动翻页，到最后一页停留结束后退出
async fn run_auto(player: &mut StoryPlayer, dwell: Duration) -> anyhow::Result<()> {
    loop {
        dwell_on_page(player, dwell).await;
        report_page(player);
        if player.next()?.is_none() {
            return Ok(());
        }
    }
}

/// 在当前页停留，倒计时页面每秒输出剩余时间
async fn dwell_on_page(player: &StoryPlayer, dwell: Duration) {
    let countdown = player.coordinator().countdown();
    let mut remaining = countdown.subscribe();
    let deadline = time::sleep(dwell);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => return,
            changed = remaining.changed() => {
                if changed.is_err() {
                    (&mut deadline).await;
                    return;
                }
                if countdown.is_connected() {
                    info!(remaining = %*remaining.borrow_and_update(), "⏳ 倒计时");
                }
            }
        }
    }
}

async fn run_interactive(player: &mut StoryPlayer) -> anyhow::Result<()> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<PlayerCommand>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}（{HELP}）");
                continue;
            }
        };

        match command {
            PlayerCommand::Next => {
                if player.next()?.is_none() {
                    println!("已经是最后一页");
                }
            }
            PlayerCommand::Previous => {
                if player.previous()?.is_none() {
                    println!("已经是第一页");
                }
            }
            PlayerCommand::GoTo(index) => {
                if let Err(e) = player.go_to(index) {
                    println!("{e}");
                }
            }
            PlayerCommand::Status => report_page(player),
            PlayerCommand::Help => println!("{HELP}"),
            PlayerCommand::Quit => break,
        }
    }
    Ok(())
}

fn report_page(player: &StoryPlayer) {
    let Some(page) = player.current_page() else {
        println!("没有激活的页面");
        return;
    };
    let coordinator = player.coordinator();
    let state = coordinator.page_state();

    println!(
        "[{}/{}] {} ({})",
        player.current_index().map_or(0, |i| i + 1),
        player.book().len(),
        page.title,
        page.id
    );
    println!(
        "  旁白: {:?}，已触发步骤: {}，挂起步骤: {}",
        coordinator.narration().status(),
        state.total_fired(),
        coordinator.timeline().pending_count()
    );
    for (property, value) in state.properties() {
        println!("  {property} = {value}");
    }
    if coordinator.countdown().is_connected() {
        println!("  倒计时: {}", coordinator.countdown().state());
    }
}
