// 雪人图鉴命令行入口

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use snowman_dex_lib::domains::format_count;
use snowman_dex_lib::models::{AppConfig, Entry};
use snowman_dex_lib::{app, logger, utils, AppState};

#[derive(Parser, Debug)]
#[command(name = "snowman-dex", version, about = "눈사람 도감")]
struct Cli {
    /// 数据目录（默认使用系统数据目录）
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 拍摄的照片加入图鉴
    Capture {
        /// 图片文件路径
        image: PathBuf,
    },
    /// 列出图鉴
    List,
    /// 查看条目详情
    Show {
        /// 条目ID
        id: String,
    },
    /// 图鉴统计
    Stats,
    /// 查看或修改配置
    Config {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        analysis_model: Option<String>,
        #[arg(long)]
        sticker_model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = match &cli.data_dir {
        Some(dir) => dir.join("logs"),
        None => utils::get_log_dir(),
    };
    let data_dir = cli.data_dir.unwrap_or_else(app::default_data_dir);
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    logger::init(&log_dir, level)?;

    let state = app::bootstrap(&data_dir).await?;

    match cli.command {
        Command::Capture { image } => capture(&state, image).await,
        Command::List => list(&state).await,
        Command::Show { id } => show(&state, &id).await,
        Command::Stats => stats(&state).await,
        Command::Config {
            api_key,
            analysis_model,
            sticker_model,
        } => config(&state, api_key, analysis_model, sticker_model).await,
    }
}

async fn capture(state: &AppState, image: PathBuf) -> Result<()> {
    let bytes = tokio::fs::read(&image)
        .await
        .with_context(|| format!("无法读取图片: {:?}", image))?;

    println!("눈사람 스캔 중...");
    match state.pipeline.submit(&bytes).await {
        Ok(entry) => {
            print_detail(&entry);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            Err(anyhow!(e))
        }
    }
}

async fn list(state: &AppState) -> Result<()> {
    let entries = state.collection.entries().await;
    let stats = state.collection.stats().await;

    println!(
        "전체 {}  카테고리 {}",
        format_count(stats.total),
        format_count(stats.categories)
    );
    for (index, entry) in entries.iter().enumerate() {
        println!(
            "No.{:03}  {:<24} {:<10} {:<10} {}",
            entries.len() - index,
            entry.name,
            entry.kind,
            entry.rarity,
            entry.id
        );
    }
    for _ in 0..stats.empty_slots {
        println!("        ❄");
    }
    Ok(())
}

async fn show(state: &AppState, id: &str) -> Result<()> {
    utils::validate_entry_id(id).map_err(|e| anyhow!(e))?;
    let entry = state.collection.open_entry(id).await?;
    print_detail(&entry);
    state.collection.close_entry().await;
    Ok(())
}

async fn stats(state: &AppState) -> Result<()> {
    let stats = state.collection.stats().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn config(
    state: &AppState,
    api_key: Option<String>,
    analysis_model: Option<String>,
    sticker_model: Option<String>,
) -> Result<()> {
    let current = state.settings.get().await;

    if api_key.is_none() && analysis_model.is_none() && sticker_model.is_none() {
        let mut shown = current.clone();
        if !shown.llm.gemini.api_key.is_empty() {
            shown.llm.gemini.api_key = "***".to_string();
        }
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    let mut gemini = current.llm.gemini;
    if let Some(key) = api_key {
        gemini.api_key = key;
    }
    if let Some(model) = analysis_model {
        gemini.analysis_model = model;
    }
    if let Some(model) = sticker_model {
        gemini.sticker_model = model;
    }

    state
        .settings
        .update(AppConfig {
            gemini: Some(gemini),
            ..AppConfig::default()
        })
        .await?;
    state
        .event_bus
        .publish(snowman_dex_lib::event_bus::AppEvent::ConfigUpdated {
            config_type: "gemini".to_string(),
        });
    println!("配置已保存: {:?}", state.settings.path());
    Ok(())
}

fn print_detail(entry: &Entry) {
    println!("{} [{}] - {}", entry.name, entry.rarity, entry.kind);
    println!("  {}", entry.description);
    println!(
        "  창의성 {} / 동글동글함 {} / 악세서리 {} / 여유 {} / 내구도 {}",
        entry.stats.creativity,
        entry.stats.roundness,
        entry.stats.accessories,
        entry.stats.chill_factor,
        entry.stats.durability
    );
    println!("  TMI: {}", entry.fun_fact);
    if let Some(created) = entry.created_at() {
        println!("  {}", created.format("%Y-%m-%d %H:%M"));
    }
    println!(
        "  스티커: {}",
        if entry.has_sticker() { "있음" } else { "없음" }
    );
    println!("  ID: {}", entry.id);
}
