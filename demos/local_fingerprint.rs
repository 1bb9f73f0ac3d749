//! techprint 本地指纹识别演示程序
//! 功能说明：
//! 1. 从本地定义文件（或缓存/远程）加载签名库
//! 2. 对本地保存的页面HTML及其脚本资源执行检测
//! 3. 按主机聚合后输出紧凑文本或JSON
//!
//! 运行命令：
//! cargo run --example local_fingerprint -- --tech-file technologies.json \
//!     --url https://example.com/ --html page.html --script https://example.com/app.js=app.js

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use techprint::{ConfigManager, Evidence, ResultAggregator, TechDetector};

#[derive(Debug, Parser)]
#[command(name = "local_fingerprint", about = "对本地保存的响应执行技术指纹识别")]
struct Args {
    /// 签名定义文件（technologies.json），缺省时使用缓存或远程拉取
    #[arg(short = 't', long)]
    tech_file: Option<PathBuf>,

    /// 页面URL
    #[arg(short, long)]
    url: String,

    /// 页面HTML文件
    #[arg(long)]
    html: PathBuf,

    /// 响应Header，格式 `Name: value`，可重复
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// 脚本资源，格式 `URL=文件路径`，可重复
    #[arg(short, long = "script")]
    scripts: Vec<String>,

    /// 以JSON格式输出
    #[arg(long)]
    json: bool,

    /// 输出详细日志
    #[arg(short, long)]
    verbose: bool,
}

fn parse_headers(raw: &[String]) -> Result<HashMap<String, Vec<String>>> {
    let mut headers: HashMap<String, Vec<String>> = HashMap::new();
    for line in raw {
        let Some((name, value)) = line.split_once(':') else {
            bail!("无效Header：{}", line);
        };
        headers
            .entry(name.trim().to_string())
            .or_default()
            .push(value.trim().to_string());
    }
    Ok(headers)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ========== 1. 日志系统初始化 ==========
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // ========== 2. 加载签名库 ==========
    let mut builder = ConfigManager::custom().verbose(args.verbose);
    if let Some(tech_file) = args.tech_file.clone() {
        builder = builder.tech_file(tech_file);
    }
    let detector = TechDetector::new(builder.build())
        .await
        .context("签名库加载失败")?;
    info!("签名库加载完成，技术{}条", detector.database().len());

    // ========== 3. 构建证据并检测 ==========
    let start = Instant::now();
    let aggregator = ResultAggregator::new();

    let html = tokio::fs::read(&args.html)
        .await
        .with_context(|| format!("读取HTML文件失败：{}", args.html.display()))?;
    let headers = parse_headers(&args.headers)?;
    let page = Evidence::from_response(&args.url, &headers, &html);
    aggregator.submit(&page, detector.detect(&page));

    for entry in &args.scripts {
        let Some((script_url, path)) = entry.split_once('=') else {
            bail!("无效脚本参数：{}，格式应为 URL=文件路径", entry);
        };
        let source = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("读取脚本文件失败：{}", path))?;
        let script = Evidence::new(script_url).with_javascript(source);
        aggregator.submit(&script, detector.detect(&script));
    }

    // ========== 4. 输出结果 ==========
    let result = aggregator.finalize(&args.url);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    // 空结果已由聚合器记录告警
    if result.is_empty() {
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.summary());
    }
    info!("检测完成，耗时 {:.3} 毫秒", elapsed_ms);

    Ok(())
}
