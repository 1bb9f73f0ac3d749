//! techprint 并发指纹识别演示
//! 同一份签名库被多个任务并发使用，结果通过聚合器按主机归并
//!
//! 运行命令：
//! cargo run --example concurrent_fingerprint --release -- --tech-file technologies.json

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use techprint::{Evidence, ResultAggregator, SignatureStore, TechDetector};

#[derive(Debug, Parser)]
#[command(name = "concurrent_fingerprint", about = "并发检测吞吐演示")]
struct Args {
    /// 签名定义文件（technologies.json）
    #[arg(short = 't', long)]
    tech_file: PathBuf,

    /// 模拟站点数量
    #[arg(long, default_value_t = 200)]
    sites: usize,

    /// 并发度
    #[arg(short, long, default_value_t = 64)]
    concurrency: usize,
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta name="generator" content="WordPress 6.4.2">
  <script src="/wp-includes/js/jquery/jquery.min.js?ver=3.7.1"></script>
  <script src="/static/app.js"></script>
</head>
<body class="wp-site-blocks"></body>
</html>"#;

const APP_JS: &str = "import React from 'react'; React.createElement(App, null);";

/// 一个站点的证据：主页面及其引用的一个脚本
fn site_evidence(index: usize) -> (Evidence, Evidence) {
    let base = format!("https://site{index}.example.com/");
    let page = Evidence::new(&base)
        .with_header("Server", "nginx/1.25.3")
        .with_header("X-Powered-By", "PHP/8.2.12")
        .with_cookie("wordpress_test_cookie", "WP Cookie check")
        .with_html(PAGE_HTML);
    let script = Evidence::new(format!("{base}static/app.js")).with_javascript(APP_JS);
    (page, script)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let db = SignatureStore::load_from_path(&args.tech_file)
        .with_context(|| format!("签名库加载失败：{}", args.tech_file.display()))?;
    let detector = TechDetector::with_database(db);
    let aggregator = Arc::new(ResultAggregator::new());
    let semaphore = Arc::new(Semaphore::new(args.concurrency.max(1)));

    info!("开始并发检测 | 站点数 = {}, 并发度 = {}", args.sites, args.concurrency);
    let start = Instant::now();

    // 脚本先于页面提交：聚合器在页面登记时归并脚本结果
    let mut tasks = Vec::with_capacity(args.sites);
    for index in 0..args.sites {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let detector = detector.clone();
        let aggregator = Arc::clone(&aggregator);
        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            let (page, script) = site_evidence(index);
            aggregator.submit(&script, detector.detect(&script));
            aggregator.submit(&page, detector.detect(&page));
        }));
    }
    for task in tasks {
        task.await?;
    }

    let elapsed = start.elapsed();
    let results = aggregator.finalize_all();
    let empty = results.iter().filter(|r| r.is_empty()).count();
    if empty > 0 {
        warn!("{} 个站点未识别到任何技术", empty);
    }

    if let Some(first) = results.first() {
        println!("{} => {}", first.host, first.summary());
    }
    info!(
        "检测完成 | 站点数 = {}, 总耗时 = {:.3} 毫秒, 吞吐 = {:.1} 站点/秒",
        results.len(),
        elapsed.as_secs_f64() * 1000.0,
        results.len() as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    Ok(())
}
