//! 行式 JSON 命令工具
//!
//! 用法: `ffish [variants.ini]`，之后从标准输入逐行读取请求，向标准输出逐行写出响应。

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ffish::{Engine, Request, Response};

fn main() -> Result<()> {
    // 日志写到标准错误，标准输出只留给响应
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("ffish=info".parse()?))
        .init();

    let engine = Engine::new();
    if let Some(path) = std::env::args().nth(1) {
        let text = std::fs::read_to_string(&path).with_context(|| format!("无法读取变体配置 {}", path))?;
        let names = engine
            .load_variant_config(&text)
            .with_context(|| format!("变体配置 {} 无效", path))?;
        info!(path = %path, count = names.len(), "已载入变体配置");
    }

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("读取标准输入失败")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => {
                debug!(?request, "request");
                engine.handle(request)
            }
            Err(err) => {
                warn!(%err, "无法解析请求");
                Response::Error(format!("Invalid request: {}", err))
            }
        };
        serde_json::to_writer(&mut out, &response).context("写出响应失败")?;
        writeln!(out).context("写出响应失败")?;
        out.flush().context("写出响应失败")?;
    }
    Ok(())
}
