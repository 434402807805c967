use clap::Parser;
use serde_json::json;

use crate::engine::{IpcEngine, SearchEngine};
use crate::normalize::{normalize, FileViewModel};
use crate::query::QueryDescriptor;

#[derive(Parser, Debug)]
#[command(author, version, about = "闪搜 - 极速文件搜索客户端（脚本/AI 调用时附加查询参数）", long_about = None)]
pub struct CliArgs {
    /// 搜索关键词（给出任一查询参数即进入命令行模式）
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,

    /// 文件类型过滤（扩展名，如 pdf）
    #[arg(short = 't', long = "file-type")]
    pub file_type: Option<String>,

    /// 最小文件大小（字节）
    #[arg(long = "min-size")]
    pub min_size: Option<u64>,

    /// 最大文件大小（字节）
    #[arg(long = "max-size")]
    pub max_size: Option<u64>,
}

impl CliArgs {
    pub fn is_headless(&self) -> bool {
        self.query.is_some()
            || self.file_type.is_some()
            || self.min_size.is_some()
            || self.max_size.is_some()
    }
}

// 命令行入口：一次派发，JSON 输出
pub fn run_cli(args: CliArgs) -> anyhow::Result<()> {
    let text = args.query.as_deref().unwrap_or("");
    let descriptor =
        if args.file_type.is_some() || args.min_size.is_some() || args.max_size.is_some() {
            QueryDescriptor::advanced(text, args.file_type.clone(), args.min_size, args.max_size)?
        } else {
            QueryDescriptor::basic(text)?
        };

    let engine = IpcEngine::new()?;
    let records = match &descriptor {
        QueryDescriptor::Basic { text } => engine.basic_search(text)?,
        QueryDescriptor::Advanced { text, filters } => engine.advanced_search(text, filters)?,
    };
    let results: Vec<FileViewModel> = records.iter().map(normalize).collect();

    let output = json!({
        "code": 0,
        "msg": if results.is_empty() { "未找到匹配的结果" } else { "success" },
        "query": descriptor.text(),
        "total": results.len(),
        "results": results,
    });

    // JSON 输出，便于脚本解析
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
