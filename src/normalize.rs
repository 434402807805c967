use crate::types::RawFileRecord;
use serde::Serialize;

/// 内容匹配行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchLine {
    pub line: u64,
    pub content: String,
}

/// 表格使用的视图模型。一条原始记录对应一条视图记录，
/// 随下一次搜索整体替换，不做增量更新。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileViewModel {
    pub path: String,
    pub name: String,
    pub kind: String,
    pub size_bytes: u64,
    pub modified_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<MatchLine>>,
}

/// 原始记录 -> 视图模型。全函数，不校验路径 (可能为空，由操作入口把关)。
/// 引擎目前不返回类型分类，kind 固定为 "unknown"；
/// 将来引擎扩展分类字段时只改这里。
pub fn normalize(raw: &RawFileRecord) -> FileViewModel {
    let matches = raw.matches.as_ref().map(|lines| {
        let anchor = raw.line_number.unwrap_or(0);
        lines
            .iter()
            .map(|content| MatchLine {
                line: anchor,
                content: content.clone(),
            })
            .collect()
    });

    FileViewModel {
        path: raw.file_path.clone(),
        name: raw.name.clone(),
        kind: "unknown".to_string(),
        size_bytes: raw.size,
        modified_time: raw.modified_time,
        matches,
    }
}

/// 文件大小显示：1024 进制，严格阈值，一位小数。
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// 修改时间显示：本地时区，固定 YYYY-MM-DD HH:mm；时间戳为 0 显示 N/A。
pub fn format_modified(epoch_secs: i64) -> String {
    if epoch_secs == 0 {
        return "N/A".to_string();
    }
    match chrono::DateTime::from_timestamp(epoch_secs, 0) {
        Some(utc) => utc
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "N/A".to_string(),
    }
}
