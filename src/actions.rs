use thiserror::Error;

/// 从文件路径推导所在目录。反斜杠优先：Windows 路径分量里
/// 不允许出现反斜杠，正斜杠却可能混在其中。
/// 两种分隔符都没有时原样返回，调用方视为"无父目录可导航"。
/// 纯字符串处理，不归一化 `..`，不访问文件系统。
pub fn directory_of(path: &str) -> &str {
    if let Some(idx) = path.rfind('\\') {
        &path[..idx]
    } else if let Some(idx) = path.rfind('/') {
        &path[..idx]
    } else {
        path
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// 空串是调用方错误，应在调用前拦下
    #[error("剪贴板内容不能为空")]
    EmptyText,
    /// 所有复制策略都失败
    #[error("当前环境没有可用的剪贴板")]
    Unsupported,
}

pub type CopyStrategy = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// 按序尝试的复制策略链：系统剪贴板优先，宿主回退垫底。
pub struct ClipboardService {
    strategies: Vec<CopyStrategy>,
}

impl ClipboardService {
    /// 系统剪贴板 (arboard)
    pub fn native() -> Self {
        Self {
            strategies: vec![Box::new(native_copy)],
        }
    }

    /// 追加回退策略。GUI 把 egui 的延迟复制命令挂在这里，
    /// 系统剪贴板不可用 (如 Wayland 无 portal) 时兜底。
    pub fn with_fallback(mut self, fallback: CopyStrategy) -> Self {
        self.strategies.push(fallback);
        self
    }

    pub fn from_strategies(strategies: Vec<CopyStrategy>) -> Self {
        Self { strategies }
    }

    pub fn copy_text(&self, text: &str) -> Result<(), ClipboardError> {
        if text.is_empty() {
            return Err(ClipboardError::EmptyText);
        }
        for strategy in &self.strategies {
            if strategy(text) {
                return Ok(());
            }
        }
        Err(ClipboardError::Unsupported)
    }
}

fn native_copy(text: &str) -> bool {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => clipboard.set_text(text.to_string()).is_ok(),
        Err(e) => {
            tracing::debug!("系统剪贴板不可用: {}", e);
            false
        }
    }
}

#[derive(Debug, Error)]
pub enum OpenLocationError {
    #[error("文件路径为空")]
    EmptyPath,
    #[error("打开目录失败: {0}")]
    Launch(#[from] std::io::Error),
}

/// 在系统文件管理器中打开文件所在目录。
pub fn open_location(path: &str) -> Result<(), OpenLocationError> {
    if path.is_empty() {
        return Err(OpenLocationError::EmptyPath);
    }
    open::that(directory_of(path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_directory_of_windows_path() {
        assert_eq!(directory_of("C:\\a\\b\\c.txt"), "C:\\a\\b");
    }

    #[test]
    fn test_directory_of_unix_path() {
        assert_eq!(directory_of("/a/b/c.txt"), "/a/b");
        assert_eq!(directory_of("/c.txt"), "");
    }

    #[test]
    fn test_directory_of_backslash_takes_precedence() {
        assert_eq!(directory_of("C:\\a\\b/c.txt"), "C:\\a");
    }

    #[test]
    fn test_directory_of_bare_name_returns_itself() {
        assert_eq!(directory_of("c.txt"), "c.txt");
        assert_eq!(directory_of(""), "");
    }

    #[test]
    fn test_copy_empty_text_is_caller_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_inner = calls.clone();
        let service = ClipboardService::from_strategies(vec![Box::new(move |_| {
            calls_inner.fetch_add(1, Ordering::SeqCst);
            true
        })]);
        assert_eq!(service.copy_text(""), Err(ClipboardError::EmptyText));
        assert_eq!(calls.load(Ordering::SeqCst), 0, "空串不应触发任何策略");
    }

    #[test]
    fn test_copy_stops_at_first_success() {
        let fallback_calls = Arc::new(AtomicUsize::new(0));
        let fallback_inner = fallback_calls.clone();
        let service = ClipboardService::from_strategies(vec![
            Box::new(|_| true),
            Box::new(move |_| {
                fallback_inner.fetch_add(1, Ordering::SeqCst);
                true
            }),
        ]);
        assert!(service.copy_text("C:\\a\\b").is_ok());
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_copy_falls_through_to_next_strategy() {
        let service = ClipboardService::from_strategies(vec![
            Box::new(|_| false),
            Box::new(|text| text == "/a/b/c.txt"),
        ]);
        assert!(service.copy_text("/a/b/c.txt").is_ok());
    }

    #[test]
    fn test_copy_unsupported_when_all_fail() {
        let service =
            ClipboardService::from_strategies(vec![Box::new(|_| false), Box::new(|_| false)]);
        assert_eq!(
            service.copy_text("/a/b/c.txt"),
            Err(ClipboardError::Unsupported)
        );
    }

    #[test]
    fn test_open_location_rejects_empty_path() {
        assert!(matches!(
            open_location(""),
            Err(OpenLocationError::EmptyPath)
        ));
    }
}
