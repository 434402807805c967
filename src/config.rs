use std::path::PathBuf;

/// 引擎 IPC 管道名 (Windows)
#[cfg(windows)]
pub const PIPE_NAME: &str = r"\\.\pipe\flashfind_engine";

/// 结果表每页条数
pub const PAGE_SIZE: usize = 10;

/// 单次搜索结果上限 (引擎侧同样限制，这里兜底)
#[allow(dead_code)]
pub const MAX_RESULTS: usize = 500;

/// 预览窗口最大显示字节
pub const MAX_PREVIEW_BYTES: usize = 512 * 1024;

/// 数据保存目录
#[allow(dead_code)]
pub fn data_dir() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("FlashFind");
    std::fs::create_dir_all(&p).ok();
    p
}

/// 引擎 socket 路径 (非 Windows)。可用环境变量覆盖，方便多实例与测试。
#[cfg(not(windows))]
pub static SOCKET_PATH: once_cell::sync::Lazy<PathBuf> = once_cell::sync::Lazy::new(|| {
    if let Ok(p) = std::env::var("FLASHFIND_ENGINE_SOCKET") {
        return PathBuf::from(p);
    }
    let mut p = dirs::runtime_dir().unwrap_or_else(std::env::temp_dir);
    p.push("flashfind_engine.sock");
    p
});
