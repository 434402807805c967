use crate::types::{EngineRequest, EngineResponse, RawFileRecord, SearchFilters};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("无法连接搜索引擎服务: {0}")]
    Connect(#[source] std::io::Error),
    #[error("引擎通信失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("引擎应答解析失败: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("引擎执行失败: {0}")]
    Engine(String),
}

/// 进程边界的唯一出入口。真实实现走 IPC，测试用内存假引擎。
pub trait SearchEngine: Send + Sync {
    fn basic_search(&self, query: &str) -> Result<Vec<RawFileRecord>, EngineError>;
    fn advanced_search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RawFileRecord>, EngineError>;
    fn build_index(&self, path: &str) -> Result<(), EngineError>;
    fn preview_file(&self, path: &str) -> Result<String, EngineError>;
    fn highlight_content(&self, content: &str, query: &str) -> Result<String, EngineError>;
    fn scan(&self) -> Result<(), EngineError>;
}

/// 行分隔 JSON：一行请求、一行应答，管道和 socket 通用，
/// 不依赖半关闭语义。
pub async fn roundtrip<S>(stream: S, request: &EngineRequest) -> Result<EngineResponse, EngineError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut payload = serde_json::to_vec(request)?;
    payload.push(b'\n');

    let mut reader = BufReader::new(stream);
    reader.get_mut().write_all(&payload).await?;
    reader.get_mut().flush().await?;

    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err(EngineError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "引擎未应答即断开连接",
        )));
    }
    Ok(serde_json::from_str(&line)?)
}

/// 通过本地 IPC 访问外部引擎进程。每次请求独立建连，
/// 引擎重启后客户端无需任何恢复动作。
pub struct IpcEngine {
    rt: tokio::runtime::Runtime,
}

impl IpcEngine {
    pub fn new() -> Result<Self, EngineError> {
        let rt = tokio::runtime::Runtime::new()?;
        Ok(Self { rt })
    }

    fn request(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
        self.rt.block_on(async {
            #[cfg(windows)]
            let stream = tokio::net::windows::named_pipe::ClientOptions::new()
                .open(crate::config::PIPE_NAME)
                .map_err(EngineError::Connect)?;
            #[cfg(not(windows))]
            let stream = tokio::net::UnixStream::connect(&*crate::config::SOCKET_PATH)
                .await
                .map_err(EngineError::Connect)?;

            roundtrip(stream, request).await
        })
    }
}

fn expect_records(response: EngineResponse) -> Result<Vec<RawFileRecord>, EngineError> {
    match response {
        EngineResponse::Ok { records, .. } => Ok(records),
        EngineResponse::Err { error } => Err(EngineError::Engine(error)),
    }
}

fn expect_text(response: EngineResponse) -> Result<String, EngineError> {
    match response {
        EngineResponse::Ok { text, .. } => Ok(text.unwrap_or_default()),
        EngineResponse::Err { error } => Err(EngineError::Engine(error)),
    }
}

fn expect_unit(response: EngineResponse) -> Result<(), EngineError> {
    match response {
        EngineResponse::Ok { .. } => Ok(()),
        EngineResponse::Err { error } => Err(EngineError::Engine(error)),
    }
}

impl SearchEngine for IpcEngine {
    fn basic_search(&self, query: &str) -> Result<Vec<RawFileRecord>, EngineError> {
        expect_records(self.request(&EngineRequest::BasicSearch {
            query: query.to_string(),
        })?)
    }

    fn advanced_search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RawFileRecord>, EngineError> {
        expect_records(self.request(&EngineRequest::AdvancedSearch {
            query: query.to_string(),
            filters: filters.clone(),
        })?)
    }

    fn build_index(&self, path: &str) -> Result<(), EngineError> {
        expect_unit(self.request(&EngineRequest::BuildIndex {
            path: path.to_string(),
        })?)
    }

    fn preview_file(&self, path: &str) -> Result<String, EngineError> {
        expect_text(self.request(&EngineRequest::PreviewFile {
            path: path.to_string(),
        })?)
    }

    fn highlight_content(&self, content: &str, query: &str) -> Result<String, EngineError> {
        expect_text(self.request(&EngineRequest::HighlightContent {
            content: content.to_string(),
            query: query.to_string(),
        })?)
    }

    fn scan(&self) -> Result<(), EngineError> {
        expect_unit(self.request(&EngineRequest::Scan)?)
    }
}
