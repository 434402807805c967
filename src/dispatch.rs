use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::engine::SearchEngine;
use crate::normalize::{normalize, FileViewModel};
use crate::query::{QueryDescriptor, QueryError};

/// 搜索生命周期事件，由派发线程发回界面线程。
/// Failed 不携带错误详情：详情进日志，用户只看到一条通用提示。
#[derive(Debug)]
pub enum SearchEvent {
    Started {
        epoch: u64,
    },
    Completed {
        epoch: u64,
        results: Vec<FileViewModel>,
    },
    Failed {
        epoch: u64,
    },
}

/// 应用事件后的会话变化，界面据此决定提示文案。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    /// 新一轮搜索开始，旧结果已清空
    Cleared,
    /// 结果整体替换
    Replaced { count: usize },
    /// 本轮搜索失败
    Failed,
    /// 过期应答，已丢弃
    Stale,
}

/// 单个搜索面板的会话状态。latest_epoch 记录最近一次派发，
/// 只有携带该纪元的应答才会被应用——后发出的搜索永远赢，
/// 与应答回来的先后无关。
#[derive(Debug, Default)]
pub struct SearchSession {
    results: Vec<FileViewModel>,
    loading: bool,
    latest_epoch: u64,
}

impl SearchSession {
    pub fn results(&self) -> &[FileViewModel] {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn apply(&mut self, event: SearchEvent) -> SessionChange {
        match event {
            SearchEvent::Started { epoch } => {
                self.latest_epoch = epoch;
                self.results.clear();
                self.loading = true;
                SessionChange::Cleared
            }
            SearchEvent::Completed { epoch, results } => {
                if epoch != self.latest_epoch {
                    tracing::debug!("丢弃过期搜索应答 (epoch {})", epoch);
                    return SessionChange::Stale;
                }
                self.loading = false;
                let count = results.len();
                self.results = results;
                SessionChange::Replaced { count }
            }
            SearchEvent::Failed { epoch } => {
                if epoch != self.latest_epoch {
                    tracing::debug!("丢弃过期失败应答 (epoch {})", epoch);
                    return SessionChange::Stale;
                }
                self.loading = false;
                SessionChange::Failed
            }
        }
    }
}

/// 查询派发器。校验在 QueryDescriptor 构造时完成，
/// 这里只负责纪元编号、线程派发和结果规范化。
pub struct Dispatcher {
    engine: Arc<dyn SearchEngine>,
    events: Sender<SearchEvent>,
    epoch: AtomicU64,
}

impl Dispatcher {
    pub fn new(engine: Arc<dyn SearchEngine>, events: Sender<SearchEvent>) -> Self {
        Self {
            engine,
            events,
            epoch: AtomicU64::new(0),
        }
    }

    /// 校验失败时直接返回，不触达引擎；调用方就地提示。
    pub fn dispatch_basic(&self, text: &str) -> Result<JoinHandle<()>, QueryError> {
        Ok(self.dispatch(QueryDescriptor::basic(text)?))
    }

    pub fn dispatch_advanced(
        &self,
        text: &str,
        file_type: Option<String>,
        min_size: Option<u64>,
        max_size: Option<u64>,
    ) -> Result<JoinHandle<()>, QueryError> {
        Ok(self.dispatch(QueryDescriptor::advanced(text, file_type, min_size, max_size)?))
    }

    pub fn dispatch(&self, descriptor: QueryDescriptor) -> JoinHandle<()> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        // Started 在派发线程启动前发出，事件序里开始顺序等于派发顺序
        let _ = self.events.send(SearchEvent::Started { epoch });

        let engine = self.engine.clone();
        let events = self.events.clone();
        std::thread::spawn(move || {
            tracing::debug!("搜索派发 (epoch {}): {:?}", epoch, descriptor);
            let outcome = match &descriptor {
                QueryDescriptor::Basic { text } => engine.basic_search(text),
                QueryDescriptor::Advanced { text, filters } => {
                    engine.advanced_search(text, filters)
                }
            };
            match outcome {
                Ok(records) => {
                    let results: Vec<FileViewModel> = records.iter().map(normalize).collect();
                    let _ = events.send(SearchEvent::Completed { epoch, results });
                }
                Err(e) => {
                    tracing::error!("搜索执行失败 (epoch {}): {}", epoch, e);
                    let _ = events.send(SearchEvent::Failed { epoch });
                }
            }
        })
    }
}
