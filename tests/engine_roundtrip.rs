//! 走真实 IPC 通道的端到端测试：起一个协议兼容的内存假引擎，
//! 用 IpcEngine + Dispatcher 驱动完整的搜索流水线。
#![cfg(unix)]

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Once, OnceLock};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

use flashfind::dispatch::{Dispatcher, SearchEvent, SearchSession, SessionChange};
use flashfind::engine::{IpcEngine, SearchEngine};
use flashfind::types::{EngineRequest, EngineResponse, RawFileRecord, SearchFilters};

static START: Once = Once::new();
static SOCKET_DIR: OnceLock<tempfile::TempDir> = OnceLock::new();

fn record(path: &str, name: &str, matches: Option<Vec<String>>) -> RawFileRecord {
    RawFileRecord {
        file_path: path.to_string(),
        name: name.to_string(),
        size: 2048,
        modified_time: 1_700_000_000,
        line_number: matches.as_ref().map(|_| 7),
        content: None,
        matches,
    }
}

fn handle(request: EngineRequest) -> EngineResponse {
    match request {
        EngineRequest::BasicSearch { query } => match query.as_str() {
            "docs" => EngineResponse::ok_records(vec![
                record(
                    "/home/u/docs/plan.md",
                    "plan.md",
                    Some(vec!["## docs overview".to_string()]),
                ),
                record("/home/u/docs/notes.txt", "notes.txt", None),
            ]),
            "none" => EngineResponse::ok_records(vec![]),
            "fail" => EngineResponse::Err {
                error: "index not ready".to_string(),
            },
            other => EngineResponse::ok_records(vec![record(
                &format!("/home/u/{}", other),
                other,
                None,
            )]),
        },
        EngineRequest::AdvancedSearch { query, filters } => {
            // 客户端必须把未填写的边界传成 null 而不是 0
            assert_eq!(filters.min_size, Some(1024));
            assert_eq!(filters.max_size, None);
            assert_eq!(filters.file_type, None);
            EngineResponse::ok_records(vec![record(
                &format!("/home/u/big/{}.bin", query),
                &format!("{}.bin", query),
                None,
            )])
        }
        EngineRequest::BuildIndex { path } => {
            assert_eq!(path, "/home/u/docs");
            EngineResponse::ok_unit()
        }
        EngineRequest::PreviewFile { path } => {
            EngineResponse::ok_text(format!("first line of {}\nsecond line", path))
        }
        EngineRequest::HighlightContent { content, query } => {
            EngineResponse::ok_text(content.replace(&query, &format!("<mark>{}</mark>", query)))
        }
        EngineRequest::Scan => EngineResponse::ok_unit(),
    }
}

/// 每个连接一问一答，行分隔 JSON，与客户端协议一致
fn start_fake_engine() -> PathBuf {
    let dir = SOCKET_DIR.get_or_init(|| tempfile::tempdir().expect("tempdir"));
    let socket = dir.path().join("engine.sock");
    let socket_for_server = socket.clone();

    START.call_once(|| {
        std::env::set_var("FLASHFIND_ENGINE_SOCKET", &socket);
        let (ready_tx, ready_rx) = mpsc::channel();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("runtime");
            rt.block_on(async move {
                let listener = UnixListener::bind(&socket_for_server).expect("bind socket");
                ready_tx.send(()).expect("signal ready");
                loop {
                    let (stream, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => break,
                    };
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(stream);
                        let mut line = String::new();
                        if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                            return;
                        }
                        let response = match serde_json::from_str::<EngineRequest>(&line) {
                            Ok(request) => handle(request),
                            Err(e) => EngineResponse::Err {
                                error: format!("请求解析失败: {}", e),
                            },
                        };
                        let mut out = serde_json::to_vec(&response).expect("serialize");
                        out.push(b'\n');
                        let _ = reader.get_mut().write_all(&out).await;
                    });
                }
            });
        });

        ready_rx.recv().expect("fake engine never came up");
    });

    socket
}

fn drain(session: &mut SearchSession, rx: &mpsc::Receiver<SearchEvent>) -> Vec<SessionChange> {
    let mut changes = Vec::new();
    while let Ok(event) = rx.try_recv() {
        changes.push(session.apply(event));
    }
    changes
}

#[test]
fn test_engine_calls_over_socket() {
    start_fake_engine();
    let engine = IpcEngine::new().expect("engine client");

    // 搜索以外的四个引擎调用
    engine.scan().expect("scan");
    engine.build_index("/home/u/docs").expect("build index");
    let preview = engine.preview_file("/home/u/docs/plan.md").expect("preview");
    assert!(preview.starts_with("first line of /home/u/docs/plan.md"));
    let marked = engine
        .highlight_content(&preview, "plan")
        .expect("highlight");
    assert!(marked.contains("<mark>plan</mark>"));

    // 高级搜索：未填写的边界保持 null（假引擎内有断言）
    let hits = engine
        .advanced_search(
            "backup",
            &SearchFilters {
                file_type: None,
                min_size: Some(1024),
                max_size: None,
            },
        )
        .expect("advanced search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "backup.bin");
}

#[test]
fn test_dispatch_pipeline_over_socket() {
    start_fake_engine();
    let engine: Arc<dyn SearchEngine> = Arc::new(IpcEngine::new().expect("engine client"));
    let (tx, rx) = mpsc::channel();
    let dispatcher = Dispatcher::new(engine, tx);
    let mut session = SearchSession::default();

    // 正常命中：原始记录被规范化成视图模型
    dispatcher
        .dispatch_basic("docs")
        .expect("valid query")
        .join()
        .expect("worker");
    let changes = drain(&mut session, &rx);
    assert_eq!(changes.last(), Some(&SessionChange::Replaced { count: 2 }));
    assert_eq!(session.results()[0].kind, "unknown");
    assert_eq!(session.results()[0].name, "plan.md");
    let matches = session.results()[0].matches.as_ref().expect("matches");
    assert_eq!(matches[0].line, 7);
    assert!(session.results()[1].matches.is_none());

    // 空结果与失败走各自的会话变化
    dispatcher
        .dispatch_basic("none")
        .expect("valid query")
        .join()
        .expect("worker");
    let changes = drain(&mut session, &rx);
    assert_eq!(changes.last(), Some(&SessionChange::Replaced { count: 0 }));

    dispatcher
        .dispatch_basic("fail")
        .expect("valid query")
        .join()
        .expect("worker");
    let changes = drain(&mut session, &rx);
    assert_eq!(changes.last(), Some(&SessionChange::Failed));
    assert!(session.results().is_empty());
}
