use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::actions::{self, ClipboardService};
use crate::config::{MAX_PREVIEW_BYTES, PAGE_SIZE};
use crate::dispatch::{Dispatcher, SearchSession, SessionChange};
use crate::engine::SearchEngine;
use crate::normalize::{format_modified, format_size, MatchLine};
use crate::query::QueryError;

#[derive(PartialEq, Clone, Copy, Debug)]
enum SearchTab {
    Basic,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// 短暂停留的顶部提示条
struct Notice {
    level: NoticeLevel,
    text: String,
    created: Instant,
}

const NOTICE_TTL: Duration = Duration::from_secs(4);

/// 后台任务 (扫描/建索引/打开目录/预览) 的回执
enum TaskEvent {
    Notice(NoticeLevel, String),
    Preview { title: String, text: String },
}

/// 行内操作先收集再执行，避免在结果借用期间改自身状态
enum RowAction {
    CopyPath(String),
    OpenLocation(String),
    OpenFile(String),
    Preview {
        path: String,
        matches: Option<Vec<MatchLine>>,
    },
}

struct PreviewWindow {
    title: String,
    text: String,
    matches: Option<Vec<MatchLine>>,
    open: bool,
}

pub struct FlashFindApp {
    // 查询输入
    tab: SearchTab,
    basic_query: String,
    adv_query: String,
    adv_file_type: String,
    adv_min_mb: String,
    adv_max_mb: String,

    // 会话与派发
    engine: Arc<dyn SearchEngine>,
    dispatcher: Dispatcher,
    search_rx: Receiver<crate::dispatch::SearchEvent>,
    session: SearchSession,
    // 预览高亮复用最近一次派发的关键词
    last_query_text: String,

    // 行操作
    clipboard: ClipboardService,

    // 后台任务回执
    task_tx: Sender<TaskEvent>,
    task_rx: Receiver<TaskEvent>,

    // 结果分页
    page: usize,

    // 工具栏
    index_path: String,

    preview: Option<PreviewWindow>,
    notices: Vec<Notice>,
}

/// 当前页的结果区间
fn page_slice(len: usize, page: usize) -> Range<usize> {
    let start = (page * PAGE_SIZE).min(len);
    let end = (start + PAGE_SIZE).min(len);
    start..end
}

fn total_pages(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE).max(1)
}

/// 表单里的 MB 输入转字节；空串表示"未填写"而非 0
fn parse_mb(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| *v >= 0.0 && v.is_finite())
        .map(|v| (v * 1024.0 * 1024.0) as u64)
}

impl FlashFindApp {
    pub fn new(cc: &eframe::CreationContext<'_>, engine: Arc<dyn SearchEngine>) -> Self {
        install_cjk_fonts(&cc.egui_ctx);

        let (search_tx, search_rx) = mpsc::channel();
        let (task_tx, task_rx) = mpsc::channel();
        let dispatcher = Dispatcher::new(engine.clone(), search_tx);

        // 系统剪贴板不可用时回退到 egui 的延迟复制命令
        let fallback_ctx = cc.egui_ctx.clone();
        let clipboard = ClipboardService::native().with_fallback(Box::new(move |text| {
            fallback_ctx.output_mut(|o| o.copied_text = text.to_string());
            true
        }));

        // 启动即触发一次后台扫描 (上次会话的索引可能已过期)
        spawn_scan(engine.clone(), task_tx.clone());

        Self {
            tab: SearchTab::Basic,
            basic_query: String::new(),
            adv_query: String::new(),
            adv_file_type: String::new(),
            adv_min_mb: String::new(),
            adv_max_mb: String::new(),
            engine,
            dispatcher,
            search_rx,
            session: SearchSession::default(),
            last_query_text: String::new(),
            clipboard,
            task_tx,
            task_rx,
            page: 0,
            index_path: String::new(),
            preview: None,
            notices: Vec::new(),
        }
    }

    fn push_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(Notice {
            level,
            text: text.into(),
            created: Instant::now(),
        });
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.task_rx.try_recv() {
            match event {
                TaskEvent::Notice(level, text) => self.push_notice(level, text),
                TaskEvent::Preview { title, text } => {
                    let matches = self
                        .preview
                        .take()
                        .filter(|p| p.title == title)
                        .and_then(|p| p.matches);
                    self.preview = Some(PreviewWindow {
                        title,
                        text,
                        matches,
                        open: true,
                    });
                }
            }
        }

        while let Ok(event) = self.search_rx.try_recv() {
            match self.session.apply(event) {
                SessionChange::Cleared => self.page = 0,
                SessionChange::Replaced { count } => {
                    self.page = 0;
                    if count == 0 {
                        self.push_notice(NoticeLevel::Info, "未找到匹配的结果");
                    }
                }
                SessionChange::Failed => {
                    self.push_notice(NoticeLevel::Error, "搜索失败，请重试");
                }
                SessionChange::Stale => {}
            }
        }

        self.notices.retain(|n| n.created.elapsed() < NOTICE_TTL);
    }

    fn on_search_basic(&mut self) {
        let query = self.basic_query.clone();
        match self.dispatcher.dispatch_basic(&query) {
            Ok(_) => self.last_query_text = query,
            Err(QueryError::EmptyKeyword) => {
                self.push_notice(NoticeLevel::Warn, "请输入文件名或路径关键字");
            }
            Err(e) => self.push_notice(NoticeLevel::Warn, e.to_string()),
        }
    }

    fn on_search_advanced(&mut self) {
        let file_type = if self.adv_file_type.trim().is_empty() {
            None
        } else {
            Some(self.adv_file_type.trim().to_string())
        };
        let query = self.adv_query.clone();
        match self.dispatcher.dispatch_advanced(
            &query,
            file_type,
            parse_mb(&self.adv_min_mb),
            parse_mb(&self.adv_max_mb),
        ) {
            Ok(_) => self.last_query_text = query,
            Err(QueryError::NoCriteria) => {
                self.push_notice(NoticeLevel::Warn, "请输入至少一个搜索条件");
            }
            Err(e) => self.push_notice(NoticeLevel::Warn, e.to_string()),
        }
    }

    fn on_build_index(&mut self) {
        let path = self.index_path.trim().to_string();
        if path.is_empty() {
            self.push_notice(NoticeLevel::Warn, "请输入要索引的目录路径");
            return;
        }
        let engine = self.engine.clone();
        let tx = self.task_tx.clone();
        std::thread::spawn(move || match engine.build_index(&path) {
            Ok(()) => {
                let _ = tx.send(TaskEvent::Notice(
                    NoticeLevel::Info,
                    "索引构建完成".to_string(),
                ));
            }
            Err(e) => {
                tracing::error!("索引构建失败: {}", e);
                let _ = tx.send(TaskEvent::Notice(
                    NoticeLevel::Error,
                    "索引构建失败".to_string(),
                ));
            }
        });
    }

    fn run_action(&mut self, action: RowAction) {
        match action {
            RowAction::CopyPath(path) => {
                if path.is_empty() {
                    self.push_notice(NoticeLevel::Warn, "无效文件路径");
                    return;
                }
                match self.clipboard.copy_text(&path) {
                    Ok(()) => self.push_notice(NoticeLevel::Info, "文件路径已复制"),
                    Err(e) => {
                        tracing::warn!("复制文件路径失败: {}", e);
                        self.push_notice(NoticeLevel::Error, "复制文件路径失败");
                    }
                }
            }
            RowAction::OpenLocation(path) => {
                if path.is_empty() {
                    self.push_notice(NoticeLevel::Warn, "无效文件路径");
                    return;
                }
                let tx = self.task_tx.clone();
                // 打开文件管理器可能阻塞，丢给工作线程
                std::thread::spawn(move || match actions::open_location(&path) {
                    Ok(()) => {
                        let _ = tx.send(TaskEvent::Notice(
                            NoticeLevel::Info,
                            "已打开文件位置".to_string(),
                        ));
                    }
                    Err(e) => {
                        tracing::warn!("打开文件位置失败: {}", e);
                        let _ = tx.send(TaskEvent::Notice(
                            NoticeLevel::Error,
                            "打开文件位置失败".to_string(),
                        ));
                    }
                });
            }
            RowAction::OpenFile(path) => {
                if path.is_empty() {
                    self.push_notice(NoticeLevel::Warn, "无效文件路径");
                    return;
                }
                std::thread::spawn(move || {
                    if let Err(e) = open::that(&path) {
                        tracing::warn!("打开文件失败: {}", e);
                    }
                });
            }
            RowAction::Preview { path, matches } => {
                if path.is_empty() {
                    self.push_notice(NoticeLevel::Warn, "无效文件路径");
                    return;
                }
                // 先占位记住匹配行，正文回执到达后一并展示
                self.preview = Some(PreviewWindow {
                    title: path.clone(),
                    text: "正在加载预览...".to_string(),
                    matches,
                    open: true,
                });
                let engine = self.engine.clone();
                let tx = self.task_tx.clone();
                let query = self.last_query_text.clone();
                std::thread::spawn(move || match engine.preview_file(&path) {
                    Ok(mut text) => {
                        if text.len() > MAX_PREVIEW_BYTES {
                            let mut cut = MAX_PREVIEW_BYTES;
                            while !text.is_char_boundary(cut) {
                                cut -= 1;
                            }
                            text.truncate(cut);
                        }
                        // 有关键词时让引擎做内容高亮，失败就退回原文
                        let text = if query.trim().is_empty() {
                            text
                        } else {
                            match engine.highlight_content(&text, &query) {
                                Ok(marked) => marked,
                                Err(e) => {
                                    tracing::warn!("内容高亮失败: {}", e);
                                    text
                                }
                            }
                        };
                        let _ = tx.send(TaskEvent::Preview { title: path, text });
                    }
                    Err(e) => {
                        tracing::error!("预览文件失败: {}", e);
                        let _ = tx.send(TaskEvent::Notice(
                            NoticeLevel::Error,
                            "预览文件失败".to_string(),
                        ));
                    }
                });
            }
        }
    }

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("⚡ 闪搜").size(18.0).strong());
            ui.separator();
            ui.label("索引目录:");
            ui.add(
                egui::TextEdit::singleline(&mut self.index_path)
                    .hint_text("输入要建立索引的目录路径")
                    .desired_width(320.0),
            );
            if ui.button("构建索引").clicked() {
                self.on_build_index();
            }
            if ui.button("重新扫描").clicked() {
                spawn_scan(self.engine.clone(), self.task_tx.clone());
            }
        });
    }

    fn show_search_inputs(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.tab, SearchTab::Basic, "🔍 快速搜索");
            ui.selectable_value(&mut self.tab, SearchTab::Advanced, "🛠 高级搜索");
        });
        ui.add_space(8.0);

        match self.tab {
            SearchTab::Basic => {
                ui.horizontal(|ui| {
                    let edit = ui.add(
                        egui::TextEdit::singleline(&mut self.basic_query)
                            .hint_text("输入文件名或路径关键字...")
                            .desired_width(ui.available_width() - 80.0),
                    );
                    let submitted =
                        edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if ui.button("搜索").clicked() || submitted {
                        self.on_search_basic();
                    }
                });
            }
            SearchTab::Advanced => {
                ui.horizontal(|ui| {
                    ui.label("关键词:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.adv_query)
                            .hint_text("文件名或路径关键字")
                            .desired_width(240.0),
                    );
                    ui.label("文件类型:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.adv_file_type)
                            .hint_text("如 pdf")
                            .desired_width(80.0),
                    );
                });
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    ui.label("大小范围 (MB):");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.adv_min_mb)
                            .hint_text("最小")
                            .desired_width(60.0),
                    );
                    ui.label("-");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.adv_max_mb)
                            .hint_text("最大")
                            .desired_width(60.0),
                    );
                    if ui.button("开始搜索").clicked() {
                        self.on_search_advanced();
                    }
                });
            }
        }
    }

    fn show_notices(&mut self, ui: &mut egui::Ui) {
        for notice in &self.notices {
            let color = match notice.level {
                NoticeLevel::Info => egui::Color32::from_rgb(60, 140, 90),
                NoticeLevel::Warn => egui::Color32::from_rgb(220, 150, 30),
                NoticeLevel::Error => egui::Color32::from_rgb(210, 70, 70),
            };
            ui.colored_label(color, &notice.text);
        }
    }

    fn show_results(&mut self, ui: &mut egui::Ui) {
        if self.session.is_loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("正在搜索...");
            });
            return;
        }
        if self.session.results().is_empty() {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.weak("暂无搜索结果");
            });
            return;
        }

        let total = self.session.results().len();

        // 表头：名称 30%, 路径 34%, 大小 9%, 时间 14%, 操作 13%
        ui.horizontal(|ui| {
            let width = ui.available_width();
            let header = |ui: &mut egui::Ui, w: f32, text: &str| {
                ui.add_sized(
                    [w, 20.0],
                    egui::Label::new(egui::RichText::new(text).color(egui::Color32::GRAY)),
                );
            };
            header(ui, width * 0.30, "文件名");
            header(ui, width * 0.34, "路径");
            header(ui, width * 0.09, "大小");
            header(ui, width * 0.14, "修改时间");
            header(ui, width * 0.13, "操作");
        });
        ui.separator();

        let mut pending: Vec<RowAction> = Vec::new();

        for i in page_slice(total, self.page) {
            let row = &self.session.results()[i];
            let has_path = !row.path.is_empty();

            let (rect, response) = ui.allocate_at_least(
                egui::vec2(ui.available_width(), 30.0),
                egui::Sense::click(),
            );
            if response.hovered() {
                ui.painter().rect_filled(
                    rect,
                    4.0,
                    egui::Color32::from_rgba_unmultiplied(120, 160, 255, 20),
                );
            }

            // 右键菜单
            response.context_menu(|ui| {
                if ui.button("复制文件路径").clicked() {
                    pending.push(RowAction::CopyPath(row.path.clone()));
                    ui.close_menu();
                }
                if ui.button("打开所在文件夹").clicked() {
                    pending.push(RowAction::OpenLocation(row.path.clone()));
                    ui.close_menu();
                }
                if ui.button("预览内容").clicked() {
                    pending.push(RowAction::Preview {
                        path: row.path.clone(),
                        matches: row.matches.clone(),
                    });
                    ui.close_menu();
                }
            });

            if response.double_clicked() {
                pending.push(RowAction::OpenFile(row.path.clone()));
            }

            ui.allocate_new_ui(egui::UiBuilder::new().max_rect(rect), |ui| {
                ui.horizontal(|ui| {
                    let width = ui.available_width();

                    ui.allocate_ui_with_layout(
                        egui::vec2(width * 0.30, 26.0),
                        egui::Layout::left_to_right(egui::Align::Center),
                        |ui| {
                            ui.label("📄");
                            let name = if row.name.is_empty() {
                                "未知"
                            } else {
                                row.name.as_str()
                            };
                            ui.add(egui::Label::new(name).truncate());
                            if let Some(matches) = &row.matches {
                                ui.weak(format!("({} 处匹配)", matches.len()));
                            }
                        },
                    );

                    ui.allocate_ui_with_layout(
                        egui::vec2(width * 0.34, 26.0),
                        egui::Layout::left_to_right(egui::Align::Center),
                        |ui| {
                            let path = if has_path {
                                row.path.as_str()
                            } else {
                                "路径不可用"
                            };
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(path)
                                        .color(egui::Color32::from_rgb(140, 140, 150)),
                                )
                                .truncate(),
                            )
                            .on_hover_text(path);
                        },
                    );

                    ui.allocate_ui_with_layout(
                        egui::vec2(width * 0.09, 26.0),
                        egui::Layout::left_to_right(egui::Align::Center),
                        |ui| {
                            ui.label(format_size(row.size_bytes));
                        },
                    );

                    ui.allocate_ui_with_layout(
                        egui::vec2(width * 0.14, 26.0),
                        egui::Layout::left_to_right(egui::Align::Center),
                        |ui| {
                            ui.label(format_modified(row.modified_time));
                        },
                    );

                    ui.allocate_ui_with_layout(
                        egui::vec2(width * 0.13, 26.0),
                        egui::Layout::left_to_right(egui::Align::Center),
                        |ui| {
                            if ui
                                .add_enabled(has_path, egui::Button::new("复制路径").small())
                                .clicked()
                            {
                                pending.push(RowAction::CopyPath(row.path.clone()));
                            }
                            if ui
                                .add_enabled(has_path, egui::Button::new("打开位置").small())
                                .clicked()
                            {
                                pending.push(RowAction::OpenLocation(row.path.clone()));
                            }
                        },
                    );
                });
            });
        }

        // 超过一页才显示分页控件
        if total > PAGE_SIZE {
            let pages = total_pages(total);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(self.page > 0, egui::Button::new("上一页"))
                    .clicked()
                {
                    self.page -= 1;
                }
                ui.label(format!("第 {} / {} 页", self.page + 1, pages));
                if ui
                    .add_enabled(self.page + 1 < pages, egui::Button::new("下一页"))
                    .clicked()
                {
                    self.page += 1;
                }
                ui.separator();
                ui.label(format!("共 {} 条结果", total));
            });
        }

        for action in pending {
            self.run_action(action);
        }
    }

    fn show_preview_window(&mut self, ctx: &egui::Context) {
        if let Some(preview) = &mut self.preview {
            let mut open = preview.open;
            egui::Window::new(format!("预览: {}", preview.title))
                .open(&mut open)
                .default_size([640.0, 480.0])
                .show(ctx, |ui| {
                    if let Some(matches) = &preview.matches {
                        ui.label(egui::RichText::new("匹配行").strong());
                        for m in matches {
                            ui.monospace(format!("{}: {}", m.line, m.content));
                        }
                        ui.separator();
                    }
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.monospace(preview.text.as_str());
                    });
                });
            preview.open = open;
            if !open {
                self.preview = None;
            }
        }
    }
}

impl eframe::App for FlashFindApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        // 持续轮询工作线程回执，搜索应答和提示条才能及时上屏
        ctx.request_repaint_after(Duration::from_millis(100));

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(6.0);
            self.show_toolbar(ui);
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);
            self.show_search_inputs(ui);
            ui.add_space(4.0);
            self.show_notices(ui);
            ui.separator();
            self.show_results(ui);
        });

        self.show_preview_window(ctx);
    }
}

fn spawn_scan(engine: Arc<dyn SearchEngine>, tx: Sender<TaskEvent>) {
    std::thread::spawn(move || match engine.scan() {
        Ok(()) => {
            let _ = tx.send(TaskEvent::Notice(
                NoticeLevel::Info,
                "后台扫描已启动".to_string(),
            ));
        }
        Err(e) => {
            tracing::error!("触发后台扫描失败: {}", e);
            let _ = tx.send(TaskEvent::Notice(
                NoticeLevel::Error,
                "启动后台扫描失败".to_string(),
            ));
        }
    });
}

/// 中文字体探测 (多路径)，找不到就退回 egui 默认字体
fn install_cjk_fonts(ctx: &egui::Context) {
    let candidates = [
        r"C:\Windows\Fonts\msyh.ttc",
        r"C:\Windows\Fonts\simhei.ttf",
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        "/System/Library/Fonts/PingFang.ttc",
    ];

    let mut fonts = egui::FontDefinitions::default();
    for path in &candidates {
        if let Ok(data) = std::fs::read(path) {
            fonts.font_data.insert(
                "cjk".to_owned(),
                egui::FontData::from_owned(data),
            );
            if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Proportional) {
                family.insert(0, "cjk".to_owned());
            }
            if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Monospace) {
                family.push("cjk".to_owned());
            }
            break;
        }
    }
    ctx.set_fonts(fonts);
}
