#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::sync::Arc;

use clap::Parser;
use eframe::egui;

use flashfind::cli;
use flashfind::engine::IpcEngine;
use flashfind::gui::FlashFindApp;

fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .init();

    let args = cli::CliArgs::parse();
    if args.is_headless() {
        return cli::run_cli(args);
    }

    let engine = Arc::new(IpcEngine::new()?);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("闪搜 FlashFind")
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([600.0, 400.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "flashfind",
        options,
        Box::new(move |cc| Ok(Box::new(FlashFindApp::new(cc, engine)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI 运行失败: {}", e))?;

    Ok(())
}
