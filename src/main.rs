// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use edx_crawler::{cli::Cli, error::AppError, run_from_cli, symbols, ui};
use fern::colors::{Color, ColoredLevelConfig};
use log::{error, info, warn};
use std::{path::Path, sync::Arc, time::Duration};

fn init_logger(level: log::LevelFilter, log_file: Option<&Path>) {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Cyan)
        .debug(Color::Magenta);

    let console = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}] [{:<5}] - {}",
                chrono::Local::now().format("%H:%M:%S"),
                colors.color(record.level()),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new()
        .level(level)
        // 依赖库的日志只在调试时有用
        .level_for("reqwest", log::LevelFilter::Warn)
        .level_for("hyper_util", log::LevelFilter::Warn)
        .level_for("html5ever", log::LevelFilter::Warn)
        .level_for("selectors", log::LevelFilter::Warn)
        .chain(console);

    if let Some(path) = log_file {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty())
            && let Err(e) = std::fs::create_dir_all(dir)
        {
            eprintln!("警告: 无法创建日志目录 {:?}: {}", dir, e);
        }
        match fern::log_file(path) {
            Ok(file) => {
                let file_dispatch = fern::Dispatch::new()
                    .format(|out, message, record| {
                        out.finish(format_args!(
                            "[{}] [{:<5}] [{}:{}] - {}",
                            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                            record.level(),
                            record.target(),
                            record.line().unwrap_or(0),
                            message
                        ))
                    })
                    .chain(file);
                dispatch = dispatch.chain(file_dispatch);
            }
            Err(e) => eprintln!("警告: 无法打开日志文件 {:?}: {}", path, e),
        }
    }

    if let Err(e) = dispatch.apply() {
        eprintln!("警告: 日志系统初始化失败: {}", e);
    }
}

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let after_help = format!(
        "示例:\n  # 抓取一门课程的全部章节\n  {bin} -u me@example.com --course-urls \"https://courses.edx.org/courses/course-v1:TokyoTechX+GeoS101x+2T2016/info\"\n\n  # 只抓取第 2 个章节，并逐个解析页面\n  {bin} -u me@example.com --course-urls \"https://...\" --filter-section 2 --sequential\n\n  # 查看默认提取的文件格式\n  {bin} --list-file-formats",
        bin = clap::crate_name!()
    );
    let cmd = Cli::command().after_help(after_help);
    let args = match Cli::from_arg_matches(&cmd.get_matches()) {
        Ok(args) => Arc::new(args),
        Err(e) => e.exit(),
    };
    init_logger(args.log_level(), args.log_file.as_deref());

    // 中断时立即退出，不清理已写出的部分文件
    tokio::spawn(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("无法监听 Ctrl-C 信号: {}", e);
            return;
        }
        warn!("检测到 Ctrl+C，正在退出...");
        println!("\n{} 用户中断程序，已写出的文件将被保留。", *symbols::WARN);
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::process::exit(AppError::UserInterrupt.exit_code());
    });

    if let Err(e) = run_from_cli(args).await {
        let code = e.exit_code();
        match e {
            AppError::UserInterrupt => warn!("程序被用户中断。"),
            _ => {
                error!("程序执行出错: {}", e);
                ui::error(&e.to_string());
            }
        }
        std::process::exit(code);
    }
    info!("程序正常退出。");
}
