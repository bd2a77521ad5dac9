// src/lib.rs

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod crawler;
pub mod error;
pub mod extractor;
pub mod models;
pub mod persist;
pub mod session;
pub mod symbols;
pub mod transcript;
pub mod ui;
pub mod utils;
pub mod workflows;

use crate::{
    cli::Cli,
    client::RobustClient,
    config::AppConfig,
    error::{AppError, AppResult},
    session::Credentials,
};
use colored::*;
use log::{debug, info, warn};
use std::sync::Arc;

/// 一次抓取所需的共享状态
#[derive(Clone)]
pub struct CrawlContext {
    pub config: Arc<AppConfig>,
    pub http_client: RobustClient,
    pub args: Arc<Cli>,
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>) -> AppResult<()> {
    debug!(
        "CLI 参数: course_urls={:?}, platform={}, html_dir={:?}, sequential={}",
        args.course_urls, args.platform, args.html_dir, args.sequential
    );

    if args.list_file_formats {
        let formats = constants::DEFAULT_FILE_FORMATS.join(" ");
        ui::box_message("默认提取的文件格式", &[formats.as_str()], |s| s.cyan());
        return Ok(());
    }
    let file_formats = utils::parse_file_formats(&args);
    debug!("文件格式: {:?}", file_formats);

    let credentials = resolve_credentials(&args)?;
    if args.course_urls.is_empty() {
        return Err(AppError::MissingCourseUrl);
    }

    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);
    let http_client = RobustClient::new(config.clone())?;

    let context = CrawlContext {
        config,
        http_client,
        args,
    };
    workflows::run_crawl(&context, &credentials, &file_formats)
        .await
        .map(drop)
}

/// 用户名缺失直接报错；密码缺失时在终端中提示输入
fn resolve_credentials(args: &Cli) -> AppResult<Credentials> {
    let (username, password) =
        config::file::resolve_credentials(args.username.as_deref(), args.password.as_deref());
    let username = username.ok_or(AppError::MissingCredentials)?;
    let password = match password {
        Some(p) => p,
        None => match ui::prompt_hidden("请输入密码") {
            Ok(p) if !p.is_empty() => p,
            Ok(_) => return Err(AppError::MissingCredentials),
            Err(e) => {
                warn!("无法读取密码输入: {}", e);
                return Err(AppError::MissingCredentials);
            }
        },
    };
    info!("使用账号 {} 登录", username);
    Ok(Credentials { username, password })
}
