// src/cli.rs

use crate::constants;
use clap::{Parser, crate_version};
use std::path::PathBuf;

// command 属性
#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    disable_help_flag = true,
    disable_version_flag = true,
)]
pub struct Cli {
    // --- 抓取目标 (Target) ---
    /// 目标课程链接 (例如 https://courses.edx.org/courses/course-v1:TokyoTechX+GeoS101x+2T2016/course/)
    #[arg(long = "course-urls", visible_alias = "url", num_args = 1.., value_name = "URL", help_heading = "Target")]
    pub course_urls: Vec<String>,
    /// edX 用户名 (邮箱)
    #[arg(short, long, help_heading = "Target")]
    pub username: Option<String>,
    /// edX 密码 (不提供时将在终端中提示输入)
    #[arg(short, long, help_heading = "Target")]
    pub password: Option<String>,
    /// 平台名称，对应配置文件中的站点
    #[arg(short = 'x', long, default_value_t = constants::DEFAULT_PLATFORM.to_string(), help_heading = "Target")]
    pub platform: String,

    // --- 抓取选项 (Options) ---
    /// 数据保存目录
    #[arg(short = 'd', long, value_name = "DIR", default_value_os_t = PathBuf::from(constants::DEFAULT_HTML_DIR), help_heading = "Options")]
    pub html_dir: PathBuf,
    /// 只抓取指定序号的章节 (从 1 开始，无效值表示全部)
    #[arg(long, value_name = "INDEX", help_heading = "Options")]
    pub filter_section: Option<String>,
    /// 列出默认提取的文件格式并退出
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub list_file_formats: bool,
    /// 追加需要提取的文件格式 (逗号分隔)
    #[arg(long, value_name = "FORMATS", help_heading = "Options")]
    pub file_formats: Option<String>,
    /// 用 --file-formats 覆盖默认文件格式，而不是追加
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub overwrite_file_formats: bool,
    /// 逐个解析页面 (便于调试)，默认并发解析
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub sequential: bool,
    /// 设置并发解析的最大任务数
    #[arg(short, long, value_parser = clap::value_parser!(usize), help_heading = "Options")]
    pub workers: Option<usize>,

    // --- 通用选项 (General) ---
    /// 只输出错误信息
    #[arg(short, long, action = clap::ArgAction::SetTrue, conflicts_with = "debug", help_heading = "General")]
    pub quiet: bool,
    /// 输出大量调试信息
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "General")]
    pub debug: bool,
    /// 同时将日志写入该文件
    #[arg(long, value_name = "FILE", help_heading = "General")]
    pub log_file: Option<PathBuf>,
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else if self.quiet {
            log::LevelFilter::Error
        } else {
            log::LevelFilter::Info
        }
    }
}
