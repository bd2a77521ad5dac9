// src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("必须提供用户名和密码才能登录")]
    MissingCredentials,
    #[error("登录失败: {0}")]
    AuthenticationFailed(String),
    #[error("必须至少提供一个课程链接")]
    MissingCourseUrl,
    #[error("提供的课程链接均不在已开课的课程列表中")]
    InvalidCourseUrl,
    #[error("不支持的站点: {0}")]
    UnsupportedSite(String),
    #[error("无法识别页面 '{url}' 的结构: {reason}")]
    SiteStructure { url: String, reason: String },
    #[error("未找到任何可下载的内容")]
    NoDownloadableContent,
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),
    #[error("网络中间件错误: {0}")]
    NetworkMiddleware(#[from] reqwest_middleware::Error),
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL 解析错误: {0}")]
    Url(#[from] url::ParseError),
    #[error("视频工具调用失败: {0}")]
    VideoTool(String),
    #[error("字幕解析失败: {0}")]
    TranscriptParse(String),
    #[error("用户中断")]
    UserInterrupt,
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// 进程退出码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Ok = 0,
    MissingCredentials = 1,
    WrongEmailOrPassword = 2,
    MissingCourseUrl = 3,
    InvalidCourseUrl = 4,
    UnknownPlatform = 5,
    NoDownloadableVideo = 6,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl AppError {
    /// 致命错误对应的退出码；其余错误统一返回 1
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::MissingCredentials => ExitCode::MissingCredentials.code(),
            AppError::AuthenticationFailed(_) => ExitCode::WrongEmailOrPassword.code(),
            AppError::MissingCourseUrl => ExitCode::MissingCourseUrl.code(),
            AppError::InvalidCourseUrl => ExitCode::InvalidCourseUrl.code(),
            AppError::UnsupportedSite(_) => ExitCode::UnknownPlatform.code(),
            AppError::NoDownloadableContent => ExitCode::NoDownloadableVideo.code(),
            AppError::UserInterrupt => ExitCode::Ok.code(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::MissingCredentials.exit_code(), 1);
        assert_eq!(AppError::AuthenticationFailed("x".into()).exit_code(), 2);
        assert_eq!(AppError::InvalidCourseUrl.exit_code(), 4);
        assert_eq!(AppError::NoDownloadableContent.exit_code(), 6);
        // 中断以成功码退出
        assert_eq!(AppError::UserInterrupt.exit_code(), 0);
        assert_eq!(AppError::VideoTool("boom".into()).exit_code(), 1);
    }
}
