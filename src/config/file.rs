// src/config/file.rs

use crate::{
    config::ExternalConfig,
    constants,
    error::{AppError, AppResult},
};
use anyhow::{Context, anyhow};
use log::{debug, info};
use std::{fs, path::PathBuf};

pub(super) fn get_config_path() -> AppResult<PathBuf> {
    let path = dirs::home_dir()
        .ok_or_else(|| AppError::Other(anyhow!("无法获取用户主目录")))?
        .join(constants::CONFIG_DIR_NAME)
        .join(constants::CONFIG_FILE_NAME);
    Ok(path)
}

pub(crate) fn load_or_create_external_config() -> AppResult<ExternalConfig> {
    let config_path = get_config_path()?;
    if config_path.is_file() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("读取配置文件 '{}' 失败", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件 '{}' 失败", config_path.display()))
            .map_err(AppError::from)
    } else {
        info!("配置文件 {:?} 不存在，将创建默认配置。", config_path);
        let config = ExternalConfig::default_app_config();

        // 写不进去也不影响本次运行
        let write_result = config_path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| {
                let json_content = serde_json::to_string_pretty(&config)?;
                fs::write(&config_path, json_content)
            });
        if let Err(e) = write_result {
            log::warn!("无法写入默认配置文件 '{}': {}", config_path.display(), e);
        }

        Ok(config)
    }
}

/// 按 命令行 → 环境变量 的顺序查找登录凭据
pub fn resolve_credentials(
    cli_username: Option<&str>,
    cli_password: Option<&str>,
) -> (Option<String>, Option<String>) {
    let pick = |cli: Option<&str>, env_key: &str| -> Option<String> {
        if let Some(value) = cli
            && !value.is_empty()
        {
            debug!("使用来自命令行参数的 {}", env_key);
            return Some(value.to_string());
        }
        if let Ok(value) = std::env::var(env_key)
            && !value.is_empty()
        {
            debug!("使用来自环境变量 {} 的凭据", env_key);
            return Some(value);
        }
        None
    };
    (
        pick(cli_username, "EDX_USERNAME"),
        pick(cli_password, "EDX_PASSWORD"),
    )
}
