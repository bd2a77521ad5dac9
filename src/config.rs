// src/config.rs

pub mod file;

use self::file::load_or_create_external_config;
use crate::{cli::Cli, constants, error::AppResult};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};

/// 站点使用哪一套页面解析规则
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum PageExtractorType {
    /// 新版课程大纲页 (`/course/`)
    Current,
    /// 旧版 courseware 手风琴导航
    Classic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteConfig {
    pub url: String,
    /// 课程导航容器的 CSS 选择器，找不到时视为页面结构无法识别
    pub courseware_selector: String,
    pub extractor: PageExtractorType,
}

/// 去重集合的作用范围
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupScope {
    /// 整次抓取共享一个集合，第二门课程中重复出现的资源会被过滤
    #[default]
    Global,
    PerCourse,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    /// 默认不做自动重试
    pub max_retries: Option<u32>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    pub sites: HashMap<String, SiteConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_tool: Option<String>,
    #[serde(default)]
    pub dedup_scope: DedupScope,
}

pub(crate) fn default_sites() -> HashMap<String, SiteConfig> {
    HashMap::from([(
        constants::DEFAULT_PLATFORM.to_string(),
        SiteConfig {
            url: constants::edx::BASE_URL.into(),
            courseware_selector: "nav[aria-label='Course Navigation'], main#main, div.course-outline, div.chapter".into(),
            extractor: PageExtractorType::Current,
        },
    )])
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        let network_config = NetworkConfig {
            connect_timeout_secs: Some(10),
            timeout_secs: Some(60),
            max_retries: Some(0),
            user_agent: None,
        };

        Self {
            network: network_config,
            sites: default_sites(),
            video_tool: None,
            dedup_scope: DedupScope::Global,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub max_workers: usize,
    pub platform: String,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub sites: HashMap<String, SiteConfig>,
    pub video_tool: String,
    pub dedup_scope: DedupScope,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;
        let mut sites = default_sites();
        sites.extend(external_config.sites);

        Ok(Self {
            max_workers: args.workers.unwrap_or(constants::DEFAULT_WORKERS).max(1),
            platform: args.platform.clone(),
            user_agent: external_config
                .network
                .user_agent
                .unwrap_or_else(|| constants::USER_AGENT.into()),
            connect_timeout: Duration::from_secs(
                external_config.network.connect_timeout_secs.unwrap_or(10),
            ),
            timeout: Duration::from_secs(external_config.network.timeout_secs.unwrap_or(60)),
            max_retries: external_config.network.max_retries.unwrap_or(0),
            sites,
            video_tool: external_config
                .video_tool
                .unwrap_or_else(|| constants::DEFAULT_VIDEO_TOOL.into()),
            dedup_scope: external_config.dedup_scope,
        })
    }

    /// 当前平台的站点配置
    pub fn site(&self) -> Option<&SiteConfig> {
        self.sites.get(&self.platform)
    }
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_workers: constants::DEFAULT_WORKERS,
            platform: constants::DEFAULT_PLATFORM.to_string(),
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            max_retries: 0,
            sites: default_sites(),
            video_tool: constants::DEFAULT_VIDEO_TOOL.to_string(),
            dedup_scope: DedupScope::Global,
        }
    }
}
