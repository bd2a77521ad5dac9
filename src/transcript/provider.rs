// src/transcript/provider.rs

use crate::{error::AppResult, models::TranscriptRecord};
use async_trait::async_trait;

/// 解析字幕所需的视频信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    /// `https://youtu.be/<id>`
    pub youtube_link: String,
    /// 平台字幕接口地址，语言位置保留 `__lang__` 占位符
    pub transcript_url_template: Option<String>,
}

/// 一次字幕查询的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptLookup {
    Found(TranscriptRecord),
    /// 视频没有任何字幕
    NoSubtitles,
    /// 有字幕，但没有请求的语言
    LanguageNotListed,
}

/// 视频元数据来源。平台接口与外部命令行工具各实现一份，由字幕解析状态机选择调用。
#[async_trait]
pub trait VideoMetadataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_transcript(&self, video: &VideoRef, language: &str)
    -> AppResult<TranscriptLookup>;

    /// 视频时长 (秒)
    async fn duration(&self, video: &VideoRef) -> AppResult<u64>;
}
