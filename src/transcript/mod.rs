// src/transcript/mod.rs

pub mod platform;
pub mod provider;
pub mod video_tool;
pub mod vtt;

pub use platform::PlatformTranscriptApi;
pub use provider::{TranscriptLookup, VideoMetadataProvider, VideoRef};
pub use video_tool::VideoToolProvider;

use crate::models::{
    ErrorContext, ExtractionError, ExtractionErrorKind, Transcript, TranscriptRecord,
};
use log::{debug, info, warn};
use std::sync::Arc;

/// 单个 (视频, 语言) 的解析结果。失败时携带一条待写入错误报告的记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub transcript: Transcript,
    pub error: Option<ExtractionError>,
}

impl Resolution {
    fn resolved(record: TranscriptRecord) -> Self {
        Self {
            transcript: Transcript::Resolved(record),
            error: None,
        }
    }

    fn failed(kind: ExtractionErrorKind, message: String, context: &ErrorContext) -> Self {
        Self {
            transcript: Transcript::Empty,
            error: Some(ExtractionError {
                kind,
                message,
                context: context.clone(),
            }),
        }
    }
}

enum State {
    TryPrimary,
    TryFallback { primary_failure: String },
    Done(Resolution),
}

/// 平台接口优先、外部工具兜底的字幕解析器。任何路径都以 `Resolution` 结束，不会返回错误。
#[derive(Clone)]
pub struct TranscriptResolver {
    primary: Arc<dyn VideoMetadataProvider>,
    fallback: Arc<dyn VideoMetadataProvider>,
}

impl TranscriptResolver {
    pub fn new(
        primary: Arc<dyn VideoMetadataProvider>,
        fallback: Arc<dyn VideoMetadataProvider>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// `context` 中的 `language` 为页面上显示的语言名称，用于错误报告
    pub async fn resolve(
        &self,
        video: &VideoRef,
        language: &str,
        context: &ErrorContext,
    ) -> Resolution {
        let mut state = State::TryPrimary;
        loop {
            state = match state {
                State::TryPrimary => match self.primary.fetch_transcript(video, language).await {
                    Ok(TranscriptLookup::Found(record)) => {
                        debug!("{} 提供了 '{}' 的 {} 字幕", self.primary.name(), video.youtube_link, language);
                        State::Done(Resolution::resolved(record))
                    }
                    Ok(other) => State::TryFallback {
                        primary_failure: format!("{} 未返回字幕 ({:?})", self.primary.name(), other),
                    },
                    Err(e) => {
                        warn!("无法从 {} 获取 '{}' 的 {} 字幕: {}", self.primary.name(), video.youtube_link, language, e);
                        State::TryFallback {
                            primary_failure: e.to_string(),
                        }
                    }
                },
                State::TryFallback { primary_failure } => {
                    match self.fallback.fetch_transcript(video, language).await {
                        Ok(TranscriptLookup::Found(record)) => {
                            info!("已通过 {} 获取 '{}' 的 {} 字幕", self.fallback.name(), video.youtube_link, language);
                            State::Done(Resolution::resolved(record))
                        }
                        Ok(TranscriptLookup::NoSubtitles | TranscriptLookup::LanguageNotListed) => {
                            warn!("'{}' 没有可用的 {} 字幕", video.youtube_link, language);
                            State::Done(Resolution::failed(
                                ExtractionErrorKind::NoTranscriptAvailable,
                                primary_failure,
                                context,
                            ))
                        }
                        Err(e) => {
                            warn!("{} 获取 '{}' 的字幕失败: {}", self.fallback.name(), video.youtube_link, e);
                            State::Done(Resolution::failed(
                                ExtractionErrorKind::TranscriptFetchFailed,
                                e.to_string(),
                                context,
                            ))
                        }
                    }
                }
                State::Done(resolution) => return resolution,
            };
        }
    }

    /// 视频时长 (秒)，每个视频只查询一次；工具失败时返回 `None`
    pub async fn duration(&self, video: &VideoRef) -> Option<u64> {
        match self.fallback.duration(video).await {
            Ok(secs) => Some(secs),
            Err(e) => {
                warn!("无法获取 '{}' 的时长: {}", video.youtube_link, e);
                None
            }
        }
    }
}
