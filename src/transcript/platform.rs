// src/transcript/platform.rs

use super::provider::{TranscriptLookup, VideoMetadataProvider, VideoRef};
use crate::{
    client::RobustClient,
    constants,
    error::*,
    models::{TranscriptRecord, api::TranscriptResponse},
};
use async_trait::async_trait;
use log::debug;

/// 通过平台的字幕翻译接口获取字幕
pub struct PlatformTranscriptApi {
    http_client: RobustClient,
}

impl PlatformTranscriptApi {
    pub fn new(http_client: RobustClient) -> Self {
        Self { http_client }
    }
}

/// 将模板中的语言占位符替换为语言代码
pub fn transcript_url(template: &str, language: &str) -> String {
    template.replace(constants::edx::LANG_PLACEHOLDER, language)
}

#[async_trait]
impl VideoMetadataProvider for PlatformTranscriptApi {
    fn name(&self) -> &'static str {
        "platform"
    }

    async fn fetch_transcript(
        &self,
        video: &VideoRef,
        language: &str,
    ) -> AppResult<TranscriptLookup> {
        let template = video.transcript_url_template.as_deref().ok_or_else(|| {
            AppError::TranscriptParse(format!("视频 '{}' 未提供字幕接口地址", video.youtube_link))
        })?;
        let url = transcript_url(template, language);
        debug!("请求平台字幕: {}", url);
        let res: TranscriptResponse = self.http_client.get_json(&url).await?;
        Ok(TranscriptLookup::Found(TranscriptRecord {
            language: language.to_string(),
            start: res.start,
            end: res.end,
            text: res.text,
        }))
    }

    async fn duration(&self, video: &VideoRef) -> AppResult<u64> {
        Err(AppError::VideoTool(format!(
            "平台接口不提供视频时长: {}",
            video.youtube_link
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_url() {
        assert_eq!(
            transcript_url("https://courses.edx.org/x/transcript/translation/__lang__", "zh"),
            "https://courses.edx.org/x/transcript/translation/zh"
        );
    }
}
