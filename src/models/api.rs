// src/models/api.rs

use serde::Deserialize;
use std::collections::BTreeMap;

// --- 登录接口 ---

#[derive(Deserialize, Debug, Clone)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    pub value: Option<String>,
}

// --- 视频组件 `data-metadata` 属性 ---

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    /// 形如 "1.00:<youtube id>"
    #[serde(default)]
    pub streams: String,
    #[serde(default)]
    pub sources: Vec<String>,
    /// 语言代码 → 语言名称
    #[serde(default)]
    pub transcript_languages: BTreeMap<String, String>,
    pub transcript_translation_url: Option<String>,
    pub transcript_available_translations_url: Option<String>,
}

impl VideoMetadata {
    /// 去掉倍速前缀后的 YouTube 视频 ID
    pub fn youtube_id(&self) -> Option<&str> {
        let id = self
            .streams
            .split(',')
            .find_map(|s| s.trim().strip_prefix(crate::constants::edx::STREAM_SPEED_PREFIX))
            .unwrap_or(self.streams.trim());
        if id.is_empty() || id.contains(':') {
            None
        } else {
            Some(id)
        }
    }
}

// --- 平台字幕接口 ---

#[derive(Deserialize, Debug, Clone)]
pub struct TranscriptResponse {
    #[serde(default)]
    pub start: Vec<u64>,
    #[serde(default)]
    pub end: Vec<u64>,
    #[serde(default)]
    pub text: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_metadata_youtube_id() {
        let meta: VideoMetadata = serde_json::from_str(
            r#"{"streams": "1.00:abcDEF123", "transcriptLanguages": {"en": "English"}}"#,
        )
        .unwrap();
        assert_eq!(meta.youtube_id(), Some("abcDEF123"));
        assert_eq!(meta.transcript_languages.get("en").map(String::as_str), Some("English"));

        let multi: VideoMetadata =
            serde_json::from_str(r#"{"streams": "0.75:slow1,1.00:normal1"}"#).unwrap();
        assert_eq!(multi.youtube_id(), Some("normal1"));

        let empty = VideoMetadata::default();
        assert_eq!(empty.youtube_id(), None);
    }
}
