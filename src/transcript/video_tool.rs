// src/transcript/video_tool.rs

use super::{
    provider::{TranscriptLookup, VideoMetadataProvider, VideoRef},
    vtt,
};
use crate::error::*;
use async_trait::async_trait;
use log::{debug, warn};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};
use tokio::process::Command;

const NO_SUBTITLES_MARKER: &str = "has no subtitles";
const SUBTITLES_SECTION_MARKER: &str = "Available subtitles for";
const LANGUAGE_TABLE_HEADER: &str = "Language formats";
const WRITING_SUBTITLES_MARKER: &str = "Writing video subtitles to:";

/// 通过 youtube-dl 一类的命令行工具查询视频时长与字幕
pub struct VideoToolProvider {
    program: String,
}

impl VideoToolProvider {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    async fn run<I, S>(&self, args: I) -> AppResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| AppError::VideoTool(format!("无法启动 '{}': {}", self.program, e)))?;
        if !output.status.success() {
            return Err(AppError::VideoTool(format!(
                "'{}' 退出状态 {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn download_subtitle(&self, link: &str, language: &str) -> AppResult<TranscriptLookup> {
        let scratch = tempfile::tempdir()?;
        let template = scratch.path().join("%(id)s.%(ext)s");
        let stdout = self
            .run([
                OsStr::new(link),
                OsStr::new("--skip-download"),
                OsStr::new("--write-sub"),
                OsStr::new("--sub-format"),
                OsStr::new("vtt"),
                OsStr::new("--sub-lang"),
                OsStr::new(language),
                OsStr::new("-o"),
                template.as_os_str(),
            ])
            .await?;

        let path = written_subtitle_path(&stdout, scratch.path()).ok_or_else(|| {
            AppError::VideoTool(format!("'{}' 未写出 {} 字幕文件", self.program, language))
        })?;
        debug!("读取字幕文件: {}", path.display());
        let content = tokio::fs::read_to_string(&path).await?;
        let record = vtt::parse_vtt(&content, language);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("删除临时字幕文件 '{}' 失败: {}", path.display(), e);
        }
        Ok(TranscriptLookup::Found(record?))
    }
}

#[async_trait]
impl VideoMetadataProvider for VideoToolProvider {
    fn name(&self) -> &'static str {
        "video-tool"
    }

    async fn fetch_transcript(
        &self,
        video: &VideoRef,
        language: &str,
    ) -> AppResult<TranscriptLookup> {
        let listing = self.run([video.youtube_link.as_str(), "--list-subs"]).await?;
        if listing.contains(NO_SUBTITLES_MARKER) {
            return Ok(TranscriptLookup::NoSubtitles);
        }
        let languages = subtitle_languages(&listing);
        debug!("'{}' 可用字幕: {:?}", video.youtube_link, languages);
        if !languages.iter().any(|l| l == language) {
            return Ok(TranscriptLookup::LanguageNotListed);
        }
        self.download_subtitle(&video.youtube_link, language).await
    }

    async fn duration(&self, video: &VideoRef) -> AppResult<u64> {
        let out = self.run([video.youtube_link.as_str(), "--get-duration"]).await?;
        parse_duration(&out)
    }
}

/// `H:MM:SS`、`MM:SS` 或 `SS` → 秒数，按冒号分段数判断格式
pub fn parse_duration(raw: &str) -> AppResult<u64> {
    let parts: Vec<u64> = raw
        .trim()
        .split(':')
        .map(|p| {
            p.trim()
                .parse::<u64>()
                .map_err(|_| AppError::VideoTool(format!("无法解析视频时长 '{}'", raw.trim())))
        })
        .collect::<AppResult<_>>()?;
    match parts.as_slice() {
        [s] => Ok(*s),
        [m, s] => Ok(m * 60 + s),
        [h, m, s] => Ok(h * 3600 + m * 60 + s),
        _ => Err(AppError::VideoTool(format!(
            "无法解析视频时长 '{}'",
            raw.trim()
        ))),
    }
}

/// 从 `--list-subs` 的输出中取出人工字幕的语言代码。
///
/// 输出中自动字幕与人工字幕各有一张表，优先取 "Available subtitles for" 之后的那张；
/// 没有该标记时取最后一张表。
pub fn subtitle_languages(listing: &str) -> Vec<String> {
    let section = listing
        .find(SUBTITLES_SECTION_MARKER)
        .map(|pos| &listing[pos..])
        .unwrap_or(listing);
    let Some(table) = section.rsplit_once(LANGUAGE_TABLE_HEADER).map(|(_, t)| t) else {
        return Vec::new();
    };
    table
        .lines()
        .map(str::trim)
        .take_while(|line| !line.starts_with('['))
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.split_whitespace().next())
        .map(|code| code.to_string())
        .collect()
}

/// 工具输出中 "Writing video subtitles to:" 后面的文件路径
pub fn written_subtitle_path(stdout: &str, scratch_dir: &Path) -> Option<PathBuf> {
    let line = stdout
        .lines()
        .find_map(|l| l.split_once(WRITING_SUBTITLES_MARKER).map(|(_, p)| p.trim()))?;
    let path = PathBuf::from(line);
    if path.is_absolute() {
        Some(path)
    } else {
        Some(scratch_dir.join(path))
    }
}
