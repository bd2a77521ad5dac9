// src/transcript/vtt.rs

use crate::{error::*, models::TranscriptRecord};
use regex::Regex;
use std::sync::LazyLock;

static TIMESTAMP_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.:,]+").unwrap());

/// `HH:MM:SS.mmm` 或 `MM:SS.mmm` → 毫秒。每一段都按整数显式解析。
pub fn timestamp_to_millis(ts: &str) -> AppResult<u64> {
    let parts: Vec<u64> = TIMESTAMP_SPLIT_RE
        .split(ts.trim())
        .map(|p| {
            p.parse::<u64>()
                .map_err(|_| AppError::TranscriptParse(format!("无效的时间戳 '{}'", ts)))
        })
        .collect::<AppResult<_>>()?;
    let (h, m, s, ms) = match parts.as_slice() {
        [h, m, s, ms] => (*h, *m, *s, *ms),
        [m, s, ms] => (0, *m, *s, *ms),
        _ => {
            return Err(AppError::TranscriptParse(format!(
                "无效的时间戳 '{}'",
                ts
            )));
        }
    };
    Ok(h * 3_600_000 + m * 60_000 + s * 1_000 + ms)
}

/// 将 WebVTT 字幕文本转换为字幕记录
pub fn parse_vtt(content: &str, language: &str) -> AppResult<TranscriptRecord> {
    let mut record = TranscriptRecord {
        language: language.to_string(),
        start: Vec::new(),
        end: Vec::new(),
        text: Vec::new(),
    };

    let mut lines = content.lines().map(|l| l.trim_end_matches('\r'));
    while let Some(line) = lines.next() {
        let Some((start, rest)) = line.split_once("-->") else {
            continue;
        };
        // 结束时间后面可能跟着 cue 设置，如 "align:start position:0%"
        let end = rest.split_whitespace().next().unwrap_or_default();
        record.start.push(timestamp_to_millis(start)?);
        record.end.push(timestamp_to_millis(end)?);

        let mut cue_text = Vec::new();
        for text_line in lines.by_ref() {
            if text_line.trim().is_empty() {
                break;
            }
            cue_text.push(text_line.trim());
        }
        record.text.push(cue_text.join("\n"));
    }
    Ok(record)
}
