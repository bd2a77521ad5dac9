// src/models/mod.rs

pub mod api;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub url: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSection {
    pub position: usize,
    /// 页面上可能缺失，写盘时以 `Untitled` 代替
    pub name: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// 从 1 开始，与页面顺序一致
    pub position: usize,
    pub name: String,
    pub url: String,
    pub subsections: Vec<SubSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub video_youtube_url: Option<String>,
    pub available_subs_url: Option<String>,
    pub sub_template_url: Option<String>,
    pub mp4_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub videos: Vec<Video>,
    pub resources_urls: Vec<String>,
}

/// 子章节 URL → 单元列表。按插入顺序迭代，比较时只看键值对，与顺序无关。
#[derive(Debug, Clone, Default)]
pub struct UnitsByUrl {
    entries: Vec<(String, Vec<Unit>)>,
    index: HashMap<String, usize>,
}

impl UnitsByUrl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: String, units: Vec<Unit>) {
        match self.index.get(&url) {
            Some(&slot) => self.entries[slot].1 = units,
            None => {
                self.index.insert(url.clone(), self.entries.len());
                self.entries.push((url, units));
            }
        }
    }

    pub fn get(&self, url: &str) -> Option<&[Unit]> {
        self.index
            .get(url)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Unit])> {
        self.entries
            .iter()
            .map(|(url, units)| (url.as_str(), units.as_slice()))
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(url, _)| url.as_str())
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.entries.iter().flat_map(|(_, units)| units.iter())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for UnitsByUrl {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(url, units)| other.get(url) == Some(units))
    }
}

impl Eq for UnitsByUrl {}

impl FromIterator<(String, Vec<Unit>)> for UnitsByUrl {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Unit>)>>(iter: I) -> Self {
        let mut map = UnitsByUrl::new();
        for (url, units) in iter {
            map.insert(url, units);
        }
        map
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub language: String,
    pub start: Vec<u64>,
    pub end: Vec<u64>,
    pub text: Vec<String>,
}

/// 某个 (视频, 语言) 组合的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    Resolved(TranscriptRecord),
    Empty,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        matches!(self, Transcript::Empty)
    }

    /// 写入 `_vdo.json` 时使用的形态；未解析到的字幕保持 `{"start":"","end":"","text":""}`
    pub fn to_artifact_value(&self) -> Value {
        match self {
            Transcript::Resolved(record) => json!({
                "start": record.start,
                "end": record.end,
                "text": record.text,
            }),
            Transcript::Empty => json!({ "start": "", "end": "", "text": "" }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    NoTranscriptAvailable,
    TranscriptFetchFailed,
}

impl fmt::Display for ExtractionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionErrorKind::NoTranscriptAvailable => write!(f, "no transcript available"),
            ExtractionErrorKind::TranscriptFetchFailed => write!(f, "transcript fetch failed"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub video_url: String,
    pub language: String,
    pub section: String,
    pub subsection: String,
    pub unit_index: String,
}

/// 写入课程错误报告的一条记录，从不向调用者抛出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionError {
    pub kind: ExtractionErrorKind,
    pub message: String,
    pub context: ErrorContext,
}

impl ExtractionError {
    pub fn to_report_entry(&self) -> String {
        format!(
            "---------------------------------\n\
             transcript error: {}: {}\n\
             video url: {}\n\
             language: {}\n\
             section:  {}\n\
             subsection: {}\n\
             unit_idx: {}\n\
             ---------------------------------\n",
            self.kind,
            self.message,
            self.context.video_url,
            self.context.language,
            self.context.section,
            self.context.subsection,
            self.context.unit_index,
        )
    }
}
