// src/persist/aggregate.rs

use crate::{constants::layout, error::AppResult};
use itertools::Itertools;
use log::{debug, info, warn};
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::Value;
use std::{
    cmp::Reverse,
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::LazyLock,
};

static COMPONENT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[data-type]").unwrap());
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.,!?(){}'";:]"#).unwrap());

/// 单元产物的种类，排序决定同一单元内的读取顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ArtifactKind {
    Html,
    Text,
    Problem,
    Video,
}

/// 从 `seq_contents_N{.html,.txt,_prob.txt,_vdo.json}` 中解析出单元序号与产物种类
fn classify_artifact(file_name: &str) -> Option<(usize, ArtifactKind)> {
    let rest = file_name.strip_prefix(layout::UNIT_ID_PREFIX)?;
    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let index = rest[..digits].parse().ok()?;
    let kind = match &rest[digits..] {
        ".html" => ArtifactKind::Html,
        ".txt" => ArtifactKind::Text,
        "_prob.txt" => ArtifactKind::Problem,
        "_vdo.json" => ArtifactKind::Video,
        _ => return None,
    };
    Some((index, kind))
}

#[derive(Debug, Serialize)]
struct TextEntry {
    content: String,
    section: String,
    subsection: String,
    unit_idx: String,
    word_count: String,
}

#[derive(Debug, Serialize)]
struct ComponentEntry {
    section: String,
    subsection: String,
    #[serde(rename = "type")]
    block_type: String,
    unit_idx: String,
}

/// 汇总结果中各类条目的数量
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AggregateSummary {
    pub text_blocks: usize,
    pub quiz_blocks: usize,
    pub video_blocks: usize,
    pub components: usize,
    pub corpus_terms: usize,
}

/// 产物所在位置
struct Location<'a> {
    section: &'a str,
    subsection: &'a str,
    unit_idx: &'a str,
}

impl Location<'_> {
    fn text_entry(&self, content: String) -> TextEntry {
        TextEntry {
            word_count: content.split_whitespace().count().to_string(),
            content,
            section: self.section.to_string(),
            subsection: self.subsection.to_string(),
            unit_idx: self.unit_idx.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct CourseAggregate {
    text_blocks: BTreeMap<String, TextEntry>,
    quiz_blocks: BTreeMap<String, TextEntry>,
    video_blocks: BTreeMap<String, Value>,
    components: BTreeMap<String, ComponentEntry>,
    all_text: String,
}

impl CourseAggregate {
    fn add_text(&mut self, at: &Location<'_>, content: String) {
        self.all_text.push_str(&content);
        self.all_text.push('\n');
        let key = format!("{}{:02}", layout::TEXT_BLOCK_PREFIX, self.text_blocks.len() + 1);
        self.text_blocks.insert(key, at.text_entry(content));
    }

    fn add_problem(&mut self, at: &Location<'_>, content: String) {
        self.all_text.push_str(&content);
        self.all_text.push('\n');
        let key = format!("{}{:02}", layout::QUIZ_BLOCK_PREFIX, self.quiz_blocks.len() + 1);
        self.quiz_blocks.insert(key, at.text_entry(content));
    }

    fn add_videos(&mut self, json: &str, path: &Path) {
        let blocks: BTreeMap<String, Value> = match serde_json::from_str(json) {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!("无法解析视频产物 '{}'，已跳过: {}", path.display(), e);
                return;
            }
        };
        for (key, mut block) in blocks {
            join_string_lists(&mut block);
            self.video_blocks.insert(key, block);
        }
    }

    fn add_components(&mut self, at: &Location<'_>, html: &str) {
        for (data_type, block_type) in component_types(html) {
            let key = format!("{:02}_{}", self.components.len() + 1, data_type);
            self.components.insert(
                key,
                ComponentEntry {
                    section: at.section.to_string(),
                    subsection: at.subsection.to_string(),
                    block_type,
                    unit_idx: at.unit_idx.to_string(),
                },
            );
        }
    }

    async fn write_to(&self, course_dir: &Path) -> AppResult<AggregateSummary> {
        write_json(&course_dir.join(layout::TEXT_COMPONENTS), &self.text_blocks).await?;
        write_json(&course_dir.join(layout::PROBLEM_COMPONENTS), &self.quiz_blocks).await?;
        write_json(&course_dir.join(layout::VIDEO_COMPONENTS), &self.video_blocks).await?;
        write_json(&course_dir.join(layout::ALL_COMPONENTS), &self.components).await?;
        tokio::fs::write(course_dir.join(layout::ALL_TEXT), &self.all_text).await?;

        let frequencies = word_frequencies(&self.all_text);
        let corpus: String = frequencies
            .iter()
            .map(|(stem, count)| format!("{}\t{}\n", stem, count))
            .collect();
        tokio::fs::write(course_dir.join(layout::CORPUS), corpus).await?;

        Ok(AggregateSummary {
            text_blocks: self.text_blocks.len(),
            quiz_blocks: self.quiz_blocks.len(),
            video_blocks: self.video_blocks.len(),
            components: self.components.len(),
            corpus_terms: frequencies.len(),
        })
    }
}

/// 视频记录中的字符串列表合并为以空格分隔的一个字符串
fn join_string_lists(block: &mut Value) {
    let Value::Object(fields) = block else {
        return;
    };
    for value in fields.values_mut() {
        if let Value::Array(items) = value
            && items.iter().all(Value::is_string)
        {
            *value = Value::String(items.iter().filter_map(Value::as_str).join(" "));
        }
    }
}

/// 单元 HTML 中带 `data-type` 的组件，返回 `(data-type, data-block-type)`
fn component_types(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    document
        .select(&COMPONENT_SEL)
        .filter_map(|el| {
            let data_type = el.value().attr("data-type")?;
            let block_type = el.value().attr("data-block-type").unwrap_or_default();
            Some((data_type.to_string(), block_type.to_string()))
        })
        .collect()
}

/// 去掉标点后做英文词干提取并计数，按出现次数降序，次数相同时保持首次出现的顺序
pub fn word_frequencies(text: &str) -> Vec<(String, usize)> {
    let stemmer = Stemmer::create(Algorithm::English);
    let stems: Vec<String> = text
        .split_whitespace()
        .map(|word| PUNCTUATION_RE.replace_all(word, "").to_lowercase())
        .filter(|word| !word.is_empty())
        .map(|word| stemmer.stem(&word).into_owned())
        .collect();
    let counts = stems.iter().counts();
    stems
        .iter()
        .unique()
        .map(|stem| (stem.clone(), counts.get(stem).copied().unwrap_or_default()))
        .sorted_by_key(|(_, count)| Reverse(*count))
        .collect()
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    let json = super::to_pretty_json(value)?;
    tokio::fs::write(path, json).await?;
    debug!("已写入 '{}'", path.display());
    Ok(())
}

/// 按名称排序列出目录下的子目录或文件，目录不存在时返回空列表
async fn sorted_entries(dir: &Path, dirs: bool) -> io::Result<Vec<(String, PathBuf)>> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        if entry.file_type().await?.is_dir() == dirs {
            entries.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// 读取课程目录下 `章节/子章节/单元产物` 的全部文件，写出课程级汇总。
///
/// 输出 `all_textcomp.json`、`all_probcomp.json`、`all_videocomp.json`、
/// `all_comp.json`、`all_text.txt` 与词干词频 `corpus.txt`。
pub async fn aggregate_course(course_dir: &Path) -> AppResult<AggregateSummary> {
    let mut aggregate = CourseAggregate::default();

    for (section, section_path) in sorted_entries(course_dir, true).await? {
        for (subsection, subsection_path) in sorted_entries(&section_path, true).await? {
            let artifacts = sorted_entries(&subsection_path, false)
                .await?
                .into_iter()
                .filter_map(|(name, path)| {
                    let (index, kind) = classify_artifact(&name)?;
                    Some((index, kind, name, path))
                })
                .sorted_by_key(|(index, kind, ..)| (*index, *kind));

            for (_, kind, name, path) in artifacts {
                let contents = tokio::fs::read_to_string(&path).await?;
                let at = Location {
                    section: &section,
                    subsection: &subsection,
                    unit_idx: &name,
                };
                match kind {
                    ArtifactKind::Html => aggregate.add_components(&at, &contents),
                    ArtifactKind::Text => aggregate.add_text(&at, contents),
                    ArtifactKind::Problem => aggregate.add_problem(&at, contents),
                    ArtifactKind::Video => aggregate.add_videos(&contents, &path),
                }
            }
        }
    }

    let summary = aggregate.write_to(course_dir).await?;
    info!(
        "课程汇总已写入 '{}': {} 个文本块, {} 个测验块, {} 个视频块, {} 个组件",
        course_dir.display(),
        summary.text_blocks,
        summary.quiz_blocks,
        summary.video_blocks,
        summary.components
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn write(path: PathBuf, contents: &str) {
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, contents).await.unwrap();
    }

    async fn read_json(path: PathBuf) -> Value {
        serde_json::from_str(&tokio::fs::read_to_string(path).await.unwrap()).unwrap()
    }

    #[test]
    fn test_classify_artifact() {
        assert_eq!(classify_artifact("seq_contents_3.html"), Some((3, ArtifactKind::Html)));
        assert_eq!(classify_artifact("seq_contents_10.txt"), Some((10, ArtifactKind::Text)));
        assert_eq!(
            classify_artifact("seq_contents_0_prob.txt"),
            Some((0, ArtifactKind::Problem))
        );
        assert_eq!(
            classify_artifact("seq_contents_2_vdo.json"),
            Some((2, ArtifactKind::Video))
        );
        assert_eq!(classify_artifact("all_prob_type.txt"), None);
        assert_eq!(classify_artifact("seq_contents_.txt"), None);
        assert_eq!(classify_artifact("seq_contents_1.json"), None);
    }

    #[test]
    fn test_word_frequencies_stem_and_rank() {
        let freq = word_frequencies("Plates move. Running, runs! plate (moving) run");
        assert_eq!(freq[0], ("run".to_string(), 3));
        assert_eq!(freq[1], ("plate".to_string(), 2));
        assert_eq!(freq[2], ("move".to_string(), 2));
        assert_eq!(freq.len(), 3);
        assert!(word_frequencies(" ... ;; ").is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_course_tree() {
        let dir = tempfile::tempdir().unwrap();
        let course = dir.path();
        let lesson1 = course.join("01-Week 1").join("Lesson 1");
        let lesson2 = course.join("01-Week 1").join("Lesson 2");

        write(
            lesson1.join("seq_contents_0.html"),
            r#"<div id="seq_contents_0">
<div data-type="HtmlBlock" data-block-type="html"><p>Plates</p></div>
<div data-type="Problem" data-block-type="problem"></div>
</div>"#,
        )
        .await;
        write(lesson1.join("seq_contents_0.txt"), "Plates move slowly ").await;
        write(lesson1.join("seq_contents_0_prob.txt"), "Which plate moves? Pacific").await;
        write(
            lesson1.join("seq_contents_1_vdo.json"),
            r#"{"video_block_01": {"youtube_url": "https://youtu.be/abc", "tags": ["a", "b"],
                "transcript_en": {"start": [0], "end": [1], "text": ["hi"]}}}"#,
        )
        .await;
        write(lesson1.join("seq_contents_10.txt"), "Later unit").await;
        write(lesson2.join("seq_contents_0.txt"), "Second lesson").await;
        write(course.join("all_prob_type.txt"), "checkbox \n").await;

        let summary = aggregate_course(course).await.unwrap();
        assert_eq!(
            summary,
            AggregateSummary {
                text_blocks: 3,
                quiz_blocks: 1,
                video_blocks: 1,
                components: 2,
                corpus_terms: summary.corpus_terms,
            }
        );

        let text = read_json(course.join(layout::TEXT_COMPONENTS)).await;
        assert_eq!(
            text["text_block_01"],
            json!({
                "content": "Plates move slowly ",
                "section": "01-Week 1",
                "subsection": "Lesson 1",
                "unit_idx": "seq_contents_0.txt",
                "word_count": "3",
            })
        );
        // 单元按序号而不是文件名排序
        assert_eq!(text["text_block_02"]["unit_idx"], json!("seq_contents_10.txt"));
        assert_eq!(text["text_block_03"]["subsection"], json!("Lesson 2"));

        let quiz = read_json(course.join(layout::PROBLEM_COMPONENTS)).await;
        assert_eq!(quiz["quiz_block_01"]["word_count"], json!("4"));

        let videos = read_json(course.join(layout::VIDEO_COMPONENTS)).await;
        assert_eq!(videos["video_block_01"]["tags"], json!("a b"));
        assert_eq!(videos["video_block_01"]["transcript_en"]["text"], json!(["hi"]));

        let components = read_json(course.join(layout::ALL_COMPONENTS)).await;
        assert_eq!(
            components["01_HtmlBlock"],
            json!({
                "section": "01-Week 1",
                "subsection": "Lesson 1",
                "type": "html",
                "unit_idx": "seq_contents_0.html",
            })
        );
        assert_eq!(components["02_Problem"]["type"], json!("problem"));

        let all_text = tokio::fs::read_to_string(course.join(layout::ALL_TEXT)).await.unwrap();
        assert_eq!(
            all_text,
            "Plates move slowly \nWhich plate moves? Pacific\nLater unit\nSecond lesson\n"
        );

        let corpus = tokio::fs::read_to_string(course.join(layout::CORPUS)).await.unwrap();
        assert!(corpus.starts_with("plate\t2\nmove\t2\n"));
        assert_eq!(corpus.lines().count(), summary.corpus_terms);
    }

    #[tokio::test]
    async fn test_aggregate_empty_course_writes_empty_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let summary = aggregate_course(dir.path()).await.unwrap();
        assert_eq!(summary, AggregateSummary::default());
        assert_eq!(read_json(dir.path().join(layout::TEXT_COMPONENTS)).await, json!({}));
        assert_eq!(
            tokio::fs::read_to_string(dir.path().join(layout::CORPUS)).await.unwrap(),
            ""
        );
    }
}
