// src/persist/components.rs

use crate::{
    constants::{self, block_types},
    extractor::utils::{unit_blocks, unit_inner_html},
    models::api::VideoMetadata,
    transcript::VideoRef,
};
use log::{debug, warn};
use scraper::{ElementRef, Html, Selector};
use std::{collections::BTreeMap, sync::LazyLock};

static HTML_BLOCK_SEL: LazyLock<Selector> = LazyLock::new(|| block_selector(block_types::HTML));
static PROBLEM_BLOCK_SEL: LazyLock<Selector> =
    LazyLock::new(|| block_selector(block_types::PROBLEM));
static VIDEO_BLOCK_SEL: LazyLock<Selector> = LazyLock::new(|| block_selector(block_types::VIDEO));
static DATA_CONTENT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[data-content]").unwrap());
static DATA_METADATA_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[data-metadata]").unwrap());
static HTML_TEXT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6, p, li").unwrap());
static PROBLEM_TEXT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6, p, label, legend").unwrap());
static DIV_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());
static INPUT_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input").unwrap());

fn block_selector(block_type: &str) -> Selector {
    Selector::parse(&format!(r#"div[data-block-type="{}"]"#, block_type)).unwrap()
}

/// 题目类型所在的 `div` 在题目内容中的序号 (从 0 开始)
const PROBLEM_TYPE_DIV_INDEX: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemComponent {
    pub text: String,
    /// 无法判断时为 `None`
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoComponent {
    pub video: VideoRef,
    /// 语言代码 → 页面上显示的语言名称
    pub languages: BTreeMap<String, String>,
}

/// 一个 `seq_contents_{n}` 单元块中识别出的全部组件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitContent {
    pub index: usize,
    /// 单元块原始 HTML
    pub raw_html: String,
    /// 文本组件内容；单元中没有文本组件时为 `None`
    pub text: Option<String>,
    pub problems: Vec<ProblemComponent>,
    pub videos: Vec<VideoComponent>,
}

impl UnitContent {
    pub fn label(&self) -> String {
        format!("{}{}", constants::layout::UNIT_ID_PREFIX, self.index)
    }

    /// 所有题目文本拼接在一起
    pub fn problem_text(&self) -> String {
        self.problems.iter().map(|p| p.text.as_str()).collect()
    }
}

fn collect_text(root: ElementRef<'_>, selector: &Selector) -> String {
    root.select(selector)
        .map(|el| format!("{} ", el.text().collect::<String>()))
        .collect()
}

fn html_text(fragment: &Html) -> Option<String> {
    let blocks: Vec<_> = fragment.select(&HTML_BLOCK_SEL).collect();
    if blocks.is_empty() {
        return None;
    }
    Some(
        blocks
            .into_iter()
            .map(|block| collect_text(block, &HTML_TEXT_SEL))
            .collect(),
    )
}

/// 根据题目内容中固定位置的 `div` 的 class 判断题型。
///
/// 单选与多选共用 `choicegroup`，靠第一个 `input` 的 type 区分；
/// 填空与下拉共用 `inputtype`，靠第二个 class 区分。
pub fn classify_problem(content: &Html) -> Option<String> {
    let type_div = content.select(&DIV_SEL).nth(PROBLEM_TYPE_DIV_INDEX)?;
    let classes: Vec<&str> = type_div
        .value()
        .attr("class")
        .map(|c| c.split_whitespace().collect())
        .unwrap_or_default();
    let primary = *classes.first()?;
    let kind = match primary {
        "choicegroup" => {
            let input_type = content
                .select(&INPUT_SEL)
                .next()
                .and_then(|input| input.value().attr("type"));
            if input_type == Some("checkbox") {
                "checkbox"
            } else {
                "multichoice"
            }
        }
        "inputtype" => {
            if classes.get(1) == Some(&"option-input") {
                "droplist"
            } else {
                "fillblank"
            }
        }
        other => other,
    };
    Some(kind.to_string())
}

fn problem_components(fragment: &Html) -> Vec<ProblemComponent> {
    fragment
        .select(&PROBLEM_BLOCK_SEL)
        .filter_map(|block| {
            let raw = block
                .select(&DATA_CONTENT_SEL)
                .next()
                .and_then(|el| el.value().attr("data-content"))?;
            let content = Html::parse_fragment(raw);
            let text = collect_text(content.root_element(), &PROBLEM_TEXT_SEL);
            let kind = classify_problem(&content);
            if kind.is_none() {
                debug!("无法识别题目类型");
            }
            Some(ProblemComponent { text, kind })
        })
        .collect()
}

fn video_components(fragment: &Html, base_url: &str) -> Vec<VideoComponent> {
    let base = base_url.trim_end_matches('/');
    fragment
        .select(&VIDEO_BLOCK_SEL)
        .filter_map(|block| {
            let raw = block
                .select(&DATA_METADATA_SEL)
                .next()
                .and_then(|el| el.value().attr("data-metadata"))?;
            let metadata: VideoMetadata = match serde_json::from_str(raw) {
                Ok(m) => m,
                Err(e) => {
                    warn!("无法解析视频组件元数据: {}", e);
                    return None;
                }
            };
            let Some(id) = metadata.youtube_id() else {
                warn!("视频组件缺少 YouTube 视频 ID，已跳过");
                return None;
            };
            let transcript_url_template = metadata
                .transcript_translation_url
                .as_deref()
                .map(|u| format!("{}/{}", base, u.trim_start_matches('/')));
            Some(VideoComponent {
                video: VideoRef {
                    youtube_link: format!("{}{}", constants::edx::YOUTUBE_SHORT_URL, id),
                    transcript_url_template,
                },
                languages: metadata.transcript_languages,
            })
        })
        .collect()
}

/// 解析子章节页面中的所有单元块并识别其中的文本、题目与视频组件
pub fn parse_unit_contents(page: &str, base_url: &str) -> Vec<UnitContent> {
    let document = Html::parse_document(page);
    unit_blocks(&document)
        .into_iter()
        .enumerate()
        .map(|(index, block)| {
            let inner = unit_inner_html(block);
            let fragment = Html::parse_fragment(&inner);
            UnitContent {
                index,
                raw_html: format!(
                    "<div id=\"{}{}\">\n{}\n</div>",
                    constants::layout::UNIT_ID_PREFIX,
                    index,
                    inner
                ),
                text: html_text(&fragment),
                problems: problem_components(&fragment),
                videos: video_components(&fragment, base_url),
            }
        })
        .collect()
}
