// src/extractor/utils.rs

use crate::{
    constants,
    error::*,
    models::{Course, Unit, Video, api::VideoMetadata},
};
use itertools::Itertools;
use log::{debug, warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

static METADATA_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[data-metadata]").unwrap());
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static H3_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3").unwrap());
static YOUTUBE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?(?:youtube\.com|youtu\.?be)/").unwrap()
});

/// 按允许的文件扩展名匹配资源链接
pub struct ResourceMatcher {
    re: Option<Regex>,
}

impl ResourceMatcher {
    /// `file_formats` 中的每一项都按正则片段处理 (如 `e?ps`)
    pub fn new(file_formats: &[String]) -> AppResult<Self> {
        // 空列表不匹配任何资源
        if file_formats.is_empty() {
            return Ok(Self { re: None });
        }
        let pattern = format!(r"^[^\x22&]*\.(?:{})$", file_formats.join("|"));
        let re = Regex::new(&pattern).map_err(|e| {
            AppError::Other(anyhow::anyhow!("无效的文件格式列表 {:?}: {}", file_formats, e))
        })?;
        Ok(Self { re: Some(re) })
    }

    pub fn is_match(&self, href: &str) -> bool {
        self.re.as_ref().is_some_and(|re| re.is_match(href))
    }
}

pub fn make_url_absolute(href: &str, base_url: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}{}", base_url.trim_end_matches('/'), href))
}

/// 找出所有 `seq_contents_{n}` 单元块，n 从 0 开始递增，直到某个序号不存在为止
pub fn unit_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    let mut blocks = Vec::new();
    for idx in 0.. {
        let Ok(selector) = Selector::parse(&format!(
            "div#{}{}",
            constants::layout::UNIT_ID_PREFIX,
            idx
        )) else {
            break;
        };
        match document.select(&selector).next() {
            Some(block) => blocks.push(block),
            None => break,
        }
    }
    blocks
}

/// 单元块的实际 HTML。
///
/// 平台把单元内容转义后放在 `seq_contents_{n}` 中，因此没有子元素时取其文本 (已反转义)。
pub fn unit_inner_html(block: ElementRef<'_>) -> String {
    let has_elements = block.children().any(|c| c.value().is_element());
    if has_elements {
        block.inner_html()
    } else {
        block.text().collect()
    }
}

fn parse_video(metadata: &VideoMetadata, base_url: &str) -> Video {
    let video_youtube_url = metadata
        .youtube_id()
        .map(|id| format!("https://youtube.com/watch?v={}", id));
    let base = base_url.trim_end_matches('/');
    let available_subs_url = metadata
        .transcript_available_translations_url
        .as_ref()
        .map(|u| format!("{}{}", base, u));
    let sub_template_url = metadata.transcript_translation_url.as_ref().map(|u| {
        format!(
            "{}{}",
            base,
            u.replace(constants::edx::LANG_PLACEHOLDER, "%s")
        )
    });
    let mp4_urls = metadata
        .sources
        .iter()
        .filter(|u| u.ends_with(".mp4"))
        .unique()
        .cloned()
        .collect();

    Video {
        video_youtube_url,
        available_subs_url,
        sub_template_url,
        mp4_urls,
    }
}

/// 从一个单元的 HTML 中提取视频与资源链接
pub fn extract_unit(unit_html: &str, base_url: &str, matcher: &ResourceMatcher) -> Unit {
    let fragment = Html::parse_fragment(unit_html);

    let videos = fragment
        .select(&METADATA_SEL)
        .filter_map(|el| {
            let raw = el.value().attr("data-metadata")?;
            match serde_json::from_str::<VideoMetadata>(raw) {
                Ok(metadata) => Some(parse_video(&metadata, base_url)),
                Err(e) => {
                    warn!("无法解析视频元数据: {}", e);
                    None
                }
            }
        })
        .collect();

    let mut resources_urls: Vec<String> = Vec::new();
    let mut youtube_links: Vec<String> = Vec::new();
    for anchor in fragment.select(&ANCHOR_SEL) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if matcher.is_match(href) {
            resources_urls.push(make_url_absolute(href, base_url));
        } else if YOUTUBE_LINK_RE.is_match(href) {
            youtube_links.push(href.to_string());
        }
    }
    // YouTube 外链排在文件资源之后
    resources_urls.extend(youtube_links);

    Unit {
        videos,
        resources_urls,
    }
}

/// 解析某个子章节页面的全部单元，丢弃既没有视频也没有资源的单元
pub fn extract_units_from_page(
    page: &str,
    base_url: &str,
    file_formats: &[String],
) -> AppResult<Vec<Unit>> {
    let matcher = ResourceMatcher::new(file_formats)?;
    let document = Html::parse_document(page);
    let units: Vec<Unit> = unit_blocks(&document)
        .into_iter()
        .map(|block| extract_unit(&unit_inner_html(block), base_url, &matcher))
        .filter(|unit| !unit.videos.is_empty() || !unit.resources_urls.is_empty())
        .collect();
    debug!("页面中提取到 {} 个包含资源的单元", units.len());
    Ok(units)
}

/// 课程链接中紧跟在课程 ID 之后的页面名
const COURSE_PAGE_SEGMENTS: &[&str] = &["courseware", "info", "course", "about"];

/// 从课程链接中解析出课程 ID (`/courses/{id}/...`)。
///
/// 新版 ID 只占一段 (`course-v1:Org+Num+Run`)，旧版为 `org/course/run` 三段。
pub fn course_id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/courses/")?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    let id = rest
        .split('/')
        .take_while(|seg| !seg.is_empty() && !COURSE_PAGE_SEGMENTS.contains(seg))
        .join("/");
    (!id.is_empty()).then_some(id)
}

/// 仪表盘中的课程条目，`selector` 因站点版本而异
pub fn extract_courses_with(page: &str, base_url: &str, selector: &Selector) -> Vec<Course> {
    let document = Html::parse_document(page);
    document
        .select(selector)
        .filter_map(|course_el| {
            let name = course_el
                .select(&H3_SEL)
                .next()
                .map(text_of)
                .filter(|n| !n.is_empty())?;
            let href = course_el
                .select(&ANCHOR_SEL)
                .next()
                .and_then(|a| a.value().attr("href"));
            let Some(href) = href else {
                return Some(Course {
                    id: String::new(),
                    name,
                    url: String::new(),
                    state: constants::COURSE_STATE_NOT_STARTED.into(),
                });
            };
            let url = make_url_absolute(href, base_url);
            let trimmed = url.trim_end_matches('/');
            // 已开课的课程才会链接到 info/course 页
            let state = if trimmed.ends_with("info") || trimmed.ends_with("course") {
                constants::COURSE_STATE_STARTED
            } else {
                constants::COURSE_STATE_NOT_STARTED
            };
            let id = course_el
                .value()
                .attr("data-course-key")
                .map(str::to_string)
                .or_else(|| course_id_from_url(&url))
                .unwrap_or_default();
            Some(Course {
                id,
                name,
                url,
                state: state.into(),
            })
        })
        .collect()
}

/// 折叠空白后的元素文本
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().join(" ")
}

pub fn parse_selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|e| {
        AppError::Other(anyhow::anyhow!("无效的 CSS 选择器 '{}': {}", css, e))
    })
}
