// src/extractor/classic.rs

use super::{PageExtractor, utils};
use crate::{
    config::SiteConfig,
    error::*,
    models::{Course, Section, SubSection},
};
use log::debug;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static COURSE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article.course").unwrap());
static CHAPTER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.chapter").unwrap());
static CHAPTER_NAME_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3 a, h3").unwrap());
static ITEM_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul > li").unwrap());
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static ITEM_NAME_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a p").unwrap());

/// 旧版 Open edX 的 courseware 手风琴导航
pub struct ClassicEdxExtractor {
    courseware: Selector,
}

impl ClassicEdxExtractor {
    pub fn new(site: &SiteConfig) -> AppResult<Self> {
        Ok(Self {
            courseware: utils::parse_selector(&site.courseware_selector)?,
        })
    }
}

impl PageExtractor for ClassicEdxExtractor {
    fn name(&self) -> &'static str {
        "classic"
    }

    fn extract_courses(&self, page: &str, base_url: &str) -> AppResult<Vec<Course>> {
        Ok(utils::extract_courses_with(page, base_url, &COURSE_SEL))
    }

    fn extract_sections(&self, page: &str, base_url: &str) -> AppResult<Vec<Section>> {
        let document = Html::parse_document(page);
        if document.select(&self.courseware).next().is_none() {
            return Err(AppError::SiteStructure {
                url: base_url.to_string(),
                reason: "未找到 courseware 导航".to_string(),
            });
        }

        let mut sections = Vec::new();
        for chapter in document.select(&CHAPTER_SEL) {
            let Some(name) = chapter
                .select(&CHAPTER_NAME_SEL)
                .next()
                .map(utils::text_of)
                .filter(|n| !n.is_empty())
            else {
                continue;
            };
            let subsections = chapter
                .select(&ITEM_SEL)
                .filter_map(|item| {
                    let href = item.select(&LINK_SEL).next()?.value().attr("href")?;
                    let name = item
                        .select(&ITEM_NAME_SEL)
                        .next()
                        .map(utils::text_of)
                        .filter(|n| !n.is_empty());
                    Some((name, utils::make_url_absolute(href, base_url)))
                })
                .enumerate()
                .map(|(i, (name, url))| SubSection {
                    position: i + 1,
                    name,
                    url,
                })
                .collect();
            sections.push(Section {
                position: sections.len() + 1,
                name,
                url: String::new(),
                subsections,
            });
        }
        debug!("courseware 中解析到 {} 个章节", sections.len());
        Ok(sections)
    }
}
