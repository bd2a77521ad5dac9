// src/extractor/edx.rs

use super::{PageExtractor, utils};
use crate::{
    config::SiteConfig,
    error::*,
    models::{Course, Section, SubSection},
};
use log::{debug, trace};
use scraper::{Html, Selector};
use std::sync::LazyLock;

static COURSE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.course-item, div.course").unwrap());
static SECTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.outline-item.section").unwrap());
static SECTION_TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".section-title").unwrap());
static SUBSECTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.subsection").unwrap());
static SUBSECTION_TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".subsection-title").unwrap());
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// 新版课程大纲页 (`/courses/{id}/course/`)
pub struct CurrentEdxExtractor {
    courseware: Selector,
}

impl CurrentEdxExtractor {
    pub fn new(site: &SiteConfig) -> AppResult<Self> {
        Ok(Self {
            courseware: utils::parse_selector(&site.courseware_selector)?,
        })
    }
}

impl PageExtractor for CurrentEdxExtractor {
    fn name(&self) -> &'static str {
        "edx"
    }

    fn extract_courses(&self, page: &str, base_url: &str) -> AppResult<Vec<Course>> {
        let courses = utils::extract_courses_with(page, base_url, &COURSE_SEL);
        debug!("仪表盘中解析到 {} 门课程", courses.len());
        Ok(courses)
    }

    fn extract_sections(&self, page: &str, base_url: &str) -> AppResult<Vec<Section>> {
        let document = Html::parse_document(page);

        let sections: Vec<Section> = document
            .select(&SECTION_SEL)
            .filter_map(|section_el| {
                // 名称无法解析的章节直接忽略
                let name = section_el
                    .select(&SECTION_TITLE_SEL)
                    .next()
                    .map(utils::text_of)
                    .filter(|n| !n.is_empty())?;
                let url = section_el
                    .select(&LINK_SEL)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| utils::make_url_absolute(href, base_url))
                    .unwrap_or_default();
                let subsections = section_el
                    .select(&SUBSECTION_SEL)
                    .filter_map(|sub_el| {
                        let href = sub_el
                            .select(&LINK_SEL)
                            .next()
                            .and_then(|a| a.value().attr("href"))?;
                        let name = sub_el
                            .select(&SUBSECTION_TITLE_SEL)
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
                Some((name, url, subsections))
            })
            .enumerate()
            .map(|(i, (name, url, subsections))| Section {
                position: i + 1,
                name,
                url,
                subsections,
            })
            .collect();

        if sections.is_empty() && document.select(&self.courseware).next().is_none() {
            return Err(AppError::SiteStructure {
                url: base_url.to_string(),
                reason: "未找到课程导航或章节列表".to_string(),
            });
        }
        trace!("解析到的章节: {:?}", sections);
        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_sites;

    const BASE: &str = "https://courses.edx.org";

    fn extractor() -> CurrentEdxExtractor {
        CurrentEdxExtractor::new(&default_sites()["edx"]).unwrap()
    }

    #[test]
    fn test_extract_sections_keeps_order_and_defaults_missing_names() {
        let page = r#"<main id="main"><ol>
          <li class="outline-item section">
            <h3 class="section-title">Week 1</h3>
            <ol>
              <li class="subsection"><a href="/courses/c/jump/s1"><h4 class="subsection-title">Intro</h4></a></li>
              <li class="subsection"><a href="/courses/c/jump/s2"></a></li>
            </ol>
          </li>
          <li class="outline-item section"><ol></ol></li>
          <li class="outline-item section">
            <h3 class="section-title">  Week 2 </h3>
            <ol><li class="subsection"><a href="https://other/s3"><h4 class="subsection-title">Wrap</h4></a></li></ol>
          </li>
        </ol></main>"#;

        let sections = extractor().extract_sections(page, BASE).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].position, 1);
        assert_eq!(sections[1].position, 2);
        assert_eq!(sections[1].name, "Week 2");

        let subs = &sections[0].subsections;
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].name.as_deref(), Some("Intro"));
        assert_eq!(subs[0].url, "https://courses.edx.org/courses/c/jump/s1");
        assert_eq!(subs[1].name, None);
        assert_eq!(sections[1].subsections[0].url, "https://other/s3");
    }

    #[test]
    fn test_unrecognized_page_is_structure_error() {
        let err = extractor()
            .extract_sections("<html><body><p>login</p></body></html>", BASE)
            .err()
            .unwrap();
        assert!(matches!(err, AppError::SiteStructure { .. }));
    }

    #[test]
    fn test_extract_courses_from_dashboard() {
        let page = r#"<ul>
          <li class="course-item"><h3>Geoscience</h3><a href="/courses/course-v1:T+G+1/course/">go</a></li>
          <li class="course-item"><h3>Future</h3><a href="/courses/course-v1:T+F+1/about">about</a></li>
        </ul>"#;
        let courses = extractor().extract_courses(page, BASE).unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].id, "course-v1:T+G+1");
        assert_eq!(courses[0].state, "Started");
        assert_eq!(
            courses[0].url,
            "https://courses.edx.org/courses/course-v1:T+G+1/course/"
        );
        assert_eq!(courses[1].state, "Not yet");
    }
}
