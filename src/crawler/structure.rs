// src/crawler/structure.rs

use crate::{
    client::RobustClient,
    constants,
    error::*,
    extractor::PageExtractor,
    models::{Course, Section},
};
use log::{debug, info};
use std::sync::Arc;

/// 课程入口页 → 章节/子章节树
pub struct StructureExtractor {
    http_client: RobustClient,
    extractor: Arc<dyn PageExtractor>,
    base_url: String,
}

impl StructureExtractor {
    pub fn new(http_client: RobustClient, extractor: Arc<dyn PageExtractor>, base_url: &str) -> Self {
        Self {
            http_client,
            extractor,
            base_url: base_url.to_string(),
        }
    }

    /// 从仪表盘解析已选修的课程
    pub async fn courses(&self, dashboard_url: &str) -> AppResult<Vec<Course>> {
        info!("正在从仪表盘提取课程信息");
        let page = self.http_client.get_text(dashboard_url).await?;
        let courses = self.extractor.extract_courses(&page, &self.base_url)?;
        debug!("提取到的课程: {:?}", courses);
        Ok(courses)
    }

    pub async fn sections(&self, courseware_url: &str) -> AppResult<Vec<Section>> {
        debug!("正在提取章节: {}", courseware_url);
        let page = self.http_client.get_text(courseware_url).await?;
        let sections = self
            .extractor
            .extract_sections(&page, &self.base_url)
            .map_err(|e| match e {
                AppError::SiteStructure { reason, .. } => AppError::SiteStructure {
                    url: courseware_url.to_string(),
                    reason,
                },
                other => other,
            })?;
        debug!("提取到 {} 个章节", sections.len());
        Ok(sections)
    }
}

/// 课程的 courseware 入口地址
pub fn courseware_url(course_url: &str, platform: &str) -> String {
    if platform == constants::DEFAULT_PLATFORM {
        course_url.replace("info", "course")
    } else {
        course_url.replace("info", "courseware")
    }
}

/// 按 1 开始的序号筛选章节。
///
/// 序号无法解析、不是正数、越界或未提供时返回全部章节，不视为错误。
pub fn filter_sections(index: Option<&str>, sections: Vec<Section>) -> Vec<Section> {
    let num_sections = sections.len();
    let Some(raw) = index else {
        return sections;
    };
    match raw.trim().parse::<usize>() {
        Ok(idx) if idx >= 1 && idx <= num_sections => {
            info!("章节已筛选为: {}", idx);
            sections.into_iter().nth(idx - 1).into_iter().collect()
        }
        _ => {
            debug!("章节序号 '{}' 无效 (共 {} 个)，保留全部章节", raw, num_sections);
            sections
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(n: usize) -> Vec<Section> {
        (1..=n)
            .map(|i| Section {
                position: i,
                name: format!("Week {}", i),
                url: String::new(),
                subsections: vec![],
            })
            .collect()
    }

    #[test]
    fn test_filter_sections_selects_one() {
        let filtered = filter_sections(Some("2"), sections(5));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].position, 2);
        assert_eq!(filtered[0].name, "Week 2");
    }

    #[test]
    fn test_filter_sections_fails_open() {
        for index in [Some("99"), Some("0"), Some("abc"), Some("-1"), Some(""), None] {
            assert_eq!(filter_sections(index, sections(5)), sections(5), "index {:?}", index);
        }
    }

    #[test]
    fn test_courseware_url_by_platform() {
        let url = "https://courses.edx.org/courses/course-v1:A+B+C/info";
        assert_eq!(
            courseware_url(url, "edx"),
            "https://courses.edx.org/courses/course-v1:A+B+C/course"
        );
        assert_eq!(
            courseware_url(url, "other"),
            "https://courses.edx.org/courses/course-v1:A+B+C/courseware"
        );
    }
}
