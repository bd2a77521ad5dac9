// src/workflows.rs

use crate::{
    CrawlContext,
    config::DedupScope,
    constants,
    crawler::{
        ConcurrentFetchOrchestrator, FetchStrategy, SeenUrls, StructureExtractor, UnitExtractor,
        count_urls, courseware_url, dedup_with, filter_sections, remove_repeated_urls,
    },
    error::{AppError, AppResult},
    extractor::get_page_extractor,
    models::{Course, Section, UnitsByUrl},
    persist::{ContentPersister, PersistSummary},
    session::{Credentials, Session},
    symbols,
    transcript::{PlatformTranscriptApi, TranscriptResolver, VideoToolProvider},
    ui,
};
use colored::*;
use log::{debug, info, warn};
use std::sync::Arc;

/// 登录 → 课程选择 → 章节发现 → 单元提取与去重统计 → 写盘
pub async fn run_crawl(
    context: &CrawlContext,
    credentials: &Credentials,
    file_formats: &[String],
) -> AppResult<PersistSummary> {
    let config = &context.config;
    let args = &context.args;
    let site = config
        .site()
        .ok_or_else(|| AppError::UnsupportedSite(config.platform.clone()))?;
    let base_url = site.url.trim_end_matches('/').to_string();

    ui::print_header(&format!("登录 {}", base_url));
    let client = Session::new(context.http_client.clone(), &base_url)
        .login(credentials)
        .await?;
    ui::success("登录成功");

    let dashboard_url = format!("{}{}", base_url, constants::edx::DASHBOARD_PATH);
    let extractor = get_page_extractor(&dashboard_url, &config.sites)?;
    let structure = StructureExtractor::new(client.clone(), extractor.clone(), &base_url);

    let available: Vec<Course> = structure
        .courses(&dashboard_url)
        .await?
        .into_iter()
        .filter(|c| c.state == constants::COURSE_STATE_STARTED)
        .collect();
    ui::display_courses(&available);
    let selected = select_courses(&args.course_urls, available)?;

    let selections = discover_sections(
        &structure,
        selected,
        &config.platform,
        args.filter_section.as_deref(),
    )
    .await?;
    ui::display_selections(&selections);

    let all_urls = subsection_urls(&selections);
    let strategy = if args.sequential {
        FetchStrategy::Sequential
    } else {
        FetchStrategy::Parallel {
            workers: config.max_workers,
        }
    };
    let fetcher = Arc::new(UnitExtractor::new(
        client.clone(),
        extractor,
        &base_url,
        file_formats,
    ));
    let all_units = ConcurrentFetchOrchestrator::new(fetcher, strategy)
        .run(&all_urls)
        .await;

    if all_units.units().next().is_none() {
        warn!("未找到任何可下载的内容");
        return Err(AppError::NoDownloadableContent);
    }

    let filtered = dedup_units(&selections, &all_units, config.dedup_scope);
    let total = count_urls(&all_units);
    let removed = total - count_urls(&filtered);
    warn!("Removed {} duplicated urls from {} in total", removed, total);
    ui::info(&format!("共 {} 个资源链接，其中 {} 个重复", total, removed));

    let resolver = TranscriptResolver::new(
        Arc::new(PlatformTranscriptApi::new(client.clone())),
        Arc::new(VideoToolProvider::new(&config.video_tool)),
    );
    let persister = ContentPersister::new(client, resolver, &args.html_dir, &base_url);
    ui::print_header("保存课程内容");
    let summary = persister.persist_all(&selections).await;
    print_summary(context, &summary);
    Ok(summary)
}

/// 逐门课程解析章节树。
///
/// 页面结构无法识别只影响该课程：记录后跳过，全部课程都失败时才返回最后一个错误。
async fn discover_sections(
    structure: &StructureExtractor,
    courses: Vec<Course>,
    platform: &str,
    filter_section: Option<&str>,
) -> AppResult<Vec<(Course, Vec<Section>)>> {
    let mut selections = Vec::with_capacity(courses.len());
    let mut last_failure = None;
    for course in courses {
        let entry_url = courseware_url(&course.url, platform);
        let sections = match structure.sections(&entry_url).await {
            Ok(sections) => sections,
            Err(e @ AppError::SiteStructure { .. }) => {
                warn!("跳过课程 '{}': {}", course.name, e);
                ui::warn(&format!("无法识别课程 '{}' 的页面结构，已跳过", course.name));
                last_failure = Some(e);
                continue;
            }
            Err(e) => return Err(e),
        };
        ui::display_sections_menu(&course, &sections);
        let sections = filter_sections(filter_section, sections);
        selections.push((course, sections));
    }
    match last_failure {
        Some(e) if selections.is_empty() => Err(e),
        _ => Ok(selections),
    }
}

/// 从已开课的课程中选出链接与给定链接完全一致的课程
pub fn select_courses(course_urls: &[String], available: Vec<Course>) -> AppResult<Vec<Course>> {
    if course_urls.is_empty() {
        return Err(AppError::MissingCourseUrl);
    }
    let selected: Vec<Course> = available
        .into_iter()
        .filter(|course| course_urls.iter().any(|url| *url == course.url))
        .collect();
    if selected.is_empty() {
        return Err(AppError::InvalidCourseUrl);
    }
    debug!("选中的课程: {:?}", selected);
    Ok(selected)
}

/// 按 课程 → 章节 → 子章节 的顺序展开子章节链接
pub fn subsection_urls(selections: &[(Course, Vec<Section>)]) -> Vec<String> {
    selections
        .iter()
        .flat_map(|(_, sections)| sections.iter())
        .flat_map(|section| section.subsections.iter())
        .map(|subsection| subsection.url.clone())
        .collect()
}

/// 按去重范围得到过滤后的映射，仅用于统计
pub fn dedup_units(
    selections: &[(Course, Vec<Section>)],
    all_units: &UnitsByUrl,
    scope: DedupScope,
) -> UnitsByUrl {
    match scope {
        DedupScope::Global => remove_repeated_urls(all_units),
        DedupScope::PerCourse => {
            let mut filtered = UnitsByUrl::new();
            for selection in selections {
                let course_units: UnitsByUrl = subsection_urls(std::slice::from_ref(selection))
                    .into_iter()
                    .filter_map(|url| {
                        let units = all_units.get(&url)?.to_vec();
                        Some((url, units))
                    })
                    .collect();
                let (course_filtered, _) = dedup_with(&course_units, SeenUrls::new());
                for (url, units) in course_filtered.iter() {
                    filtered.insert(url.to_string(), units.to_vec());
                }
            }
            filtered
        }
    }
}

fn print_summary(context: &CrawlContext, summary: &PersistSummary) {
    let html_dir = dunce::canonicalize(&context.args.html_dir)
        .unwrap_or_else(|_| context.args.html_dir.clone());
    info!("写盘完成: {:?}", summary);
    ui::print_header("抓取报告");
    println!(
        "{} {} 个子章节，{} 个单元",
        *symbols::SUBSECTION,
        summary.subsections.to_string().green(),
        summary.units.to_string().green()
    );
    println!(
        "{} {} 个视频，{} 条字幕未能获取",
        *symbols::VIDEO,
        summary.videos.to_string().green(),
        summary.transcript_errors.to_string().yellow()
    );
    println!("已写入 {} 个文件到 {}", summary.files_written, html_dir.display());
    if summary.skipped_subsections > 0 {
        ui::warn(&format!("{} 个子章节页面获取失败，已跳过", summary.skipped_subsections));
    }
    if summary.transcript_errors > 0 {
        println!(
            "{} 字幕错误详见各课程目录下的 {}",
            *symbols::TRANSCRIPT,
            constants::layout::TRANSCRIPT_ERROR_REPORT
        );
    }
    if summary.write_errors > 0 {
        ui::warn(&format!(
            "{} 个文件写入失败，详见 {}",
            summary.write_errors,
            constants::layout::DOWNLOADING_ERROR_REPORT
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SubSection, Unit};

    fn course(name: &str, url: &str) -> Course {
        Course {
            id: name.into(),
            name: name.into(),
            url: url.into(),
            state: constants::COURSE_STATE_STARTED.into(),
        }
    }

    fn section(urls: &[&str]) -> Section {
        Section {
            position: 1,
            name: "Week 1".into(),
            url: String::new(),
            subsections: urls
                .iter()
                .enumerate()
                .map(|(i, u)| SubSection {
                    position: i + 1,
                    name: None,
                    url: u.to_string(),
                })
                .collect(),
        }
    }

    fn unit(resource: &str) -> Vec<Unit> {
        vec![Unit {
            videos: vec![],
            resources_urls: vec![resource.to_string()],
        }]
    }

    #[test]
    fn test_select_courses() {
        let available = vec![course("A", "https://x/a/info"), course("B", "https://x/b/info")];
        let picked = select_courses(&["https://x/b/info".to_string()], available.clone()).unwrap();
        assert_eq!(picked, vec![course("B", "https://x/b/info")]);

        assert!(matches!(
            select_courses(&[], available.clone()),
            Err(AppError::MissingCourseUrl)
        ));
        assert!(matches!(
            select_courses(&["https://x/c/info".to_string()], available),
            Err(AppError::InvalidCourseUrl)
        ));
    }

    #[test]
    fn test_dedup_scope() {
        let selections = vec![
            (course("A", "a"), vec![section(&["s1"])]),
            (course("B", "b"), vec![section(&["s2"])]),
        ];
        let all_units: UnitsByUrl = vec![
            ("s1".to_string(), unit("https://x/shared.pdf")),
            ("s2".to_string(), unit("https://x/shared.pdf")),
        ]
        .into_iter()
        .collect();

        let global = dedup_units(&selections, &all_units, DedupScope::Global);
        assert_eq!(count_urls(&global), 1);
        assert_eq!(global.get("s2"), Some(&[][..]));

        let per_course = dedup_units(&selections, &all_units, DedupScope::PerCourse);
        assert_eq!(count_urls(&per_course), 2);
        assert_eq!(subsection_urls(&selections), vec!["s1", "s2"]);
    }
}
