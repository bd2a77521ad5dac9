// src/persist/mod.rs

pub mod aggregate;
pub mod components;
pub mod report;

use self::{
    components::{UnitContent, VideoComponent, parse_unit_contents},
    report::ProblemTypeTally,
};
use crate::{
    client::RobustClient,
    constants,
    models::{Course, ErrorContext, Section},
    transcript::TranscriptResolver,
    utils,
};
use log::{debug, error, info, warn};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// `_vdo.json` 中单个视频的记录
#[derive(Debug, Serialize)]
struct VideoArtifact {
    section: String,
    subsection: String,
    unit_idx: String,
    youtube_url: String,
    video_duration: Option<u64>,
    #[serde(flatten)]
    transcripts: BTreeMap<String, Value>,
}

/// 按编号顺序输出的 `video_block_NN` 映射
struct VideoBlocks(Vec<(String, VideoArtifact)>);

impl Serialize for VideoBlocks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PersistSummary {
    pub subsections: usize,
    pub units: usize,
    pub files_written: usize,
    pub videos: usize,
    pub transcript_errors: usize,
    pub write_errors: usize,
    pub skipped_subsections: usize,
}

impl PersistSummary {
    fn merge(&mut self, other: &PersistSummary) {
        self.subsections += other.subsections;
        self.units += other.units;
        self.files_written += other.files_written;
        self.videos += other.videos;
        self.transcript_errors += other.transcript_errors;
        self.write_errors += other.write_errors;
        self.skipped_subsections += other.skipped_subsections;
    }
}

/// 一门课程写盘过程中的可变状态
struct CourseState {
    course_dir: PathBuf,
    /// 全课程唯一的视频编号，从 1 开始
    video_counter: usize,
    tally: ProblemTypeTally,
    summary: PersistSummary,
}

/// 逐个章节、子章节、单元地重新抓取页面并写出各类产物。
///
/// 视频编号与题型统计在单元之间共享，因此整个过程严格串行。
pub struct ContentPersister {
    http_client: RobustClient,
    resolver: TranscriptResolver,
    html_dir: PathBuf,
    base_url: String,
}

impl ContentPersister {
    pub fn new(
        http_client: RobustClient,
        resolver: TranscriptResolver,
        html_dir: &Path,
        base_url: &str,
    ) -> Self {
        Self {
            http_client,
            resolver,
            html_dir: html_dir.to_path_buf(),
            base_url: base_url.to_string(),
        }
    }

    pub fn course_dir(&self, course: &Course) -> PathBuf {
        self.html_dir.join(utils::directory_name(&course.name))
    }

    pub async fn persist_all(&self, selections: &[(Course, Vec<Section>)]) -> PersistSummary {
        let mut total = PersistSummary::default();
        for (course, sections) in selections {
            let summary = self.persist_course(course, sections).await;
            total.merge(&summary);
        }
        total
    }

    pub async fn persist_course(&self, course: &Course, sections: &[Section]) -> PersistSummary {
        info!("正在保存课程 '{}' 的内容", course.name);
        let mut state = CourseState {
            course_dir: self.course_dir(course),
            video_counter: 1,
            tally: ProblemTypeTally::default(),
            summary: PersistSummary::default(),
        };

        for section in sections {
            let section_dirname =
                utils::sanitize_filename(&format!("{:02}-{}", section.position, section.name));
            let section_dir = state.course_dir.join(&section_dirname);

            for subsection in &section.subsections {
                let subsection_name = utils::sanitize_filename(
                    subsection.name.as_deref().unwrap_or(constants::UNTITLED),
                );
                let target_dir = section_dir.join(&subsection_name);
                if let Err(e) = tokio::fs::create_dir_all(&target_dir).await {
                    error!("创建目录 '{}' 失败: {}", target_dir.display(), e);
                }
                info!("url: {}, subsection: {}", subsection.url, subsection_name);

                let page = match self.http_client.get_text(&subsection.url).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!("获取子章节页面 '{}' 失败，已跳过: {}", subsection.url, e);
                        state.summary.skipped_subsections += 1;
                        continue;
                    }
                };
                let units = parse_unit_contents(&page, &self.base_url);
                debug!("'{}' 中有 {} 个单元", subsection.url, units.len());
                state.summary.subsections += 1;

                for unit in &units {
                    self.persist_unit(&mut state, unit, &target_dir, &section_dirname, &subsection_name)
                        .await;
                }
            }
        }

        if !state.tally.is_empty()
            && let Err(e) = state.tally.write_to(&state.course_dir).await
        {
            error!("写入题型统计失败: {}", e);
            state.summary.write_errors += 1;
        }

        if state.summary.subsections > 0
            && let Err(e) = aggregate::aggregate_course(&state.course_dir).await
        {
            error!("汇总课程 '{}' 的组件失败: {}", course.name, e);
            state.summary.write_errors += 1;
        }
        state.summary
    }

    async fn persist_unit(
        &self,
        state: &mut CourseState,
        unit: &UnitContent,
        target_dir: &Path,
        section_dirname: &str,
        subsection_name: &str,
    ) {
        let label = unit.label();
        state.summary.units += 1;

        self.write_artifact(state, target_dir, &format!("{}.html", label), &unit.raw_html)
            .await;

        if let Some(text) = &unit.text {
            self.write_artifact(state, target_dir, &format!("{}.txt", label), text)
                .await;
        }

        let problem_text = unit.problem_text();
        if !problem_text.is_empty() {
            for problem in &unit.problems {
                if let Some(kind) = &problem.kind {
                    state.tally.record(kind);
                }
            }
            self.write_artifact(state, target_dir, &format!("{}_prob.txt", label), &problem_text)
                .await;
        }

        if unit.videos.is_empty() {
            return;
        }
        let mut blocks = Vec::with_capacity(unit.videos.len());
        for video in &unit.videos {
            let artifact = self
                .resolve_video(state, video, section_dirname, subsection_name, &label)
                .await;
            blocks.push((
                format!(
                    "{}{:02}",
                    constants::layout::VIDEO_BLOCK_PREFIX,
                    state.video_counter
                ),
                artifact,
            ));
            state.video_counter += 1;
            state.summary.videos += 1;
        }
        match to_pretty_json(&VideoBlocks(blocks)) {
            Ok(json) => {
                self.write_artifact(state, target_dir, &format!("{}_vdo.json", label), &json)
                    .await;
            }
            Err(e) => {
                error!("序列化 '{}' 的视频信息失败: {}", label, e);
                state.summary.write_errors += 1;
            }
        }
    }

    async fn resolve_video(
        &self,
        state: &mut CourseState,
        component: &VideoComponent,
        section_dirname: &str,
        subsection_name: &str,
        unit_label: &str,
    ) -> VideoArtifact {
        let video = &component.video;
        let video_duration = self.resolver.duration(video).await;

        let mut transcripts = BTreeMap::new();
        for (key, language_name) in &component.languages {
            info!("下载 '{}' 的 {} 字幕", video.youtube_link, language_name);
            let context = ErrorContext {
                video_url: video.youtube_link.clone(),
                language: language_name.clone(),
                section: section_dirname.to_string(),
                subsection: subsection_name.to_string(),
                unit_index: unit_label.to_string(),
            };
            let resolution = self.resolver.resolve(video, key, &context).await;
            if let Some(err) = &resolution.error {
                report::append_transcript_error(&state.course_dir, err).await;
                state.summary.transcript_errors += 1;
            }
            transcripts.insert(
                format!("transcript_{}", key),
                resolution.transcript.to_artifact_value(),
            );
        }

        VideoArtifact {
            section: section_dirname.to_string(),
            subsection: subsection_name.to_string(),
            unit_idx: unit_label.to_string(),
            youtube_url: video.youtube_link.clone(),
            video_duration,
            transcripts,
        }
    }

    /// 写出一个产物文件；失败时改写到输出根目录下的同名文件，并记录到错误报告
    async fn write_artifact(
        &self,
        state: &mut CourseState,
        target_dir: &Path,
        file_name: &str,
        contents: &str,
    ) {
        let path = target_dir.join(file_name);
        match tokio::fs::write(&path, contents).await {
            Ok(()) => {
                debug!("已写入 '{}'", path.display());
                state.summary.files_written += 1;
            }
            Err(e) => {
                warn!("写入 '{}' 失败，改用备用文件名: {}", path.display(), e);
                state.summary.write_errors += 1;
                report::append_downloading_error(&self.html_dir, &e).await;
                let fallback = self.html_dir.join(file_name);
                match tokio::fs::write(&fallback, contents).await {
                    Ok(()) => state.summary.files_written += 1,
                    Err(e) => error!("写入备用文件 '{}' 也失败: {}", fallback.display(), e),
                }
            }
        }
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
