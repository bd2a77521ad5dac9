// src/persist/report.rs

use crate::{constants::layout, models::ExtractionError};
use log::{debug, error};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

async fn append(path: &Path, text: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await
}

/// 课程级字幕错误报告
pub async fn append_transcript_error(course_dir: &Path, err: &ExtractionError) {
    let path = course_dir.join(layout::TRANSCRIPT_ERROR_REPORT);
    if let Err(e) = append(&path, &err.to_report_entry()).await {
        error!("写入字幕错误报告 '{}' 失败: {}", path.display(), e);
    }
}

/// 输出根目录下的写文件错误报告
pub async fn append_downloading_error(html_dir: &Path, cause: &io::Error) {
    let path = html_dir.join(layout::DOWNLOADING_ERROR_REPORT);
    let text = format!("External command error ignored: {}\n\n", cause);
    if let Err(e) = append(&path, &text).await {
        error!("写入错误报告 '{}' 失败: {}", path.display(), e);
    }
}

/// 整门课程的题型统计，按遇到的顺序记录，每道题一行
#[derive(Debug, Default)]
pub struct ProblemTypeTally {
    kinds: Vec<String>,
}

impl ProblemTypeTally {
    pub fn record(&mut self, kind: &str) {
        self.kinds.push(kind.to_string());
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn render(&self) -> String {
        self.kinds.iter().map(|k| format!("{} \n", k)).collect()
    }

    pub async fn write_to(&self, course_dir: &Path) -> io::Result<PathBuf> {
        let path = course_dir.join(layout::PROBLEM_TYPE_TALLY);
        tokio::fs::write(&path, self.render()).await?;
        debug!("题型统计已写入 '{}' ({} 条)", path.display(), self.len());
        Ok(path)
    }
}
