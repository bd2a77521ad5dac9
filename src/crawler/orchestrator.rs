// src/crawler/orchestrator.rs

use super::units::UnitFetcher;
use crate::{
    constants,
    models::{Unit, UnitsByUrl},
    ui, utils,
};
use futures::{StreamExt, stream};
use itertools::Itertools;
use log::{info, warn};
use std::{collections::HashMap, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// 按输入顺序逐个抓取
    Sequential,
    /// 固定宽度的并发任务组
    Parallel { workers: usize },
}

impl Default for FetchStrategy {
    fn default() -> Self {
        FetchStrategy::Parallel {
            workers: constants::DEFAULT_WORKERS,
        }
    }
}

/// 对一批子章节 URL 运行单元提取，产出 URL → 单元 映射。
///
/// 两种策略对同一输入给出相同的映射；单个 URL 失败只会让该键对应空列表。
pub struct ConcurrentFetchOrchestrator<F: UnitFetcher> {
    fetcher: Arc<F>,
    strategy: FetchStrategy,
}

impl<F: UnitFetcher + 'static> ConcurrentFetchOrchestrator<F> {
    pub fn new(fetcher: Arc<F>, strategy: FetchStrategy) -> Self {
        Self { fetcher, strategy }
    }

    pub async fn run(&self, urls: &[String]) -> UnitsByUrl {
        match self.strategy {
            FetchStrategy::Sequential => self.run_sequential(urls).await,
            FetchStrategy::Parallel { workers } => self.run_parallel(urls, workers.max(1)).await,
        }
    }

    async fn fetch_or_empty(fetcher: &F, url: &str) -> Vec<Unit> {
        match fetcher.fetch_units(url).await {
            Ok(units) => units,
            Err(e) => {
                warn!("解析 '{}' 失败，按空结果处理: {}", url, e);
                Vec::new()
            }
        }
    }

    async fn run_sequential(&self, urls: &[String]) -> UnitsByUrl {
        info!("正在逐个提取 {} 个页面的单元信息", urls.len());
        let pbar = ui::new_tasks_progress_bar(urls.len() as u64, "解析");
        let mut all_units = UnitsByUrl::new();
        for url in urls {
            pbar.set_message(utils::truncate_text(url, constants::FILENAME_TRUNCATE_LENGTH));
            let units = Self::fetch_or_empty(&self.fetcher, url).await;
            all_units.insert(url.clone(), units);
            pbar.inc(1);
        }
        pbar.finish_and_clear();
        all_units
    }

    async fn run_parallel(&self, urls: &[String], workers: usize) -> UnitsByUrl {
        info!(
            "正在并发提取 {} 个页面的单元信息 (并发数: {})",
            urls.len(),
            workers
        );
        // 重复的 URL 只抓取一次
        let distinct: Vec<String> = urls.iter().unique().cloned().collect();
        let pbar = ui::new_tasks_progress_bar(distinct.len() as u64, "解析");

        let results: HashMap<String, Vec<Unit>> = stream::iter(distinct)
            .map(|url| {
                let fetcher = self.fetcher.clone();
                let pbar = pbar.clone();
                async move {
                    let units = Self::fetch_or_empty(&fetcher, &url).await;
                    pbar.inc(1);
                    (url, units)
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;
        pbar.finish_and_clear();

        // 全部完成后按输入顺序组装，结果只按 URL 关联
        urls.iter()
            .map(|url| {
                let units = results.get(url).cloned().unwrap_or_default();
                (url.clone(), units)
            })
            .collect()
    }
}
