// src/crawler/units.rs

use crate::{client::RobustClient, error::*, extractor::PageExtractor, models::Unit};
use async_trait::async_trait;
use log::trace;
use std::sync::Arc;

/// 给定子章节 URL，产出其单元列表
#[async_trait]
pub trait UnitFetcher: Send + Sync {
    async fn fetch_units(&self, url: &str) -> AppResult<Vec<Unit>>;
}

/// 抓取并解析单个子章节页面
#[derive(Clone)]
pub struct UnitExtractor {
    http_client: RobustClient,
    extractor: Arc<dyn PageExtractor>,
    base_url: String,
    file_formats: Arc<[String]>,
}

impl UnitExtractor {
    pub fn new(
        http_client: RobustClient,
        extractor: Arc<dyn PageExtractor>,
        base_url: &str,
        file_formats: &[String],
    ) -> Self {
        Self {
            http_client,
            extractor,
            base_url: base_url.to_string(),
            file_formats: file_formats.into(),
        }
    }
}

#[async_trait]
impl UnitFetcher for UnitExtractor {
    async fn fetch_units(&self, url: &str) -> AppResult<Vec<Unit>> {
        let page = self.http_client.get_text(url).await?;
        let units = self
            .extractor
            .extract_units(&page, &self.base_url, &self.file_formats)?;
        trace!("'{}' 中解析到单元: {:?}", url, units);
        Ok(units)
    }
}
