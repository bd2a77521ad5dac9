// src/extractor/mod.rs

pub mod classic;
pub mod edx;
pub mod utils;

use crate::{
    config::{PageExtractorType, SiteConfig},
    error::*,
    models::{Course, Section, Unit},
};
use log::debug;
use std::{collections::HashMap, sync::Arc};
use url::Url;

/// 站点相关的页面解析能力。所有方法只处理已抓取的页面文本，不做网络请求。
pub trait PageExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract_courses(&self, page: &str, base_url: &str) -> AppResult<Vec<Course>>;

    fn extract_sections(&self, page: &str, base_url: &str) -> AppResult<Vec<Section>>;

    fn extract_units(
        &self,
        page: &str,
        base_url: &str,
        file_formats: &[String],
    ) -> AppResult<Vec<Unit>> {
        utils::extract_units_from_page(page, base_url, file_formats)
    }
}

fn build_extractor(site: &SiteConfig) -> AppResult<Arc<dyn PageExtractor>> {
    Ok(match site.extractor {
        PageExtractorType::Current => Arc::new(edx::CurrentEdxExtractor::new(site)?),
        PageExtractorType::Classic => Arc::new(classic::ClassicEdxExtractor::new(site)?),
    })
}

fn host_signature(url: &str) -> Option<(String, Option<u16>)> {
    let parsed = Url::parse(url).ok()?;
    Some((parsed.host_str()?.to_ascii_lowercase(), parsed.port_or_known_default()))
}

/// 根据目标 URL 的主机名在已知站点中选择解析器，一次抓取只选择一次
pub fn get_page_extractor(
    url: &str,
    sites: &HashMap<String, SiteConfig>,
) -> AppResult<Arc<dyn PageExtractor>> {
    let target = host_signature(url).ok_or_else(|| AppError::UnsupportedSite(url.to_string()))?;
    // HashMap 无序，按名称排序保证选择结果稳定
    let mut candidates: Vec<_> = sites.iter().collect();
    candidates.sort_by(|a, b| a.0.cmp(b.0));
    let (name, site) = candidates
        .into_iter()
        .find(|(_, site)| host_signature(&site.url).as_ref() == Some(&target))
        .ok_or_else(|| AppError::UnsupportedSite(url.to_string()))?;
    debug!("URL '{}' 匹配站点 '{}' ({:?})", url, name, site.extractor);
    build_extractor(site)
}
