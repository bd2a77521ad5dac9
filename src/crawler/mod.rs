// src/crawler/mod.rs

pub mod dedup;
pub mod orchestrator;
pub mod structure;
pub mod units;

pub use dedup::{SeenUrls, count_urls, dedup_with, remove_repeated_urls};
pub use orchestrator::{ConcurrentFetchOrchestrator, FetchStrategy};
pub use structure::{StructureExtractor, courseware_url, filter_sections};
pub use units::{UnitExtractor, UnitFetcher};
