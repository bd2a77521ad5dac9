// src/crawler/dedup.rs

use crate::models::{Unit, UnitsByUrl, Video};
use log::debug;
use std::collections::HashSet;

/// 已经出现过的资源 URL。作为折叠状态显式传递，从不作为全局变量存在。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenUrls {
    urls: HashSet<String>,
}

impl SeenUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(state, url) -> (state', kept?)`：首次出现的 URL 被保留并记录
    pub fn admit(mut self, url: &str) -> (Self, bool) {
        let kept = self.urls.insert(url.to_string());
        (self, kept)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

fn admit_all(urls: &[String], seen: SeenUrls) -> (Vec<String>, SeenUrls) {
    urls.iter()
        .fold((Vec::new(), seen), |(mut kept, seen), url| {
            let (seen, is_new) = seen.admit(url);
            if is_new {
                kept.push(url.clone());
            }
            (kept, seen)
        })
}

fn dedup_video(video: &Video, seen: SeenUrls) -> (Option<Video>, SeenUrls) {
    let (video_youtube_url, seen) = match &video.video_youtube_url {
        Some(url) => {
            let (seen, is_new) = seen.admit(url);
            (is_new.then(|| url.clone()), seen)
        }
        None => (None, seen),
    };
    let (mp4_urls, seen) = admit_all(&video.mp4_urls, seen);

    if video_youtube_url.is_none() && mp4_urls.is_empty() {
        return (None, seen);
    }
    // 字幕地址不参与去重
    let kept = Video {
        video_youtube_url,
        available_subs_url: video.available_subs_url.clone(),
        sub_template_url: video.sub_template_url.clone(),
        mp4_urls,
    };
    (Some(kept), seen)
}

fn dedup_unit(unit: &Unit, seen: SeenUrls) -> (Option<Unit>, SeenUrls) {
    let (videos, seen) = unit
        .videos
        .iter()
        .fold((Vec::new(), seen), |(mut videos, seen), video| {
            let (kept, seen) = dedup_video(video, seen);
            videos.extend(kept);
            (videos, seen)
        });
    let (resources_urls, seen) = admit_all(&unit.resources_urls, seen);

    if videos.is_empty() && resources_urls.is_empty() {
        (None, seen)
    } else {
        (
            Some(Unit {
                videos,
                resources_urls,
            }),
            seen,
        )
    }
}

/// 在给定的已见集合之上去重，返回过滤后的副本与更新后的集合。
///
/// 按映射的插入顺序处理，先出现者保留。
pub fn dedup_with(all_units: &UnitsByUrl, seen: SeenUrls) -> (UnitsByUrl, SeenUrls) {
    let mut filtered = UnitsByUrl::new();
    let mut seen = seen;
    for (url, units) in all_units.iter() {
        let (reduced, next) = units
            .iter()
            .fold((Vec::new(), seen), |(mut reduced, seen), unit| {
                let (kept, seen) = dedup_unit(unit, seen);
                reduced.extend(kept);
                (reduced, seen)
            });
        seen = next;
        filtered.insert(url.to_string(), reduced);
    }
    debug!("去重完成，共记录 {} 个不同的 URL", seen.len());
    (filtered, seen)
}

/// 从空集合开始去重整个映射
pub fn remove_repeated_urls(all_units: &UnitsByUrl) -> UnitsByUrl {
    dedup_with(all_units, SeenUrls::new()).0
}

/// 统计映射中的 URL 数量 (包括字幕地址)
pub fn count_urls(all_units: &UnitsByUrl) -> usize {
    all_units
        .units()
        .map(|unit| {
            let video_urls: usize = unit
                .videos
                .iter()
                .map(|video| {
                    usize::from(video.video_youtube_url.is_some())
                        + usize::from(video.available_subs_url.is_some())
                        + usize::from(video.sub_template_url.is_some())
                        + video.mp4_urls.len()
                })
                .sum();
            video_urls + unit.resources_urls.len()
        })
        .sum()
}
