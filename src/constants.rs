// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const FILENAME_TRUNCATE_LENGTH: usize = 65;
pub const MAX_FILENAME_BYTES: usize = 200;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_HTML_DIR: &str = "HTMLs";
pub const DEFAULT_PLATFORM: &str = "edx";
pub const DEFAULT_WORKERS: usize = 16;
pub const DEFAULT_VIDEO_TOOL: &str = "youtube-dl";
pub const USER_AGENT: &str = "edX-downloader/0.01";

/// 子章节名称缺失时使用的目录名
pub const UNTITLED: &str = "Untitled";
/// 只有处于该状态的课程才会被抓取
pub const COURSE_STATE_STARTED: &str = "Started";
pub const COURSE_STATE_NOT_STARTED: &str = "Not yet";

pub const DEFAULT_FILE_FORMATS: &[&str] = &[
    "e?ps", "pdf", "txt", "doc", "xls", "ppt", "docx", "xlsx", "pptx", "odt", "ods", "odp", "odg",
    "zip", "rar", "gz", "mp3", "R", "Rmd", "ipynb", "py",
];

pub mod layout {
    pub const UNIT_ID_PREFIX: &str = "seq_contents_";
    pub const PROBLEM_TYPE_TALLY: &str = "all_prob_type.txt";
    pub const TRANSCRIPT_ERROR_REPORT: &str = "transcript_error_report.txt";
    pub const DOWNLOADING_ERROR_REPORT: &str = "downloading_error_report.txt";
    pub const VIDEO_BLOCK_PREFIX: &str = "video_block_";

    // 课程级汇总产物
    pub const TEXT_COMPONENTS: &str = "all_textcomp.json";
    pub const PROBLEM_COMPONENTS: &str = "all_probcomp.json";
    pub const VIDEO_COMPONENTS: &str = "all_videocomp.json";
    pub const ALL_COMPONENTS: &str = "all_comp.json";
    pub const ALL_TEXT: &str = "all_text.txt";
    pub const CORPUS: &str = "corpus.txt";
    pub const TEXT_BLOCK_PREFIX: &str = "text_block_";
    pub const QUIZ_BLOCK_PREFIX: &str = "quiz_block_";
}

pub mod edx {
    pub const BASE_URL: &str = "https://courses.edx.org";
    pub const LOGIN_PATH: &str = "/login_ajax";
    pub const DASHBOARD_PATH: &str = "/dashboard";
    pub const CSRF_COOKIE: &str = "csrftoken";
    pub const YOUTUBE_SHORT_URL: &str = "https://youtu.be/";
    pub const STREAM_SPEED_PREFIX: &str = "1.00:";
    pub const LANG_PLACEHOLDER: &str = "__lang__";
}

pub mod block_types {
    pub const HTML: &str = "html";
    pub const PROBLEM: &str = "problem";
    pub const VIDEO: &str = "video";
}
