// tests/crawl_pipeline_test.rs

use clap::Parser;
use edx_crawler::{
    CrawlContext,
    cli::Cli,
    client::RobustClient,
    config::AppConfig,
    constants,
    error::AppResult,
    session::Credentials,
    workflows,
};
use serde_json::{Value, json};
use std::fs;
use std::sync::Arc;

/// 平台把单元内容转义后嵌入 `seq_contents_{n}`
fn subsection_page(units: &[&str]) -> String {
    let blocks: String = units
        .iter()
        .enumerate()
        .map(|(i, html)| {
            let escaped = html
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
            format!(r#"<div id="seq_contents_{}" class="seq_contents">{}</div>"#, i, escaped)
        })
        .collect();
    format!(
        r#"<!DOCTYPE html><html><body><div class="container">{}</div></body></html>"#,
        blocks
    )
}

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{}", name)).expect("无法读取测试数据文件")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_full_crawl_writes_artifact_tree() -> AppResult<()> {
    // --- 1. Arrange (准备阶段) ---
    let mut server = mockito::Server::new_async().await;
    let server_url = server.url();
    let out_dir = tempfile::tempdir()?;

    let login_page = server
        .mock("GET", "/login_ajax")
        .with_status(200)
        .with_header("set-cookie", "csrftoken=tok123; Path=/")
        .with_body("<html></html>")
        .create_async()
        .await;
    let login = server
        .mock("POST", "/login_ajax")
        .match_header("x-csrftoken", "tok123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;
    let _dashboard = server
        .mock("GET", "/dashboard")
        .with_status(200)
        .with_body(fixture("dashboard.html"))
        .create_async()
        .await;
    let _outline = server
        .mock("GET", "/courses/geo101/course")
        .with_status(200)
        .with_body(fixture("outline.html"))
        .create_async()
        .await;
    let _block1 = server
        .mock("GET", "/courses/geo101/block1")
        .with_status(200)
        .with_body(subsection_page(&[&fixture("unit_video_problem.html")]))
        .create_async()
        .await;
    let _block2 = server
        .mock("GET", "/courses/geo101/block2")
        .with_status(200)
        .with_body(subsection_page(&[&fixture("unit_resource.html")]))
        .create_async()
        .await;
    let transcript_en = server
        .mock(
            "GET",
            "/courses/geo101/xblock/video1/handler/transcript/translation/en",
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"start": [0, 1500], "end": [1500, 3000], "text": ["Hello", "world"]}"#)
        .create_async()
        .await;
    let _transcript_fr = server
        .mock(
            "GET",
            "/courses/geo101/xblock/video1/handler/transcript/translation/fr",
        )
        .with_status(404)
        .create_async()
        .await;

    let mut config = AppConfig::default();
    if let Some(site) = config.sites.get_mut(constants::DEFAULT_PLATFORM) {
        site.url = server_url.clone();
    }
    // 外部工具不存在：时长为空，备用字幕来源失败
    config.video_tool = "edx-crawler-test-missing-tool".to_string();
    let config = Arc::new(config);

    let course_url = format!("{}/courses/geo101/info", server_url);
    let html_dir = out_dir.path().to_string_lossy().into_owned();
    let args = Arc::new(Cli::parse_from([
        "edx-crawler",
        "--course-urls",
        course_url.as_str(),
        "-d",
        html_dir.as_str(),
        "--sequential",
    ]));
    let context = CrawlContext {
        http_client: RobustClient::new(config.clone())?,
        config,
        args,
    };
    let credentials = Credentials {
        username: "me@example.com".into(),
        password: "secret".into(),
    };
    let formats: Vec<String> = constants::DEFAULT_FILE_FORMATS
        .iter()
        .map(|f| f.to_string())
        .collect();

    // --- 2. Act (执行阶段) ---
    let summary = workflows::run_crawl(&context, &credentials, &formats).await?;

    // --- 3. Assert (断言阶段) ---
    login_page.assert_async().await;
    login.assert_async().await;
    transcript_en.assert_async().await;

    assert_eq!(summary.subsections, 2);
    assert_eq!(summary.units, 2);
    assert_eq!(summary.videos, 1);
    assert_eq!(summary.transcript_errors, 1);
    assert_eq!(summary.write_errors, 0);

    let course_dir = out_dir.path().join("Geo Science");
    let lesson_dir = course_dir.join("01-Week 1- Basics").join("Lesson 1");
    let untitled_dir = course_dir.join("01-Week 1- Basics").join("Untitled");

    assert!(lesson_dir.join("seq_contents_0.html").is_file());
    let text = fs::read_to_string(lesson_dir.join("seq_contents_0.txt"))?;
    assert_eq!(text, "Plate tectonics The crust moves. ");
    let problem = fs::read_to_string(lesson_dir.join("seq_contents_0_prob.txt"))?;
    assert!(problem.contains("Which plates are oceanic?"));
    assert!(problem.contains("Pacific"));

    let videos: Value =
        serde_json::from_str(&fs::read_to_string(lesson_dir.join("seq_contents_0_vdo.json"))?)?;
    let block = &videos["video_block_01"];
    assert_eq!(block["youtube_url"], json!("https://youtu.be/geoVid01"));
    assert_eq!(block["unit_idx"], json!("seq_contents_0"));
    assert_eq!(block["section"], json!("01-Week 1- Basics"));
    assert_eq!(block["video_duration"], Value::Null);
    assert_eq!(block["transcript_en"]["text"], json!(["Hello", "world"]));
    assert_eq!(block["transcript_en"]["end"], json!([1500, 3000]));
    assert_eq!(block["transcript_fr"], json!({"start": "", "end": "", "text": ""}));

    // 没有名称的子章节落在 Untitled 下
    assert!(untitled_dir.join("seq_contents_0.html").is_file());
    assert_eq!(
        fs::read_to_string(untitled_dir.join("seq_contents_0.txt"))?,
        "Read the notes "
    );
    assert!(!untitled_dir.join("seq_contents_0_vdo.json").exists());

    assert_eq!(
        fs::read_to_string(course_dir.join("all_prob_type.txt"))?,
        "checkbox \n"
    );
    let report = fs::read_to_string(course_dir.join("transcript_error_report.txt"))?;
    assert_eq!(report.matches("video url: https://youtu.be/geoVid01").count(), 1);
    assert!(report.contains("language: French"));
    assert!(report.contains("subsection: Lesson 1"));

    // 课程级汇总
    let text_components: Value =
        serde_json::from_str(&fs::read_to_string(course_dir.join("all_textcomp.json"))?)?;
    assert_eq!(
        text_components["text_block_01"]["content"],
        json!("Plate tectonics The crust moves. ")
    );
    assert_eq!(text_components["text_block_02"]["subsection"], json!("Untitled"));
    let quiz_components: Value =
        serde_json::from_str(&fs::read_to_string(course_dir.join("all_probcomp.json"))?)?;
    assert_eq!(quiz_components["quiz_block_01"]["unit_idx"], json!("seq_contents_0_prob.txt"));
    let video_components: Value =
        serde_json::from_str(&fs::read_to_string(course_dir.join("all_videocomp.json"))?)?;
    assert_eq!(
        video_components["video_block_01"]["youtube_url"],
        json!("https://youtu.be/geoVid01")
    );
    assert!(course_dir.join("all_comp.json").is_file());
    assert!(fs::read_to_string(course_dir.join("all_text.txt"))?.contains("Read the notes"));
    assert!(fs::read_to_string(course_dir.join("corpus.txt"))?.contains("plate\t"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unrecognized_course_page_skips_only_that_course() -> AppResult<()> {
    let mut server = mockito::Server::new_async().await;
    let server_url = server.url();
    let out_dir = tempfile::tempdir()?;

    server
        .mock("GET", "/login_ajax")
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("POST", "/login_ajax")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/dashboard")
        .with_status(200)
        .with_body(fixture("dashboard_two_courses.html"))
        .create_async()
        .await;
    server
        .mock("GET", "/courses/geo101/course")
        .with_status(200)
        .with_body(fixture("outline.html"))
        .create_async()
        .await;
    let broken = server
        .mock("GET", "/courses/broken303/course")
        .with_status(200)
        .with_body("<html><body><p>Maintenance</p></body></html>")
        .create_async()
        .await;
    server
        .mock("GET", "/courses/geo101/block1")
        .with_status(200)
        .with_body(subsection_page(&[&fixture("unit_resource.html")]))
        .create_async()
        .await;
    server
        .mock("GET", "/courses/geo101/block2")
        .with_status(200)
        .with_body(subsection_page(&[&fixture("unit_resource.html")]))
        .create_async()
        .await;

    let mut config = AppConfig::default();
    if let Some(site) = config.sites.get_mut(constants::DEFAULT_PLATFORM) {
        site.url = server_url.clone();
    }
    let config = Arc::new(config);
    let geo_url = format!("{}/courses/geo101/info", server_url);
    let broken_url = format!("{}/courses/broken303/info", server_url);
    let html_dir = out_dir.path().to_string_lossy().into_owned();
    let args = Arc::new(Cli::parse_from([
        "edx-crawler",
        "--course-urls",
        broken_url.as_str(),
        geo_url.as_str(),
        "-d",
        html_dir.as_str(),
        "--sequential",
    ]));
    let context = CrawlContext {
        http_client: RobustClient::new(config.clone())?,
        config,
        args,
    };
    let credentials = Credentials {
        username: "me@example.com".into(),
        password: "secret".into(),
    };

    let formats: Vec<String> = constants::DEFAULT_FILE_FORMATS
        .iter()
        .map(|f| f.to_string())
        .collect();

    let summary = workflows::run_crawl(&context, &credentials, &formats).await?;

    broken.assert_async().await;
    assert_eq!(summary.subsections, 2);
    let course_dir = out_dir.path().join("Geo Science");
    assert!(
        course_dir
            .join("01-Week 1- Basics")
            .join("Lesson 1")
            .join("seq_contents_0.txt")
            .is_file()
    );
    assert!(!out_dir.path().join("Broken Course").exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_crawl_rejects_unknown_course_url() -> AppResult<()> {
    let mut server = mockito::Server::new_async().await;
    let server_url = server.url();
    server
        .mock("GET", "/login_ajax")
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("POST", "/login_ajax")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/dashboard")
        .with_status(200)
        .with_body(fixture("dashboard.html"))
        .create_async()
        .await;

    let mut config = AppConfig::default();
    if let Some(site) = config.sites.get_mut(constants::DEFAULT_PLATFORM) {
        site.url = server_url.clone();
    }
    let config = Arc::new(config);
    // 未开课的课程同样视为无效
    let course_url = format!("{}/courses/future202/about", server_url);
    let args = Arc::new(Cli::parse_from(["edx-crawler", "--course-urls", course_url.as_str()]));
    let context = CrawlContext {
        http_client: RobustClient::new(config.clone())?,
        config,
        args,
    };
    let credentials = Credentials {
        username: "me@example.com".into(),
        password: "secret".into(),
    };

    let err = workflows::run_crawl(&context, &credentials, &[])
        .await
        .err()
        .expect("应当因课程链接无效而失败");
    assert_eq!(err.exit_code(), 4);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_crawl_reports_wrong_password() -> AppResult<()> {
    let mut server = mockito::Server::new_async().await;
    let server_url = server.url();
    server
        .mock("GET", "/login_ajax")
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("POST", "/login_ajax")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "value": "Email or password is incorrect."}"#)
        .create_async()
        .await;

    let mut config = AppConfig::default();
    if let Some(site) = config.sites.get_mut(constants::DEFAULT_PLATFORM) {
        site.url = server_url.clone();
    }
    let config = Arc::new(config);
    let args = Arc::new(Cli::parse_from(["edx-crawler", "--course-urls", "x"]));
    let context = CrawlContext {
        http_client: RobustClient::new(config.clone())?,
        config,
        args,
    };
    let credentials = Credentials {
        username: "me@example.com".into(),
        password: "wrong".into(),
    };

    let err = workflows::run_crawl(&context, &credentials, &[])
        .await
        .err()
        .expect("应当登录失败");
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("Email or password is incorrect."));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_crawl_rejects_unconfigured_platform() -> AppResult<()> {
    let mut config = AppConfig::default();
    config.platform = "nowhere".to_string();
    assert!(config.site().is_none());
    let config = Arc::new(config);
    let args = Arc::new(Cli::parse_from(["edx-crawler", "--course-urls", "x"]));
    let context = CrawlContext {
        http_client: RobustClient::new(config.clone())?,
        config,
        args,
    };
    let credentials = Credentials {
        username: "me@example.com".into(),
        password: "secret".into(),
    };

    let err = workflows::run_crawl(&context, &credentials, &[])
        .await
        .err()
        .expect("未配置的平台应当失败");
    assert_eq!(err.exit_code(), 5);
    assert!(err.to_string().contains("nowhere"));
    Ok(())
}
