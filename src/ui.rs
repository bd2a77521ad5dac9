// src/ui.rs

use crate::{
    constants,
    models::{Course, Section},
    symbols,
};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    io::{self, Write},
    time::Duration,
};

pub fn print_header(title: &str) {
    println!("\n{}", "═".repeat(constants::UI_WIDTH));
    println!(" {}", title.cyan().bold());
    println!("{}", "═".repeat(constants::UI_WIDTH));
}

pub fn print_sub_header(title: &str) {
    println!("\n--- {} ---", title.bold());
}

pub fn box_message(title: &str, content: &[&str], color_func: fn(ColoredString) -> ColoredString) {
    println!("\n┌{}┐", "─".repeat(constants::UI_WIDTH - 2));
    println!("  {}", color_func(title.bold()));
    println!("├{}┤", "─".repeat(constants::UI_WIDTH - 2));
    for line in content {
        println!("  {}", line);
    }
    println!("└{}┘", "─".repeat(constants::UI_WIDTH - 2));
}

pub fn info(message: &str) {
    println!("{} {}", *symbols::INFO, message);
}

pub fn warn(message: &str) {
    println!("{} {}", *symbols::WARN, message.yellow());
}

pub fn success(message: &str) {
    println!("{} {}", *symbols::OK, message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", *symbols::ERROR, message.red());
}

pub fn prompt_hidden(message: &str) -> io::Result<String> {
    print!("\n>>> {}: ", message);
    io::stdout().flush()?;
    rpassword::read_password()
}

/// 按任务数计数的进度条
pub fn new_tasks_progress_bar(len: u64, prefix: &str) -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{prefix:7.bold.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}/{len:3} ({percent:>3}%) {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    let pbar = ProgressBar::new(len);
    pbar.set_style(style);
    pbar.set_prefix(prefix.to_string());
    pbar.enable_steady_tick(Duration::from_millis(100));
    pbar
}

pub fn display_courses(courses: &[Course]) {
    print_sub_header(&format!("共找到 {} 门课程", courses.len()));
    for (i, course) in courses.iter().enumerate() {
        println!(
            "  [{}] {} {} [{}]",
            format!("{:>2}", i + 1).yellow(),
            course.name,
            format!("({})", course.url).dimmed(),
            course.state
        );
    }
}

/// 章节菜单：序号、名称以及子章节数量
pub fn display_sections_menu(course: &Course, sections: &[Section]) {
    print_sub_header(&format!("{} 共有 {} 个章节", course.name, sections.len()));
    for section in sections {
        println!(
            "  [{}] {} {}",
            format!("{:>2}", section.position).yellow(),
            section.name,
            format!("({} 个子章节)", section.subsections.len()).dimmed()
        );
    }
}

/// 已选定的课程与章节树
pub fn display_selections(selections: &[(Course, Vec<Section>)]) {
    print_header("已选择的内容");
    for (course, sections) in selections {
        println!(" {}", course.name.bold());
        for section in sections {
            println!("   {:02}-{}", section.position, section.name);
            for subsection in &section.subsections {
                println!(
                    "      {}",
                    subsection.name.as_deref().unwrap_or(constants::UNTITLED)
                );
            }
        }
    }
}
