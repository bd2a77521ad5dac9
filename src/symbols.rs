// src/symbols.rs

use colored::{ColoredString, Colorize};
use std::sync::LazyLock;

pub static OK: LazyLock<ColoredString> = LazyLock::new(|| "[OK]".green());
pub static ERROR: LazyLock<ColoredString> = LazyLock::new(|| "[X]".red());
pub static INFO: LazyLock<ColoredString> = LazyLock::new(|| "[i]".cyan());
pub static WARN: LazyLock<ColoredString> = LazyLock::new(|| "[!]".yellow());

// 抓取报告中的产物标记
pub static SUBSECTION: LazyLock<ColoredString> = LazyLock::new(|| "[S]".blue());
pub static VIDEO: LazyLock<ColoredString> = LazyLock::new(|| "[V]".magenta());
pub static TRANSCRIPT: LazyLock<ColoredString> = LazyLock::new(|| "[T]".yellow());
