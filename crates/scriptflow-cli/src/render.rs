//! Terminal rendering of screens, progress and the edit form.

use colored::Colorize;
use regex::Regex;
use scriptflow_core::admin::EditBuffer;
use scriptflow_core::screen::{ScreenDefinition, ScreenGraph};
use scriptflow_core::session::{Progress, SessionObserver};
use std::sync::LazyLock;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</p>|</div>|</li>").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("valid regex"));

/// Turns a markup body into terminal text.
pub fn plain_text(body: &str) -> String {
    let text = LINE_BREAK.replace_all(body, "\n");
    let text = TAG.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub fn render_progress(progress: &Progress) -> String {
    const WIDTH: usize = 20;
    let filled = (progress.percent.min(100) as usize * WIDTH) / 100;
    format!(
        "[{}{}] {:>3}%  {}",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        progress.percent,
        progress.label()
    )
}

pub fn render_screen(screen: &ScreenDefinition, progress: &Progress) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        screen.title.bright_cyan().bold(),
        format!("({})", screen.id).bright_black()
    ));
    out.push_str(&format!("{}\n", render_progress(progress).bright_black()));

    let body = plain_text(&screen.body);
    if !body.is_empty() {
        out.push('\n');
        out.push_str(&body);
        out.push('\n');
    }

    if !screen.buttons.is_empty() {
        out.push('\n');
    }
    for (i, button) in screen.buttons.iter().enumerate() {
        let label = format!("[{}] {}", i + 1, button.label);
        let label = if button.primary {
            label.bright_green().bold().to_string()
        } else {
            label.green().to_string()
        };
        match button.target() {
            Some(next) => out.push_str(&format!("  {} {}\n", label, format!("-> {}", next).bright_black())),
            None => out.push_str(&format!("  {}\n", label)),
        }
    }
    out
}

pub fn render_buffer(buffer: &EditBuffer) -> String {
    let size = |v: Option<u32>| v.map(|n| format!("{n}px")).unwrap_or_else(|| "-".to_string());
    let mut out = format!(
        "{}\n  id:      {}\n  title:   {}\n  body:    {}\n  tab:     {}\n  sizes:   title {} / body {} / buttons {} / padding {}\n",
        "Edit form".bright_yellow().bold(),
        buffer.id,
        buffer.title,
        plain_text(&buffer.body).replace('\n', " "),
        buffer.tab,
        size(buffer.font_size_title),
        size(buffer.font_size_body),
        size(buffer.font_size_buttons),
        size(buffer.padding_body),
    );
    for (i, row) in buffer.buttons.iter().enumerate() {
        out.push_str(&format!(
            "  button {}: {} -> {}{}\n",
            i + 1,
            row.label,
            if row.next.is_empty() { "(none)" } else { row.next.as_str() },
            if row.primary { " [primary]" } else { "" }
        ));
    }
    out
}

/// Prints every screen change to stdout.
pub struct TerminalObserver;

impl SessionObserver for TerminalObserver {
    fn on_screen_changed(&self, screen: &ScreenDefinition, progress: &Progress) {
        println!();
        print!("{}", render_screen(screen, progress));
    }

    fn on_graph_rebuilt(&self, graph: &ScreenGraph) {
        println!(
            "{}",
            format!(
                "Script loaded: {} screens, products: {}",
                graph.len(),
                graph.products().join(", ")
            )
            .bright_black()
        );
    }
}
