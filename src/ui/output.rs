use colored::*;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::highlight::{highlight, highlight_json};

/// Tool results longer than this are cut when echoed to the terminal.
pub const RESULT_PREVIEW_CHARS: usize = 500;

const MAX_PANEL_WIDTH: usize = 100;

#[derive(Debug, Clone, Copy)]
pub enum Tone {
    Blue,
    Green,
    Cyan,
}

impl Tone {
    fn paint(self, s: &str) -> ColoredString {
        match self {
            Tone::Blue => s.blue(),
            Tone::Green => s.green(),
            Tone::Cyan => s.cyan(),
        }
    }
}

fn panel_width() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w as usize)
        .unwrap_or(80)
        .clamp(40, MAX_PANEL_WIDTH)
}

/// Render `body` inside a titled box. Lines wider than the box wrap.
pub fn panel(title: &str, body: &str, tone: Tone) -> String {
    let width = panel_width();
    let inner = width - 4;
    let mut out = String::new();

    let title_len = title.chars().count();
    let top_fill = width.saturating_sub(title_len + 5);
    out.push_str(&format!(
        "{} {} {}\n",
        tone.paint("┌─"),
        title.bold(),
        tone.paint(&format!("{}┐", "─".repeat(top_fill)))
    ));

    for line in body.lines() {
        for chunk in wrap(line, inner) {
            let pad = inner.saturating_sub(visible_width(&chunk));
            out.push_str(&format!(
                "{} {}{} {}\n",
                tone.paint("│"),
                chunk,
                " ".repeat(pad),
                tone.paint("│")
            ));
        }
    }

    out.push_str(&format!(
        "{}\n",
        tone.paint(&format!("└{}┘", "─".repeat(width - 2)))
    ));
    out
}

fn ansi_escape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("ANSI escape pattern compiles"))
}

/// Terminal columns taken by `s`, colour escapes excluded.
fn visible_width(s: &str) -> usize {
    ansi_escape().replace_all(s, "").chars().count()
}

fn wrap(line: &str, width: usize) -> Vec<String> {
    if visible_width(line) <= width {
        return vec![line.to_string()];
    }
    // Long coloured lines lose their colour rather than split an escape.
    let plain = ansi_escape().replace_all(line, "");
    let chars: Vec<char> = plain.chars().collect();
    chars
        .chunks(width.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

/// Cut `text` to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_for_display(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Pull the outermost JSON array or object out of a tool's text output.
/// The MongoDB MCP server wraps documents in prose, so the first opening
/// bracket and the last matching closing bracket delimit the payload.
pub fn extract_json(text: &str) -> Option<Value> {
    let start = match (text.find('['), text.find('{')) {
        (Some(a), Some(o)) => a.min(o),
        (Some(a), None) => a,
        (None, Some(o)) => o,
        (None, None) => return None,
    };
    let closing = if text[start..].starts_with('[') { ']' } else { '}' };
    let end = text.rfind(closing)?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

pub fn display_connected(tool_count: usize) {
    let body = format!(
        "{}\n{}",
        "✓ Connected to MongoDB MCP Server".green(),
        format!("Available tools: {}", tool_count).dimmed()
    );
    print!("{}", panel("Connection Status", &body, Tone::Green));
}

pub fn display_closed() {
    println!("{}", "Connection closed.".dimmed());
}

pub fn display_query(prompt: &str) {
    print!("{}", panel("Query", prompt, Tone::Blue));
}

pub fn display_tool_call(name: &str, input: &Value) {
    println!();
    println!("{} {}", "⚡ Executing:".yellow(), name.bold());
    print!("{}", highlight_json(input));
}

pub fn display_tool_result(result: &str) {
    if result.is_empty() {
        return;
    }
    println!(
        "{} {}\n",
        "Result:".green(),
        truncate_for_display(result, RESULT_PREVIEW_CHARS)
    );
}

pub fn display_tool_error(name: &str, error: &str) {
    println!("{} {}: {}\n", "Tool error:".red(), name.bold(), error);
}

pub fn display_response(response: &str) {
    print!("{}", panel("Response", response, Tone::Green));
}

/// Pretty-print a direct operation result, highlighting embedded JSON.
pub fn print_result(title: &str, result: &str) {
    print!("{}", panel(title, "", Tone::Blue));
    match extract_json(result) {
        Some(value) => {
            let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            print!("{}", highlight(&format!("{}\n", pretty), "json"));
        }
        None => println!("{}", result),
    }
    println!();
}
