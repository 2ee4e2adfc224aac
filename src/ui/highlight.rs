use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

const THEME: &str = "base16-mocha.dark";

struct Assets {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

fn assets() -> &'static Assets {
    static ASSETS: OnceLock<Assets> = OnceLock::new();
    ASSETS.get_or_init(|| Assets {
        syntax_set: SyntaxSet::load_defaults_newlines(),
        theme_set: ThemeSet::load_defaults(),
    })
}

/// Terminal-escaped syntax highlighting for `code`. `lang` is a syntax token
/// or file extension ("json", "js"); unknown languages render as plain text.
pub fn highlight(code: &str, lang: &str) -> String {
    let assets = assets();
    let Some(theme) = assets.theme_set.themes.get(THEME) else {
        return code.to_string();
    };

    let syntax = assets
        .syntax_set
        .find_syntax_by_token(lang)
        .or_else(|| assets.syntax_set.find_syntax_by_extension(lang))
        .unwrap_or_else(|| assets.syntax_set.find_syntax_plain_text());

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut output = String::new();

    for line in LinesWithEndings::from(code) {
        match highlighter.highlight_line(line, &assets.syntax_set) {
            Ok(ranges) => {
                let ranges: Vec<(Style, &str)> = ranges;
                output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
            }
            Err(_) => output.push_str(line),
        }
    }

    // Reset colours so they don't bleed into whatever is printed next.
    output.push_str("\x1b[0m");
    output
}

pub fn highlight_json(value: &serde_json::Value) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    highlight(&format!("{}\n", pretty), "json")
}
