//! Printers: text and markdown (termimad).

use owo_colors::OwoColorize;
use termimad::MadSkin;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextPrinter {
    pub color: Option<&'static str>,
}

impl TextPrinter {
    pub fn green() -> Self {
        Self { color: Some("green") }
    }

    pub fn red() -> Self {
        Self { color: Some("red") }
    }

    pub fn paint(&self, text: &str) -> String {
        match self.color {
            Some("green") => text.green().to_string(),
            Some("red") => text.red().to_string(),
            _ => text.to_string(),
        }
    }

    pub fn print(&self, text: &str) {
        println!("{}", self.paint(text));
    }

    pub fn eprint(&self, text: &str) {
        eprintln!("{}", self.paint(text));
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default() }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }
}

/// Fenced markdown block for a snippet, tagged with its language.
pub fn code_block(lang: &str, code: &str) -> String {
    format!("```{}\n{}\n```", lang, code)
}
