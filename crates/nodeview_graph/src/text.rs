// SPDX-License-Identifier: MIT OR Apache-2.0
//! Font description and approximate text metrics.
//!
//! Layout only needs widths and line heights, so metrics are derived from the
//! point size with a fixed per-character advance table. The numbers are not
//! meant to match any rasterizer pixel for pixel; they are stable, which keeps
//! layout deterministic.

use egui::{Color32, Vec2};
use serde::{Deserialize, Serialize};

/// Ellipsis appended or inserted by [`Font::elided_text`]
pub const ELLIPSIS: char = '…';

/// Where text is shortened when it does not fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElideMode {
    /// Never shorten
    #[default]
    None,
    /// Drop characters from the start
    Left,
    /// Drop characters from the middle
    Middle,
    /// Drop characters from the end
    Right,
}

/// Font used for titles, labels and detail text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    /// Family name, passed through to the paint backend
    pub family: String,
    /// Size in points
    pub point_size: f32,
    /// Bold weight
    pub bold: bool,
    /// Italic style
    pub italic: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self::new(9.0)
    }
}

impl Font {
    /// Regular font of the given point size
    pub fn new(point_size: f32) -> Self {
        Self {
            family: "Sans".to_string(),
            point_size,
            bold: false,
            italic: false,
        }
    }

    /// Bold font of the given point size
    pub fn bold(point_size: f32) -> Self {
        Self {
            bold: true,
            ..Self::new(point_size)
        }
    }

    /// Size in device pixels (96 dpi)
    pub fn pixel_size(&self) -> f32 {
        self.point_size * 96.0 / 72.0
    }

    /// Height of one line of text
    pub fn height(&self) -> f32 {
        (self.pixel_size() * 1.25).ceil()
    }

    fn base_advance(&self) -> f32 {
        let weight = if self.bold { 0.6 } else { 0.55 };
        self.pixel_size() * weight
    }

    /// Advance of a single character
    pub fn char_width(&self, c: char) -> f32 {
        let base = self.base_advance();
        match c {
            ' ' | 'i' | 'l' | 'j' | '.' | ',' | ';' | ':' | '\'' | '|' | '!' => base * 0.5,
            'm' | 'w' | 'M' | 'W' | '@' => base * 1.4,
            c if c.is_uppercase() => base * 1.2,
            _ => base,
        }
    }

    /// Width of a space
    pub fn space_width(&self) -> f32 {
        self.char_width(' ')
    }

    /// Width of a single line of text
    pub fn text_width(&self, text: &str) -> f32 {
        text.chars().map(|c| self.char_width(c)).sum()
    }

    /// Size of a single line of text
    pub fn text_size(&self, text: &str) -> Vec2 {
        Vec2::new(self.text_width(text), self.height())
    }

    /// Shorten `text` so that it fits into `width`, inserting an ellipsis.
    pub fn elided_text(&self, text: &str, mode: ElideMode, width: f32) -> String {
        if mode == ElideMode::None || self.text_width(text) <= width {
            return text.to_string();
        }

        let budget = width - self.char_width(ELLIPSIS);
        if budget <= 0.0 {
            return String::new();
        }

        let chars: Vec<char> = text.chars().collect();
        match mode {
            ElideMode::None => text.to_string(),
            ElideMode::Right => {
                let head = self.take_fitting(chars.iter().copied(), budget);
                let mut out: String = chars[..head].iter().collect();
                out.push(ELLIPSIS);
                out
            }
            ElideMode::Left => {
                let tail = self.take_fitting(chars.iter().rev().copied(), budget);
                let mut out = String::new();
                out.push(ELLIPSIS);
                out.extend(&chars[chars.len() - tail..]);
                out
            }
            ElideMode::Middle => {
                let head = self.take_fitting(chars.iter().copied(), budget / 2.0);
                let head_width: f32 = chars[..head].iter().map(|&c| self.char_width(c)).sum();
                let tail = self
                    .take_fitting(chars[head..].iter().rev().copied(), budget - head_width);
                let mut out: String = chars[..head].iter().collect();
                out.push(ELLIPSIS);
                out.extend(&chars[chars.len() - tail..]);
                out
            }
        }
    }

    fn take_fitting(&self, chars: impl Iterator<Item = char>, budget: f32) -> usize {
        let mut used = 0.0;
        let mut count = 0;
        for c in chars {
            let w = self.char_width(c);
            if used + w > budget {
                break;
            }
            used += w;
            count += 1;
        }
        count
    }

    /// Greedy word wrap. Words wider than `width` are broken by character.
    pub fn wrap_text(&self, text: &str, width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut line = String::new();
            for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
                let candidate = if line.is_empty() {
                    word.to_string()
                } else {
                    format!("{line} {word}")
                };
                if self.text_width(&candidate) <= width {
                    line = candidate;
                    continue;
                }
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                if self.text_width(word) <= width {
                    line = word.to_string();
                } else {
                    let mut pieces = self.break_word(word, width);
                    line = pieces.pop().unwrap_or_default();
                    lines.extend(pieces);
                }
            }
            lines.push(line);
        }
        lines
    }

    fn break_word(&self, word: &str, width: f32) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut piece = String::new();
        let mut used = 0.0;
        for c in word.chars() {
            let w = self.char_width(c);
            if used + w > width && !piece.is_empty() {
                pieces.push(std::mem::take(&mut piece));
                used = 0.0;
            }
            piece.push(c);
            used += w;
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
        pieces
    }
}

/// A block of possibly multi-line text with its own visibility
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Text content; `\n` separates paragraphs
    pub text: String,
    /// Font
    pub font: Font,
    /// Text colour
    pub color: Color32,
    /// Whether the block takes part in layout and painting
    pub visible: bool,
}

impl Default for TextBlock {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: Font::default(),
            color: Color32::BLACK,
            visible: false,
        }
    }
}

impl TextBlock {
    /// Lines after wrapping to `width`
    pub fn lines(&self, width: f32) -> Vec<String> {
        if self.text.is_empty() {
            return Vec::new();
        }
        self.font.wrap_text(&self.text, width.max(1.0))
    }

    /// Size when wrapped to `width`; zero when hidden
    pub fn size(&self, width: f32) -> Vec2 {
        if !self.visible {
            return Vec2::ZERO;
        }
        let lines = self.lines(width).len().max(1);
        Vec2::new(width, lines as f32 * self.font.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elide_none_keeps_text() {
        let font = Font::new(9.0);
        assert_eq!(font.elided_text("a very long title", ElideMode::None, 5.0), "a very long title");
    }

    #[test]
    fn test_elide_right_fits_width() {
        let font = Font::new(9.0);
        let text = "Connection Output Socket";
        let width = font.text_width(text) / 2.0;
        let elided = font.elided_text(text, ElideMode::Right, width);
        assert!(elided.ends_with(ELLIPSIS));
        assert!(font.text_width(&elided) <= width);
        assert!(text.starts_with(elided.trim_end_matches(ELLIPSIS)));
    }

    #[test]
    fn test_elide_left_and_middle() {
        let font = Font::new(9.0);
        let text = "abcdefghijklmnop";
        let width = font.text_width("abcdefgh");

        let left = font.elided_text(text, ElideMode::Left, width);
        assert!(left.starts_with(ELLIPSIS));
        assert!(text.ends_with(left.trim_start_matches(ELLIPSIS)));

        let middle = font.elided_text(text, ElideMode::Middle, width);
        assert!(middle.contains(ELLIPSIS));
        assert!(middle.starts_with('a'));
        assert!(middle.ends_with('p'));
        assert!(font.text_width(&middle) <= width);
    }

    #[test]
    fn test_short_text_is_not_elided() {
        let font = Font::new(9.0);
        assert_eq!(font.elided_text("In", ElideMode::Right, 100.0), "In");
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        let font = Font::new(9.0);
        let width = font.text_width("gamma delta");
        let lines = font.wrap_text("alpha beta gamma delta", width);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn test_wrap_breaks_long_word() {
        let font = Font::new(9.0);
        let width = font.text_width("abc");
        let lines = font.wrap_text("abcdefgh", width);
        assert!(lines.len() >= 3);
        assert_eq!(lines.concat(), "abcdefgh");
        for line in &lines {
            assert!(font.text_width(line) <= width);
        }
    }

    #[test]
    fn test_hidden_block_has_no_size() {
        let block = TextBlock {
            text: "detail".to_string(),
            ..Default::default()
        };
        assert_eq!(block.size(100.0), Vec2::ZERO);
    }

    #[test]
    fn test_bold_is_wider() {
        assert!(Font::bold(12.0).text_width("Node") > Font::new(12.0).text_width("Node"));
    }
}
