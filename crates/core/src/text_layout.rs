//! Multi-line text layout shared by hit-testing, preview and export.

use crate::annotation::TextAnnotation;
use crate::geometry::Rect;

/// Width of a single line of text in document units.
///
/// The compositor implements this with real font metrics; hit-testing falls
/// back to [`ApproxMeasure`] when no font is loaded.
pub trait TextMeasure {
    fn line_width(&self, line: &str, font_size: f32, bold: bool) -> f32;
}

/// Average-advance estimate: 0.6 em per character, a little wider for bold
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproxMeasure;

impl TextMeasure for ApproxMeasure {
    fn line_width(&self, line: &str, font_size: f32, bold: bool) -> f32 {
        let advance = if bold { 0.65 } else { 0.6 };
        line.chars().count() as f32 * font_size * advance
    }
}

/// One laid-out line
#[derive(Clone, Debug, PartialEq)]
pub struct LaidOutLine<'a> {
    pub index: usize,
    pub text: &'a str,
    /// Baseline y in document space: `anchorY + fontSize + index * lineHeight`
    pub baseline: f32,
}

/// Lines that actually draw something; whitespace-only lines still take up
/// vertical space but are skipped here.
pub fn visible_lines(text: &TextAnnotation) -> Vec<LaidOutLine<'_>> {
    let line_height = text.line_height();
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| LaidOutLine {
            index,
            text: line,
            baseline: text.position.y + text.font_size + index as f32 * line_height,
        })
        .collect()
}

/// Bounding box of the whole annotation: widest line by `lineCount * lineHeight`
pub fn text_bounds(text: &TextAnnotation, measure: &dyn TextMeasure) -> Rect {
    let width = text
        .lines()
        .map(|line| measure.line_width(line, text.font_size, text.bold))
        .fold(0.0_f32, f32::max);
    let height = text.lines().count() as f32 * text.line_height();
    Rect::new(text.position.x, text.position.y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_baselines_skip_blank_lines() {
        let text = TextAnnotation::new(1, Point::new(110.0, 110.0), "REDACTED\n  \nline three");
        let lines = visible_lines(&text);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].baseline, 124.0);
        assert_eq!(lines[1].index, 2);
        assert!((lines[1].baseline - (124.0 + 2.0 * 16.8)).abs() < 1e-4);
    }

    #[test]
    fn test_bounds_use_widest_line() {
        let text = TextAnnotation::new(1, Point::new(0.0, 0.0), "ab\nabcd");
        let bounds = text_bounds(&text, &ApproxMeasure);
        assert!((bounds.width - 4.0 * 14.0 * 0.6).abs() < 1e-4);
        assert!((bounds.height - 2.0 * 16.8).abs() < 1e-4);
    }
}
