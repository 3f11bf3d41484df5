use ratatui::{
    style::Style,
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

/// Pre-wrap lines to `max_width` so the transcript height is known exactly and
/// the paragraph can be drawn without ratatui's own wrapping.
pub fn wrap_lines(lines: &[Line<'static>], max_width: u16) -> Vec<Line<'static>> {
    if max_width == 0 {
        return lines.to_vec();
    }
    lines
        .iter()
        .flat_map(|line| wrap_line(line, max_width as usize))
        .collect()
}

/// Wrap spans to the provided width while preserving styles and word boundaries.
pub fn wrap_line(line: &Line<'static>, max_width: usize) -> Vec<Line<'static>> {
    if line.spans.is_empty() {
        return vec![Line::default()];
    }
    let mut wrapped_lines: Vec<Vec<Span<'static>>> = Vec::new();
    let mut current_line: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0usize;
    let parts: Vec<(String, Style)> = line
        .spans
        .iter()
        .map(|s| (s.content.to_string(), line.style.patch(s.style)))
        .collect();

    for (mut text, style) in parts {
        while !text.is_empty() {
            let mut chars_to_fit = 0usize;
            let mut width_so_far = 0usize;
            let mut last_break_pos: Option<usize> = None;
            for (char_pos, ch) in text.char_indices() {
                let cw = UnicodeWidthStr::width(ch.encode_utf8(&mut [0; 4]));
                if current_width + width_so_far + cw <= max_width {
                    width_so_far += cw;
                    chars_to_fit = char_pos + ch.len_utf8();
                    if ch.is_whitespace() {
                        last_break_pos = Some(char_pos + ch.len_utf8());
                    }
                } else {
                    break;
                }
            }

            if chars_to_fit == 0 {
                // Nothing fits on this line
                if !current_line.is_empty() {
                    wrapped_lines.push(std::mem::take(&mut current_line));
                    current_width = 0;
                    continue;
                }
                // A single character wider than the line; take it anyway.
                let mut forced_width = 0usize;
                let mut forced_end = 0usize;
                for (char_pos, ch) in text.char_indices() {
                    let cw = UnicodeWidthStr::width(ch.encode_utf8(&mut [0; 4]));
                    if forced_end > 0 && forced_width + cw > max_width {
                        break;
                    }
                    forced_width += cw;
                    forced_end = char_pos + ch.len_utf8();
                }
                current_line.push(Span::styled(text[..forced_end].to_string(), style));
                current_width = forced_width;
                text = text[forced_end..].to_string();
                if !text.is_empty() {
                    wrapped_lines.push(std::mem::take(&mut current_line));
                    current_width = 0;
                }
            } else if chars_to_fit >= text.len() {
                current_line.push(Span::styled(text.clone(), style));
                current_width += width_so_far;
                break;
            } else {
                if last_break_pos.is_none() && current_width > 0 {
                    // No natural break inside the incoming span; start it on the next line.
                    wrapped_lines.push(std::mem::take(&mut current_line));
                    current_width = 0;
                    continue;
                }
                let break_pos = last_break_pos.unwrap_or(chars_to_fit);
                let left = text[..break_pos].trim_end();
                if !left.is_empty() {
                    let left_width = UnicodeWidthStr::width(left);
                    current_line.push(Span::styled(left.to_string(), style));
                    current_width += left_width;
                }
                text = text[break_pos..].trim_start().to_string();
                if !text.is_empty() {
                    wrapped_lines.push(std::mem::take(&mut current_line));
                    current_width = 0;
                }
            }
        }
    }
    if !current_line.is_empty() {
        wrapped_lines.push(current_line);
    }
    if wrapped_lines.is_empty() {
        return vec![Line::default()];
    }
    wrapped_lines.into_iter().map(Line::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[Line<'static>]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn wrap_splits_at_spaces() {
        let line = Line::from("word boundary test");
        let wrapped = wrap_line(&line, 6);
        assert_eq!(texts(&wrapped), vec!["word", "bounda", "ry", "test"]);
    }

    #[test]
    fn short_lines_are_untouched() {
        let line = Line::from(vec![Span::raw("a "), Span::raw("b")]);
        assert_eq!(texts(&wrap_line(&line, 80)), vec!["a b"]);
        assert_eq!(texts(&wrap_line(&Line::default(), 80)), vec![""]);
    }

    #[test]
    fn wide_characters_count_double() {
        let line = Line::from("量子计算");
        assert_eq!(texts(&wrap_line(&line, 4)), vec!["量子", "计算"]);
    }

    #[test]
    fn zero_width_disables_wrapping() {
        let lines = vec![Line::from("a long line that would wrap")];
        assert_eq!(wrap_lines(&lines, 0).len(), 1);
    }
}
