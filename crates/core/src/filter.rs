//! Reduce extracted lines to body-text snippets.

use crate::config::NumberingConfig;
use crate::types::{LineRecord, Snippet};

/// Drop titles, running headers and blank lines; keep the rest as snippets.
///
/// A line is judged by its first span: larger than
/// [`NumberingConfig::max_title_font_size`] is a title, a baseline above
/// [`NumberingConfig::top_margin`] is a header. Lines without spans are
/// skipped.
pub fn extract_snippets(lines: &[LineRecord], config: &NumberingConfig) -> Vec<Snippet> {
    lines
        .iter()
        .filter_map(|line| snippet_from_line(line, config))
        .collect()
}

fn snippet_from_line(line: &LineRecord, config: &NumberingConfig) -> Option<Snippet> {
    let first = line.spans.first()?;

    if first.size > config.max_title_font_size {
        return None;
    }

    let y = first.origin.1;
    if y < config.top_margin {
        return None;
    }

    let text = line
        .spans
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(Snippet {
        text: text.to_string(),
        x: line.bbox.x0,
        y,
        center: line.bbox.center_x(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::{BoundingBox, TextSpan};

    fn line(parts: &[&str], x0: f32, x1: f32, y: f32, size: f32) -> LineRecord {
        LineRecord {
            spans: parts
                .iter()
                .map(|t| TextSpan {
                    text: t.to_string(),
                    size,
                    origin: (x0, y),
                })
                .collect(),
            bbox: BoundingBox::new(x0, y - size, x1, y + 2.0),
        }
    }

    #[test]
    fn test_body_line_becomes_snippet() {
        let lines = vec![line(&["Hello", "world"], 72.0, 272.0, 120.0, 10.0)];
        let snippets = extract_snippets(&lines, &NumberingConfig::default());

        assert_eq!(
            snippets,
            vec![Snippet {
                text: "Hello world".into(),
                x: 72.0,
                y: 120.0,
                center: 172.0,
            }]
        );
    }

    #[test]
    fn test_title_skipped_regardless_of_position() {
        let lines = vec![
            line(&["A Big Title"], 72.0, 300.0, 120.0, 13.0),
            line(&["Another Title"], 72.0, 300.0, 600.0, 13.0),
        ];
        assert!(extract_snippets(&lines, &NumberingConfig::default()).is_empty());
    }

    #[test]
    fn test_size_at_threshold_is_kept() {
        let lines = vec![line(&["Body"], 72.0, 100.0, 120.0, 12.0)];
        assert_eq!(extract_snippets(&lines, &NumberingConfig::default()).len(), 1);
    }

    #[test]
    fn test_header_skipped_regardless_of_size() {
        let lines = vec![
            line(&["Journal of Things"], 72.0, 300.0, 30.0, 8.0),
            line(&["Journal of Things"], 72.0, 300.0, 30.0, 11.0),
        ];
        assert!(extract_snippets(&lines, &NumberingConfig::default()).is_empty());
    }

    #[test]
    fn test_baseline_at_margin_is_kept() {
        let lines = vec![line(&["Body"], 72.0, 100.0, 50.0, 10.0)];
        assert_eq!(extract_snippets(&lines, &NumberingConfig::default()).len(), 1);
    }

    #[test]
    fn test_only_first_span_size_counts() {
        let mut record = line(&["small", "BIG"], 72.0, 200.0, 120.0, 10.0);
        record.spans[1].size = 20.0;
        assert_eq!(extract_snippets(&[record], &NumberingConfig::default()).len(), 1);
    }

    #[test]
    fn test_blank_text_skipped() {
        let lines = vec![line(&["  ", "\t"], 72.0, 100.0, 120.0, 10.0)];
        assert!(extract_snippets(&lines, &NumberingConfig::default()).is_empty());
    }

    #[test]
    fn test_text_is_trimmed() {
        let lines = vec![line(&[" lead", "trail "], 72.0, 100.0, 120.0, 10.0)];
        let snippets = extract_snippets(&lines, &NumberingConfig::default());
        assert_eq!(snippets[0].text, "lead trail");
    }

    #[test]
    fn test_line_without_spans_skipped() {
        let lines = vec![LineRecord {
            spans: vec![],
            bbox: BoundingBox::new(72.0, 100.0, 200.0, 110.0),
        }];
        assert!(extract_snippets(&lines, &NumberingConfig::default()).is_empty());
    }

    #[test]
    fn test_custom_thresholds() {
        let config = NumberingConfig {
            max_title_font_size: 9.0,
            top_margin: 130.0,
            ..Default::default()
        };
        let lines = vec![
            line(&["too big"], 72.0, 100.0, 200.0, 10.0),
            line(&["too high"], 72.0, 100.0, 120.0, 8.0),
            line(&["kept"], 72.0, 100.0, 200.0, 8.0),
        ];
        let snippets = extract_snippets(&lines, &config);
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].text, "kept");
    }
}
