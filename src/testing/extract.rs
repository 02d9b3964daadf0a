//! Marker line extraction
//!
//! Finds the lines of a simulation log that carry the marker text and
//! reads the number that follows it. The value is located relative to
//! the marker, not at a fixed column.

/// What was found after a marker
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// A number parsed from the text after the marker
    Value(f64),
    /// The text after the marker, which is not a number
    Unparseable(String),
}

/// A marker occurrence in a log
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerHit {
    /// 1-based line number
    pub line: usize,
    pub extraction: Extraction,
}

/// Parse the value following `marker` in `line`
///
/// Returns `None` when the line does not contain the marker. A single
/// `:` or `=` separator after the marker is skipped, and the first
/// whitespace-delimited token is parsed.
pub fn parse_marker_line(line: &str, marker: &str) -> Option<Extraction> {
    let (_, rest) = line.split_once(marker)?;
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('='))
        .unwrap_or(rest)
        .trim();

    let parsed = rest
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<f64>().ok());

    Some(match parsed {
        Some(value) => Extraction::Value(value),
        None => Extraction::Unparseable(rest.to_string()),
    })
}

/// Scan a whole log for marker lines, in order
pub fn scan_log(content: &str, marker: &str) -> Vec<MarkerHit> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            parse_marker_line(line, marker).map(|extraction| MarkerHit {
                line: i + 1,
                extraction,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::DEFAULT_MARKER;

    #[test]
    fn test_parse_albany_line() {
        let line = "Main_Solve: MeanValue of final solution 0.000809523809524";
        assert_eq!(
            parse_marker_line(line, DEFAULT_MARKER),
            Some(Extraction::Value(0.000809523809524))
        );
    }

    #[test]
    fn test_parse_independent_of_prefix_length() {
        let line = "[rank 0] Main_Solve: MeanValue of final solution   8.09523809524e-04  ";
        assert_eq!(
            parse_marker_line(line, DEFAULT_MARKER),
            Some(Extraction::Value(8.09523809524e-04))
        );
    }

    #[test]
    fn test_parse_skips_separator() {
        assert_eq!(
            parse_marker_line("mean = 1.5", "mean"),
            Some(Extraction::Value(1.5))
        );
        assert_eq!(
            parse_marker_line("mean: -2e3 (converged)", "mean"),
            Some(Extraction::Value(-2000.0))
        );
    }

    #[test]
    fn test_parse_line_without_marker() {
        assert_eq!(parse_marker_line("Main_Solve: done", DEFAULT_MARKER), None);
    }

    #[test]
    fn test_parse_unparseable_value() {
        let line = "Main_Solve: MeanValue of final solution not-a-number";
        assert_eq!(
            parse_marker_line(line, DEFAULT_MARKER),
            Some(Extraction::Unparseable("not-a-number".to_string()))
        );

        let line = "Main_Solve: MeanValue of final solution";
        assert_eq!(
            parse_marker_line(line, DEFAULT_MARKER),
            Some(Extraction::Unparseable(String::new()))
        );
    }

    #[test]
    fn test_scan_reports_every_occurrence() {
        let log = "\
Starting solve
Main_Solve: MeanValue of final solution 0.1
step 2
Main_Solve: MeanValue of final solution 0.2
";
        let hits = scan_log(log, DEFAULT_MARKER);
        assert_eq!(
            hits,
            vec![
                MarkerHit { line: 2, extraction: Extraction::Value(0.1) },
                MarkerHit { line: 4, extraction: Extraction::Value(0.2) },
            ]
        );
    }

    #[test]
    fn test_scan_empty_log() {
        assert!(scan_log("", DEFAULT_MARKER).is_empty());
        assert!(scan_log("nothing to see\n", DEFAULT_MARKER).is_empty());
    }
}
