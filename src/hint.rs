//! Near-miss diagnostics for skipped literal and block rules.
//!
//! A block that drifted by a single reformatted line is skipped silently by the
//! engine. When that happens we look for the window of buffer lines that most
//! resembles the expected text and point the user at the first line that
//! differs. Hints are reporting only and never influence the buffer.

use serde::Serialize;

/// Minimum mean line similarity for a window to be reported.
pub const MIN_SIMILARITY: f64 = 0.80;

/// The closest region of the buffer to text a rule expected but did not find.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearMiss {
    /// 1-based line where the closest window starts.
    pub line: usize,
    /// Mean normalized Levenshtein similarity over the window, in `[0, 1]`.
    pub similarity: f64,
    /// 1-based line of the first divergent line inside the window.
    pub divergent_line: usize,
    /// The buffer's text at `divergent_line`.
    pub found: String,
    /// The expected text for that line.
    pub expected: String,
}

/// Find the region of `buffer` closest to `expected`, if it is close enough.
pub fn find_near_miss(buffer: &str, expected: &str) -> Option<NearMiss> {
    let expected_lines: Vec<&str> = expected.lines().collect();
    let buffer_lines: Vec<&str> = buffer.lines().collect();
    if expected_lines.is_empty() || buffer_lines.len() < expected_lines.len() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (start, window) in buffer_lines.windows(expected_lines.len()).enumerate() {
        let score = window_similarity(window, &expected_lines);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((start, score)),
        }
    }

    let (start, similarity) = best?;
    if similarity < MIN_SIMILARITY {
        return None;
    }

    let window = &buffer_lines[start..start + expected_lines.len()];
    let offset = window
        .iter()
        .zip(&expected_lines)
        .position(|(found, expected)| found != expected)
        .unwrap_or(0);

    Some(NearMiss {
        line: start + 1,
        similarity,
        divergent_line: start + offset + 1,
        found: window[offset].to_string(),
        expected: expected_lines[offset].to_string(),
    })
}

fn window_similarity(window: &[&str], expected: &[&str]) -> f64 {
    let total: f64 = window
        .iter()
        .zip(expected)
        .map(|(found, expected)| {
            if found == expected {
                1.0
            } else {
                strsim::normalized_levenshtein(found.trim(), expected.trim())
            }
        })
        .sum();
    total / expected.len() as f64
}
