//! Timestamp markers embedded in transcripts, e.g. `(00:01:15)`.

use regex::Regex;

/// Search windows, in characters before the quote. The final attempt covers
/// the entire prefix.
const WINDOWS: [usize; 3] = [200, 500, 1000];

/// Finds the timestamp marker governing a transcript position.
pub struct MarkerScanner {
    marker: Regex,
}

impl Default for MarkerScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerScanner {
    pub fn new() -> Self {
        // (H:MM:SS), (HH:MM:SS) or (MM:SS)
        let marker = Regex::new(r"\((\d{1,2}:\d{2}(?::\d{2})?)\)").expect("Invalid regex");
        Self { marker }
    }

    /// The last marker strictly before byte `offset`, as zero-padded `HH:MM:SS`.
    ///
    /// Windows widen until a marker is found. Text at or after `offset` is
    /// never examined.
    pub fn timestamp_before(&self, transcript: &str, offset: usize) -> Option<String> {
        let end = floor_char_boundary(transcript, offset.min(transcript.len()));
        let prefix = &transcript[..end];

        WINDOWS
            .iter()
            .map(|&chars| window_start(prefix, chars))
            .chain(std::iter::once(0))
            .find_map(|start| self.last_marker(&prefix[start..]))
            .map(|raw| normalize_timestamp(&raw))
    }

    fn last_marker(&self, window: &str) -> Option<String> {
        self.marker
            .captures_iter(window)
            .last()
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Byte position `chars` characters back from the end of `text`.
fn window_start(text: &str, chars: usize) -> usize {
    if chars == 0 {
        return text.len();
    }
    text.char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(pos, _)| pos)
        .unwrap_or(0)
}

fn floor_char_boundary(text: &str, mut pos: usize) -> usize {
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Normalize `MM:SS` or `H:MM:SS` to `HH:MM:SS`.
pub fn normalize_timestamp(raw: &str) -> String {
    let parts: Vec<&str> = raw.split(':').collect();
    match parts.as_slice() {
        [minutes, seconds] => format!("00:{:0>2}:{}", minutes, seconds),
        [hours, minutes, seconds] => format!("{:0>2}:{}:{}", hours, minutes, seconds),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_timestamp() {
        assert_eq!(normalize_timestamp("1:15"), "00:01:15");
        assert_eq!(normalize_timestamp("12:05"), "00:12:05");
        assert_eq!(normalize_timestamp("1:02:03"), "01:02:03");
        assert_eq!(normalize_timestamp("01:02:03"), "01:02:03");
    }

    #[test]
    fn test_picks_last_marker_before_offset() {
        let transcript = "(00:00:10) Host: Hi. (00:00:40) Ada: Focus wins. (00:01:00) Host: Next.";
        let offset = transcript.find("Focus").unwrap();
        let scanner = MarkerScanner::new();
        assert_eq!(scanner.timestamp_before(transcript, offset).as_deref(), Some("00:00:40"));
    }

    #[test]
    fn test_never_looks_after_offset() {
        let transcript = "Ada: Focus wins. (00:01:00) Host: Next.";
        let scanner = MarkerScanner::new();
        assert_eq!(scanner.timestamp_before(transcript, 5), None);
    }

    #[test]
    fn test_marker_ending_at_offset_counts() {
        let transcript = "(12:34)Focus wins.";
        let offset = transcript.find("Focus").unwrap();
        let scanner = MarkerScanner::new();
        assert_eq!(scanner.timestamp_before(transcript, offset).as_deref(), Some("00:12:34"));
    }

    #[test]
    fn test_window_widens() {
        let scanner = MarkerScanner::new();
        for gap in [300, 800, 2500] {
            let transcript = format!("(1:02:03) Ada: {}Focus wins.", "x".repeat(gap));
            let offset = transcript.find("Focus").unwrap();
            assert_eq!(
                scanner.timestamp_before(&transcript, offset).as_deref(),
                Some("01:02:03"),
                "gap of {} chars",
                gap
            );
        }
    }

    #[test]
    fn test_nearer_window_wins_over_wider() {
        // A marker inside the 200-char window shadows older ones further back
        let transcript = format!(
            "(00:00:05) {} (00:02:00) {}Focus wins.",
            "a".repeat(600),
            "b".repeat(100)
        );
        let offset = transcript.find("Focus").unwrap();
        let scanner = MarkerScanner::new();
        assert_eq!(scanner.timestamp_before(&transcript, offset).as_deref(), Some("00:02:00"));
    }

    #[test]
    fn test_window_counts_characters() {
        let scanner = MarkerScanner::new();
        let transcript = format!("(00:03:00) {}Focus wins.", "é".repeat(150));
        let offset = transcript.find("Focus").unwrap();
        // 150 two-byte chars sit inside the 200-char window
        assert_eq!(window_start(&transcript[..offset], 200), 0);
        assert_eq!(scanner.timestamp_before(&transcript, offset).as_deref(), Some("00:03:00"));
    }
}
