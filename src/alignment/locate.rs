//! Finding a quote's position in its transcript.

/// Prefix lengths (in characters) tried when the full quote is not found.
const PREFIX_LENGTHS: [usize; 3] = [100, 50, 30];
/// Prefix length for the final case-insensitive attempt.
const CASE_INSENSITIVE_PREFIX: usize = 50;

/// Text with whitespace collapsed and curly quotes straightened, plus a map
/// from every byte of the normalized text back to a byte offset in the input.
#[derive(Debug)]
pub(crate) struct Normalized {
    pub text: String,
    offsets: Vec<usize>,
}

impl Normalized {
    pub fn new(raw: &str) -> Self {
        let mut text = String::with_capacity(raw.len());
        let mut offsets = Vec::with_capacity(raw.len());
        let mut pending_space: Option<usize> = None;

        for (pos, c) in raw.char_indices() {
            if c.is_whitespace() {
                // Leading whitespace is dropped; runs keep their first position
                if !text.is_empty() && pending_space.is_none() {
                    pending_space = Some(pos);
                }
                continue;
            }

            if let Some(space_pos) = pending_space.take() {
                text.push(' ');
                offsets.push(space_pos);
            }

            let c = straighten_quote(c);
            let before = text.len();
            text.push(c);
            offsets.extend(std::iter::repeat(pos).take(text.len() - before));
        }

        Self { text, offsets }
    }

    /// Unicode lowercase copy. Offsets still point into the original raw input.
    pub fn to_lowercase(&self) -> Self {
        let mut text = String::with_capacity(self.text.len());
        let mut offsets = Vec::with_capacity(self.offsets.len());

        for (pos, c) in self.text.char_indices() {
            let before = text.len();
            text.extend(c.to_lowercase());
            offsets.extend(std::iter::repeat(self.raw_offset(pos)).take(text.len() - before));
        }

        Self { text, offsets }
    }

    /// Byte offset in the raw input for a byte offset in the normalized text.
    pub fn raw_offset(&self, normalized: usize) -> usize {
        self.offsets.get(normalized).copied().unwrap_or(0)
    }
}

fn straighten_quote(c: char) -> char {
    match c {
        '\u{201C}' | '\u{201D}' => '"',
        '\u{2018}' | '\u{2019}' => '\'',
        other => other,
    }
}

/// The first `chars` characters of `text`.
fn char_prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Byte offset in `transcript` where `quote` starts, or `None` if it cannot be
/// found.
///
/// Matching runs on normalized text: the full quote first, then its leading
/// 100, 50 and 30 characters (each only for quotes longer than that), then a
/// case-insensitive match of the first 50 characters.
pub fn locate_quote(transcript: &str, quote: &str) -> Option<usize> {
    let haystack = Normalized::new(transcript);
    let needle = Normalized::new(quote).text;
    if needle.is_empty() {
        return None;
    }

    let found = haystack.text.find(&needle).or_else(|| {
        let quote_chars = needle.chars().count();
        PREFIX_LENGTHS
            .iter()
            .filter(|&&len| quote_chars > len)
            .find_map(|&len| haystack.text.find(char_prefix(&needle, len)))
    });

    if let Some(pos) = found {
        return Some(haystack.raw_offset(pos));
    }

    let lowered = haystack.to_lowercase();
    let prefix = char_prefix(&needle, CASE_INSENSITIVE_PREFIX).to_lowercase();
    lowered.text.find(&prefix).map(|pos| lowered.raw_offset(pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_maps_to_raw_offset() {
        let transcript = "(00:00:01) Host:   Welcome\n\n back.  (00:01:15) Ada: Growth is about retention.";
        let offset = locate_quote(transcript, "Growth is about retention.").unwrap();
        assert!(transcript[offset..].starts_with("Growth is about retention."));
    }

    #[test]
    fn test_whitespace_and_curly_quotes_ignored() {
        let transcript = "Lee: She said \u{201C}ship   it\u{201D}\nand we did.";
        let offset = locate_quote(transcript, "said \"ship it\" and we did.").unwrap();
        assert!(transcript[offset..].starts_with("said"));
    }

    #[test]
    fn test_prefix_fallback() {
        let spoken = "The best companies treat onboarding as a product, not a checklist, and they measure it weekly.";
        let transcript = format!("(00:10:00) Ada: {}", spoken);
        // The extractor paraphrased the ending
        let quote = "The best companies treat onboarding as a product, not a checklist, and they review it every single week.";

        let offset = locate_quote(&transcript, quote).unwrap();
        assert!(transcript[offset..].starts_with("The best companies"));
    }

    #[test]
    fn test_short_quote_skips_prefixes_but_tries_case_insensitive() {
        let transcript = "Ada: FOCUS WINS.";
        assert_eq!(locate_quote(transcript, "focus wins."), Some(5));
    }

    #[test]
    fn test_case_insensitive_match_handles_accents() {
        let transcript = "(00:04:00) Renée: ÉCOLE FIRST, ÇA VA.";
        let offset = locate_quote(transcript, "école first, ça va.").unwrap();
        assert!(transcript[offset..].starts_with("ÉCOLE"));
    }

    #[test]
    fn test_not_found() {
        assert_eq!(locate_quote("Ada: Focus wins.", "Nothing like this was said."), None);
        assert_eq!(locate_quote("Ada: Focus wins.", "   "), None);
    }

    #[test]
    fn test_multibyte_text_before_quote() {
        let transcript = "Café “talk” con señor:   Growth is about retention.";
        let offset = locate_quote(transcript, "Growth is about retention.").unwrap();
        assert!(transcript[offset..].starts_with("Growth"));
    }
}
