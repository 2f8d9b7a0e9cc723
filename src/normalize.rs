//! Whitespace and encoding-artifact cleanup for extracted article text.

use once_cell::sync::Lazy;
use regex::Regex;

static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").expect("newline regex"));
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

// UTF-8 curly quotes that were re-decoded as Latin-1 somewhere upstream.
const MOJIBAKE_RSQUO: &str = "\u{e2}\u{20ac}\u{2122}"; // â€™
const MOJIBAKE_LDQUO: &str = "\u{e2}\u{20ac}\u{153}"; // â€œ
const MOJIBAKE_RDQUO: &str = "\u{e2}\u{20ac}"; // â€

/// Collapses whitespace, fixes common mis-decoded quote sequences and
/// unescapes the literal `&amp;` entity.
///
/// Newline runs are collapsed to a single newline first, then every
/// whitespace run (including those newlines) collapses to a single space,
/// so the output is one logical line with no paragraph structure. Callers
/// that care about paragraph boundaries must split before normalizing.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = NEWLINE_RUNS.replace_all(raw, "\n");
    let text = WHITESPACE_RUNS.replace_all(&text, " ");

    // The two-character sequence is a prefix of the three-character ones,
    // so replacement order matters.
    let text = text
        .replace(MOJIBAKE_RSQUO, "'")
        .replace(MOJIBAKE_LDQUO, "\"")
        .replace(MOJIBAKE_RDQUO, "\"")
        .replace("&amp;", "&");

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_to_single_line() {
        assert_eq!(
            normalize("first  paragraph\n\n\nsecond\tparagraph"),
            "first paragraph second paragraph"
        );
    }

    #[test]
    fn fixes_misdecoded_quotes() {
        assert_eq!(normalize("it\u{e2}\u{20ac}\u{2122}s"), "it's");
        assert_eq!(
            normalize("\u{e2}\u{20ac}\u{153}quoted\u{e2}\u{20ac}"),
            "\"quoted\""
        );
    }

    #[test]
    fn unescapes_amp_entity() {
        assert_eq!(normalize("Smith &amp; Sons"), "Smith & Sons");
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n  "), "");
    }

    #[test]
    fn idempotent_on_typical_input() {
        let inputs = [
            "A  story\n\nwith paragraphs and it\u{e2}\u{20ac}\u{2122}s quirks.",
            "Smith &amp; Sons expand\toverseas",
            "already clean text",
        ];
        for raw in inputs {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }
}
