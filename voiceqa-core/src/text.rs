use regex::Regex;
use std::sync::OnceLock;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"))
}

/// Collapses whitespace runs so stitched-together recognition segments read
/// as one sentence.
pub fn collapse_whitespace(text: &str) -> String {
    whitespace_re().replace_all(text.trim(), " ").to_string()
}

/// Joins the committed transcript with the still-revisable interim tail.
pub fn join_committed_and_interim(committed: &str, interim: &str) -> String {
    let c = committed.trim();
    let i = interim.trim();

    if c.is_empty() {
        return i.to_string();
    }
    if i.is_empty() {
        return c.to_string();
    }
    format!("{c} {i}")
}

/// Appends a committed recognition segment, space-separated.
pub fn append_committed(committed: &mut String, segment: &str) {
    let segment = segment.trim();
    if segment.is_empty() {
        return;
    }
    if !committed.is_empty() && !committed.ends_with(' ') {
        committed.push(' ');
    }
    committed.push_str(segment);
}

/// Accepts a finalized transcript as the current question only if it carries
/// non-whitespace content.
pub fn accept_finalized_question(text: String) -> Option<String> {
    let cleaned = collapse_whitespace(&text);
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_runs_and_trims() {
        assert_eq!(collapse_whitespace("  a   b\t\nc "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn joins_committed_and_interim_text() {
        assert_eq!(join_committed_and_interim("", ""), "");
        assert_eq!(join_committed_and_interim("hello", ""), "hello");
        assert_eq!(join_committed_and_interim("", "there"), "there");
        assert_eq!(join_committed_and_interim("hello", "there"), "hello there");
        assert_eq!(join_committed_and_interim(" hello ", " there "), "hello there");
    }

    #[test]
    fn appends_segments_with_single_spaces() {
        let mut committed = String::new();
        append_committed(&mut committed, "what is");
        append_committed(&mut committed, "  ");
        append_committed(&mut committed, "a closure");
        assert_eq!(committed, "what is a closure");
    }

    #[test]
    fn finalized_question_accepts_only_non_empty() {
        assert_eq!(accept_finalized_question("".to_string()), None);
        assert_eq!(accept_finalized_question("   \n\t".to_string()), None);
        assert_eq!(
            accept_finalized_question(" what  is rust ".to_string()),
            Some("what is rust".to_string())
        );
    }
}
