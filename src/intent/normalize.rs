//! Text canonicalization shared by the gate and the classifier

/// Characters dropped from the end of an utterance before classification
const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Normalize text for rule matching
///
/// Lower-cases, collapses runs of whitespace to a single space, trims, and
/// strips trailing punctuation. Interior punctuation is kept so that
/// domains like `youtube.com` survive.
pub fn normalize(text: &str) -> String {
    let collapsed = collapse_whitespace(&text.to_lowercase());
    collapsed
        .trim_end_matches(|c: char| c.is_whitespace() || TRAILING_PUNCTUATION.contains(&c))
        .to_string()
}

/// Canonicalize a finalized utterance before it leaves the gate
///
/// Lower-cases, removes every period and comma, and collapses whitespace.
pub fn canonicalize_command(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | ','))
        .collect();
    collapse_whitespace(&stripped)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
