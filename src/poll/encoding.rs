//! Candidate-line encoding.
//!
//! Each published candidate message embeds its poll title and 1-based
//! position so the binding can be recovered from the message text alone:
//!
//! ```text
//! option line := {title} " candidate " {index} ": " {text}
//! ```
//!
//! Title plus index form the composite key; the candidate text is not
//! relied on for identity (labels may repeat). Decoding matches the known
//! title literally, so reserved characters in titles or labels cannot
//! confuse the parse. This is the single encode/decode pair in the crate;
//! nothing else pattern-matches message text.

/// Bumped if the line grammar ever changes shape.
pub const ENCODING_VERSION: u32 = 1;

/// Render the message line for one candidate. `index` is 1-based.
pub fn encode_option_line(title: &str, index: usize, text: &str) -> String {
    format!("{title} candidate {index}: {text}")
}

/// Recover `(index, text)` from a message line published for `title`.
///
/// Returns `None` for anything that is not a candidate line of this exact
/// title: other conversation, intro/announcement messages, or candidate
/// lines of a different poll.
pub fn parse_option_line<'a>(title: &str, line: &'a str) -> Option<(usize, &'a str)> {
    let rest = line.strip_prefix(title)?;
    let rest = rest.strip_prefix(" candidate ")?;
    let (digits, text) = rest.split_once(": ")?;
    let index: usize = digits.parse().ok()?;
    if index == 0 {
        return None;
    }
    Some((index, text))
}
