//! Line-oriented reply parsing.
//!
//! Turns the service's free text into an ordered list of raw labels. This
//! module knows nothing about the taxonomy or about how many lines were
//! expected; validation and alignment happen in `align`.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLine {
    /// Leading ordinal, when the line carried one.
    pub ordinal: Option<usize>,
    /// Raw label text, not yet validated.
    pub label: String,
    pub explanation: Option<String>,
}

fn prefix_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    // optional bullet, then an optional ordinal like "1." "2)" "3 -" "#4:" "[5]"
    RE.get_or_init(|| {
        Regex::new(r"^(?:[-*•]\s+)?(?:\[?#?(?P<n>\d{1,4})\s*(?:[.):\]]|-\s)\s*)?(?P<rest>.*)$").ok()
    })
    .as_ref()
}

/// Parse a reply into non-empty lines with the ordinal stripped.
///
/// An unnumbered line ending in `:` before the first numbered line is a
/// heading ("Aquí tienes la lista:") and is dropped. Past that point every
/// line fills a slot, so "2. Salud:" stays. A `|` splits label from
/// explanation.
pub fn parse_reply(text: &str) -> Vec<ReplyLine> {
    let mut out = Vec::new();
    let mut numbered = false;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(parsed) = parse_line(line) else {
            continue;
        };
        if parsed.ordinal.is_some() {
            numbered = true;
        } else if !numbered && line.ends_with(':') {
            continue;
        }
        out.push(parsed);
    }
    out
}

fn parse_line(line: &str) -> Option<ReplyLine> {
    let (ordinal, rest) = match prefix_re().and_then(|re| re.captures(line)) {
        Some(caps) => (
            caps.name("n").and_then(|m| m.as_str().parse().ok()),
            caps.name("rest").map_or("", |m| m.as_str()),
        ),
        None => (None, line),
    };

    let (label, explanation) = match rest.split_once('|') {
        Some((l, e)) => (l.trim(), Some(e.trim()).filter(|e| !e.is_empty())),
        None => (rest.trim(), None),
    };

    if label.is_empty() && ordinal.is_none() {
        return None;
    }

    Some(ReplyLine {
        ordinal,
        label: label.to_string(),
        explanation: explanation.map(str::to_string),
    })
}
