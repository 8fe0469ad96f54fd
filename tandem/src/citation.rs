//! Citation wire format: inline markers and the tail-of-document source list.
//!
//! Inline: `"quote" [Source, URL, YYYY-MM-DD] [N]`.
//! Tail list entry: `[N] "quote" - Source - URL - YYYY-MM-DD`.
//! Inline and list quotes must match byte-for-byte after whitespace collapse.
//!
//! Stored source text keeps its original case; case folding is applied only at
//! match time (see `cache::normalize_for_match`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a response's citation block.
#[derive(Debug, Error)]
pub enum CitationError {
    #[error("no source list found (expected a tail section of [N] entries)")]
    MissingSourceList,
    #[error("malformed citation entry: {0}")]
    MalformedEntry(String),
    #[error("duplicate citation number [{0}]")]
    DuplicateRefNum(u32),
}

/// One entry of the tail source list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub ref_num: u32,
    pub quote: String,
    pub source: String,
    pub url: String,
    pub date: String,
}

/// One inline citation marker found in the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineCitation {
    pub ref_num: u32,
    pub quote: String,
    pub source: String,
    pub url: String,
    pub date: String,
}

static TAIL_ENTRY: Lazy<Regex> = Lazy::new(|| {
    // [N] "quote" - Source - URL - Date
    Regex::new(r#"(?m)^\s*\[(\d+)\]\s+"(.+?)"\s+-\s+(.+?)\s+-\s+(\S+)\s+-\s+(\S+)\s*$"#)
        .expect("tail entry regex")
});

static INLINE_MARKER: Lazy<Regex> = Lazy::new(|| {
    // "quote" [Source, URL, Date] [N]
    Regex::new(r#""([^"]+)"\s*\[([^,\]]+),\s*([^,\]]+),\s*([^\]]+)\]\s*\[(\d+)\]"#)
        .expect("inline marker regex")
});

static SOURCES_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^#{1,3}\s*sources\s*$").expect("sources heading regex"));

/// Collapses all whitespace runs to single spaces and trims. Case is untouched.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-collapsed, case-folded form used only at match time.
pub fn normalize_for_match(s: &str) -> String {
    collapse_whitespace(s).to_lowercase()
}

/// Parses the tail source list of a response.
///
/// Looks for a `## Sources` (or equivalently leveled) heading and parses every
/// `[N]` entry after it; without a heading, parses `[N]` entries anywhere in
/// the final lines. Duplicate ref numbers are rejected.
pub fn parse_source_list(response: &str) -> Result<Vec<Citation>, CitationError> {
    let tail = match SOURCES_HEADING.find(response) {
        Some(m) => &response[m.end()..],
        None => response,
    };
    let mut out: Vec<Citation> = Vec::new();
    for caps in TAIL_ENTRY.captures_iter(tail) {
        let ref_num: u32 = caps[1]
            .parse()
            .map_err(|_| CitationError::MalformedEntry(caps[0].to_string()))?;
        if out.iter().any(|c| c.ref_num == ref_num) {
            return Err(CitationError::DuplicateRefNum(ref_num));
        }
        out.push(Citation {
            ref_num,
            quote: caps[2].to_string(),
            source: caps[3].trim().to_string(),
            url: caps[4].to_string(),
            date: caps[5].to_string(),
        });
    }
    if out.is_empty() {
        return Err(CitationError::MissingSourceList);
    }
    out.sort_by_key(|c| c.ref_num);
    Ok(out)
}

/// Extracts inline citation markers from the body (text before the source list).
pub fn parse_inline_citations(response: &str) -> Vec<InlineCitation> {
    let body = match SOURCES_HEADING.find(response) {
        Some(m) => &response[..m.start()],
        None => response,
    };
    INLINE_MARKER
        .captures_iter(body)
        .filter_map(|caps| {
            Some(InlineCitation {
                ref_num: caps[5].parse().ok()?,
                quote: caps[1].to_string(),
                source: caps[2].trim().to_string(),
                url: caps[3].trim().to_string(),
                date: caps[4].trim().to_string(),
            })
        })
        .collect()
}

/// Checks that each inline marker has a tail entry with the same ref number
/// and a byte-identical quote after whitespace collapse. Returns the ref
/// numbers that disagree.
pub fn inline_list_mismatches(inline: &[InlineCitation], list: &[Citation]) -> Vec<u32> {
    let mut bad = Vec::new();
    for ic in inline {
        match list.iter().find(|c| c.ref_num == ic.ref_num) {
            Some(entry) => {
                if collapse_whitespace(&entry.quote) != collapse_whitespace(&ic.quote) {
                    bad.push(ic.ref_num);
                }
            }
            None => bad.push(ic.ref_num),
        }
    }
    bad
}
