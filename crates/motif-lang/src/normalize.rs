//! Surface-syntax normalisation.
//!
//! Applied in order: strip single-line comments, strip multi-line comments,
//! blank out string literals, collapse whitespace, canonicalise common
//! keywords. The result is the "normalised view" that tokenisation and the
//! LCS tier both consume. Normalisation is idempotent and must never panic,
//! whatever the input.

use crate::languages::Language;
use regex::Regex;

/// Owns the compiled regexes; build once per run.
pub struct Normalizer {
    double_quoted: Regex,
    single_quoted: Regex,
    keywords: Regex,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            // Escapes inside literals are not honoured; the literal body is
            // discarded anyway.
            double_quoted: Regex::new(r#""[^"\n]*""#).expect("static regex"),
            single_quoted: Regex::new(r"'[^'\n]*'").expect("static regex"),
            keywords: Regex::new(r"\b(?:var|let|const|function|def|class|async)\b")
                .expect("static regex"),
        }
    }

    /// Full normalisation pipeline for one fragment.
    pub fn normalize(&self, source: &str, language: Language) -> String {
        let style = language.comment_style();

        let mut text = strip_line_comments(source, style.line);
        if let Some((open, close)) = style.block {
            text = strip_block_comments(&text, open, close);
        }
        let text = self.double_quoted.replace_all(&text, "\"\"");
        let text = self.single_quoted.replace_all(&text, "''");
        let collapsed = collapse_whitespace(&text);
        self.canonicalize_keywords(&collapsed)
    }

    /// Replace declaration keywords with uppercase stand-ins so dialects
    /// align: `var`/`let`/`const` → VAR, `function`/`def` → FUNC,
    /// `class` → CLASS, `async` → ASYNC.
    fn canonicalize_keywords(&self, text: &str) -> String {
        self.keywords
            .replace_all(text, |caps: &regex::Captures<'_>| {
                match caps.get(0).map_or("", |m| m.as_str()) {
                    "var" | "let" | "const" => "VAR",
                    "function" | "def" => "FUNC",
                    "class" => "CLASS",
                    "async" => "ASYNC",
                    other => other,
                }
                .to_string()
            })
            .into_owned()
    }
}

/// Truncate each line at the earliest single-line comment marker.
fn strip_line_comments(source: &str, markers: &[&str]) -> String {
    if markers.is_empty() {
        return source.to_string();
    }
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let cut = markers.iter().filter_map(|m| line.find(m)).min();
        match cut {
            Some(idx) => out.push_str(&line[..idx]),
            None => out.push_str(line),
        }
        out.push('\n');
    }
    out
}

/// Remove every `open … close` span; an unterminated opener eats the rest
/// of the text.
fn strip_block_comments(source: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find(open) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + open.len()..];
        match after_open.find(close) {
            Some(end) => rest = &after_open[end + close.len()..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
