//! Heuristic snippet extraction.
//!
//! Cuts a file into function/class-sized fragments so clustering compares
//! peers, not whole files. Lossy and approximate by design; the only
//! contract is that emitted fragments are syntactically plausible units and
//! line ranges are correct relative to the source.

use crate::languages::Language;
use regex::Regex;
use std::collections::HashMap;

/// Fragments shorter than this many non-whitespace characters are discarded.
const MIN_CONTENT_CHARS: usize = 20;

/// Files with no detected declaration and at most this many lines are
/// emitted as one whole-file fragment.
const WHOLE_FILE_MAX_LINES: usize = 50;

/// Indent-scoped fragments must span at least this many lines before an
/// outdent is allowed to cut them.
const MIN_INDENT_FRAGMENT_LINES: usize = 3;

/// One extracted fragment with its inclusive 1-based line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub content: String,
    pub line_start: usize,
    pub line_end: usize,
}

/// Owns the per-language declaration regexes; build once per run.
pub struct SnippetExtractor {
    starts: HashMap<Language, Vec<Regex>>,
}

impl Default for SnippetExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SnippetExtractor {
    pub fn new() -> Self {
        let mut starts = HashMap::new();
        for language in Language::ALL {
            let patterns = declaration_patterns(language);
            if patterns.is_empty() {
                continue;
            }
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(p).expect("static regex"))
                .collect();
            starts.insert(language, compiled);
        }
        Self { starts }
    }

    /// Extract fragments from one file, in file order.
    pub fn extract(&self, source: &str, language: Language) -> Vec<Fragment> {
        let lines: Vec<&str> = source.lines().collect();
        let mut fragments = Vec::new();

        if let Some(rules) = self.starts.get(&language) {
            let mut i = 0;
            while i < lines.len() {
                if rules.iter().any(|re| re.is_match(lines[i])) {
                    let end = if language.indent_scoped() {
                        indent_scope_end(&lines, i)
                    } else {
                        brace_scope_end(&lines, i, language)
                    };
                    fragments.push(Fragment {
                        content: lines[i..=end].join("\n"),
                        line_start: i + 1,
                        line_end: end + 1,
                    });
                    i = end + 1;
                } else {
                    i += 1;
                }
            }
        }

        if fragments.is_empty()
            && lines.len() <= WHOLE_FILE_MAX_LINES
            && !source.trim().is_empty()
        {
            fragments.push(Fragment {
                content: lines.join("\n"),
                line_start: 1,
                line_end: lines.len(),
            });
        }

        fragments.retain(|f| non_whitespace_chars(&f.content) > MIN_CONTENT_CHARS);
        fragments
    }
}

/// Last line index of a brace-delimited fragment: the first line whose
/// trimmed content closes a block at indentation no deeper than the opening
/// line. Runs to end of file when no closer is found.
fn brace_scope_end(lines: &[&str], start: usize, language: Language) -> usize {
    let opening_indent = indent_width(lines[start]);
    for (j, line) in lines.iter().enumerate().skip(start + 1) {
        if closes_block(line.trim(), language) && indent_width(line) <= opening_indent {
            return j;
        }
    }
    lines.len() - 1
}

fn closes_block(trimmed: &str, language: Language) -> bool {
    if language == Language::Ruby {
        return trimmed == "end";
    }
    trimmed == "}" || trimmed == "};"
}

/// Last line index of an indent-delimited fragment: ends just before the
/// next non-blank line at indentation no deeper than the opening line, once
/// the fragment has a plausible minimum length.
fn indent_scope_end(lines: &[&str], start: usize) -> usize {
    let opening_indent = indent_width(lines[start]);
    let mut end = lines.len() - 1;
    for (j, line) in lines.iter().enumerate().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indent_width(line) <= opening_indent && j - start >= MIN_INDENT_FRAGMENT_LINES {
            end = j - 1;
            break;
        }
    }
    // Trim trailing blank lines off the fragment.
    while end > start && lines[end].trim().is_empty() {
        end -= 1;
    }
    end
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn non_whitespace_chars(content: &str) -> usize {
    content.chars().filter(|c| !c.is_whitespace()).count()
}

/// Declaration-start patterns per language. Languages without patterns fall
/// back to whole-file extraction.
fn declaration_patterns(language: Language) -> &'static [&'static str] {
    match language {
        Language::JavaScript | Language::TypeScript => &[
            r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*[\w$]*\s*\(",
            r"^\s*(?:export\s+)?(?:abstract\s+)?class\s+[\w$]",
            r"^\s*(?:export\s+)?(?:const|let|var)\s+[\w$]+\s*=\s*(?:async\s+)?(?:function\b|\()",
        ],
        Language::Python => &[r"^\s*(?:async\s+)?def\s+\w", r"^\s*class\s+\w"],
        Language::Java => &[
            r"^\s*(?:(?:public|private|protected|static|final|abstract)\s+)*(?:class|interface|enum)\s+\w",
            r"^\s*(?:(?:public|private|protected|static|final|synchronized|abstract)\s+)+[\w<>\[\],\s]+\s+\w+\s*\([^;]*$",
        ],
        Language::CSharp => &[
            r"^\s*(?:(?:public|private|protected|internal|static|sealed|abstract)\s+)*(?:class|interface|struct|enum)\s+\w",
            r"^\s*(?:(?:public|private|protected|internal|static|virtual|override|async)\s+)+[\w<>\[\],\s]+\s+\w+\s*\([^;]*$",
        ],
        Language::C => &[
            r"^\s*(?:(?:static|inline|unsigned|signed|extern)\s+)*[A-Za-z_]\w*[\s\*]+[A-Za-z_]\w*\s*\([^;]*$",
            r"^\s*(?:typedef\s+)?struct\s+\w",
        ],
        Language::Cpp => &[
            r"^\s*(?:(?:static|inline|virtual|constexpr|extern)\s+)*[A-Za-z_][\w:<>,\s]*[\s\*&]+[~A-Za-z_][\w:]*\s*\([^;]*$",
            r"^\s*(?:class|struct)\s+\w",
        ],
        Language::Go => &[
            r"^\s*func\s+(?:\(\s*\w+\s+\*?[\w\.]+\s*\)\s*)?\w+\s*\(",
            r"^\s*type\s+\w+\s+(?:struct|interface)\b",
        ],
        Language::Rust => &[
            r"^\s*(?:pub(?:\([\w\s:]+\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+\w",
            r"^\s*(?:pub(?:\([\w\s:]+\))?\s+)?(?:struct|enum|trait|impl)\b",
        ],
        Language::Ruby => &[r"^\s*(?:def|class|module)\s+\w"],
        Language::Php => &[
            r"^\s*(?:(?:public|private|protected|static|abstract|final)\s+)*function\s+\w",
            r"^\s*(?:abstract\s+|final\s+)?class\s+\w",
        ],
        Language::Swift => &[
            r"^\s*(?:(?:public|private|internal|open|fileprivate|static|override)\s+)*func\s+\w",
            r"^\s*(?:(?:public|private|internal|open|final)\s+)*(?:class|struct|enum|extension)\s+\w",
        ],
        Language::Kotlin => &[
            r"^\s*(?:(?:public|private|internal|open|override|suspend)\s+)*fun\s+\w",
            r"^\s*(?:(?:public|private|internal|open|abstract|data|sealed)\s+)*(?:class|object|interface)\s+\w",
        ],
        Language::Scala => &[
            r"^\s*(?:(?:private|protected|override|final)\s+)*def\s+\w",
            r"^\s*(?:(?:private|final|abstract|case)\s+)*(?:class|object|trait)\s+\w",
        ],
        Language::Html | Language::Css | Language::Sql | Language::Unknown => &[],
    }
}
