//! Structural tier: regex-derived canonical shapes.
//!
//! Per-language regex suites reduce raw content to declaration/control
//! shapes with identifiers and conditions erased ("function ID(CONDITION)",
//! "if (CONDITION)", "class ID extends ID"). Canonical forms are
//! per-language, so cross-language structural matches do not emerge; the
//! n-gram and LCS tiers carry that load.

use chrono::Utc;
use motif_core::record::{Pattern, PatternKind, Snippet};
use motif_lang::Language;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How a language writes its control-flow heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlStyle {
    /// `if (cond) {`: condition in parentheses.
    Paren,
    /// `if cond {`: bare condition before a brace.
    Brace,
    /// `if cond:`: indent-scoped heads.
    Indent,
    None,
}

fn control_style(language: Language) -> ControlStyle {
    match language {
        Language::JavaScript
        | Language::TypeScript
        | Language::Java
        | Language::CSharp
        | Language::C
        | Language::Cpp
        | Language::Php
        | Language::Kotlin
        | Language::Scala => ControlStyle::Paren,
        Language::Go | Language::Rust | Language::Swift => ControlStyle::Brace,
        Language::Python | Language::Ruby => ControlStyle::Indent,
        Language::Html | Language::Css | Language::Sql | Language::Unknown => ControlStyle::None,
    }
}

/// Owns the compiled regex suites; build once per synthesis run.
pub struct StructuralTagger {
    functions: HashMap<Language, Vec<(Regex, &'static str)>>,
    control_paren: Regex,
    control_brace: Regex,
    control_indent: Regex,
    control_indent_bare: Regex,
    control_bare: Regex,
    class_decl: Regex,
    extends_tail: Regex,
    extends_tail_ruby: Regex,
}

impl Default for StructuralTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralTagger {
    pub fn new() -> Self {
        let mut functions: HashMap<Language, Vec<(Regex, &'static str)>> = HashMap::new();
        for &(language, pattern, canonical) in FUNCTION_RULES {
            functions
                .entry(language)
                .or_default()
                .push((Regex::new(pattern).expect("static regex"), canonical));
        }
        Self {
            functions,
            control_paren: Regex::new(r"\b(if|while|for|switch|catch)\s*\(")
                .expect("static regex"),
            control_brace: Regex::new(r"(?m)^\s*(if|while|for|switch)\b[^{\n]*\{")
                .expect("static regex"),
            control_indent: Regex::new(r"(?m)^\s*(if|elif|while|for|except)\b")
                .expect("static regex"),
            control_indent_bare: Regex::new(r"(?m)^\s*(try|finally)\s*:").expect("static regex"),
            control_bare: Regex::new(r"\b(try|finally)\b").expect("static regex"),
            class_decl: Regex::new(r"\b(?:class|struct)\s+[A-Za-z_]\w*").expect("static regex"),
            extends_tail: Regex::new(
                r"^[ \t]*(?:extends\s+[A-Za-z_]|\([ \t]*[A-Za-z_]|:[ \t]*[A-Za-z_])",
            )
            .expect("static regex"),
            extends_tail_ruby: Regex::new(r"^[ \t]*<[ \t]*[A-Za-z_]").expect("static regex"),
        }
    }

    /// Canonical tags for one snippet's raw content.
    pub fn tags(&self, content: &str, language: Language) -> Vec<String> {
        let mut tags = Vec::new();

        if let Some(rules) = self.functions.get(&language) {
            for (re, canonical) in rules {
                for _ in re.find_iter(content) {
                    tags.push((*canonical).to_string());
                }
            }
        }

        match control_style(language) {
            ControlStyle::Paren => {
                for caps in self.control_paren.captures_iter(content) {
                    tags.push(format!("{} (CONDITION)", &caps[1]));
                }
                for caps in self.control_bare.captures_iter(content) {
                    tags.push(caps[1].to_string());
                }
            }
            ControlStyle::Brace => {
                for caps in self.control_brace.captures_iter(content) {
                    tags.push(format!("{} (CONDITION)", &caps[1]));
                }
            }
            ControlStyle::Indent => {
                for caps in self.control_indent.captures_iter(content) {
                    tags.push(format!("{} (CONDITION)", &caps[1]));
                }
                for caps in self.control_indent_bare.captures_iter(content) {
                    tags.push(caps[1].to_string());
                }
            }
            ControlStyle::None => {}
        }

        if language != Language::Sql && language != Language::Css {
            for m in self.class_decl.find_iter(content) {
                let tail = &content[m.end()..];
                let extended = if language == Language::Ruby {
                    self.extends_tail_ruby.is_match(tail)
                } else {
                    self.extends_tail.is_match(tail)
                };
                tags.push(
                    if extended {
                        "class ID extends ID"
                    } else {
                        "class ID"
                    }
                    .to_string(),
                );
            }
        }

        tags
    }
}

/// Per-language function-signature rules: (language, pattern, canonical).
const FUNCTION_RULES: &[(Language, &str, &str)] = &[
    (
        Language::JavaScript,
        r"\bfunction\s+[\w$]+\s*\([^)]*\)",
        "function ID(CONDITION)",
    ),
    (
        Language::TypeScript,
        r"\bfunction\s+[\w$]+\s*\([^)]*\)",
        "function ID(CONDITION)",
    ),
    (
        Language::Python,
        r"\bdef\s+\w+\s*\([^)]*\)",
        "def ID(CONDITION)",
    ),
    (Language::Ruby, r"(?m)^\s*def\s+\w+", "def ID(CONDITION)"),
    (Language::Rust, r"\bfn\s+\w+", "fn ID(CONDITION)"),
    (
        Language::Go,
        r"\bfunc\s+(?:\([^)]*\)\s*)?\w+\s*\(",
        "func ID(CONDITION)",
    ),
    (
        Language::Java,
        r"(?m)^\s*(?:(?:public|private|protected|static|final|synchronized|abstract)\s+)+[\w<>\[\]]+\s+\w+\s*\([^)]*\)",
        "method ID(CONDITION)",
    ),
    (
        Language::CSharp,
        r"(?m)^\s*(?:(?:public|private|protected|internal|static|virtual|override|async)\s+)+[\w<>\[\]]+\s+\w+\s*\([^)]*\)",
        "method ID(CONDITION)",
    ),
    (
        Language::Php,
        r"\bfunction\s+\w+\s*\([^)]*\)",
        "function ID(CONDITION)",
    ),
    (Language::Swift, r"\bfunc\s+\w+\s*\(", "func ID(CONDITION)"),
    (Language::Kotlin, r"\bfun\s+\w+\s*\(", "fun ID(CONDITION)"),
    (Language::Scala, r"\bdef\s+\w+", "def ID(CONDITION)"),
    (
        Language::C,
        r"(?m)^[A-Za-z_][\w\s\*]*\s\*?[A-Za-z_]\w*\s*\([^;{}]*\)\s*\{",
        "function ID(CONDITION)",
    ),
    (
        Language::Cpp,
        r"(?m)^[A-Za-z_][\w\s\*:<>,&]*\s[\*&]?[~A-Za-z_][\w:]*\s*\([^;{}]*\)\s*\{",
        "function ID(CONDITION)",
    ),
];

/// Count canonical-form occurrences across all snippets and emit the forms
/// supported by at least `min_frequency` snippets.
pub fn mine(snippets: &[Snippet], min_frequency: usize) -> Vec<Pattern> {
    let tagger = StructuralTagger::new();

    #[derive(Default)]
    struct Support {
        snippet_ids: BTreeSet<String>,
        languages: BTreeSet<String>,
    }

    let mut support: BTreeMap<String, Support> = BTreeMap::new();
    for snippet in snippets {
        let language = Language::from_name(&snippet.language).unwrap_or(Language::Unknown);
        for tag in tagger.tags(&snippet.content, language) {
            let entry = support.entry(tag).or_default();
            entry.snippet_ids.insert(snippet.id.clone());
            entry.languages.insert(snippet.language.clone());
        }
    }

    let total = snippets.len();
    let now = Utc::now();
    let mut patterns = Vec::new();
    for (content, entry) in support {
        if entry.snippet_ids.len() < min_frequency {
            continue;
        }
        let frequency = entry.snippet_ids.len();
        patterns.push(Pattern {
            id: format!("ast_{:04}", patterns.len() + 1),
            kind: PatternKind::Ast,
            content,
            frequency,
            confidence: if total == 0 {
                0.0
            } else {
                frequency as f64 / total as f64
            },
            snippet_ids: entry.snippet_ids,
            languages: entry.languages,
            created_at: now,
        });
    }
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use motif_core::record::content_hash;

    fn make_snippet(id: &str, language: &str, content: &str) -> Snippet {
        Snippet {
            id: id.to_string(),
            content_hash: content_hash(content),
            content: content.to_string(),
            language: language.to_string(),
            file: format!("{id}.src"),
            line_start: 1,
            line_end: 1,
            tokens: Vec::new(),
            signature: vec![0; 4],
            cluster_id: None,
            created_at: Utc::now(),
        }
    }

    fn tags_for(content: &str, language: Language) -> Vec<String> {
        StructuralTagger::new().tags(content, language)
    }

    #[test]
    fn test_js_function_signature_canonicalised() {
        let tags = tags_for("function add(a, b) { return a + b; }", Language::JavaScript);
        assert!(tags.contains(&"function ID(CONDITION)".to_string()));
    }

    #[test]
    fn test_python_and_js_forms_stay_distinct() {
        let js = tags_for("function add(a, b) { return a + b }", Language::JavaScript);
        let py = tags_for("def add(a, b):\n    return a + b", Language::Python);
        assert!(js.contains(&"function ID(CONDITION)".to_string()));
        assert!(py.contains(&"def ID(CONDITION)".to_string()));
        assert!(!py.contains(&"function ID(CONDITION)".to_string()));
    }

    #[test]
    fn test_control_flow_heads() {
        let tags = tags_for(
            "if (ready) { go(); } while (busy) { wait(); } try { x(); } catch (e) {}",
            Language::JavaScript,
        );
        assert!(tags.contains(&"if (CONDITION)".to_string()));
        assert!(tags.contains(&"while (CONDITION)".to_string()));
        assert!(tags.contains(&"catch (CONDITION)".to_string()));
        assert!(tags.contains(&"try".to_string()));
    }

    #[test]
    fn test_brace_style_control_for_go() {
        let tags = tags_for(
            "func run() {\n\tif err != nil {\n\t\treturn\n\t}\n\tfor i := 0; i < n; i++ {\n\t}\n}",
            Language::Go,
        );
        assert!(tags.contains(&"if (CONDITION)".to_string()));
        assert!(tags.contains(&"for (CONDITION)".to_string()));
    }

    #[test]
    fn test_class_declarations() {
        let plain = tags_for("class Parser { }", Language::JavaScript);
        assert!(plain.contains(&"class ID".to_string()));

        let extended = tags_for("class Parser extends Reader { }", Language::JavaScript);
        assert!(extended.contains(&"class ID extends ID".to_string()));

        let py_extended = tags_for("class Parser(Reader):\n    pass", Language::Python);
        assert!(py_extended.contains(&"class ID extends ID".to_string()));

        let py_plain = tags_for("class Parser:\n    pass", Language::Python);
        assert!(py_plain.contains(&"class ID".to_string()));

        let ruby = tags_for("class Parser < Reader\nend", Language::Ruby);
        assert!(ruby.contains(&"class ID extends ID".to_string()));
    }

    #[test]
    fn test_generic_class_is_not_extends() {
        let tags = tags_for("public class Box<T> { }", Language::Java);
        assert!(tags.contains(&"class ID".to_string()));
        assert!(!tags.contains(&"class ID extends ID".to_string()));
    }

    #[test]
    fn test_mine_counts_distinct_snippets() {
        let snippets = vec![
            make_snippet("a", "javascript", "function one(x) { return x; }"),
            make_snippet("b", "javascript", "function two(y) { return y; }"),
            make_snippet("c", "python", "def three(z):\n    return z"),
        ];

        let patterns = mine(&snippets, 2);
        let js_fn = patterns
            .iter()
            .find(|p| p.content == "function ID(CONDITION)")
            .expect("shared JS form must be emitted");
        assert_eq!(js_fn.frequency, 2);
        assert_eq!(js_fn.kind, PatternKind::Ast);
        assert!((js_fn.confidence - 2.0 / 3.0).abs() < 1e-9);

        // The lone Python form misses min_frequency.
        assert!(!patterns.iter().any(|p| p.content == "def ID(CONDITION)"));
    }

    #[test]
    fn test_markup_languages_yield_no_tags() {
        assert!(tags_for("<div class=\"row\"></div>", Language::Html).is_empty());
        assert!(tags_for(".row { color: red; }", Language::Css).is_empty());
    }
}
