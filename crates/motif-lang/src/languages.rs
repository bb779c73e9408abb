//! Language detection and per-language syntax metadata.
//!
//! Detection is by file extension only; content sniffing is deliberately
//! not used. Unknown extensions yield [`Language::Unknown`], which callers
//! filter out before extraction.

use std::path::Path;

/// Supported language tags (closed vocabulary), plus `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Java,
    Cpp,
    C,
    CSharp,
    Go,
    Rust,
    Ruby,
    Php,
    Swift,
    Kotlin,
    Scala,
    Html,
    Css,
    Sql,
    Unknown,
}

/// Comment syntax used during normalisation.
#[derive(Debug, Clone, Copy)]
pub struct CommentStyle {
    /// Single-line comment markers, e.g. `//`, `#`, `--`.
    pub line: &'static [&'static str],
    /// Multi-line open/close pair, e.g. `/* */` or `<!-- -->`.
    pub block: Option<(&'static str, &'static str)>,
}

impl Language {
    /// All known tags, in detection-table order.
    pub const ALL: [Language; 17] = [
        Self::JavaScript,
        Self::TypeScript,
        Self::Python,
        Self::Java,
        Self::Cpp,
        Self::C,
        Self::CSharp,
        Self::Go,
        Self::Rust,
        Self::Ruby,
        Self::Php,
        Self::Swift,
        Self::Kotlin,
        Self::Scala,
        Self::Html,
        Self::Css,
        Self::Sql,
    ];

    /// Detect language from a file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "tsx" => Self::TypeScript,
            "py" => Self::Python,
            "java" => Self::Java,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => Self::Cpp,
            "c" | "h" => Self::C,
            "cs" => Self::CSharp,
            "go" => Self::Go,
            "rs" => Self::Rust,
            "rb" => Self::Ruby,
            "php" => Self::Php,
            "swift" => Self::Swift,
            "kt" | "kts" => Self::Kotlin,
            "scala" => Self::Scala,
            "html" | "htm" => Self::Html,
            "css" => Self::Css,
            "sql" => Self::Sql,
            _ => Self::Unknown,
        }
    }

    /// Detect language from a path's extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Self::Unknown, Self::from_extension)
    }

    /// Display name; stored verbatim in records.
    pub fn name(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Python => "python",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::CSharp => "csharp",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
            Self::Scala => "scala",
            Self::Html => "html",
            Self::Css => "css",
            Self::Sql => "sql",
            Self::Unknown => "unknown",
        }
    }

    /// Parse language from name string (as returned by `name()`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.name() == name)
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    /// Comment syntax for normalisation.
    pub fn comment_style(self) -> CommentStyle {
        match self {
            Self::Python | Self::Ruby => CommentStyle {
                line: &["#"],
                block: None,
            },
            Self::Php => CommentStyle {
                line: &["//", "#"],
                block: Some(("/*", "*/")),
            },
            Self::Sql => CommentStyle {
                line: &["--"],
                block: Some(("/*", "*/")),
            },
            Self::Html => CommentStyle {
                line: &[],
                block: Some(("<!--", "-->")),
            },
            Self::Css => CommentStyle {
                line: &[],
                block: Some(("/*", "*/")),
            },
            // The C-family default also covers Unknown, which only shows up
            // in tests; unknown files are filtered before tokenisation.
            _ => CommentStyle {
                line: &["//"],
                block: Some(("/*", "*/")),
            },
        }
    }

    /// Whether fragment extraction uses the indentation heuristic instead
    /// of brace matching.
    pub fn indent_scoped(self) -> bool {
        self == Self::Python
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension_table_covers_all_tags() {
        assert_eq!(Language::from_extension("js"), Language::JavaScript);
        assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("hpp"), Language::Cpp);
        assert_eq!(Language::from_extension("h"), Language::C);
        assert_eq!(Language::from_extension("kts"), Language::Kotlin);
        assert_eq!(Language::from_extension("xyz"), Language::Unknown);
    }

    #[test]
    fn test_seventeen_known_languages() {
        assert_eq!(Language::ALL.len(), 17);
        assert!(Language::ALL.iter().all(|lang| lang.is_known()));
    }

    #[test]
    fn test_name_roundtrip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_name(lang.name()), Some(lang));
        }
        assert_eq!(Language::from_name("unknown"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            Language::from_path(&PathBuf::from("src/main.rs")),
            Language::Rust
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("README")),
            Language::Unknown
        );
    }

    #[test]
    fn test_comment_styles() {
        assert_eq!(Language::Python.comment_style().line, &["#"]);
        assert!(Language::Python.comment_style().block.is_none());
        assert_eq!(Language::Sql.comment_style().line, &["--"]);
        assert_eq!(
            Language::Html.comment_style().block,
            Some(("<!--", "-->"))
        );
        assert_eq!(Language::Go.comment_style().line, &["//"]);
    }
}
