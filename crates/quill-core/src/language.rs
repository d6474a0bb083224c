//! Language identification for open documents.

use std::fmt;
use std::path::Path;

/// The declared language of a document, inferred from its file extension at
/// open time.
///
/// The wire name (`as_str`) is what the completion backend receives as the
/// `fileType` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    Python,
    JavaScript,
    Html,
    Css,
    Json,
    Markdown,
    Xml,
    Sql,
    Shell,
    Yaml,
    Ini,
    #[default]
    PlainText,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "py" => Language::Python,
            "js" => Language::JavaScript,
            "html" => Language::Html,
            "css" => Language::Css,
            "json" => Language::Json,
            "md" => Language::Markdown,
            "xml" => Language::Xml,
            "sql" => Language::Sql,
            "sh" => Language::Shell,
            "yaml" | "yml" => Language::Yaml,
            "ini" | "conf" => Language::Ini,
            _ => Language::PlainText,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Language::from_extension)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Html => "html",
            Language::Css => "css",
            Language::Json => "json",
            Language::Markdown => "markdown",
            Language::Xml => "xml",
            Language::Sql => "sql",
            Language::Shell => "sh",
            Language::Yaml => "yaml",
            Language::Ini => "ini",
            Language::PlainText => "text",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_language_from_path() {
        assert_eq!(Language::from_path("src/app.py"), Language::Python);
        assert_eq!(Language::from_path("a/b/index.HTML"), Language::Html);
        assert_eq!(Language::from_path("conf/site.yml"), Language::Yaml);
        assert_eq!(Language::from_path("notes"), Language::PlainText);
        assert_eq!(Language::from_path("weird.xyz"), Language::PlainText);
    }

    #[test]
    fn wire_names_match_backend_expectations() {
        assert_eq!(Language::Python.as_str(), "python");
        assert_eq!(Language::Shell.as_str(), "sh");
        assert_eq!(Language::PlainText.as_str(), "text");
    }
}
