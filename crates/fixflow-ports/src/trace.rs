//! Structured call-stack records produced by the stack-trace parser.

use serde::{Deserialize, Serialize};

/// Source language detected from a raw stack trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Go,
    Java,
    CSharp,
    Ruby,
    Rust,
    Unknown,
}

impl Language {
    /// Lowercase ticket tag for this language. `None` for [`Language::Unknown`],
    /// which never appears on work items.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Language::JavaScript => Some("javascript"),
            Language::TypeScript => Some("typescript"),
            Language::Python => Some("python"),
            Language::Go => Some("go"),
            Language::Java => Some("java"),
            Language::CSharp => Some("csharp"),
            Language::Ruby => Some("ruby"),
            Language::Rust => Some("rust"),
            Language::Unknown => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag().unwrap_or("unknown"))
    }
}

/// One call frame extracted from a raw stack trace.
///
/// The file path is kept exactly as it appeared in the raw text. A frame with
/// only a file path is still valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub file: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub function: Option<String>,
    pub class_name: Option<String>,

    /// True when the frame belongs to the application under investigation
    /// rather than vendor/runtime code.
    pub first_party: bool,

    /// Explicit repository association ("owner/name"), when the producer
    /// annotated the frame.
    pub repository: Option<String>,
}

impl Frame {
    /// Frame with just a file path; everything else absent, first-party
    /// until classified otherwise.
    pub fn for_file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
            function: None,
            class_name: None,
            first_party: true,
            repository: None,
        }
    }

    /// File base name with the extension stripped ("src/app.ts" -> "app").
    pub fn file_stem(&self) -> &str {
        let base = self
            .file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file.as_str());
        base.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(base)
    }
}

/// Parsed, language-tagged call stack. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedStackTrace {
    /// Original raw text, verbatim.
    pub raw: String,

    /// Frames in call order, outermost (most recent) first.
    pub frames: Vec<Frame>,

    pub language: Language,

    /// Resolved error type ("TypeError", "ValueError", ...), when the first
    /// line matched a known convention.
    pub error_type: Option<String>,

    pub error_message: String,
}

impl ParsedStackTrace {
    /// Frames classified as application code, in original order.
    pub fn first_party_frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().filter(|f| f.first_party)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tags() {
        assert_eq!(Language::TypeScript.tag(), Some("typescript"));
        assert_eq!(Language::CSharp.tag(), Some("csharp"));
        assert_eq!(Language::Unknown.tag(), None);
        assert_eq!(Language::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_frame_file_stem() {
        assert_eq!(Frame::for_file("src/app.service.ts").file_stem(), "app.service");
        assert_eq!(Frame::for_file("C:\\api\\Handler.cs").file_stem(), "Handler");
        assert_eq!(Frame::for_file("Makefile").file_stem(), "Makefile");
    }

    #[test]
    fn test_first_party_frames_filter() {
        let mut vendor = Frame::for_file("node_modules/express/lib/router.js");
        vendor.first_party = false;
        let trace = ParsedStackTrace {
            raw: String::new(),
            frames: vec![Frame::for_file("src/app.js"), vendor],
            language: Language::JavaScript,
            error_type: None,
            error_message: String::new(),
        };
        let own: Vec<_> = trace.first_party_frames().collect();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].file, "src/app.js");
    }
}
