//! Language detection and error-header extraction.
//!
//! Detection is a prioritized pattern match over the whole raw text,
//! evaluated top to bottom, first match wins. The precedence is a fixed
//! design choice and intentionally not configurable.

use std::sync::OnceLock;

use regex::Regex;

use fixflow_ports::Language;

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("hard-coded pattern compiles"))
}

/// `at fn (path:line:col)` with a source-file extension.
fn ecma_frame() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r"(?m)^\s*at\s+(?:\S.*?\s+)?\(?\S+\.(?:tsx?|jsx?|mjs|cjs):\d+:\d+\)?",
    )
}

/// `File "path", line N` traceback line.
fn python_frame() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r#"(?m)^\s*File "[^"]+", line \d+"#)
}

/// `path.go:line` token; combined with a goroutine marker.
fn go_location() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"\.go:\d+")
}

/// `at Class.method(File.java:line)`.
fn java_frame() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?m)^\s*at [\w$.]+\([\w$]+\.java:\d+\)")
}

/// `at ... in path:line N`.
fn csharp_frame() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?m)^\s*at .+ in .+:line \d+")
}

/// `path.rb:line:in `method'`.
fn ruby_frame() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?m)\S+\.rb:\d+:in `[^']*'")
}

/// `path.rs:line` token; combined with a thread-panic marker.
fn rust_location() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"\.rs:\d+")
}

/// `<WordEndingInError>: message` (ECMAScript convention).
fn ecma_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"^([A-Za-z_$][A-Za-z0-9_$]*Error):\s*(.+)$")
}

/// `<dotted.path.Error|Exception>: message` (scripting convention).
fn dotted_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r"^((?:[A-Za-z_]\w*\.)*[A-Za-z_]\w*(?:Error|Exception)):\s*(.+)$",
    )
}

/// Detect the source language of a raw stack trace.
pub fn detect_language(raw: &str) -> Language {
    if let Some(m) = ecma_frame().find(raw) {
        if m.as_str().contains(".ts") {
            return Language::TypeScript;
        }
        return Language::JavaScript;
    }
    if python_frame().is_match(raw) {
        return Language::Python;
    }
    if go_location().is_match(raw) && raw.contains("goroutine ") {
        return Language::Go;
    }
    if java_frame().is_match(raw) {
        return Language::Java;
    }
    if csharp_frame().is_match(raw) {
        return Language::CSharp;
    }
    if ruby_frame().is_match(raw) {
        return Language::Ruby;
    }
    if rust_location().is_match(raw) && raw.contains("panicked") {
        return Language::Rust;
    }
    Language::Unknown
}

/// Split the first non-empty line into (error type, message) when it matches
/// a known `Type: message` convention; otherwise the type is absent and the
/// message falls back to the provided message or that line verbatim.
pub fn extract_error_header(raw: &str, provided_message: Option<&str>) -> (Option<String>, String) {
    let first_line = raw.lines().map(str::trim).find(|line| !line.is_empty());

    if let Some(line) = first_line {
        for header in [ecma_header(), dotted_header()] {
            if let Some(caps) = header.captures(line) {
                return (
                    Some(caps[1].to_string()),
                    caps[2].trim().to_string(),
                );
            }
        }
    }

    let message = provided_message
        .map(str::to_string)
        .or_else(|| first_line.map(str::to_string))
        .unwrap_or_default();
    (None, message)
}
