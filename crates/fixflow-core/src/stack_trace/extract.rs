//! Frame extraction strategies, dispatched by detected language.
//!
//! Four language-specific extractors (ECMAScript, Python, Java, C#) plus a
//! generic `file.ext:line` fallback for everything else. Strategies scan
//! line by line and preserve encounter order; numeric fields that fail to
//! parse are left absent.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use fixflow_ports::{Frame, Language};

/// Path/qualifier markers for vendor, runtime, and native frames.
/// A frame matching any of these is never first-party.
const VENDOR_MARKERS: &[&str] = &[
    // dependency directories
    "node_modules",
    "bower_components",
    "vendor/",
    "site-packages",
    "dist-packages",
    ".cargo/registry",
    // packaged library directories
    "/usr/lib/",
    "/usr/local/lib/",
    "program files",
    // runtime internals
    "internal/",
    "node:",
    "<frozen ",
    // anonymous functions
    "<anonymous>",
    // native code
    "[native code]",
    "native method",
];

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("hard-coded pattern compiles"))
}

fn ecma_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"^\s*at\s+(?:(.+?)\s+)?\(?([^()\s]+):(\d+):(\d+)\)?\s*$")
}

fn python_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r#"^\s*File "([^"]+)", line (\d+)(?:, in (.+))?\s*$"#)
}

fn java_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"^\s*at ([\w$.]+)\.([\w$<>]+)\(([\w$]+\.java):(\d+)\)\s*$")
}

fn csharp_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"^\s*at (.+?) in (.+?):line (\d+)\s*$")
}

fn generic_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"([A-Za-z0-9_.\-/\\]+\.[A-Za-z][A-Za-z0-9]*):(\d+)")
}

/// Pure marker test: is this frame application code?
pub fn is_first_party(file: &str, qualifier: Option<&str>) -> bool {
    let file = file.to_lowercase();
    let qualifier = qualifier.map(str::to_lowercase);
    !VENDOR_MARKERS.iter().any(|marker| {
        file.contains(marker)
            || qualifier
                .as_deref()
                .map(|q| q.contains(marker))
                .unwrap_or(false)
    })
}

fn frame(
    file: &str,
    line: Option<u32>,
    column: Option<u32>,
    function: Option<String>,
    class_name: Option<String>,
) -> Frame {
    let qualifier = match (&class_name, &function) {
        (Some(class), Some(func)) => Some(format!("{class}.{func}")),
        (Some(class), None) => Some(class.clone()),
        (None, Some(func)) => Some(func.clone()),
        (None, None) => None,
    };
    Frame {
        first_party: is_first_party(file, qualifier.as_deref()),
        file: file.to_string(),
        line,
        column,
        function,
        class_name,
        repository: None,
    }
}

/// Split an `Outer.inner` qualifier into (class, function).
fn split_qualifier(qualifier: &str) -> (Option<String>, Option<String>) {
    match qualifier.rsplit_once('.') {
        Some((class, func)) if !class.is_empty() && !func.is_empty() => {
            (Some(class.to_string()), Some(func.to_string()))
        }
        _ => (None, Some(qualifier.to_string())),
    }
}

/// Extract frames using the strategy for the detected language.
pub fn extract_frames(language: Language, raw: &str) -> Vec<Frame> {
    match language {
        Language::JavaScript | Language::TypeScript => ecmascript_frames(raw),
        Language::Python => python_frames(raw),
        Language::Java => java_frames(raw),
        Language::CSharp => csharp_frames(raw),
        Language::Go | Language::Ruby | Language::Rust | Language::Unknown => generic_frames(raw),
    }
}

fn ecmascript_frames(raw: &str) -> Vec<Frame> {
    let mut frames = Vec::new();
    for line in raw.lines() {
        if let Some(caps) = ecma_line().captures(line) {
            let (class_name, function) = match caps.get(1) {
                Some(qualifier) => split_qualifier(qualifier.as_str()),
                None => (None, None),
            };
            frames.push(frame(
                &caps[2],
                caps[3].parse().ok(),
                caps[4].parse().ok(),
                function,
                class_name,
            ));
        }
    }
    frames
}

fn python_frames(raw: &str) -> Vec<Frame> {
    let mut frames = Vec::new();
    for line in raw.lines() {
        if let Some(caps) = python_line().captures(line) {
            frames.push(frame(
                &caps[1],
                caps[2].parse().ok(),
                None,
                caps.get(3).map(|m| m.as_str().trim().to_string()),
                None,
            ));
        }
    }
    frames
}

fn java_frames(raw: &str) -> Vec<Frame> {
    let mut frames = Vec::new();
    for line in raw.lines() {
        if let Some(caps) = java_line().captures(line) {
            frames.push(frame(
                &caps[3],
                caps[4].parse().ok(),
                None,
                Some(caps[2].to_string()),
                Some(caps[1].to_string()),
            ));
        }
    }
    frames
}

fn csharp_frames(raw: &str) -> Vec<Frame> {
    let mut frames = Vec::new();
    for line in raw.lines() {
        if let Some(caps) = csharp_line().captures(line) {
            // Strip the argument list from `Namespace.Class.Method(args)`.
            let qualifier = caps[1]
                .split_once('(')
                .map(|(head, _)| head)
                .unwrap_or(&caps[1])
                .trim()
                .to_string();
            let (class_name, function) = split_qualifier(&qualifier);
            frames.push(frame(
                &caps[2],
                caps[3].parse().ok(),
                None,
                function,
                class_name,
            ));
        }
    }
    frames
}

/// Fallback: any `file.ext:line` token anywhere in a line, one frame per
/// distinct file path.
fn generic_frames(raw: &str) -> Vec<Frame> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut frames = Vec::new();
    for line in raw.lines() {
        for caps in generic_token().captures_iter(line) {
            let file = caps[1].to_string();
            if !seen.insert(file.clone()) {
                continue;
            }
            frames.push(frame(&file, caps[2].parse().ok(), None, None, None));
        }
    }
    frames
}
