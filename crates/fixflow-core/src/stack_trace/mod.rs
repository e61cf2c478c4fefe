//! Stack-trace classification and parsing.
//!
//! [`parse`] turns an arbitrary text blob into a structured,
//! language-tagged call stack. It never fails: unrecognized input yields
//! [`Language::Unknown`], a best-effort frame list, and the provided
//! message (or the first non-empty line) as the error message.

pub mod classify;
pub mod extract;

use fixflow_ports::{Language, ParsedStackTrace};

/// Parse a raw stack trace.
///
/// `provided_message` is the error message reported alongside the trace,
/// used when the first line does not carry a `Type: message` header.
pub fn parse(raw: &str, provided_message: Option<&str>) -> ParsedStackTrace {
    let language = classify::detect_language(raw);
    let frames = extract::extract_frames(language, raw);
    let (error_type, error_message) = classify::extract_error_header(raw, provided_message);

    ParsedStackTrace {
        raw: raw.to_string(),
        frames,
        language,
        error_type,
        error_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS_TRACE: &str = "TypeError: Cannot read property 'map' of undefined\n    at CheckoutView.render (src/views/checkout.ts:42:17)\n    at processQueue (node_modules/react-dom/lib/queue.js:88:9)";

    #[test]
    fn test_parse_typescript_trace() {
        let trace = parse(TS_TRACE, None);
        assert_eq!(trace.language, Language::TypeScript);
        assert_eq!(trace.error_type.as_deref(), Some("TypeError"));
        assert_eq!(
            trace.error_message,
            "Cannot read property 'map' of undefined"
        );
        assert_eq!(trace.frames.len(), 2);
        assert_eq!(trace.frames[0].file, "src/views/checkout.ts");
        assert_eq!(trace.frames[0].line, Some(42));
        assert_eq!(trace.frames[0].column, Some(17));
        assert!(trace.frames[0].first_party);
        assert!(!trace.frames[1].first_party);
    }

    #[test]
    fn test_parse_python_trace() {
        let raw = "Traceback (most recent call last):\n  File \"app/services/billing.py\", line 77, in charge\n    total = sum(i.price for i in items)\nbilling.errors.ChargeError: no items";
        let trace = parse(raw, None);
        assert_eq!(trace.language, Language::Python);
        assert_eq!(trace.frames.len(), 1);
        assert!(trace.frames[0].file.contains(".py"));
        assert_eq!(trace.frames[0].line, Some(77));
        assert_eq!(trace.frames[0].function.as_deref(), Some("charge"));
    }

    #[test]
    fn test_parse_unrecognized_input_never_fails() {
        let trace = parse("segmentation fault (core dumped)", Some("crash"));
        assert_eq!(trace.language, Language::Unknown);
        assert!(trace.frames.is_empty());
        assert_eq!(trace.error_type, None);
        assert_eq!(trace.error_message, "crash");
    }

    #[test]
    fn test_parse_empty_input() {
        let trace = parse("", None);
        assert_eq!(trace.language, Language::Unknown);
        assert!(trace.frames.is_empty());
        assert_eq!(trace.error_message, "");

        let trace = parse("", Some("reported message"));
        assert_eq!(trace.error_message, "reported message");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse(TS_TRACE, Some("msg"));
        let second = parse(TS_TRACE, Some("msg"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_preserves_raw_verbatim() {
        let trace = parse(TS_TRACE, None);
        assert_eq!(trace.raw, TS_TRACE);
    }
}
