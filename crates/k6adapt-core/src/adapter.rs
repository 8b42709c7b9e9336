//! The export rewrite.
//!
//! k6 requires the `options` export of a test script to be a plain object,
//! but the compiled module exports its zero-argument options provider under
//! that name. The adapter splices in a declaration that invokes the provider
//! once at load time and re-exports the result as `options`, leaving the
//! `default` export untouched.

use tracing::debug;

use crate::config::{AdapterConfig, MultiMatchPolicy};
use crate::error::{AdaptError, Result};
use crate::scanner::{find_export_clauses, is_ident_char, is_ident_start, ExportClause};

/// Base name for the binding that holds the invoked options value.
const FRESH_BINDING_BASE: &str = "__options";

/// Outcome of [`adapt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptResult {
    /// Whether the document was rewritten.
    pub changed: bool,
    /// The (possibly rewritten) document text. Equal to the input
    /// byte-for-byte when `changed` is false.
    pub output: String,
    /// Matching clauses beyond the first that were left untouched under
    /// [`MultiMatchPolicy::First`].
    pub extra_matches: usize,
}

/// Rewrite the first `export { A as options, B as default }` clause so the
/// result of `A()` is exported instead of `A` itself.
///
/// Pure over the document text; persistence is the caller's concern. Clauses
/// that were already converted by a previous run are skipped, so re-running
/// over the adapter's own output is a no-op rather than a double-wrap.
pub fn adapt(document: &str, config: &AdapterConfig) -> Result<AdaptResult> {
    let clauses: Vec<ExportClause> = find_export_clauses(document)
        .into_iter()
        .filter(|clause| !is_already_converted(document, clause))
        .collect();

    let Some(clause) = clauses.first() else {
        return Ok(AdaptResult {
            changed: false,
            output: document.to_string(),
            extra_matches: 0,
        });
    };

    if clauses.len() > 1 && config.multi_match == MultiMatchPolicy::Error {
        return Err(AdaptError::AmbiguousMatch {
            count: clauses.len(),
        });
    }

    let fresh = fresh_binding(document);
    debug!(
        options = %clause.options_binding,
        default = %clause.default_binding,
        binding = %fresh,
        "rewriting options export"
    );

    let mut output = String::with_capacity(document.len() + 64);
    output.push_str(&document[..clause.span.start]);
    output.push_str(&format!(
        "const {} = {}();\n",
        fresh, clause.options_binding
    ));
    output.push_str(&format!(
        "export {{ {} as options, {} as default }}",
        fresh, clause.default_binding
    ));
    output.push_str(&document[clause.span.end..]);

    Ok(AdaptResult {
        changed: true,
        output,
        extra_matches: clauses.len() - 1,
    })
}

/// Choose a binding name that does not occur anywhere in `document`.
fn fresh_binding(document: &str) -> String {
    if !contains_token(document, FRESH_BINDING_BASE) {
        return FRESH_BINDING_BASE.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{FRESH_BINDING_BASE}{n}");
        if !contains_token(document, &candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Whole-token occurrence check for an identifier.
fn contains_token(document: &str, token: &str) -> bool {
    let bytes = document.as_bytes();
    let mut from = 0;
    while let Some(offset) = document[from..].find(token) {
        let start = from + offset;
        let end = start + token.len();
        let before_ok = start == 0 || !is_ident_char(bytes[start - 1]);
        let after_ok = end >= bytes.len() || !is_ident_char(bytes[end]);
        if before_ok && after_ok {
            return true;
        }
        from = start + 1;
    }
    false
}

/// A clause counts as converted when the statement right before it is the
/// declaration this adapter emits: `const <optionsBinding> = <ident>();`.
fn is_already_converted(document: &str, clause: &ExportClause) -> bool {
    let before = document[..clause.span.start].trim_end();
    match before.rsplit('\n').next() {
        Some(line) => is_call_result_declaration(line.trim(), &clause.options_binding),
        None => false,
    }
}

fn is_call_result_declaration(line: &str, binding: &str) -> bool {
    let Some(rest) = line.strip_prefix("const ") else {
        return false;
    };
    let Some(rest) = rest.trim_start().strip_prefix(binding) else {
        return false;
    };
    if rest.as_bytes().first().copied().is_some_and(is_ident_char) {
        return false;
    }
    let rest = rest.trim_start();
    let Some(rest) = rest.strip_prefix('=') else {
        return false;
    };
    let rest = rest.trim_start();
    let Some(open) = rest.find('(') else {
        return false;
    };
    is_identifier(rest[..open].trim_end()) && rest[open..].trim_end_matches(';').trim() == "()"
}

fn is_identifier(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(&b) if is_ident_start(b) => bytes.iter().all(|&b| is_ident_char(b)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> AdapterConfig {
        AdapterConfig::default()
    }

    fn error_config() -> AdapterConfig {
        AdapterConfig {
            multi_match: MultiMatchPolicy::Error,
            ..AdapterConfig::default()
        }
    }

    #[test]
    fn test_converts_options_export() {
        let input = "function getOptions() { return { vus: 1 }; }\nfunction runTest() {}\nexport { getOptions as options, runTest as default };\n";
        let result = adapt(input, &default_config()).unwrap();

        assert!(result.changed);
        assert_eq!(result.extra_matches, 0);

        let decl = result.output.find("const __options = getOptions();").unwrap();
        let export = result
            .output
            .find("export { __options as options, runTest as default }")
            .unwrap();
        assert!(decl < export);
        // Original provider function body is untouched.
        assert!(result.output.contains("function getOptions() { return { vus: 1 }; }"));
    }

    #[test]
    fn test_trailing_semicolon_preserved() {
        let input = "export { a as options, b as default };\n";
        let result = adapt(input, &default_config()).unwrap();
        assert!(result
            .output
            .ends_with("export { __options as options, b as default };\n"));
    }

    #[test]
    fn test_no_match_returns_document_verbatim() {
        let input = "export { fn as default };\n";
        let result = adapt(input, &default_config()).unwrap();

        assert!(!result.changed);
        assert_eq!(result.output, input);
        assert_eq!(result.extra_matches, 0);
    }

    #[test]
    fn test_empty_document() {
        let result = adapt("", &default_config()).unwrap();
        assert!(!result.changed);
        assert_eq!(result.output, "");
    }

    #[test]
    fn test_second_run_is_noop() {
        let input = "function getOptions() {}\nexport { getOptions as options, runTest as default };\n";
        let first = adapt(input, &default_config()).unwrap();
        assert!(first.changed);

        let second = adapt(&first.output, &default_config()).unwrap();
        assert!(!second.changed);
        assert_eq!(second.output, first.output);
    }

    #[test]
    fn test_fresh_binding_avoids_collision() {
        let input = "const __options = 1;\nexport { getOptions as options, runTest as default };\n";
        let result = adapt(input, &default_config()).unwrap();

        assert!(result.changed);
        assert!(result.output.contains("const __options2 = getOptions();"));
        assert!(result
            .output
            .contains("export { __options2 as options, runTest as default }"));
        // The pre-existing binding is not shadowed.
        assert!(result.output.contains("const __options = 1;"));
    }

    #[test]
    fn test_fresh_binding_skips_multiple_collisions() {
        let input = "let __options = 1;\nlet __options2 = 2;\nexport { a as options, b as default };\n";
        let result = adapt(input, &default_config()).unwrap();
        assert!(result.output.contains("const __options3 = a();"));
    }

    #[test]
    fn test_collision_check_is_token_aware() {
        // `__options2` alone does not block the base name.
        let input = "let __options2 = 1;\nexport { a as options, b as default };\n";
        let result = adapt(input, &default_config()).unwrap();
        assert!(result.output.contains("const __options = a();"));
    }

    #[test]
    fn test_first_of_multiple_clauses_rewritten() {
        let input = "export { a as options, b as default };\nexport { c as options, d as default };\n";
        let result = adapt(input, &default_config()).unwrap();

        assert!(result.changed);
        assert_eq!(result.extra_matches, 1);
        assert!(result.output.contains("const __options = a();"));
        assert!(result
            .output
            .contains("export { __options as options, b as default }"));
        // Second clause is left exactly as it was.
        assert!(result
            .output
            .contains("export { c as options, d as default };"));
    }

    #[test]
    fn test_error_policy_on_multiple_clauses() {
        let input = "export { a as options, b as default };\nexport { c as options, d as default };\n";
        let err = adapt(input, &error_config()).unwrap_err();
        assert!(matches!(err, AdaptError::AmbiguousMatch { count: 2 }));
    }

    #[test]
    fn test_error_policy_single_clause_still_converts() {
        let input = "export { a as options, b as default };\n";
        let result = adapt(input, &error_config()).unwrap();
        assert!(result.changed);
    }

    #[test]
    fn test_pattern_inside_string_not_rewritten() {
        let input = "const s = \"export { a as options, b as default }\";\n";
        let result = adapt(input, &default_config()).unwrap();
        assert!(!result.changed);
        assert_eq!(result.output, input);
    }

    #[test]
    fn test_converted_clause_not_counted_as_match() {
        // Hand-written equivalent of the adapter's own output.
        let input = "const __options = getOptions();\nexport { __options as options, runTest as default };\n";
        let result = adapt(input, &default_config()).unwrap();
        assert!(!result.changed);
    }

    #[test]
    fn test_unrelated_preceding_const_does_not_suppress() {
        let input = "const ready = init();\nexport { getOptions as options, runTest as default };\n";
        let result = adapt(input, &default_config()).unwrap();
        assert!(result.changed);
    }
}
