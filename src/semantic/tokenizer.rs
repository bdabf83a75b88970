//! Token-bag extraction from test method source.
//!
//! The tokenizer reduces a test method to the vocabulary that predicts what
//! it exercises: structural keywords, test-semantics words, called function
//! names, referenced class names, a small set of meaningful variable names,
//! and a collapsed `num` token for literals. Everything else is dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Structural keywords kept verbatim (lowercased).
static LANGUAGE_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "function", "class", "if", "else", "elseif", "for", "foreach", "while", "do", "switch",
        "case", "return", "try", "catch", "finally", "throw", "new", "public", "private",
        "protected", "static", "int", "float", "string", "bool", "array", "void", "true", "false",
        "null",
    ]
    .into_iter()
    .collect()
});

/// Words that signal what a test asserts about, kept verbatim (lowercased).
static TEST_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "test",
        "test_method",
        "success",
        "fail",
        "failure",
        "error",
        "valid",
        "invalid",
        "empty",
        "missing",
        "create",
        "update",
        "delete",
        "store",
        "destroy",
        "authorized",
        "unauthorized",
        "forbidden",
        "authenticated",
        "guest",
        "expect",
        "assert",
        "mock",
        "stub",
        "fake",
        "exception",
        "redirect",
        "json",
        "database",
    ]
    .into_iter()
    .collect()
});

/// Variable names meaningful enough to keep as-is.
static MEANINGFUL_VARIABLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "password", "user", "email", "id", "name", "status", "response", "request", "token",
        "data", "result", "payload", "session", "role", "admin", "count", "total",
    ]
    .into_iter()
    .collect()
});

static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)(//|#).*$").unwrap());
static DOUBLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).unwrap());
static SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(?:[^'\\]|\\.)*'").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static WORD_OR_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*|\d+(?:\.\d+)?").unwrap());

/// Extract the body of `function <method>(...)` by walking balanced braces.
///
/// Returns `None` when the method is not found or its braces never balance;
/// callers fall back to the synthetic class-plus-method document.
pub fn extract_method_body(source: &str, method: &str) -> Option<String> {
    let needle = format!("function {method}(");
    let start = source.find(&needle)?;
    let after_signature = &source[start..];
    let open = after_signature.find('{')?;

    let mut depth = 0usize;
    for (offset, ch) in after_signature[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let body = &after_signature[open..open + offset + 1];
                    return Some(body.to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip comments, blank out string literals and collapse whitespace.
fn clean_source(source: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(source, " ");
    let without_lines = LINE_COMMENT.replace_all(&without_blocks, " ");
    let without_dq = DOUBLE_QUOTED.replace_all(&without_lines, "\"\"");
    let without_sq = SINGLE_QUOTED.replace_all(&without_dq, "''");
    WHITESPACE.replace_all(&without_sq, " ").trim().to_string()
}

fn is_pascal_case(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => word.chars().any(|c| c.is_ascii_lowercase()),
        _ => false,
    }
}

/// True when the next non-space character after the token is `(`.
fn is_called(text: &str, token_end: usize) -> bool {
    text[token_end..]
        .chars()
        .find(|c| !c.is_whitespace())
        .is_some_and(|c| c == '(')
}

/// Classify one raw token; `None` drops it.
fn classify(word: &str, called: bool) -> Option<String> {
    let lower = word.to_lowercase();

    if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Some("num".to_string());
    }
    if LANGUAGE_KEYWORDS.contains(lower.as_str()) {
        return Some(lower);
    }
    if TEST_KEYWORDS.contains(lower.as_str()) {
        return Some(lower);
    }
    if called {
        return Some(format!("call_{lower}"));
    }
    if lower.contains("assert") || lower.contains("expect") {
        return Some(lower);
    }
    if is_pascal_case(word) {
        return Some(format!("class_{lower}"));
    }
    if MEANINGFUL_VARIABLES.contains(lower.as_str()) {
        return Some(lower);
    }
    None
}

/// Tokenize a test into its semantic bag.
///
/// The synthetic `test_method <method>` marker leads every document so the
/// method name contributes even when no body is available. `body` is the
/// extracted method body, or the class-plus-method fallback text.
pub fn tokenize(method: &str, body: &str) -> Vec<String> {
    let mut tokens = vec!["test_method".to_string()];
    if !method.is_empty() {
        tokens.push(method.to_lowercase());
    }

    let cleaned = clean_source(body);
    for m in WORD_OR_NUMBER.find_iter(&cleaned) {
        let called = is_called(&cleaned, m.end());
        if let Some(token) = classify(m.as_str(), called) {
            tokens.push(token);
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const SAMPLE: &str = indoc! {r#"
        class UserTest {
            /* fixture shared by login tests */
            public function testLogin() {
                $user = User::create(['email' => 'a@b.c']);
                $password = 'secret123';
                // exercise the endpoint
                $response = $this->post('/login', $password);
                $this->assertEquals(200, $response->status());
            }

            public function testLogout() {
                $this->assertTrue(true);
            }
        }
    "#};

    #[test]
    fn test_extract_method_body_balanced_braces() {
        let body = extract_method_body(SAMPLE, "testLogin").unwrap();
        assert!(body.starts_with('{'));
        assert!(body.ends_with('}'));
        assert!(body.contains("assertEquals"));
        assert!(!body.contains("testLogout"));
    }

    #[test]
    fn test_extract_method_body_missing_method() {
        assert!(extract_method_body(SAMPLE, "testMissing").is_none());
    }

    #[test]
    fn test_marker_tokens_lead_document() {
        let tokens = tokenize("testLogin", "{}");
        assert_eq!(tokens[0], "test_method");
        assert_eq!(tokens[1], "testlogin");
    }

    #[test]
    fn test_comments_and_strings_are_stripped() {
        let body = extract_method_body(SAMPLE, "testLogin").unwrap();
        let tokens = tokenize("testLogin", &body);
        // Words that only appear inside comments or string literals vanish
        assert!(!tokens.contains(&"fixture".to_string()));
        assert!(!tokens.contains(&"secret123".to_string()));
        assert!(!tokens.contains(&"login".to_string()));
    }

    #[test]
    fn test_called_identifiers_become_call_tokens() {
        let tokens = tokenize("testLogin", "{ $this->post('/x'); helperFn(); }");
        assert!(tokens.contains(&"call_post".to_string()));
        assert!(tokens.contains(&"call_helperfn".to_string()));
    }

    #[test]
    fn test_assert_calls_classified_as_calls() {
        let body = extract_method_body(SAMPLE, "testLogin").unwrap();
        let tokens = tokenize("testLogin", &body);
        // assertEquals is followed by `(` so the call rule wins
        assert!(tokens.contains(&"call_assertequals".to_string()));
    }

    #[test]
    fn test_uncalled_expectation_tokens_kept_lowercase() {
        let tokens = tokenize("t", "{ $expectedTotal = 3; }");
        assert!(tokens.contains(&"expectedtotal".to_string()));
    }

    #[test]
    fn test_pascal_case_becomes_class_token() {
        let body = extract_method_body(SAMPLE, "testLogin").unwrap();
        let tokens = tokenize("testLogin", &body);
        assert!(tokens.contains(&"class_user".to_string()));
    }

    #[test]
    fn test_numbers_collapse_to_num() {
        let tokens = tokenize("t", "{ $x = 42; $y = 3.14; }");
        assert!(tokens.iter().filter(|t| *t == "num").count() >= 2);
        assert!(!tokens.contains(&"42".to_string()));
    }

    #[test]
    fn test_meaningful_variables_survive() {
        let body = extract_method_body(SAMPLE, "testLogin").unwrap();
        let tokens = tokenize("testLogin", &body);
        assert!(tokens.contains(&"user".to_string()));
        assert!(tokens.contains(&"response".to_string()));
        assert!(tokens.contains(&"password".to_string()));
    }

    #[test]
    fn test_noise_identifiers_dropped() {
        let tokens = tokenize("t", "{ $xyz = $qqfoo; }");
        assert_eq!(tokens, vec!["test_method", "t"]);
    }
}
