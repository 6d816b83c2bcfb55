//! Grammar validation helpers for MIME tokens and parameter values.
//!
//! Based on the RFC 7230 token and RFC 2045 parameter value definitions.

/// Reports whether the character is in 'token' as used by HTTP header values.
///
/// token char := ALPHA / DIGIT / "!" / "#" / "$" / "%" / "&" / "'" / "*"
///             / "+" / "-" / "." / "^" / "_" / "`" / "|" / "~"
pub fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|'
                | '~'
        )
}

/// Reports whether the string is a valid 'token'.
///
/// A token must be non-empty and contain only valid token characters.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// Reports whether the character may appear in a parameter value:
/// HTAB or any code point in U+0020..=U+007E.
pub fn is_restricted_char(c: char) -> bool {
    c == '\t' || ('\x20'..='\x7e').contains(&c)
}

/// Reports whether the string is valid restricted text.
///
/// The empty string is valid; every character must satisfy
/// [`is_restricted_char`].
pub fn is_restricted_text(s: &str) -> bool {
    s.chars().all(is_restricted_char)
}

/// Reports whether the character is linear whitespace (SP or HTAB).
pub fn is_ws(c: char) -> bool {
    c == ' ' || c == '\t'
}
