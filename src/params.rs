//! Content-Type parameter lists.
//!
//! [`MimeParams`] holds the `; key=value` suffix of a MIME type as an
//! insertion-ordered multimap: duplicate keys are preserved, keys are
//! case-folded to lowercase, and values are kept verbatim. Parsing follows
//! the RFC 2045 parameter grammar with RFC 7230 quoted-string handling;
//! serialization quotes a value exactly when it is empty or contains a
//! non-token character.
//!
//! RFC 5987/2231 ext-parameters (`filename*=UTF-8''…`) are accepted because
//! `*` is a token character, but their extended-value syntax is never
//! decoded; the value stays an opaque token.

use std::fmt;
use std::slice;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::grammar::{is_restricted_text, is_token, is_token_char, is_ws};

/// Maximum number of characters of unconsumed input quoted in a parse error.
const SNIPPET_LEN: usize = 30;

/// An ordered multimap of validated MIME parameters.
///
/// # Examples
///
/// ```
/// use mimekit::MimeParams;
///
/// let params: MimeParams = "; charset=\"utf-8\"; q=0.5".parse().unwrap();
/// assert_eq!(params.get("CHARSET").unwrap(), Some("utf-8"));
/// assert_eq!(params.encode(false), "charset=utf-8; q=0.5");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeParams {
    entries: Vec<(String, String)>,
    immutable: bool,
}

impl MimeParams {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        MimeParams::default()
    }

    /// Builds a parameter list from `(key, value)` pairs, validating and
    /// appending each in iteration order. Accepts any pair iterator, so both
    /// sequences and maps work.
    ///
    /// # Examples
    ///
    /// ```
    /// use mimekit::MimeParams;
    ///
    /// let params = MimeParams::from_pairs([("a", "b"), ("c", "d")]).unwrap();
    /// assert_eq!(params.encode(true), "; a=b; c=d");
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = MimeParams::new();
        for (key, value) in pairs {
            params.append(key.as_ref(), value.as_ref())?;
        }
        Ok(params)
    }

    /// Parses `input`, returning `None` instead of an error on failure.
    pub fn parse(input: &str) -> Option<Self> {
        input.parse().ok()
    }

    /// Reports whether `input` parses as a parameter list.
    pub fn can_parse(input: &str) -> bool {
        Self::parse(input).is_some()
    }

    /// Returns the argument unchanged if it is already a `MimeParams`,
    /// otherwise parses it.
    pub fn of(value: impl IntoMimeParams) -> Result<Self> {
        value.into_mime_params()
    }

    /// The number of parameter tuples, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the list holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `(key, value)` at the end, preserving any existing tuples
    /// with the same key.
    pub fn append(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_mutable()?;
        let key = valid_key(key)?;
        valid_value(value)?;
        self.entries.push((key, value.to_string()));
        Ok(())
    }

    /// Removes every tuple with `key`, then appends `(key, value)`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_mutable()?;
        let key = valid_key(key)?;
        valid_value(value)?;
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, value.to_string()));
        Ok(())
    }

    /// Removes every tuple whose key equals `key` and, when `value` is
    /// given, whose value equals it too. Returns the number removed.
    pub fn remove(&mut self, key: &str, value: Option<&str>) -> Result<usize> {
        self.check_mutable()?;
        let key = valid_key(key)?;
        if let Some(v) = value {
            valid_value(v)?;
        }
        let before = self.entries.len();
        self.entries
            .retain(|(k, v)| !(*k == key && value.map_or(true, |want| v == want)));
        Ok(before - self.entries.len())
    }

    /// The first value stored under `key`, or `None` when the key is absent.
    /// Lookup is case-insensitive; an invalid key is an error.
    pub fn get(&self, key: &str) -> Result<Option<&str>> {
        let key = valid_key(key)?;
        Ok(self
            .entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str()))
    }

    /// Every value stored under `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> Result<Vec<&str>> {
        let key = valid_key(key)?;
        Ok(self
            .entries
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .collect())
    }

    /// Reports whether any tuple matches `key` (and `value`, when given).
    pub fn contains(&self, key: &str, value: Option<&str>) -> Result<bool> {
        let key = valid_key(key)?;
        if let Some(v) = value {
            valid_value(v)?;
        }
        Ok(self
            .entries
            .iter()
            .any(|(k, v)| *k == key && value.map_or(true, |want| v == want)))
    }

    /// Removes all tuples.
    pub fn clear(&mut self) -> Result<()> {
        self.check_mutable()?;
        self.entries.clear();
        Ok(())
    }

    /// Stable-sorts the tuples by key in code-point order. Tuples with equal
    /// keys keep their insertion order.
    pub fn sort(&mut self) -> Result<()> {
        self.check_mutable()?;
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(())
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    /// Iterates over `(key, value)` tuples in insertion order.
    pub fn entries(&self) -> Entries<'_> {
        Entries(self.entries.iter())
    }

    /// Invokes `f(value, key, list)` for each tuple in insertion order.
    /// Note the value-first argument order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &str, &MimeParams),
    {
        for (key, value) in &self.entries {
            f(value, key, self);
        }
    }

    /// Locks the list; every later mutation fails with [`Error::Immutable`].
    /// Idempotent and irreversible.
    pub fn make_immutable(&mut self) {
        self.immutable = true;
    }

    /// Reports whether the list has been locked.
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// Serializes the list.
    ///
    /// Each tuple is emitted as `key=value` with a `"; "` separator before
    /// every tuple except the first; `leading_separator` requests the
    /// separator before the first as well (used when the list is a suffix of
    /// a MIME type). A value is written bare when it is a valid token, and
    /// quoted with `\`-escaped `"` and `\` otherwise. An empty list always
    /// serializes to the empty string.
    pub fn encode(&self, leading_separator: bool) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 || leading_separator {
                out.push_str("; ");
            }
            out.push_str(key);
            out.push('=');
            if is_token(value) {
                out.push_str(value);
            } else {
                out.push('"');
                for c in value.chars() {
                    if c == '"' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
            }
        }
        out
    }

    fn check_mutable(&self) -> Result<()> {
        if self.immutable {
            Err(Error::Immutable)
        } else {
            Ok(())
        }
    }

    /// Runs the parameter grammar over `input`, appending each tuple.
    ///
    /// A leading `;` is supplied when the input lacks one. After the scan
    /// the cursor must sit at the end of the input; any unconsumed tail is
    /// reported through [`Error::InvalidParams`].
    fn parse_into(&mut self, input: &str) -> Result<()> {
        if input.is_empty() {
            return Ok(());
        }
        let rejoined;
        let s = if input.starts_with(';') {
            input
        } else {
            rejoined = format!(";{input}");
            rejoined.as_str()
        };

        let mut cur = Cursor::new(s);
        loop {
            let mark = cur.pos;
            match parameter(&mut cur)? {
                Some((key, value)) => self.entries.push((key, value)),
                None => {
                    cur.pos = mark;
                    break;
                }
            }
        }
        if cur.pos < s.len() {
            return Err(Error::InvalidParams(snippet(&s[cur.pos..])));
        }
        Ok(())
    }
}

impl FromStr for MimeParams {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut params = MimeParams::new();
        params.parse_into(s)?;
        Ok(params)
    }
}

impl fmt::Display for MimeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode(false))
    }
}

/// Iterator over the `(key, value)` tuples of a [`MimeParams`].
#[derive(Debug, Clone)]
pub struct Entries<'a>(slice::Iter<'a, (String, String)>);

impl<'a> Iterator for Entries<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Entries<'_> {}

impl<'a> IntoIterator for &'a MimeParams {
    type Item = (&'a str, &'a str);
    type IntoIter = Entries<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

/// Conversion used by [`MimeParams::of`]: identity for an existing list,
/// parse for strings.
pub trait IntoMimeParams {
    fn into_mime_params(self) -> Result<MimeParams>;
}

impl IntoMimeParams for MimeParams {
    fn into_mime_params(self) -> Result<MimeParams> {
        Ok(self)
    }
}

impl IntoMimeParams for &str {
    fn into_mime_params(self) -> Result<MimeParams> {
        self.parse()
    }
}

impl IntoMimeParams for String {
    fn into_mime_params(self) -> Result<MimeParams> {
        self.as_str().parse()
    }
}

/// Validates a parameter key and case-folds it to lowercase.
fn valid_key(key: &str) -> Result<String> {
    if is_token(key) {
        Ok(key.to_ascii_lowercase())
    } else {
        Err(Error::InvalidKey(key.to_string()))
    }
}

/// Validates a parameter value as restricted text.
fn valid_value(value: &str) -> Result<()> {
    if is_restricted_text(value) {
        Ok(())
    } else {
        Err(Error::InvalidValue(value.to_string()))
    }
}

fn snippet(rest: &str) -> String {
    let mut out: String = rest.chars().take(SNIPPET_LEN).collect();
    if out.len() < rest.len() {
        out.push_str("...");
    }
    out
}

struct Cursor<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Cursor { s, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.s[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expect: char) -> bool {
        if self.peek() == Some(expect) {
            self.pos += expect.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.s[start..self.pos]
    }
}

/// Matches one `";" WS* key "=" (quoted | token) WS*` run at the cursor.
///
/// `Ok(None)` means the grammar does not match here; the caller resets the
/// cursor and reports the remainder. An error means a grammatically valid
/// quoted value failed restricted-text validation after unquoting.
fn parameter(cur: &mut Cursor) -> Result<Option<(String, String)>> {
    if !cur.eat(';') {
        return Ok(None);
    }
    cur.eat_while(is_ws);
    let key = cur.eat_while(is_token_char);
    if key.is_empty() {
        return Ok(None);
    }
    if !cur.eat('=') {
        return Ok(None);
    }
    let value = if cur.eat('"') {
        match quoted_body(cur) {
            Some(body) => body,
            None => return Ok(None),
        }
    } else {
        let bare = cur.eat_while(is_token_char);
        if bare.is_empty() {
            return Ok(None);
        }
        bare.to_string()
    };
    cur.eat_while(is_ws);
    if !is_restricted_text(&value) {
        return Err(Error::InvalidValue(value));
    }
    Ok(Some((key.to_ascii_lowercase(), value)))
}

/// Consumes `qchar+ DQUOTE`, dropping the backslash of each quoted pair.
/// The body must be non-empty and the closing quote must be present.
fn quoted_body(cur: &mut Cursor) -> Option<String> {
    let mut body = String::new();
    loop {
        match cur.bump()? {
            '"' => {
                return if body.is_empty() { None } else { Some(body) };
            }
            '\\' => body.push(cur.bump()?),
            c => body.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let params: MimeParams = "".parse().unwrap();
        assert!(params.is_empty());
        assert_eq!(params.encode(true), "");
    }

    #[test]
    fn test_parse_bare_and_quoted() {
        let params: MimeParams = "; charset=\"utf-8\"; q=0.5".parse().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("charset").unwrap(), Some("utf-8"));
        assert_eq!(params.get("q").unwrap(), Some("0.5"));
    }

    #[test]
    fn test_parse_without_leading_separator() {
        let params: MimeParams = "a=b; c=d".parse().unwrap();
        assert_eq!(params.encode(false), "a=b; c=d");
    }

    #[test]
    fn test_parse_no_space_between_parameters() {
        let params: MimeParams = ";a=1;b=2".parse().unwrap();
        assert_eq!(params.encode(false), "a=1; b=2");
    }

    #[test]
    fn test_parse_key_lowercased() {
        let params: MimeParams = "; CharSet=utf-8".parse().unwrap();
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["charset"]);
        assert_eq!(params.get("CHARSET").unwrap(), Some("utf-8"));
    }

    #[test]
    fn test_parse_quoted_escapes() {
        let params: MimeParams = "; test=\"ab\\\"cd\"".parse().unwrap();
        assert_eq!(params.get("test").unwrap(), Some("ab\"cd"));

        // Every backslash is removed in a single pass.
        let params: MimeParams = "; p=\"a\\\\b\"".parse().unwrap();
        assert_eq!(params.get("p").unwrap(), Some("a\\b"));
    }

    #[test]
    fn test_parse_quoted_value_with_spaces() {
        let params: MimeParams = "; name=\"hello world\"".parse().unwrap();
        assert_eq!(params.get("name").unwrap(), Some("hello world"));
        assert_eq!(params.encode(false), "name=\"hello world\"");
    }

    #[test]
    fn test_parse_ext_parameter_is_opaque() {
        let params: MimeParams = "; filename*=UTF-8''file%20name.jpg".parse().unwrap();
        assert_eq!(
            params.get("filename*").unwrap(),
            Some("UTF-8''file%20name.jpg")
        );
        assert_eq!(params.encode(true), "; filename*=UTF-8''file%20name.jpg");
    }

    #[test]
    fn test_parse_errors() {
        // No '=' after the key.
        let err = "; def".parse::<MimeParams>().unwrap_err();
        assert_eq!(err, Error::InvalidParams("; def".to_string()));

        // Empty quoted string: the grammar requires at least one qchar.
        assert!("; a=\"\"".parse::<MimeParams>().is_err());

        // Unterminated quoted string.
        assert!("; a=\"open".parse::<MimeParams>().is_err());

        // Bare value with a non-token character.
        assert!("; a=b c".parse::<MimeParams>().is_err());

        // NUL inside a quoted value survives the grammar but fails
        // restricted-text validation.
        let err = "; a=\"x\x00y\"".parse::<MimeParams>().unwrap_err();
        assert_eq!(err, Error::InvalidValue("x\x00y".to_string()));
    }

    #[test]
    fn test_parse_error_snippet_truncated() {
        let long = format!("; bad value {}", "x".repeat(60));
        let err = long.parse::<MimeParams>().unwrap_err();
        match err {
            Error::InvalidParams(snip) => {
                assert!(snip.ends_with("..."));
                assert_eq!(snip.chars().count(), SNIPPET_LEN + 3);
            }
            other => panic!("expected InvalidParams, got {other:?}"),
        }
    }

    #[test]
    fn test_from_pairs() {
        let params = MimeParams::from_pairs([("A", "b"), ("c", "d")]).unwrap();
        assert_eq!(params.encode(true), "; a=b; c=d");

        assert!(MimeParams::from_pairs([("bad key", "v")]).is_err());
    }

    #[test]
    fn test_append_preserves_duplicates() {
        let mut params = MimeParams::new();
        params.append("a", "1").unwrap();
        params.append("a", "2").unwrap();
        params.append("b", "3").unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("a").unwrap(), Some("1"));
        assert_eq!(params.get_all("a").unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_set_collapses_duplicates() {
        let mut params: MimeParams = "; a=1; b=2; a=3".parse().unwrap();
        params.set("a", "9").unwrap();
        assert_eq!(params.encode(false), "b=2; a=9");
    }

    #[test]
    fn test_remove_counts() {
        let mut params: MimeParams = "; a=1; b=2; a=1; a=3".parse().unwrap();
        assert_eq!(params.remove("a", Some("1")).unwrap(), 2);
        assert_eq!(params.remove("a", None).unwrap(), 1);
        assert_eq!(params.remove("a", None).unwrap(), 0);
        assert_eq!(params.encode(false), "b=2");
    }

    #[test]
    fn test_get_missing_key_is_none() {
        let params: MimeParams = "; a=1".parse().unwrap();
        assert_eq!(params.get("zzz").unwrap(), None);
        assert!(params.get_all("zzz").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_key_is_error() {
        let params = MimeParams::new();
        assert_eq!(
            params.get("bad key").unwrap_err(),
            Error::InvalidKey("bad key".to_string())
        );
        assert!(params.contains("", None).is_err());
    }

    #[test]
    fn test_contains() {
        let params: MimeParams = "; a=1; a=2".parse().unwrap();
        assert!(params.contains("a", None).unwrap());
        assert!(params.contains("A", Some("2")).unwrap());
        assert!(!params.contains("a", Some("3")).unwrap());
        assert!(!params.contains("b", None).unwrap());
    }

    #[test]
    fn test_clear() {
        let mut params: MimeParams = "; a=1; b=2".parse().unwrap();
        params.clear().unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_sort_is_stable() {
        let mut params: MimeParams = "; b=b1; a=a1; b=b0; a=a0".parse().unwrap();
        params.sort().unwrap();
        let entries: Vec<_> = params.entries().collect();
        assert_eq!(
            entries,
            vec![("a", "a1"), ("a", "a0"), ("b", "b1"), ("b", "b0")]
        );
    }

    #[test]
    fn test_iterators_follow_insertion_order() {
        let params: MimeParams = "; c=3; a=1; b=2".parse().unwrap();
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["c", "a", "b"]);
        assert_eq!(params.values().collect::<Vec<_>>(), vec!["3", "1", "2"]);
        let entries: Vec<_> = (&params).into_iter().collect();
        assert_eq!(entries, vec![("c", "3"), ("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_for_each_value_first() {
        let params: MimeParams = "; a=1; b=2".parse().unwrap();
        let mut seen = Vec::new();
        params.for_each(|value, key, list| {
            assert_eq!(list.len(), 2);
            seen.push((value.to_string(), key.to_string()));
        });
        assert_eq!(
            seen,
            vec![
                ("1".to_string(), "a".to_string()),
                ("2".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn test_encode_quoting() {
        let mut params = MimeParams::new();
        params.append("token", "simple").unwrap();
        params.append("spaced", "a b").unwrap();
        params.append("empty", "").unwrap();
        params.append("escaped", "a\"b\\c").unwrap();
        assert_eq!(
            params.encode(false),
            "token=simple; spaced=\"a b\"; empty=\"\"; escaped=\"a\\\"b\\\\c\""
        );
    }

    #[test]
    fn test_encode_leading_separator() {
        let params = MimeParams::from_pairs([("a", "b")]).unwrap();
        assert_eq!(params.encode(false), "a=b");
        assert_eq!(params.encode(true), "; a=b");
        assert_eq!(params.to_string(), "a=b");
    }

    #[test]
    fn test_immutable_blocks_mutation() {
        let mut params: MimeParams = "; a=1".parse().unwrap();
        params.make_immutable();
        params.make_immutable(); // idempotent
        assert!(params.is_immutable());

        assert_eq!(params.append("b", "2").unwrap_err(), Error::Immutable);
        assert_eq!(params.set("a", "2").unwrap_err(), Error::Immutable);
        assert_eq!(params.remove("a", None).unwrap_err(), Error::Immutable);
        assert_eq!(params.clear().unwrap_err(), Error::Immutable);
        assert_eq!(params.sort().unwrap_err(), Error::Immutable);

        // Reads still work.
        assert_eq!(params.get("a").unwrap(), Some("1"));
        assert_eq!(params.encode(false), "a=1");
    }

    #[test]
    fn test_of() {
        let params = MimeParams::of("; a=b").unwrap();
        assert_eq!(params.encode(false), "a=b");

        let same = MimeParams::of(params.clone()).unwrap();
        assert_eq!(same, params);

        assert!(MimeParams::of("; nope").is_err());
    }

    #[test]
    fn test_parse_can_parse_agreement() {
        for input in ["; a=b", "; a=\"x y\"", "; def", "garbage;;", ""] {
            assert_eq!(MimeParams::can_parse(input), MimeParams::parse(input).is_some());
        }
    }
}
