//! MIME type parsing and serialization.
//!
//! [`MimeType`] is a validated `type/subtype` pair plus an owned
//! [`MimeParams`] list, covering the value space of HTTP `Content-Type`
//! headers. Type and subtype are stored verbatim; only parameter keys are
//! case-folded.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::grammar::is_token;
use crate::params::MimeParams;

/// A parsed MIME type.
///
/// # Examples
///
/// ```
/// use mimekit::MimeType;
///
/// let mime = MimeType::new("text/plain; charset=\"utf-8\"").unwrap();
/// assert_eq!(mime.type_(), "text");
/// assert_eq!(mime.subtype(), "plain");
/// assert_eq!(mime.to_string(), "text/plain; charset=utf-8");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    type_: String,
    subtype: String,
    params: MimeParams,
    immutable: bool,
}

impl MimeType {
    /// Parses `input` into a MIME type.
    ///
    /// Everything before the first `;` must be `type/subtype` with both
    /// sides valid tokens; everything from the `;` on is handed verbatim to
    /// the parameter parser.
    pub fn new(input: &str) -> Result<Self> {
        let (head, tail) = match input.find(';') {
            Some(i) => (&input[..i], &input[i..]),
            None => (input, ""),
        };
        let (type_, subtype) = split_essence(head)?;
        let params = tail.parse()?;
        Ok(MimeType {
            type_,
            subtype,
            params,
            immutable: false,
        })
    }

    /// Parses `input`, returning `None` instead of an error on failure.
    pub fn parse(input: &str) -> Option<Self> {
        Self::new(input).ok()
    }

    /// Reports whether `input` parses as a MIME type.
    pub fn can_parse(input: &str) -> bool {
        Self::parse(input).is_some()
    }

    /// Returns the argument unchanged if it is already a `MimeType`,
    /// otherwise parses it.
    pub fn of(value: impl IntoMimeType) -> Result<Self> {
        value.into_mime_type()
    }

    /// The primary type, e.g. `text` in `text/plain`.
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// Replaces the primary type.
    pub fn set_type(&mut self, type_: &str) -> Result<()> {
        self.check_mutable()?;
        if !is_token(type_) {
            return Err(Error::InvalidType(type_.to_string()));
        }
        self.type_ = type_.to_string();
        Ok(())
    }

    /// The subtype, e.g. `plain` in `text/plain`.
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Replaces the subtype.
    pub fn set_subtype(&mut self, subtype: &str) -> Result<()> {
        self.check_mutable()?;
        if !is_token(subtype) {
            return Err(Error::InvalidSubtype(subtype.to_string()));
        }
        self.subtype = subtype.to_string();
        Ok(())
    }

    /// The `type/subtype` pair without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    /// Parses `essence` as `type/subtype` and replaces both.
    pub fn set_essence(&mut self, essence: &str) -> Result<()> {
        self.check_mutable()?;
        let (type_, subtype) = split_essence(essence)?;
        self.type_ = type_;
        self.subtype = subtype;
        Ok(())
    }

    /// The parameter list.
    pub fn params(&self) -> &MimeParams {
        &self.params
    }

    /// The parameter list, mutably. Mutations still fail once the MIME type
    /// has been locked, since locking propagates to the list.
    pub fn params_mut(&mut self) -> &mut MimeParams {
        &mut self.params
    }

    /// Locks the MIME type and its parameter list. Idempotent and
    /// irreversible.
    pub fn make_immutable(&mut self) {
        self.immutable = true;
        self.params.make_immutable();
    }

    /// Reports whether the MIME type has been locked.
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    fn check_mutable(&self) -> Result<()> {
        if self.immutable {
            Err(Error::Immutable)
        } else {
            Ok(())
        }
    }
}

impl FromStr for MimeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MimeType::new(s)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}{}",
            self.type_,
            self.subtype,
            self.params.encode(true)
        )
    }
}

/// Conversion used by [`MimeType::of`]: identity for an existing value,
/// parse for strings.
pub trait IntoMimeType {
    fn into_mime_type(self) -> Result<MimeType>;
}

impl IntoMimeType for MimeType {
    fn into_mime_type(self) -> Result<MimeType> {
        Ok(self)
    }
}

impl IntoMimeType for &str {
    fn into_mime_type(self) -> Result<MimeType> {
        MimeType::new(self)
    }
}

impl IntoMimeType for String {
    fn into_mime_type(self) -> Result<MimeType> {
        MimeType::new(&self)
    }
}

/// Splits `type/subtype` at the first `/` and validates both sides.
fn split_essence(head: &str) -> Result<(String, String)> {
    let (type_, subtype) = head.split_once('/').ok_or(Error::MissingSubtype)?;
    if !is_token(type_) {
        return Err(Error::InvalidType(type_.to_string()));
    }
    if !is_token(subtype) {
        return Err(Error::InvalidSubtype(subtype.to_string()));
    }
    Ok((type_.to_string(), subtype.to_string()))
}
