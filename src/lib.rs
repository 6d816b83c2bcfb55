//! Parsing, validation, manipulation, and serialization of MIME type
//! strings as used in HTTP `Content-Type` headers.
//!
//! This crate provides:
//! - MIME type parsing and formatting (`type/subtype` plus parameters)
//! - An insertion-ordered, duplicate-preserving parameter multimap
//! - Strict token and restricted-text validation
//! - Round-trip-stable serialization with quoted-string handling
//! - One-way immutability locking on both entities
//!
//! Parsing is strict: the full input must be consumed, and every key and
//! value is validated against the token and restricted-text grammars.
//!
//! # Examples
//!
//! ```
//! use mimekit::MimeType;
//!
//! let mut mime = MimeType::new("text/plain; charset=\"utf-8\"").unwrap();
//! mime.params_mut().append("format", "flowed").unwrap();
//! assert_eq!(mime.to_string(), "text/plain; charset=utf-8; format=flowed");
//! ```

pub mod error;
pub mod grammar;
pub mod mime_type;
pub mod params;

// Re-export commonly used types
pub use error::{Error, Result};
pub use mime_type::{IntoMimeType, MimeType};
pub use params::{Entries, IntoMimeParams, MimeParams};
