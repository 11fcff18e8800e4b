//! The library code for the `gistpress` site. The journal is the interesting
//! part, and it breaks down into two steps:
//!
//! 1. Resolving an article source into an article ([`crate::article`])
//! 2. Summarizing a curated list of articles into the aggregate index
//!    ([`crate::index`])
//!
//! Resolution fetches the source's files ([`crate::source`]), parses its
//! metadata ([`crate::metadata`]), points image references in the body at the
//! hosted images and renders the body to HTML ([`crate::markdown`]). Author
//! identifiers are looked up in the contributor registry
//! ([`crate::contributor`]), which is passed to the resolver explicitly.
//!
//! The second step runs offline; its output is the file the web tier
//! ([`crate::web`]) renders the journal listing from. Only an article page
//! resolves a gist at request time.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod article;
pub mod config;
pub mod contributor;
pub mod guestbook;
pub mod index;
pub mod license;
pub mod mail;
pub mod markdown;
pub mod metadata;
pub mod source;
mod util;
pub mod web;
