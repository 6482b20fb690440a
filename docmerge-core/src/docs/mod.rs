//! Documentation fragments and their extraction from inline markup.
//!
//! ```text
//! raw markup ──► markup::extract ──► ParsedDocs { fragments, params }
//!                      │
//!                      └── unbalanced tags ──► MarkupError (entity degrades)
//! ```

pub mod fragments;
pub mod markup;

pub use fragments::{DocFragments, ExceptionDoc, OverlayFields, TypeParamDoc};
pub use markup::{extract, MarkupError, ParsedDocs};
