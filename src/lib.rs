//! prettify - regex-driven syntax highlighting for HTML fragments
//!
//! A fragment of preformatted HTML is split into plain source text and
//! tags, the source is lexed by the handler for its language, and the
//! resulting styles are woven back in as `<span class="...">` markup.
//!
//! ```no_run
//! use prettify::Prettifier;
//!
//! let prettifier = Prettifier::with_defaults()?;
//! let html = prettifier.highlight_fragment("int x = 1; // hi", Some("c"));
//! # Ok::<(), prettify::PrettifyError>(())
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod page;
pub mod prettify;
pub mod recombine;
pub mod syntax;

pub use config::Config;
pub use error::{PrettifyError, Result};
pub use extract::{extract_tags, html_to_text, Extracted, ExtractedTag};
pub use page::highlight_page;
pub use prettify::{Prettifier, SourceJob};
pub use recombine::{escape_html, recombine, HighlightOptions, Recombiner, TabExpander};
pub use syntax::{LanguageHandler, LanguageRegistry, StyleClass};
