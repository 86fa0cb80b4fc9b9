//! # Code Embed Selector
//!
//! Decides which lines of a source file an embed shows.
//!
//! ## Pipeline
//!
//! ```text
//! Source Text
//!     │
//!     ├──> Range Expression ("3-5, 8")
//!     │      └─> RangeSpec [3, 4, 5, gap, 8, gap]
//!     │
//!     ├──> Function Names ("foo, bar")
//!     │      ├─> LanguageRegistry → start anchor + end strategy
//!     │      ├─> FunctionLocator (indent / brackets)
//!     │      └─> merge_spans → RangeSpec
//!     │
//!     └──> extract(text, spec)
//!            └─> display text with "..." at every discontinuity
//! ```
//!
//! ## Example
//!
//! ```rust
//! use code_embed_selector::{extract, FunctionLocator, LanguageRegistry, RangeSpec, merge_spans};
//!
//! let source = "import os\n\ndef foo():\n    return 1\n\nprint(foo())";
//!
//! let by_lines = extract(source, &RangeSpec::parse("3-4"));
//! assert_eq!(by_lines, "...\ndef foo():\n    return 1");
//!
//! let registry = LanguageRegistry::builtin();
//! let span = FunctionLocator::new(&registry).locate("python", "foo", source).unwrap();
//! assert_eq!((span.start_line, span.end_line), (3, 4));
//! assert_eq!(extract(source, &merge_spans(&[span])), by_lines);
//! ```

mod error;
mod extract;
mod language;
mod locator;
mod range;
mod types;

pub use error::{Result, SelectorError};
pub use extract::{extract, ELLIPSIS};
pub use language::{EndDetection, LanguageRegistry, LanguageTemplate, NAME_PLACEHOLDER};
pub use locator::{indentation_width, FunctionLocator};
pub use range::{RangeEntry, RangeSpec};
pub use types::{merge_spans, FunctionSpan};
