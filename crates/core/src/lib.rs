//! Core library for linenum
//!
//! This crate implements the **Functional Core** of the linenum application:
//! deciding which lines of a page are body text and which number each one
//! receives. It never reads or writes files; the `linenum` binary and the
//! `pdf` crate form the Imperative Shell around it.
//!
//! # Pipeline
//!
//! ```text
//! PageText  ->  Snippet[]  ->  split_y  ->  Zones  ->  Row[]  ->  LineLabel[]
//!               filter         columns      columns    rows       rows
//! ```
//!
//! 1. [`filter::extract_snippets`] drops titles, running headers and blank
//!    lines.
//! 2. [`columns::detect_split_y`] finds where a two-column body starts.
//! 3. [`columns::partition`] assigns every snippet to the top, left or right
//!    zone.
//! 4. [`rows::number_zone`] groups a zone into visual rows, skips captions and
//!    hands out numbers.
//!
//! [`document::number_document`] runs the pipeline over every page of a
//! [`document::DocumentModel`], threading a single counter through the
//! zones of each page and across pages.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use linenum_core::{plan_page, NumberingConfig, PageText};
//!
//! let page = PageText { width: 612.0, height: 792.0, lines };
//! let plan = plan_page(&page, &NumberingConfig::default(), 1);
//! for label in &plan.labels {
//!     println!("{} at ({}, {})", label.number, label.x, label.y);
//! }
//! ```

pub mod columns;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod rows;
pub mod types;

pub use config::{ConfigError, LabelStyle, NumberingConfig};
pub use document::{number_document, plan_document, plan_page, DocumentModel, FIRST_NUMBER};
pub use error::NumberingError;
pub use types::*;
