//! JSON feature-template compiler.
//!
//! This crate turns a declarative JSON template - static JSON interleaved
//! with directive keys (`$source`, `$filter`, `@context`, `$options`) and
//! `${...}` expression markers - into the immutable builder tree that the
//! renderer walks once per record.

pub mod lexicon;
pub mod reader;

pub use reader::{JsonTemplateReader, MAX_TEMPLATE_DEPTH, ReaderConfiguration};
