//! # lintpool_engine
//!
//! A line-oriented lint and format engine for LintPool.
//!
//! Each [`LineEngine`] caches parsed `.editorconfig` files, which makes it
//! expensive to set up and unsafe to share: exactly the kind of worker the
//! `lintpool_core` pool is built for.

pub mod editorconfig;
mod engine;
mod error;
mod rules;

pub use editorconfig::{EDITORCONFIG_FILE, EditorConfigCache, IndentStyle, Properties};
pub use engine::{FormatOutcome, LineEngine, LineEngineBuilder, LintReport};
pub use error::EngineError;
pub use rules::{Rule, Violation, standard_provider};
