//! Content pipeline for a terminal-themed portfolio.
//!
//! Plain-text section files written in a small line-oriented markup dialect
//! are fetched, parsed, joined with a contact directory, and rendered into an
//! HTML document tree. Sub-skill dossiers hidden in the skills text are
//! revealed lazily when their tile is activated.

pub mod commands;
pub mod config;
pub mod contact;
pub mod controller;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod fetcher;
pub mod info;
pub mod inline;
pub mod logger;
pub mod page;
pub mod parser;
pub mod render;
pub mod revealer;
pub mod site;
pub mod types;
pub mod watch;

pub use config::Config;
pub use contact::ContactDirectory;
pub use error::Error;
pub use parser::{Parsed, parse};
pub use site::{Click, Site};
