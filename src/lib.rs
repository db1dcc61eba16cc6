pub mod boundary;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod history;
pub mod publish;
pub mod range;
pub mod report;
pub mod scanner;
pub mod tags;
pub mod tracker;
pub mod ui;
pub mod version;

pub use error::{ReleaseNotesError, Result};
