// Library root
// -----------
// osf-upload copies a study's data files from a web directory listing into
// an OSF repository. The binary (`main.rs`) wires these modules together
// into the interactive CLI.
//
// Module responsibilities:
// - `listing`: scrapes file names out of a directory listing page and
//   derives dictionary file names.
// - `api`: talks to the OSF files API (raw folder lookup, uploads).
// - `transfer`: preview and two-phase upload of a study version.
// - `ui`: prompts and the outer prompt loop.
// - `config`, `error`, `logging`: settings, error type, tracing setup.
pub mod api;
pub mod config;
pub mod error;
pub mod listing;
pub mod logging;
pub mod transfer;
pub mod ui;

pub use error::{Error, Result};
