//! HPGL pen-plotter pipeline
//!
//! Parses HPGL plot files into typed command sequences, derives pen-up /
//! pen-down geometry and bounding metrics, applies per-object affine
//! transforms, keeps loaded documents in an observable collection with
//! per-entry locking, and streams commands to the device over a serial
//! channel with optional speed-based pacing.
//!
//! This crate is organized into these modules:
//! - `command`: typed commands and command sequences
//! - `parse`: HPGL text into a command sequence
//! - `geometry`: derived line lists, extents and travel distances
//! - `transform`: the per-object scale/rotate/translate stack
//! - `object`: the plot object aggregate and wire serialization
//! - `scene`: rendered items, groups and bounding rects for a renderer
//! - `model`: the multi-document collection
//! - `channel` / `stream`: the serial boundary and the streaming protocol
//! - `settings`: persisted configuration
//! - `errors`: the diagnostic taxonomy

use std::path::Path;

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "hpgl.pest"]
pub struct HpglParser;

pub mod channel;
pub mod command;
pub mod errors;
pub mod geometry;
pub mod log;
pub mod model;
pub mod object;
pub mod parse;
pub mod scene;
pub mod settings;
pub mod stream;
pub mod transform;

// Re-export commonly used items
pub use channel::{IoChannel, SerialChannel};
pub use command::{Command, CommandKind, CommandSequence, Pen};
pub use errors::{ModelError, ParseError, PlotError, SettingsError, StreamError};
pub use geometry::{Geometry, MM_PER_UNIT, Segment};
pub use model::{DocumentEntry, DocumentModel, EntryState, FileName, ModelEvent, Uid};
pub use object::PlotObject;
pub use scene::{ItemGroup, Rect, RenderedItem};
pub use settings::Settings;
pub use stream::{CancelToken, Pacing, StreamOutcome, StreamState, Streamer};
pub use transform::PlotTransform;

/// Parse HPGL text into a plot object.
///
/// `name` labels the source in diagnostics.
pub fn load_str(name: &str, source: &str) -> Result<PlotObject, ParseError> {
    Ok(PlotObject::new(parse::parse(name, source)?))
}

/// Read and parse an HPGL file from disk.
///
/// A failure (unreadable file or malformed command) means no object is
/// produced, so nothing broken can enter a document collection.
pub fn load_file(path: impl AsRef<Path>) -> Result<PlotObject, miette::Report> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("cannot read {}: {e}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<input>");
    load_str(name, &source).map_err(Into::into)
}
