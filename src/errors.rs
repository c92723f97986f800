//! Error types with rich diagnostics using miette
//!
//! One enum per pipeline stage: parse-time failures fail the file load,
//! serialize-time failures abort the plot job, collection failures are plain
//! failure returns. Every variant is a distinguishable, user-surfaceable
//! diagnostic rather than a generic boolean.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

// ============================================================================
// Parse Errors
// ============================================================================

/// Errors that occur while parsing HPGL text.
///
/// Any of these fails the file load; nothing is added to the document
/// collection.
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("malformed command: {detail}")]
    #[diagnostic(code(penstream::parse::malformed_command))]
    MalformedCommand {
        detail: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("statement breaks down here")]
        span: SourceSpan,
    },

    #[error("invalid number: {value}")]
    #[diagnostic(code(penstream::parse::invalid_number))]
    InvalidNumber {
        value: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("does not fit an integer coordinate")]
        span: SourceSpan,
    },

    #[error("odd coordinate count on {opcode}: {count} values")]
    #[diagnostic(
        code(penstream::parse::odd_coordinate),
        help("pen-moving commands take x,y pairs")
    )]
    OddCoordinate {
        opcode: String,
        count: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("trailing coordinate has no partner")]
        span: SourceSpan,
    },
}

// ============================================================================
// Serialization Errors
// ============================================================================

/// Errors that occur while rendering a command back to wire text
#[derive(Error, Diagnostic, Debug)]
pub enum PlotError {
    /// A transformed coordinate landed outside the device's reachable
    /// quadrant. The plotter's origin is a corner; negative coordinates do
    /// not exist on the medium.
    #[error("command {index} is out of bounds at ({x}, {y})")]
    #[diagnostic(
        code(penstream::plot::out_of_bounds),
        help("an X or Y value is less than zero; adjust the object transform and retry")
    )]
    OutOfBounds { index: usize, x: i64, y: i64 },
}

// ============================================================================
// Collection Errors
// ============================================================================

/// Errors from document collection row operations
#[derive(Error, Diagnostic, Debug)]
pub enum ModelError {
    #[error("row range {row}+{count} outside collection of {len}")]
    #[diagnostic(code(penstream::model::index_out_of_range))]
    IndexOutOfRange { row: usize, count: usize, len: usize },
}

// ============================================================================
// Streaming Errors
// ============================================================================

/// Errors that abort (or refuse to start) a plot job.
///
/// The document collection and its loaded objects are left intact; the user
/// can fix transforms or reconnect and retry.
#[derive(Error, Diagnostic, Debug)]
pub enum StreamError {
    #[error("serial channel is not open")]
    #[diagnostic(code(penstream::stream::channel_unavailable))]
    ChannelUnavailable,

    #[error("nothing to plot")]
    #[diagnostic(code(penstream::stream::nothing_to_plot))]
    NothingToPlot,

    #[error("object {object} cannot be plotted")]
    #[diagnostic(code(penstream::stream::out_of_bounds))]
    OutOfBounds {
        object: usize,
        #[source]
        source: PlotError,
    },

    #[error("serial channel write failed")]
    #[diagnostic(code(penstream::stream::channel_io))]
    Channel {
        #[from]
        source: std::io::Error,
    },
}

// ============================================================================
// Settings Errors
// ============================================================================

/// Errors from settings persistence
#[derive(Error, Diagnostic, Debug)]
pub enum SettingsError {
    #[error("cannot access settings file")]
    #[diagnostic(code(penstream::settings::io))]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("settings file is not valid JSON")]
    #[diagnostic(code(penstream::settings::format))]
    Format {
        #[from]
        source: serde_json::Error,
    },
}
