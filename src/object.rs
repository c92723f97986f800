//! The unit of work: one parsed command sequence, its derived geometry, and
//! its transform state
//!
//! Serialization back to wire text happens per command and re-applies the
//! active transform every time, so bounds violations are caught even when
//! the transform changed between plots.

use std::cell::OnceCell;

use glam::{DVec2, dvec2};

use crate::command::{CommandKind, CommandSequence, Pen};
use crate::errors::PlotError;
use crate::geometry::Geometry;
use crate::scene::{Rect, RenderedItem};
use crate::transform::PlotTransform;

/// A loaded plot document: commands, derived geometry, transform stack
#[derive(Debug, Clone, Default)]
pub struct PlotObject {
    sequence: CommandSequence,
    transform: PlotTransform,
    geometry: OnceCell<Geometry>,
}

impl PlotObject {
    pub fn new(sequence: CommandSequence) -> Self {
        Self {
            sequence,
            transform: PlotTransform::new(),
            geometry: OnceCell::new(),
        }
    }

    /// Number of parsed commands
    pub fn command_count(&self) -> usize {
        self.sequence.len()
    }

    pub fn sequence(&self) -> &CommandSequence {
        &self.sequence
    }

    pub fn transform(&self) -> &PlotTransform {
        &self.transform
    }

    /// Mutable access to the transform stack. Any cached rendering derived
    /// from this object is stale after a change.
    pub fn transform_mut(&mut self) -> &mut PlotTransform {
        &mut self.transform
    }

    /// Untransformed line lists and metrics, generated on first use.
    ///
    /// The sequence is immutable after parse, so the cache never
    /// invalidates; transforms are applied downstream of it.
    pub fn geometry(&self) -> &Geometry {
        self.geometry.get_or_init(|| Geometry::generate(&self.sequence))
    }

    /// Cumulative pen-down millimeters up to and including command `index`
    pub fn travel_mm(&self, index: usize) -> f64 {
        self.geometry().travel_mm(index)
    }

    /// Pen-down millimeters contributed by command `index` alone
    pub fn command_mm(&self, index: usize) -> f64 {
        self.geometry().command_mm(index)
    }

    /// Render command `index` back to wire text, transform applied.
    ///
    /// Pen-moving coordinates go through the composed transform and round to
    /// the nearest integer; if any rounded X or Y is negative the command is
    /// unreachable from the plotter's corner origin and
    /// [`PlotError::OutOfBounds`] comes back instead of text. Zero is
    /// in-bounds. Opaque parameters are device settings, not coordinates:
    /// they serialize verbatim.
    ///
    /// `index` must be below [`command_count`](Self::command_count).
    pub fn serialize_command(&self, index: usize) -> Result<String, PlotError> {
        let command = self.sequence.get(index).expect("command index out of range");

        match &command.kind {
            CommandKind::Move { points } | CommandKind::Draw { points } => {
                let mut text = String::from(command.kind.opcode());
                for (i, &point) in points.iter().enumerate() {
                    let mapped = self.transform.apply(point.as_dvec2());
                    let x = mapped.x.round() as i64;
                    let y = mapped.y.round() as i64;
                    if x < 0 || y < 0 {
                        return Err(PlotError::OutOfBounds { index, x, y });
                    }
                    if i > 0 {
                        text.push(',');
                    }
                    text.push_str(&format!("{x},{y}"));
                }
                text.push(';');
                Ok(text)
            }
            CommandKind::Opaque { params, .. } => {
                let mut text = String::from(command.kind.opcode());
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        text.push(',');
                    }
                    text.push_str(&param.to_string());
                }
                text.push(';');
                Ok(text)
            }
        }
    }

    /// Transformed polylines for the rendering collaborator, one per
    /// pen-moving command, in plot order
    pub fn rendered_items(&self) -> Vec<RenderedItem> {
        let mut items = Vec::new();
        let mut position = dvec2(0.0, 0.0);

        for command in &self.sequence {
            let (points, pen) = match &command.kind {
                CommandKind::Move { points } => (points, Pen::Up),
                CommandKind::Draw { points } => (points, Pen::Down),
                CommandKind::Opaque { .. } => continue,
            };
            if points.is_empty() {
                continue;
            }
            let mut run: Vec<DVec2> = Vec::with_capacity(points.len() + 1);
            run.push(self.transform.apply(position));
            for &point in points {
                let p = point.as_dvec2();
                run.push(self.transform.apply(p));
                position = p;
            }
            items.push(RenderedItem { points: run, pen });
        }
        items
    }

    /// Bounding rectangle of the transformed geometry
    pub fn rendered_bounds(&self) -> Option<Rect> {
        Rect::from_points(
            self.rendered_items()
                .iter()
                .flat_map(|item| item.points.iter().copied()),
        )
    }
}
