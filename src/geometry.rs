//! Derived pen geometry: line lists, bounding extents, travel distances
//!
//! Regenerated from a command sequence on demand; never persisted apart from
//! its source sequence. Coordinates stay in native HPGL units here; the
//! transform stage and the scene layer deal in transformed space.

use glam::IVec2;

use crate::command::{CommandKind, CommandSequence};

/// Millimeters per HPGL unit (1/1016 inch)
pub const MM_PER_UNIT: f64 = 0.025;

/// A line segment between two pen positions, in HPGL units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub p1: IVec2,
    pub p2: IVec2,
}

impl Segment {
    /// Euclidean length in HPGL units
    pub fn length_units(&self) -> f64 {
        (self.p2 - self.p1).as_dvec2().length()
    }

    /// Euclidean length in millimeters
    pub fn length_mm(&self) -> f64 {
        self.length_units() * MM_PER_UNIT
    }
}

/// Line lists and bounding metrics derived from one command sequence
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    /// Segments drawn with the pen down, in plot order
    pub line_down: Vec<Segment>,
    /// Pen-up repositioning moves, in plot order
    pub line_up: Vec<Segment>,
    /// Maximum absolute X extent across both lists
    pub width: i32,
    /// Maximum absolute Y extent across both lists
    pub height: i32,
    /// Cumulative pen-down millimeters up to and including each command
    travel: Vec<f64>,
}

impl Geometry {
    /// Walk the sequence once, emitting segments and accumulating travel.
    ///
    /// The pen starts at the origin. Consecutive coordinates within one
    /// pen-down command become connected `line_down` segments; pen-up moves
    /// become `line_up` segments the same way. Opaque commands neither move
    /// the pen nor emit geometry.
    pub fn generate(sequence: &CommandSequence) -> Geometry {
        let mut geometry = Geometry::default();
        let mut position = IVec2::ZERO;
        let mut travelled = 0.0_f64;

        for command in sequence {
            match &command.kind {
                CommandKind::Move { points } => {
                    for &point in points {
                        geometry.line_up.push(Segment {
                            p1: position,
                            p2: point,
                        });
                        position = point;
                    }
                }
                CommandKind::Draw { points } => {
                    for &point in points {
                        let segment = Segment {
                            p1: position,
                            p2: point,
                        };
                        travelled += segment.length_mm();
                        geometry.line_down.push(segment);
                        position = point;
                    }
                }
                CommandKind::Opaque { .. } => {}
            }
            geometry.travel.push(travelled);
        }

        for segment in geometry.line_down.iter().chain(&geometry.line_up) {
            for point in [segment.p1, segment.p2] {
                geometry.width = geometry.width.max(point.x.abs());
                geometry.height = geometry.height.max(point.y.abs());
            }
        }

        geometry
    }

    /// Cumulative pen-down distance in millimeters up to and including
    /// command `index`. Monotonically non-decreasing in `index`.
    pub fn travel_mm(&self, index: usize) -> f64 {
        match self.travel.get(index) {
            Some(&mm) => mm,
            None => self.travel.last().copied().unwrap_or(0.0),
        }
    }

    /// Pen-down distance contributed by command `index` alone
    pub fn command_mm(&self, index: usize) -> f64 {
        let before = match index {
            0 => 0.0,
            _ => self.travel_mm(index - 1),
        };
        self.travel_mm(index) - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use glam::ivec2;

    fn geometry_of(source: &str) -> Geometry {
        Geometry::generate(&parse("<test>", source).unwrap())
    }

    #[test]
    fn segments_account_for_every_pair() {
        let geometry = geometry_of("PU0,0;PD100,100,200,200;PU300,300;PD400,400;");
        // 6 coordinate pairs consumed, 6 segments out.
        assert_eq!(geometry.line_down.len() + geometry.line_up.len(), 6);
        assert_eq!(geometry.line_down.len(), 3);
        assert_eq!(geometry.line_up.len(), 3);
    }

    #[test]
    fn segments_connect_consecutive_points() {
        let geometry = geometry_of("PD100,0,100,50;");
        assert_eq!(geometry.line_down[0].p1, ivec2(0, 0));
        assert_eq!(geometry.line_down[0].p2, ivec2(100, 0));
        assert_eq!(geometry.line_down[1].p1, ivec2(100, 0));
        assert_eq!(geometry.line_down[1].p2, ivec2(100, 50));
    }

    #[test]
    fn opaque_commands_emit_no_geometry() {
        let geometry = geometry_of("IN;SP1;PD10,0;");
        assert_eq!(geometry.line_up.len(), 0);
        assert_eq!(geometry.line_down.len(), 1);
        // SP's parameter never became a pen position.
        assert_eq!(geometry.line_down[0].p1, ivec2(0, 0));
    }

    #[test]
    fn extents_are_absolute_maxima_over_both_lists() {
        let geometry = geometry_of("PU-300,20;PD100,-150;");
        assert_eq!(geometry.width, 300);
        assert_eq!(geometry.height, 150);
    }

    #[test]
    fn travel_counts_pen_down_only() {
        // 3-4-5 triangle: 1000 units of pen-down travel = 25 mm.
        let geometry = geometry_of("PU600,800;PD0,0;PU600,800;");
        assert_eq!(geometry.travel_mm(0), 0.0);
        assert_eq!(geometry.travel_mm(1), 25.0);
        assert_eq!(geometry.travel_mm(2), 25.0);
    }

    #[test]
    fn travel_is_monotonic() {
        let geometry = geometry_of("PD10,0;PU20,0;PD30,0,40,0;IN;PD50,0;");
        let mut previous = 0.0;
        for index in 0..5 {
            let mm = geometry.travel_mm(index);
            assert!(mm >= previous);
            previous = mm;
        }
    }

    #[test]
    fn command_mm_is_the_per_command_delta() {
        let geometry = geometry_of("PD40,0;PU40,40;PD80,40;");
        assert_eq!(geometry.command_mm(0), 1.0);
        assert_eq!(geometry.command_mm(1), 0.0);
        assert_eq!(geometry.command_mm(2), 1.0);
    }
}
