//! Scene-side data handed to the rendering collaborator
//!
//! The core never exposes mutable references into its own buffers: rendered
//! items are owned values appended under an entry's lock, and bounding
//! rectangles are computed fresh on request.

use glam::DVec2;

use crate::command::Pen;

/// Axis-aligned bounding rectangle in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Rect {
    /// Tightest rect around a set of points; `None` when the set is empty
    pub fn from_points(points: impl IntoIterator<Item = DVec2>) -> Option<Rect> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut rect = Rect {
            min: first,
            max: first,
        };
        for p in points {
            rect.min = rect.min.min(p);
            rect.max = rect.max.max(p);
        }
        Some(rect)
    }

    pub fn union(self, other: Rect) -> Rect {
        Rect {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn translated(self, offset: DVec2) -> Rect {
        Rect {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// One rendered polyline: a point run plus the pen that draws it
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedItem {
    pub points: Vec<DVec2>,
    pub pen: Pen,
}

impl RenderedItem {
    pub fn bounds(&self) -> Option<Rect> {
        Rect::from_points(self.points.iter().copied())
    }
}

/// Grouping handle used to reposition a document's items collectively.
///
/// Items keep their own coordinates; the group contributes a shared offset,
/// and its scene bounds are the union of item bounds displaced by that
/// offset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ItemGroup {
    pos: DVec2,
}

impl ItemGroup {
    pub fn pos(&self) -> DVec2 {
        self.pos
    }

    pub fn set_pos(&mut self, pos: DVec2) {
        self.pos = pos;
    }

    pub fn translate(&mut self, offset: DVec2) {
        self.pos += offset;
    }

    /// Bounding rectangle of `items` in scene coordinates
    pub fn scene_bounds(&self, items: &[RenderedItem]) -> Option<Rect> {
        items
            .iter()
            .filter_map(RenderedItem::bounds)
            .reduce(Rect::union)
            .map(|rect| rect.translated(self.pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn rect_from_points_spans_extremes() {
        let rect = Rect::from_points([dvec2(3.0, -1.0), dvec2(-2.0, 4.0), dvec2(0.0, 0.0)])
            .expect("non-empty");
        assert_eq!(rect.min, dvec2(-2.0, -1.0));
        assert_eq!(rect.max, dvec2(3.0, 4.0));
        assert_eq!(rect.width(), 5.0);
        assert_eq!(rect.height(), 5.0);
    }

    #[test]
    fn empty_point_set_has_no_rect() {
        assert!(Rect::from_points(std::iter::empty::<DVec2>()).is_none());
    }

    #[test]
    fn group_offset_displaces_scene_bounds() {
        let item = RenderedItem {
            points: vec![dvec2(0.0, 0.0), dvec2(10.0, 20.0)],
            pen: Pen::Down,
        };
        let mut group = ItemGroup::default();
        group.translate(dvec2(-15.0, 5.0));
        let rect = group.scene_bounds(std::slice::from_ref(&item)).unwrap();
        assert_eq!(rect.min, dvec2(-15.0, 5.0));
        assert_eq!(rect.max, dvec2(-5.0, 25.0));
    }

    #[test]
    fn group_without_items_has_no_bounds() {
        let group = ItemGroup::default();
        assert!(group.scene_bounds(&[]).is_none());
    }
}
