//! Ordered, observable collection of loaded plot documents
//!
//! Rows are positional and shift on insert/remove; the uid is the only
//! stable cross-reference and is never reused. Each entry owns its own lock
//! (an arena of per-row mutexes, not one collection-wide lock), so a
//! background renderer working on one row never contends with edits to
//! another. Mutations publish range events on subscribed channels, the
//! explicit replacement for begin/end model-signal bracketing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};

use glam::DVec2;

use crate::errors::ModelError;
use crate::log::debug;
use crate::object::PlotObject;
use crate::scene::{ItemGroup, RenderedItem};

/// Monotonic document identifier, assigned at insert, never reused
pub type Uid = u64;

/// Display name and origin of a loaded file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileName {
    pub filename: String,
    pub path: String,
}

impl FileName {
    pub fn new(filename: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            path: path.into(),
        }
    }
}

/// Mutation notification carrying the affected row range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEvent {
    RowsInserted { first: usize, last: usize },
    RowsRemoved { first: usize, last: usize },
    NameChanged { row: usize },
}

/// The fields a second flow may read or mutate, guarded per entry
#[derive(Debug, Default)]
pub struct EntryState {
    pub name: FileName,
    pub items: Vec<RenderedItem>,
    pub group: ItemGroup,
}

/// One document slot: a stable uid plus its own exclusive lock.
///
/// Handed out as `Arc` so a reference held by an async render callback
/// survives row shuffles and removal.
#[derive(Debug)]
pub struct DocumentEntry {
    uid: Uid,
    state: Mutex<EntryState>,
}

impl DocumentEntry {
    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// The only sanctioned access to name, items and group.
    ///
    /// Never hold the guard across serial I/O or pacing sleeps.
    pub fn lock(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct DocumentRow {
    entry: Arc<DocumentEntry>,
    object: PlotObject,
}

/// The multi-document collection driven by the control flow
#[derive(Default)]
pub struct DocumentModel {
    rows: Vec<DocumentRow>,
    next_uid: Uid,
    observers: Vec<mpsc::Sender<ModelEvent>>,
}

impl DocumentModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Register an observer; events arrive on the returned channel.
    /// Dropped receivers are pruned on the next publication.
    pub fn subscribe(&mut self) -> mpsc::Receiver<ModelEvent> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    fn publish(&mut self, event: ModelEvent) {
        self.observers.retain(|tx| tx.send(event).is_ok());
    }

    /// Insert `count` empty entries so that the first occupies `row`.
    ///
    /// Requires `row <= len`. Fresh uids come from the monotonic counter;
    /// positions shift, uids never do.
    pub fn insert_rows(&mut self, row: usize, count: usize) -> Result<(), ModelError> {
        if row > self.rows.len() {
            return Err(ModelError::IndexOutOfRange {
                row,
                count,
                len: self.rows.len(),
            });
        }
        if count == 0 {
            return Ok(());
        }
        for offset in 0..count {
            let uid = self.next_uid;
            self.next_uid += 1;
            self.rows.insert(
                row + offset,
                DocumentRow {
                    entry: Arc::new(DocumentEntry {
                        uid,
                        state: Mutex::new(EntryState::default()),
                    }),
                    object: PlotObject::default(),
                },
            );
        }
        self.publish(ModelEvent::RowsInserted {
            first: row,
            last: row + count - 1,
        });
        Ok(())
    }

    /// Remove `count` entries starting at `row`.
    ///
    /// Each entry's own lock is taken before its row is dropped, so a
    /// renderer holding the entry finishes its access first.
    pub fn remove_rows(&mut self, row: usize, count: usize) -> Result<(), ModelError> {
        debug!("remove rows {}+{} of {}", row, count, self.rows.len());
        let end = row.checked_add(count);
        if count == 0 || end.is_none_or(|end| end > self.rows.len()) {
            return Err(ModelError::IndexOutOfRange {
                row,
                count,
                len: self.rows.len(),
            });
        }
        for index in (row..row + count).rev() {
            let removed = self.rows.remove(index);
            let mut state = removed.entry.lock();
            state.items.clear();
        }
        self.publish(ModelEvent::RowsRemoved {
            first: row,
            last: row + count - 1,
        });
        Ok(())
    }

    /// The entry at `row`, shareable with a render flow
    pub fn entry(&self, row: usize) -> Option<Arc<DocumentEntry>> {
        self.rows.get(row).map(|r| Arc::clone(&r.entry))
    }

    pub fn uid(&self, row: usize) -> Option<Uid> {
        self.rows.get(row).map(|r| r.entry.uid)
    }

    /// Current row of the entry with `uid`, if it is still in the collection
    pub fn row_of(&self, uid: Uid) -> Option<usize> {
        self.rows.iter().position(|r| r.entry.uid == uid)
    }

    pub fn entry_by_uid(&self, uid: Uid) -> Option<Arc<DocumentEntry>> {
        self.row_of(uid).and_then(|row| self.entry(row))
    }

    pub fn object(&self, row: usize) -> Option<&PlotObject> {
        self.rows.get(row).map(|r| &r.object)
    }

    pub fn object_mut(&mut self, row: usize) -> Option<&mut PlotObject> {
        self.rows.get_mut(row).map(|r| &mut r.object)
    }

    /// Loaded objects in row order
    pub fn objects(&self) -> impl Iterator<Item = &PlotObject> {
        self.rows.iter().map(|r| &r.object)
    }

    pub fn set_object(&mut self, row: usize, object: PlotObject) -> Result<(), ModelError> {
        match self.rows.get_mut(row) {
            Some(slot) => {
                slot.object = object;
                Ok(())
            }
            None => Err(ModelError::IndexOutOfRange {
                row,
                count: 1,
                len: self.rows.len(),
            }),
        }
    }

    pub fn set_name(&mut self, row: usize, name: FileName) -> Result<(), ModelError> {
        let Some(slot) = self.rows.get(row) else {
            return Err(ModelError::IndexOutOfRange {
                row,
                count: 1,
                len: self.rows.len(),
            });
        };
        slot.entry.lock().name = name;
        self.publish(ModelEvent::NameChanged { row });
        Ok(())
    }

    pub fn name(&self, row: usize) -> Option<FileName> {
        self.rows.get(row).map(|r| r.entry.lock().name.clone())
    }

    /// Append a rendered item to the row's guarded item list
    pub fn add_polygon(&self, row: usize, item: RenderedItem) -> Result<(), ModelError> {
        let Some(slot) = self.rows.get(row) else {
            return Err(ModelError::IndexOutOfRange {
                row,
                count: 1,
                len: self.rows.len(),
            });
        };
        slot.entry.lock().items.push(item);
        Ok(())
    }

    /// Nudge every entry's group back inside `[lower, upper]`.
    ///
    /// X is checked against the lower edge only, Y against both edges; the
    /// group moves by the minimal vector that restores containment. Each
    /// entry's lock is held only for that entry's adjustment; this is not
    /// an atomic pass over the whole collection.
    pub fn constrain_items(&self, lower: DVec2, upper: DVec2) {
        for slot in &self.rows {
            let mut state = slot.entry.lock();
            let EntryState { items, group, .. } = &mut *state;
            let Some(rect) = group.scene_bounds(items) else {
                continue;
            };

            let mut offset = DVec2::ZERO;
            if rect.min.x < lower.x {
                offset.x = lower.x - rect.min.x;
            }
            if rect.min.y < lower.y {
                offset.y = lower.y - rect.min.y;
            } else if rect.max.y > upper.y {
                offset.y = upper.y - rect.max.y;
            }

            if offset != DVec2::ZERO {
                group.translate(offset);
            }
        }
    }

    /// Load convenience: append a row holding `object` under `name`,
    /// returning the new entry's uid
    pub fn append_object(&mut self, object: PlotObject, name: FileName) -> Uid {
        let row = self.rows.len();
        // Appending at the end cannot be out of range.
        let _ = self.insert_rows(row, 1);
        let _ = self.set_object(row, object);
        let _ = self.set_name(row, name);
        self.rows[row].entry.uid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Pen;
    use glam::dvec2;

    fn item(points: &[(f64, f64)]) -> RenderedItem {
        RenderedItem {
            points: points.iter().map(|&(x, y)| dvec2(x, y)).collect(),
            pen: Pen::Down,
        }
    }

    #[test]
    fn uids_are_never_renumbered_or_reused() {
        let mut model = DocumentModel::new();
        model.insert_rows(0, 3).unwrap();
        assert_eq!(model.uid(0), Some(0));
        assert_eq!(model.uid(1), Some(1));
        assert_eq!(model.uid(2), Some(2));

        model.remove_rows(1, 1).unwrap();
        assert_eq!(model.uid(0), Some(0));
        assert_eq!(model.uid(1), Some(2));

        model.insert_rows(2, 1).unwrap();
        assert_eq!(model.uid(2), Some(3));
    }

    #[test]
    fn row_lookup_follows_shifts_while_uid_is_stable() {
        let mut model = DocumentModel::new();
        model.insert_rows(0, 2).unwrap();
        model.insert_rows(0, 1).unwrap();
        // The front insert shifted the original rows down.
        assert_eq!(model.uid(0), Some(2));
        assert_eq!(model.row_of(0), Some(1));
        assert_eq!(model.row_of(1), Some(2));
        assert!(model.entry_by_uid(1).is_some());
        assert!(model.entry_by_uid(99).is_none());
    }

    #[test]
    fn invalid_ranges_fail_without_mutating() {
        let mut model = DocumentModel::new();
        model.insert_rows(0, 2).unwrap();

        assert!(matches!(
            model.insert_rows(3, 1),
            Err(ModelError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            model.remove_rows(1, 2),
            Err(ModelError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            model.remove_rows(0, 0),
            Err(ModelError::IndexOutOfRange { .. })
        ));
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn mutations_publish_range_events() {
        let mut model = DocumentModel::new();
        let events = model.subscribe();

        model.insert_rows(0, 2).unwrap();
        model.remove_rows(0, 1).unwrap();
        model.set_name(0, FileName::new("drawing.hpgl", "/tmp")).unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            ModelEvent::RowsInserted { first: 0, last: 1 }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            ModelEvent::RowsRemoved { first: 0, last: 0 }
        );
        assert_eq!(events.try_recv().unwrap(), ModelEvent::NameChanged { row: 0 });
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn constrain_moves_minimally_on_violated_axes_only() {
        let mut model = DocumentModel::new();
        model.insert_rows(0, 1).unwrap();
        model
            .add_polygon(0, item(&[(0.0, 5.0), (50.0, 60.0)]))
            .unwrap();

        // The group offset puts the left edge at x = -10; y stays in range.
        let entry = model.entry(0).unwrap();
        entry.lock().group.set_pos(dvec2(-10.0, 0.0));

        model.constrain_items(dvec2(0.0, 0.0), dvec2(1000.0, 1000.0));

        assert_eq!(entry.lock().group.pos(), dvec2(0.0, 0.0));
    }

    #[test]
    fn constrain_pulls_down_from_the_upper_edge() {
        let mut model = DocumentModel::new();
        model.insert_rows(0, 1).unwrap();
        model
            .add_polygon(0, item(&[(5.0, 900.0), (20.0, 1100.0)]))
            .unwrap();

        model.constrain_items(dvec2(0.0, 0.0), dvec2(1000.0, 1000.0));

        let entry = model.entry(0).unwrap();
        assert_eq!(entry.lock().group.pos(), dvec2(0.0, -100.0));
    }

    #[test]
    fn constrain_leaves_contained_groups_alone() {
        let mut model = DocumentModel::new();
        model.insert_rows(0, 1).unwrap();
        model.add_polygon(0, item(&[(1.0, 1.0), (2.0, 2.0)])).unwrap();

        model.constrain_items(dvec2(0.0, 0.0), dvec2(1000.0, 1000.0));

        let entry = model.entry(0).unwrap();
        assert_eq!(entry.lock().group.pos(), dvec2(0.0, 0.0));
    }

    #[test]
    fn entries_are_usable_from_a_render_thread() {
        let mut model = DocumentModel::new();
        model.insert_rows(0, 2).unwrap();
        let shared = model.entry(0).unwrap();

        let renderer = std::thread::spawn(move || {
            let mut state = shared.lock();
            state.items.push(RenderedItem {
                points: vec![dvec2(0.0, 0.0), dvec2(1.0, 1.0)],
                pen: Pen::Up,
            });
        });

        // Row 1 has its own lock; touching it cannot contend with row 0.
        model.add_polygon(1, item(&[(0.0, 0.0)])).unwrap();
        renderer.join().expect("render thread panicked");

        let entry = model.entry(0).unwrap();
        assert_eq!(entry.lock().items.len(), 1);
    }

    #[test]
    fn entry_reference_survives_removal() {
        let mut model = DocumentModel::new();
        model.insert_rows(0, 1).unwrap();
        let held = model.entry(0).unwrap();
        model.remove_rows(0, 1).unwrap();

        // The uid is gone from the collection but the held entry is alive.
        assert_eq!(model.row_of(0), None);
        assert_eq!(held.uid(), 0);
        drop(held.lock());
    }

    #[test]
    fn append_object_names_the_new_row() {
        let mut model = DocumentModel::new();
        let uid = model.append_object(
            PlotObject::default(),
            FileName::new("square.hpgl", "/plots/square.hpgl"),
        );
        assert_eq!(uid, 0);
        assert_eq!(model.name(0).unwrap().filename, "square.hpgl");
        assert_eq!(model.object(0).unwrap().command_count(), 0);
    }

    #[test]
    fn dead_observers_are_pruned() {
        let mut model = DocumentModel::new();
        let events = model.subscribe();
        drop(events);
        model.insert_rows(0, 1).unwrap();
        assert!(model.observers.is_empty());
    }

    #[test]
    fn entries_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Arc<DocumentEntry>>();
    }
}
