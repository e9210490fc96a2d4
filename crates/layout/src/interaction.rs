//! Pointer gestures on fields
//!
//! A gesture starts on pointer-down over one of a field's handles and ends
//! on pointer-up anywhere. While it runs, pointer moves rewrite the target
//! field from the snapshot taken at the start, so the result only depends on
//! the current pointer position and never accumulates rounding.

use crate::{FieldId, FieldSet, LayoutError, Point, Result, SurfaceGeometry, TextField};

/// Screen pixels of drag per 1.0 of scale when resizing
pub const RESIZE_SENSITIVITY: f64 = 100.0;

/// What a gesture does to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureMode {
    Move,
    Resize,
    Rotate,
}

/// State captured when a gesture begins
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionSession {
    pub target: FieldId,
    pub mode: GestureMode,
    /// Pointer position at pointer-down, in viewport pixels
    pub start: Point,
    /// Rotation center in viewport pixels
    pub pivot: Point,
    /// The target as it was at pointer-down
    pub snapshot: TextField,
}

/// Gesture state machine: idle, or exactly one gesture in progress
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    Active(InteractionSession),
}

impl Interaction {
    pub fn is_active(&self) -> bool {
        matches!(self, Interaction::Active(_))
    }

    pub fn session(&self) -> Option<&InteractionSession> {
        match self {
            Interaction::Active(session) => Some(session),
            Interaction::Idle => None,
        }
    }

    /// Start a gesture on `id`, which also becomes the active field
    pub fn begin(
        &mut self,
        fields: &mut FieldSet,
        id: FieldId,
        mode: GestureMode,
        pointer: Point,
        pivot: Point,
    ) -> Result<()> {
        if let Interaction::Active(session) = self {
            return Err(LayoutError::GestureInProgress(session.target));
        }
        if !is_finite(pointer) || !is_finite(pivot) {
            return Err(LayoutError::InvalidPointer);
        }
        let snapshot = fields.get(id).cloned().ok_or(LayoutError::UnknownField(id))?;
        fields.set_active(id)?;
        log::trace!("Begin {mode:?} on field {id}");
        *self = Interaction::Active(InteractionSession {
            target: id,
            mode,
            start: pointer,
            pivot,
            snapshot,
        });
        Ok(())
    }

    /// Apply a pointer move to the target field
    ///
    /// Returns whether a field changed. Does nothing while idle or for a
    /// non-finite pointer; a target that disappeared mid-gesture ends the
    /// gesture.
    pub fn update(
        &mut self,
        fields: &mut FieldSet,
        geometry: &SurfaceGeometry,
        pointer: Point,
    ) -> bool {
        if !is_finite(pointer) {
            return false;
        }
        let target = match self {
            Interaction::Active(session) => session.target,
            Interaction::Idle => return false,
        };
        let Some(field) = fields.get_mut(target) else {
            *self = Interaction::Idle;
            return false;
        };
        let Interaction::Active(session) = &*self else {
            return false;
        };

        let snap = &session.snapshot;
        let dx = pointer.x - session.start.x;
        let dy = pointer.y - session.start.y;

        match session.mode {
            GestureMode::Move => {
                let (scale_x, scale_y) = geometry.scale();
                field.x = (snap.x + dx * scale_x).round();
                field.y = (snap.y - dy * scale_y).round();
            }
            GestureMode::Resize => {
                let scale_x = snap.scale_x + dx / RESIZE_SENSITIVITY;
                let scale_y = snap.scale_y + dy / RESIZE_SENSITIVITY;
                field.set_scale_x(scale_x);
                if !field.lock_ratio {
                    field.set_scale_y(scale_y);
                }
            }
            GestureMode::Rotate => {
                let angle = (pointer.y - session.pivot.y)
                    .atan2(pointer.x - session.pivot.x)
                    .to_degrees();
                field.set_rotate((angle + 90.0).round());
            }
        }
        true
    }

    /// Finish the current gesture, returning its target
    pub fn end(&mut self) -> Option<FieldId> {
        match std::mem::take(self) {
            Interaction::Active(session) => {
                log::trace!("End {:?} on field {}", session.mode, session.target);
                Some(session.target)
            }
            Interaction::Idle => None,
        }
    }
}

fn is_finite(point: Point) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldAttr, Size};
    use pretty_assertions::assert_eq;

    fn geometry() -> SurfaceGeometry {
        SurfaceGeometry::new(
            Point::default(),
            Size::new(400.0, 300.0),
            Size::new(800.0, 600.0),
        )
        .unwrap()
    }

    fn fields() -> FieldSet {
        FieldSet::new(Point::new(400.0, 300.0))
    }

    #[test]
    fn test_update_while_idle_is_noop() {
        let mut fields = fields();
        let before = fields.clone();
        let mut interaction = Interaction::default();
        assert!(!interaction.update(&mut fields, &geometry(), Point::new(5.0, 5.0)));
        assert_eq!(fields, before);
        assert_eq!(interaction.end(), None);
    }

    #[test]
    fn test_non_finite_pointer_leaves_field_alone() {
        for mode in [GestureMode::Move, GestureMode::Resize, GestureMode::Rotate] {
            let mut fields = fields();
            let id = fields.active_id();
            let before = fields.clone();
            let mut interaction = Interaction::default();
            interaction
                .begin(&mut fields, id, mode, Point::new(10.0, 10.0), Point::new(200.0, 150.0))
                .unwrap();

            for pointer in [
                Point::new(f64::NAN, 10.0),
                Point::new(10.0, f64::INFINITY),
                Point::new(f64::NEG_INFINITY, f64::NAN),
            ] {
                assert!(!interaction.update(&mut fields, &geometry(), pointer));
            }
            assert_eq!(fields, before, "{mode:?}");
            assert!(interaction.is_active());
            assert_eq!(interaction.end(), Some(id));
        }
    }

    #[test]
    fn test_begin_rejects_non_finite_pointer() {
        let mut fields = fields();
        let id = fields.active_id();
        let mut interaction = Interaction::default();
        assert_eq!(
            interaction.begin(
                &mut fields,
                id,
                GestureMode::Move,
                Point::new(f64::NAN, 0.0),
                Point::default()
            ),
            Err(LayoutError::InvalidPointer)
        );
        assert_eq!(
            interaction.begin(
                &mut fields,
                id,
                GestureMode::Rotate,
                Point::default(),
                Point::new(0.0, f64::INFINITY)
            ),
            Err(LayoutError::InvalidPointer)
        );
        assert!(!interaction.is_active());
    }

    #[test]
    fn test_move_inverts_y_and_scales() {
        let mut fields = fields();
        let id = fields.active_id();
        let mut interaction = Interaction::default();
        interaction
            .begin(&mut fields, id, GestureMode::Move, Point::new(100.0, 100.0), Point::default())
            .unwrap();

        assert!(interaction.update(&mut fields, &geometry(), Point::new(110.0, 90.0)));
        let field = fields.get(id).unwrap();
        assert_eq!(field.position(), Point::new(420.0, 320.0));

        // Relative to the snapshot, not the previous move
        interaction.update(&mut fields, &geometry(), Point::new(100.3, 100.0));
        assert_eq!(fields.get(id).unwrap().position(), Point::new(401.0, 300.0));

        assert_eq!(interaction.end(), Some(id));
        assert!(!interaction.is_active());
    }

    #[test]
    fn test_resize_locked_uses_x_delta() {
        let mut fields = fields();
        let id = fields.active_id();
        let mut interaction = Interaction::default();
        interaction
            .begin(&mut fields, id, GestureMode::Resize, Point::new(0.0, 0.0), Point::default())
            .unwrap();
        interaction.update(&mut fields, &geometry(), Point::new(50.0, -80.0));
        let field = fields.get(id).unwrap();
        assert_eq!((field.scale_x, field.scale_y), (1.5, 1.5));
    }

    #[test]
    fn test_resize_unlocked_axes_and_floor() {
        let mut fields = fields();
        let id = fields.active_id();
        fields.update(id, FieldAttr::LockRatio, "false").unwrap();
        let mut interaction = Interaction::default();
        interaction
            .begin(&mut fields, id, GestureMode::Resize, Point::new(0.0, 0.0), Point::default())
            .unwrap();
        interaction.update(&mut fields, &geometry(), Point::new(100.0, -500.0));
        let field = fields.get(id).unwrap();
        assert_eq!((field.scale_x, field.scale_y), (2.0, 0.1));
    }

    #[test]
    fn test_rotate_angles() {
        let mut fields = fields();
        let id = fields.active_id();
        let pivot = Point::new(200.0, 150.0);
        let mut interaction = Interaction::default();
        interaction
            .begin(&mut fields, id, GestureMode::Rotate, Point::new(200.0, 100.0), pivot)
            .unwrap();

        let cases = [
            (Point::new(200.0, 100.0), 0.0),
            (Point::new(250.0, 150.0), 90.0),
            (Point::new(200.0, 200.0), 180.0),
            (Point::new(150.0, 150.0), 270.0),
        ];
        for (pointer, expected) in cases {
            interaction.update(&mut fields, &geometry(), pointer);
            assert_eq!(fields.get(id).unwrap().rotate, expected);
        }
    }

    #[test]
    fn test_begin_makes_target_active() {
        let mut fields = fields();
        let second = fields.add_field(Point::default(), None);
        fields.set_active(crate::FieldId(1)).unwrap();
        let mut interaction = Interaction::default();
        interaction
            .begin(&mut fields, second, GestureMode::Move, Point::default(), Point::default())
            .unwrap();
        assert_eq!(fields.active_id(), second);
    }

    #[test]
    fn test_begin_rejected_during_gesture() {
        let mut fields = fields();
        let first = fields.active_id();
        let second = fields.add_field(Point::default(), None);
        let mut interaction = Interaction::default();
        interaction
            .begin(&mut fields, first, GestureMode::Move, Point::default(), Point::default())
            .unwrap();
        let err = interaction
            .begin(&mut fields, second, GestureMode::Rotate, Point::default(), Point::default())
            .unwrap_err();
        assert_eq!(err, LayoutError::GestureInProgress(first));
        assert_eq!(interaction.session().unwrap().target, first);
    }

    #[test]
    fn test_begin_unknown_field() {
        let mut fields = fields();
        let mut interaction = Interaction::default();
        let err = interaction
            .begin(&mut fields, FieldId(5), GestureMode::Move, Point::default(), Point::default())
            .unwrap_err();
        assert_eq!(err, LayoutError::UnknownField(FieldId(5)));
        assert!(!interaction.is_active());
    }

    #[test]
    fn test_only_target_changes() {
        let mut fields = fields();
        let other = fields.active_id();
        let target = fields.add_field(Point::new(10.0, 10.0), None);
        let other_before = fields.get(other).unwrap().clone();
        let mut interaction = Interaction::default();
        interaction
            .begin(&mut fields, target, GestureMode::Move, Point::default(), Point::default())
            .unwrap();
        interaction.update(&mut fields, &geometry(), Point::new(30.0, 30.0));
        assert_eq!(fields.get(other).unwrap(), &other_before);
        assert_eq!(fields.get(target).unwrap().position(), Point::new(70.0, -50.0));
    }

    #[test]
    fn test_removed_target_ends_gesture() {
        let mut fields = fields();
        let target = fields.add_field(Point::default(), None);
        let mut interaction = Interaction::default();
        interaction
            .begin(&mut fields, target, GestureMode::Move, Point::default(), Point::default())
            .unwrap();
        fields.remove_field(target).unwrap();
        assert!(!interaction.update(&mut fields, &geometry(), Point::new(1.0, 1.0)));
        assert!(!interaction.is_active());
    }
}
