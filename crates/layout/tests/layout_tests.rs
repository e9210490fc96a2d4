//! Layout editing scenarios across geometry, fields, gestures and presets

use layout::{
    export_preset, import_preset, FieldAttr, FieldSet, GestureMode, Interaction, LayoutError,
    Point, Size, SurfaceGeometry,
};
use pretty_assertions::assert_eq;

/// An A4 landscape page shown at half size, 40px from the viewport edge
fn surface() -> SurfaceGeometry {
    SurfaceGeometry::new(
        Point::new(40.0, 40.0),
        Size::new(421.0, 297.5),
        Size::new(842.0, 595.0),
    )
    .unwrap()
}

#[test]
fn test_screen_roundtrip_at_integer_resolution() {
    let geometry = surface();
    for (x, y) in [(0.0, 0.0), (421.0, 297.0), (12.0, 250.0), (842.0, 595.0)] {
        let document = Point::new(x, y);
        let back = geometry.to_document_rounded(geometry.to_screen(document));
        assert_eq!(back, document);
    }
}

#[test]
fn test_click_then_drag_active_field() {
    let geometry = surface();
    let mut fields = FieldSet::new(geometry.native.center());
    let id = fields.active_id();

    // Click places the active field at the rounded document point
    let click = geometry.to_document_rounded(Point::new(140.0, 90.0));
    fields.update(id, FieldAttr::X, &click.x.to_string()).unwrap();
    fields.update(id, FieldAttr::Y, &click.y.to_string()).unwrap();
    assert_eq!(fields.active().position(), Point::new(200.0, 495.0));

    let mut interaction = Interaction::default();
    let pivot = geometry.to_screen(fields.active().position());
    interaction
        .begin(&mut fields, id, GestureMode::Move, pivot, pivot)
        .unwrap();
    interaction.update(
        &mut fields,
        &geometry,
        Point::new(pivot.x + 25.0, pivot.y + 10.0),
    );
    assert_eq!(interaction.end(), Some(id));
    assert_eq!(fields.active().position(), Point::new(250.0, 475.0));
}

#[test]
fn test_gesture_then_preset_roundtrip() {
    let geometry = surface();
    let mut fields = FieldSet::new(geometry.native.center());
    let name = fields.active_id();
    fields.update(name, FieldAttr::Column, "Name").unwrap();
    let course = fields.add_field(Point::new(421.0, 200.0), Some("Course".into()));

    let mut interaction = Interaction::default();
    let pivot = geometry.to_screen(fields.get(course).unwrap().position());
    interaction
        .begin(
            &mut fields,
            course,
            GestureMode::Rotate,
            Point::new(pivot.x, pivot.y - 30.0),
            pivot,
        )
        .unwrap();
    interaction.update(&mut fields, &geometry, Point::new(pivot.x + 30.0, pivot.y));
    interaction.end();
    assert_eq!(fields.get(course).unwrap().rotate, 90.0);

    let json = export_preset(&fields).unwrap();
    let mut restored = FieldSet::new(Point::default());
    restored.replace_all(import_preset(&json).unwrap()).unwrap();
    assert_eq!(restored.fields(), fields.fields());
    assert_eq!(restored.active_id(), name);
}

#[test]
fn test_failed_import_leaves_fields_untouched() {
    let mut fields = FieldSet::new(Point::new(1.0, 2.0));
    let before = fields.clone();
    let result = import_preset("[]").and_then(|imported| fields.replace_all(imported));
    assert!(matches!(result, Err(LayoutError::Preset(_))));
    assert_eq!(fields, before);
}
