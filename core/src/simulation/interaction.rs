//! Pointer handling for drag-and-select front ends.
//!
//! Selection and hover live in a [`PointerState`] value owned by the caller;
//! every handler takes the previous state and returns the next one.

use crate::math::Vec2;
use crate::prelude::ObjectId;
use crate::simulation::engine::Engine;

/// Distance within which a pointer grabs an object.
pub const PICK_RADIUS: f64 = 15.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub selected: Option<ObjectId>,
    pub hovered: Option<ObjectId>,
    pub dragging: Option<Drag>,
}

/// Active drag: the object and the pointer's offset from its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub id: ObjectId,
    pub grab_offset: Vec2,
}

/// Forgets ids that no longer exist in the engine.
pub fn sanitize(engine: &Engine, state: PointerState) -> PointerState {
    let alive = |id: &ObjectId| engine.object(*id).is_some();
    PointerState {
        selected: state.selected.filter(alive),
        hovered: state.hovered.filter(alive),
        dragging: state.dragging.filter(|drag| alive(&drag.id)),
    }
}

pub fn pointer_pressed(engine: &Engine, state: PointerState, point: Vec2) -> PointerState {
    let state = sanitize(engine, state);
    match engine.object_at(point, PICK_RADIUS) {
        Some(id) => {
            let grab_offset = engine
                .object(id)
                .map(|object| point - object.position())
                .unwrap_or_default();
            PointerState {
                selected: Some(id),
                hovered: Some(id),
                dragging: Some(Drag { id, grab_offset }),
            }
        }
        None => PointerState {
            selected: None,
            dragging: None,
            ..state
        },
    }
}

/// Updates hover and, while dragging, moves the grabbed object with the pointer.
pub fn pointer_moved(engine: &mut Engine, state: PointerState, point: Vec2) -> PointerState {
    let mut state = sanitize(engine, state);
    if let Some(drag) = state.dragging {
        if engine.set_position(drag.id, point - drag.grab_offset).is_err() {
            state.dragging = None;
        }
    }
    state.hovered = engine.object_at(point, PICK_RADIUS);
    state
}

pub fn pointer_released(state: PointerState) -> PointerState {
    PointerState {
        dragging: None,
        ..state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::ObjectKind;

    fn engine_with_source_at(position: Vec2) -> (Engine, ObjectId) {
        let mut engine = Engine::default();
        let id = engine.create_object(ObjectKind::Source).id();
        engine.set_position(id, position).unwrap();
        (engine, id)
    }

    #[test]
    fn press_selects_and_drag_moves() {
        let (mut engine, id) = engine_with_source_at(Vec2::new(100.0, 100.0));

        let state = pointer_pressed(&engine, PointerState::default(), Vec2::new(105.0, 100.0));
        assert_eq!(state.selected, Some(id));

        let state = pointer_moved(&mut engine, state, Vec2::new(205.0, 150.0));
        assert_eq!(engine.object(id).unwrap().position(), Vec2::new(200.0, 150.0));

        let state = pointer_released(state);
        assert!(state.dragging.is_none());
        assert_eq!(state.selected, Some(id));

        pointer_moved(&mut engine, state, Vec2::new(400.0, 400.0));
        assert_eq!(engine.object(id).unwrap().position(), Vec2::new(200.0, 150.0));
    }

    #[test]
    fn press_on_empty_space_clears_selection() {
        let (engine, id) = engine_with_source_at(Vec2::new(100.0, 100.0));
        let state = PointerState {
            selected: Some(id),
            ..Default::default()
        };
        let state = pointer_pressed(&engine, state, Vec2::new(500.0, 500.0));
        assert_eq!(state.selected, None);
    }

    #[test]
    fn hover_follows_pointer() {
        let (mut engine, id) = engine_with_source_at(Vec2::new(10.0, 10.0));
        let state = pointer_moved(&mut engine, PointerState::default(), Vec2::new(12.0, 8.0));
        assert_eq!(state.hovered, Some(id));
        let state = pointer_moved(&mut engine, state, Vec2::new(80.0, 80.0));
        assert_eq!(state.hovered, None);
    }

    #[test]
    fn deleted_selection_is_dropped_on_next_event() {
        let (mut engine, id) = engine_with_source_at(Vec2::new(10.0, 10.0));
        let state = pointer_pressed(&engine, PointerState::default(), Vec2::new(10.0, 10.0));
        engine.delete_object(id).unwrap();

        let state = pointer_moved(&mut engine, state, Vec2::new(50.0, 50.0));
        assert_eq!(state, PointerState::default());
    }
}
