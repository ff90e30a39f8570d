use crate::controller::dispatch::{ApplicationEvent, EventDispatcher};
use crate::types::{DeviceId, Vector2};
use std::collections::HashMap;
use tracing::debug;

/// Game-side touchpad or touch screen, tracking every active touch
#[derive(Debug)]
pub struct Touchpad {
    id: DeviceId,
    screen: bool,
    touches: HashMap<u64, Vector2>,
}

impl Touchpad {
    pub(crate) fn new(id: DeviceId, screen: bool) -> Self {
        Self {
            id,
            screen,
            touches: HashMap::new(),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Touch screen rather than trackpad
    pub fn is_screen(&self) -> bool {
        self.screen
    }

    pub fn touch_position(&self, touch_id: u64) -> Option<Vector2> {
        self.touches.get(&touch_id).copied()
    }

    pub fn active_touches(&self) -> impl Iterator<Item = (u64, Vector2)> + '_ {
        self.touches.iter().map(|(id, position)| (*id, *position))
    }

    pub(crate) fn handle_touch_begin(
        &mut self,
        touch_id: u64,
        position: Vector2,
        force: f32,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        self.touches.insert(touch_id, position);
        dispatcher.dispatch(ApplicationEvent::TouchBegin {
            touchpad: self.id,
            touch_id,
            position,
            force,
        })
    }

    /// A move without a begin starts tracking from the origin
    pub(crate) fn handle_touch_move(
        &mut self,
        touch_id: u64,
        position: Vector2,
        force: f32,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        let previous = self.touches.insert(touch_id, position).unwrap_or_else(|| {
            debug!("Move for untracked touch {} on {}", touch_id, self.id);
            Vector2::ZERO
        });

        dispatcher.dispatch(ApplicationEvent::TouchMove {
            touchpad: self.id,
            touch_id,
            position,
            difference: position - previous,
            force,
        })
    }

    pub(crate) fn handle_touch_end(
        &mut self,
        touch_id: u64,
        position: Vector2,
        force: f32,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        self.touches.remove(&touch_id);
        dispatcher.dispatch(ApplicationEvent::TouchEnd {
            touchpad: self.id,
            touch_id,
            position,
            force,
        })
    }

    pub(crate) fn handle_touch_cancel(
        &mut self,
        touch_id: u64,
        position: Vector2,
        force: f32,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        self.touches.remove(&touch_id);
        dispatcher.dispatch(ApplicationEvent::TouchCancel {
            touchpad: self.id,
            touch_id,
            position,
            force,
        })
    }
}
