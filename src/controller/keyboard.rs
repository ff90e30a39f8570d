use crate::controller::dispatch::{ApplicationEvent, EventDispatcher};
use crate::types::{DeviceId, Key};

/// Game-side keyboard; key edges are carried by the events themselves
#[derive(Debug)]
pub struct Keyboard {
    id: DeviceId,
}

impl Keyboard {
    pub(crate) fn new(id: DeviceId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub(crate) fn handle_key_press(&mut self, key: Key, dispatcher: &mut dyn EventDispatcher) -> bool {
        dispatcher.dispatch(ApplicationEvent::KeyPress {
            keyboard: self.id,
            key,
        })
    }

    pub(crate) fn handle_key_release(
        &mut self,
        key: Key,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        dispatcher.dispatch(ApplicationEvent::KeyRelease {
            keyboard: self.id,
            key,
        })
    }
}
