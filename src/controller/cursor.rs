//! Application-held cursor handles
//!
//! A [`Cursor`] owns one resource id while initialized. Initializing sends the
//! pixel data (or system cursor choice) to the native thread; dropping the
//! handle destroys the native cursor and returns the id to the shared pool.
//! Mice only keep a weak reference, so a dropped cursor reads back as
//! `ResourceId::NONE` on every mouse that had it selected.

use crate::bus::{Command, CommandExecutor, CursorBitmap, CursorSource, ResourceId, ResourceIds};
use crate::error::InputError;
use crate::types::{PixelFormat, Size2, SystemCursor, Vector2};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

#[derive(Debug, Default)]
pub(crate) struct CursorShared {
    resource: AtomicU64,
}

impl CursorShared {
    pub(crate) fn resource(&self) -> ResourceId {
        ResourceId::from_raw(self.resource.load(Ordering::Acquire))
    }
}

pub struct Cursor {
    shared: Arc<CursorShared>,
    commands: Arc<dyn CommandExecutor>,
    resource_ids: ResourceIds,
}

impl Cursor {
    pub(crate) fn new(commands: Arc<dyn CommandExecutor>, resource_ids: ResourceIds) -> Self {
        Self {
            shared: Arc::new(CursorShared::default()),
            commands,
            resource_ids,
        }
    }

    /// `ResourceId::NONE` until the first `init`
    pub fn resource(&self) -> ResourceId {
        self.shared.resource()
    }

    pub fn init(&mut self, cursor: SystemCursor) {
        self.init_source(CursorSource::System(cursor));
    }

    /// Custom cursor from premultiplied-alpha pixels, `size` in whole pixels
    pub fn init_bitmap(
        &mut self,
        data: Vec<u8>,
        size: Size2,
        pixel_format: PixelFormat,
        hot_spot: Vector2,
    ) -> Result<(), InputError> {
        let (width, height) = match (pixel_count(size.width), pixel_count(size.height)) {
            (Some(width), Some(height)) => (width, height),
            _ => {
                return Err(InputError::InvalidCursorBitmap(format!(
                    "size {}x{} is not a whole number of pixels",
                    size.width, size.height
                )))
            }
        };

        let Some(expected) = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(pixel_format.bytes_per_pixel()))
        else {
            return Err(InputError::InvalidCursorBitmap(format!(
                "size {}x{} {:?} is too large",
                width, height, pixel_format
            )));
        };

        if data.len() != expected {
            return Err(InputError::InvalidCursorBitmap(format!(
                "expected {} bytes for {}x{} {:?}, got {}",
                expected,
                width,
                height,
                pixel_format,
                data.len()
            )));
        }

        self.init_source(CursorSource::Bitmap(CursorBitmap {
            data,
            size,
            pixel_format,
            hot_spot,
        }));
        Ok(())
    }

    pub(crate) fn downgrade(&self) -> Weak<CursorShared> {
        Arc::downgrade(&self.shared)
    }

    fn init_source(&mut self, source: CursorSource) {
        let mut resource = self.resource();
        if resource.is_none() {
            resource = self.resource_ids.allocate();
            self.shared
                .resource
                .store(resource.get(), Ordering::Release);
        }

        debug!("Initializing cursor {}", resource);
        self.commands
            .execute_on_owning_thread(Command::InitCursor { resource, source });
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        let resource = ResourceId::from_raw(self.shared.resource.swap(0, Ordering::AcqRel));
        if resource.is_none() {
            return;
        }

        debug!("Destroying cursor {}", resource);
        self.commands
            .execute_on_owning_thread(Command::DestroyCursor { resource });
        self.resource_ids.release(resource);
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("resource", &self.resource())
            .finish_non_exhaustive()
    }
}

fn pixel_count(extent: f32) -> Option<usize> {
    (extent >= 0.0 && extent.fract() == 0.0 && extent <= u32::MAX as f32).then_some(extent as usize)
}
