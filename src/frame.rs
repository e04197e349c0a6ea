//! Cancellable `requestAnimationFrame` loop.

use crate::capabilities::CapabilityError;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

struct LoopInner {
    request_id: Cell<Option<i32>>,
    closure: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl LoopInner {
    fn request_next(&self) -> Result<(), CapabilityError> {
        let window = web_sys::window().ok_or(CapabilityError::Unavailable)?;
        let closure = self.closure.borrow();
        let Some(callback) = closure.as_ref() else {
            return Ok(());
        };
        let id = window.request_animation_frame(callback.as_ref().unchecked_ref())?;
        self.request_id.set(Some(id));
        Ok(())
    }
}

/// Calls `on_frame` once per animation frame until it returns `false` or the
/// loop is dropped. Dropping cancels the pending frame synchronously, so no
/// callback runs afterwards.
pub struct AnimationFrameLoop {
    inner: Rc<LoopInner>,
}

impl AnimationFrameLoop {
    pub fn start<F>(mut on_frame: F) -> Result<Self, CapabilityError>
    where
        F: FnMut(f64) -> bool + 'static,
    {
        let inner = Rc::new(LoopInner {
            request_id: Cell::new(None),
            closure: RefCell::new(None),
        });

        let weak: Weak<LoopInner> = Rc::downgrade(&inner);
        let closure = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.request_id.set(None);
            if !on_frame(timestamp) {
                return;
            }
            if let Err(e) = inner.request_next() {
                log::warn!("Animation frame loop stopped: {}", e);
            }
        });
        *inner.closure.borrow_mut() = Some(closure);
        inner.request_next()?;

        Ok(Self { inner })
    }

    /// A frame is currently requested.
    pub fn is_pending(&self) -> bool {
        self.inner.request_id.get().is_some()
    }
}

impl Drop for AnimationFrameLoop {
    fn drop(&mut self) {
        if let Some(id) = self.inner.request_id.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        self.inner.closure.borrow_mut().take();
    }
}
