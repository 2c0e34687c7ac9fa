//! Trackbar callbacks.
//!
//! The window system calls a trackbar callback with nothing but the new
//! position. Each registered trackbar therefore gets its own slot and a
//! trampoline that captures the slot index. Trampolines only queue
//! `(slot, position)` events; [`TrackbarTable::dispatch`] runs the Lua
//! closures after the window system call has returned, so a closure may
//! call back into the window system.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use luacv_highgui::{TrackbarCallback, WindowSystem};
use mlua::{Function, Lua, RegistryKey};

use crate::error::BindingError;

/// Default number of trackbar slots.
pub const DEFAULT_CAPACITY: usize = 24;

struct Slot {
    callback: RegistryKey,
    value: Rc<Cell<i32>>,
}

/// Bounded table of trackbar callbacks; slots are numbered from 1 and never
/// reused.
pub(crate) struct TrackbarTable {
    capacity: usize,
    slots: RefCell<Vec<Slot>>,
    pending: Rc<RefCell<VecDeque<(usize, i32)>>>,
}

/// Arguments of `CreateTrackbar`.
pub(crate) struct TrackbarSpec<'a> {
    pub name: &'a str,
    pub window: &'a str,
    pub value: i32,
    pub max: i32,
}

impl TrackbarTable {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: RefCell::new(Vec::new()),
            pending: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bind `callback` to a new trackbar and return its slot.
    ///
    /// The slot is only consumed when the window system accepts the
    /// trackbar.
    pub(crate) fn register(
        &self,
        lua: &Lua,
        windows: &mut dyn WindowSystem,
        spec: TrackbarSpec<'_>,
        callback: Function<'_>,
    ) -> Result<usize, mlua::Error> {
        let slot = self.slots.borrow().len() + 1;
        if slot > self.capacity {
            return Err(BindingError::CapacityExceeded {
                capacity: self.capacity,
            }
            .into());
        }

        // The window system must never hold a trampoline for an unfilled slot.
        let callback = lua.create_registry_value(callback)?;
        let value = Rc::new(Cell::new(spec.value));
        let pending = Rc::clone(&self.pending);
        let trampoline: TrackbarCallback =
            Box::new(move |pos| pending.borrow_mut().push_back((slot, pos)));
        windows
            .create_trackbar(spec.name, spec.window, Rc::clone(&value), spec.max, trampoline)
            .map_err(BindingError::from)?;

        self.slots.borrow_mut().push(Slot { callback, value });
        log::debug!(
            "trackbar '{}' in '{}' bound to slot {slot}/{}",
            spec.name,
            spec.window,
            self.capacity
        );
        Ok(slot)
    }

    /// Last position the window system reported for `slot`.
    pub(crate) fn value(&self, slot: usize) -> Option<i32> {
        let slots = self.slots.borrow();
        slots.get(slot.checked_sub(1)?).map(|s| s.value.get())
    }

    /// Run the closures of all queued trackbar events, oldest first.
    ///
    /// Events for slots that were never committed are dropped. An error
    /// raised by a closure stops dispatch and leaves later events queued.
    pub(crate) fn dispatch(&self, lua: &Lua) -> Result<(), mlua::Error> {
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some((slot, pos)) = next else {
                return Ok(());
            };
            let callback: Option<Function> = {
                let slots = self.slots.borrow();
                match slots.get(slot - 1) {
                    Some(s) => Some(lua.registry_value(&s.callback)?),
                    None => None,
                }
            };
            match callback {
                Some(callback) => {
                    log::trace!("trackbar slot {slot} -> {pos}");
                    callback.call::<_, ()>(pos)?;
                }
                None => log::trace!("dropping event for unbound trackbar slot {slot}"),
            }
        }
    }
}
