use std::cell::Cell;
use std::rc::Rc;

use luacv_core::{Image, NamedOption};

use crate::error::WindowError;

/// Called with the new position whenever a trackbar moves.
///
/// The callback only sees the value; anything else it needs must be
/// captured when it is created.
pub type TrackbarCallback = Box<dyn FnMut(i32)>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WindowMode {
    /// The window follows the size of the image shown in it.
    #[default]
    AutoSize,
    /// The window can be resized freely.
    Normal,
}

impl NamedOption for WindowMode {
    const KIND: &'static str = "window mode";
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("autosize", WindowMode::AutoSize),
        ("normal", WindowMode::Normal),
    ];
}

/// Native windows, trackbars and the keyboard event loop.
///
/// Implementations are single-threaded and own every trackbar callback
/// handed to them. Callbacks run synchronously from
/// [`set_trackbar_pos`](WindowSystem::set_trackbar_pos) and
/// [`wait_key`](WindowSystem::wait_key).
pub trait WindowSystem {
    fn named_window(&mut self, name: &str, mode: WindowMode) -> Result<(), WindowError>;

    /// Unknown names are ignored.
    fn destroy_window(&mut self, name: &str);

    fn destroy_all_windows(&mut self);

    fn move_window(&mut self, name: &str, x: i32, y: i32) -> Result<(), WindowError>;

    fn resize_window(&mut self, name: &str, width: u32, height: u32) -> Result<(), WindowError>;

    /// Show `image`, creating the window if needed.
    fn show_image(&mut self, name: &str, image: &Image) -> Result<(), WindowError>;

    /// Attach a trackbar to an existing window.
    ///
    /// `value` is the trackbar position; the window system writes every
    /// move into it before calling `on_change`.
    fn create_trackbar(
        &mut self,
        trackbar: &str,
        window: &str,
        value: Rc<Cell<i32>>,
        max: i32,
        on_change: TrackbarCallback,
    ) -> Result<(), WindowError>;

    fn trackbar_pos(&self, trackbar: &str, window: &str) -> Option<i32>;

    /// Move a trackbar (clamped to its range) and notify its callback.
    fn set_trackbar_pos(&mut self, trackbar: &str, window: &str, pos: i32)
        -> Result<(), WindowError>;

    /// Run the event loop for up to `delay_ms` milliseconds (forever when
    /// `delay_ms <= 0`) and return the next key pressed.
    fn wait_key(&mut self, delay_ms: i32) -> Option<i32>;
}
