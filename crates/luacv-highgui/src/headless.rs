//! A window system without a display.
//!
//! Windows, trackbars and shown frames are kept in memory. Key presses and
//! trackbar moves are scripted through [`HeadlessWindows::push_key`] and
//! [`HeadlessWindows::queue_trackbar_move`] and delivered by `wait_key`,
//! which makes the event loop deterministic for tests and batch runs.

use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use luacv_core::{Image, Size};

use crate::error::WindowError;
use crate::window::{TrackbarCallback, WindowMode, WindowSystem};

struct Trackbar {
    name: String,
    value: Rc<Cell<i32>>,
    max: i32,
    on_change: TrackbarCallback,
}

impl Trackbar {
    fn move_to(&mut self, pos: i32) {
        let pos = pos.clamp(0, self.max);
        self.value.set(pos);
        (self.on_change)(pos);
    }
}

#[derive(Default)]
struct Window {
    mode: WindowMode,
    position: (i32, i32),
    size: Option<(u32, u32)>,
    frames_shown: u64,
    last_frame: Option<Size>,
    trackbars: Vec<Trackbar>,
}

/// Snapshot of a headless window, for inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowInfo {
    pub mode: WindowMode,
    pub position: (i32, i32),
    pub size: Option<(u32, u32)>,
    pub frames_shown: u64,
    pub last_frame: Option<Size>,
    pub trackbars: Vec<String>,
}

#[derive(Default)]
pub struct HeadlessWindows {
    windows: BTreeMap<String, Window>,
    keys: VecDeque<i32>,
    moves: VecDeque<(String, String, i32)>,
    sleep: bool,
}

impl HeadlessWindows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `wait_key` with a positive delay actually sleep when no key is
    /// queued. Off by default.
    pub fn with_real_delays(mut self, sleep: bool) -> Self {
        self.sleep = sleep;
        self
    }

    /// Queue a key press for a later `wait_key`.
    pub fn push_key(&mut self, key: i32) {
        self.keys.push_back(key);
    }

    /// Queue a user move of a trackbar, delivered by the next `wait_key`.
    pub fn queue_trackbar_move(&mut self, trackbar: &str, window: &str, pos: i32) {
        self.moves
            .push_back((trackbar.to_owned(), window.to_owned(), pos));
    }

    pub fn window(&self, name: &str) -> Option<WindowInfo> {
        self.windows.get(name).map(|w| WindowInfo {
            mode: w.mode,
            position: w.position,
            size: w.size,
            frames_shown: w.frames_shown,
            last_frame: w.last_frame,
            trackbars: w.trackbars.iter().map(|t| t.name.clone()).collect(),
        })
    }

    pub fn window_names(&self) -> Vec<String> {
        self.windows.keys().cloned().collect()
    }

    fn window_mut(&mut self, name: &str) -> Result<&mut Window, WindowError> {
        self.windows
            .get_mut(name)
            .ok_or_else(|| WindowError::UnknownWindow(name.to_owned()))
    }

    fn trackbar_mut(&mut self, trackbar: &str, window: &str) -> Result<&mut Trackbar, WindowError> {
        self.window_mut(window)?
            .trackbars
            .iter_mut()
            .find(|t| t.name == trackbar)
            .ok_or_else(|| WindowError::UnknownTrackbar {
                trackbar: trackbar.to_owned(),
                window: window.to_owned(),
            })
    }
}

impl WindowSystem for HeadlessWindows {
    fn named_window(&mut self, name: &str, mode: WindowMode) -> Result<(), WindowError> {
        self.windows.entry(name.to_owned()).or_insert_with(|| {
            log::debug!("window '{name}' created");
            Window {
                mode,
                ..Window::default()
            }
        });
        Ok(())
    }

    fn destroy_window(&mut self, name: &str) {
        if self.windows.remove(name).is_some() {
            log::debug!("window '{name}' destroyed");
        }
    }

    fn destroy_all_windows(&mut self) {
        self.windows.clear();
    }

    fn move_window(&mut self, name: &str, x: i32, y: i32) -> Result<(), WindowError> {
        self.window_mut(name)?.position = (x, y);
        Ok(())
    }

    fn resize_window(&mut self, name: &str, width: u32, height: u32) -> Result<(), WindowError> {
        let window = self.window_mut(name)?;
        if window.mode == WindowMode::Normal {
            window.size = Some((width, height));
        }
        Ok(())
    }

    fn show_image(&mut self, name: &str, image: &Image) -> Result<(), WindowError> {
        self.named_window(name, WindowMode::AutoSize)?;
        let window = self.window_mut(name)?;
        window.frames_shown += 1;
        window.last_frame = Some(image.size());
        if window.mode == WindowMode::AutoSize || window.size.is_none() {
            window.size = Some((image.size().width, image.size().height));
        }
        Ok(())
    }

    fn create_trackbar(
        &mut self,
        trackbar: &str,
        window: &str,
        value: Rc<Cell<i32>>,
        max: i32,
        on_change: TrackbarCallback,
    ) -> Result<(), WindowError> {
        if max < 0 {
            return Err(WindowError::InvalidRange(max));
        }
        let win = self.window_mut(window)?;
        value.set(value.get().clamp(0, max));
        let bar = Trackbar {
            name: trackbar.to_owned(),
            value,
            max,
            on_change,
        };
        match win.trackbars.iter_mut().find(|t| t.name == trackbar) {
            Some(existing) => *existing = bar,
            None => win.trackbars.push(bar),
        }
        Ok(())
    }

    fn trackbar_pos(&self, trackbar: &str, window: &str) -> Option<i32> {
        self.windows
            .get(window)?
            .trackbars
            .iter()
            .find(|t| t.name == trackbar)
            .map(|t| t.value.get())
    }

    fn set_trackbar_pos(
        &mut self,
        trackbar: &str,
        window: &str,
        pos: i32,
    ) -> Result<(), WindowError> {
        self.trackbar_mut(trackbar, window)?.move_to(pos);
        Ok(())
    }

    fn wait_key(&mut self, delay_ms: i32) -> Option<i32> {
        while let Some((trackbar, window, pos)) = self.moves.pop_front() {
            match self.trackbar_mut(&trackbar, &window) {
                Ok(bar) => bar.move_to(pos),
                Err(err) => log::debug!("dropping queued trackbar move: {err}"),
            }
        }

        if let Some(key) = self.keys.pop_front() {
            return Some(key);
        }
        if self.sleep && delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(delay_ms as u64));
        }
        None
    }
}
