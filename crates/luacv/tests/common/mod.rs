#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use luacv::{Config, Options};
use luacv_core::{save_image, Depth, Image, Size};
use luacv_highgui::HeadlessWindows;
use mlua::Lua;

/// A Lua state with `luacv` loaded as a global, plus the headless window
/// system behind it.
pub fn lua_with(config: Config) -> (Lua, Rc<RefCell<HeadlessWindows>>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let windows = Rc::new(RefCell::new(HeadlessWindows::new()));
    let lua = Lua::new();
    let options = Options::new(config).with_windows(windows.clone());
    let module = luacv::open_with(&lua, options).unwrap();
    lua.globals().set("luacv", module).unwrap();
    (lua, windows)
}

pub fn lua() -> Lua {
    lua_with(Config::default()).0
}

/// Make a Rust string visible to scripts as a global.
pub fn set_path(lua: &Lua, name: &str, path: &Path) {
    lua.globals()
        .set(name, path.to_string_lossy().into_owned())
        .unwrap();
}

pub const SQUARE: f64 = 18.0;
pub const ORIGIN: (f64, f64) = (30.4, 25.7);

/// Image position of inner corner `(i, j)` of [`render_board`].
pub fn board_corner(i: usize, j: usize) -> (f64, f64) {
    (
        ORIGIN.0 + (i + 1) as f64 * SQUARE,
        ORIGIN.1 + (j + 1) as f64 * SQUARE,
    )
}

/// Axis-aligned board with `pattern` inner corners, 4x4 supersampled.
pub fn render_board(pattern: Size, width: u32, height: u32) -> Image {
    let squares = (pattern.width as i64 + 1, pattern.height as i64 + 1);
    let is_dark = |x: f64, y: f64| {
        let i = ((x - ORIGIN.0) / SQUARE).floor() as i64;
        let j = ((y - ORIGIN.1) / SQUARE).floor() as i64;
        (0..squares.0).contains(&i) && (0..squares.1).contains(&j) && (i + j) % 2 == 0
    };

    let mut img = Image::new(Size::new(width, height), Depth::U8, 3).unwrap();
    const SS: usize = 4;
    for y in 0..height as usize {
        for x in 0..width as usize {
            let mut light = 0usize;
            for sy in 0..SS {
                for sx in 0..SS {
                    let fx = x as f64 + (sx as f64 + 0.5) / SS as f64 - 0.5;
                    let fy = y as f64 + (sy as f64 + 0.5) / SS as f64 - 0.5;
                    if !is_dark(fx, fy) {
                        light += 1;
                    }
                }
            }
            let v = 20.0 + 215.0 * light as f64 / (SS * SS) as f64;
            for c in 0..3 {
                img.set(x, y, c, v);
            }
        }
    }
    img
}

pub fn write_board(path: &Path, pattern: Size) {
    save_image(path, &render_board(pattern, 210, 160)).unwrap();
}

/// Write `count` small frames whose first sample is `10 * k`.
pub fn write_frames(dir: &Path, count: usize) {
    for k in 0..count {
        let mut img = Image::new(Size::new(8, 6), Depth::U8, 3).unwrap();
        img.fill(&[10.0 * k as f64, 0.0, 0.0]);
        save_image(dir.join(format!("frame_{k:03}.png")), &img).unwrap();
    }
}
