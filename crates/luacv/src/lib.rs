//! Lua bindings for the `luacv` image processing crates.
//!
//! [`open`] builds the `luacv` module table for a Lua state:
//!
//! ```
//! # fn main() -> mlua::Result<()> {
//! let lua = mlua::Lua::new();
//! let cv = luacv::open(&lua)?;
//! lua.globals().set("luacv", cv)?;
//! lua.load(
//!     r#"
//!     local img = luacv.CreateImage({64, 48}, "8u", 1)
//!     local size = luacv.GetSize(img)
//!     assert(size[1] == 64 and size[2] == 48)
//! "#,
//! )
//! .exec()?;
//! # Ok(())
//! # }
//! ```
//!
//! Native resources reach Lua as handles (`lcvImage`, `lcvCapture`,
//! `lcvCorners`) freed by the garbage collector. Frames returned by a
//! capture are borrowed from it and stay valid while any handle to the
//! capture or its frames is alive. "No result" outcomes (no board, an
//! unreadable file, no frame, no key) are `nil`; everything else that goes
//! wrong is a Lua error carrying a [`BindingError`].
//!
//! With the `module` feature the crate builds `luaopen_luacv` for
//! `require "luacv"` from a stock Lua 5.4 interpreter.

mod args;
mod config;
mod context;
mod cv;
mod error;
mod handle;
mod highgui;
mod trackbar;
mod video;

use std::rc::Rc;

use mlua::{Lua, Table};

pub use config::{Config, ConfigError, CONFIG_ENV};
pub use context::{CameraOpener, Options};
pub use error::{binding_error, BindingError};
pub use handle::{released, CaptureHandle, CornersHandle, HandleKind, ImageHandle};
pub use trackbar::DEFAULT_CAPACITY;

/// Build the `luacv` module table with the default [`Options`].
pub fn open(lua: &Lua) -> mlua::Result<Table<'_>> {
    open_with(lua, Options::default())
}

/// Build the `luacv` module table.
///
/// Each call gets its own trackbar table; windows are shared with whatever
/// else holds `options.windows`.
pub fn open_with(lua: &Lua, options: Options) -> mlua::Result<Table<'_>> {
    let ctx = Rc::new(context::Context::new(options));
    let module = lua.create_table()?;

    cv::register(lua, &module, &ctx)?;
    video::register(lua, &module, &ctx)?;
    highgui::register(lua, &module, &ctx)?;

    module.set("_VERSION", format!("luacv {}", env!("CARGO_PKG_VERSION")))?;
    module.set("TRACKBAR_CAPACITY", ctx.trackbars.capacity())?;
    log::debug!(
        "luacv {} opened ({} trackbar slots)",
        env!("CARGO_PKG_VERSION"),
        ctx.trackbars.capacity()
    );
    Ok(module)
}

/// Entry point for `require "luacv"`; settings come from `LUACV_CONFIG`.
#[cfg(feature = "module")]
#[mlua::lua_module]
fn luacv(lua: &Lua) -> mlua::Result<Table> {
    let config = Config::from_env().map_err(mlua::Error::external)?;
    open_with(lua, Options::new(config))
}
