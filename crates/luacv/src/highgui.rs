//! Windows, trackbars and the key loop.

use std::rc::Rc;

use luacv_highgui::WindowMode;
use mlua::{Function, IntoLuaMulti, Lua, MultiValue, Table, Value};

use crate::args::{to_i32, to_option};
use crate::context::Context;
use crate::error::BindingError;
use crate::handle::{read_image, unwrap, ImageHandle};
use crate::trackbar::TrackbarSpec;

fn dimension(value: i64, function: &'static str, position: usize) -> Result<u32, BindingError> {
    u32::try_from(value)
        .map_err(|_| BindingError::invalid(function, position, format!("{value} is out of range")))
}

fn create_trackbar<'lua>(
    ctx: &Context,
    lua: &'lua Lua,
    (name, window, value, max, callback): (String, String, i64, i64, Function<'lua>),
) -> mlua::Result<MultiValue<'lua>> {
    const FN: &str = "CreateTrackbar";
    let spec = TrackbarSpec {
        name: &name,
        window: &window,
        value: to_i32(value, FN, 3)?,
        max: to_i32(max, FN, 4)?,
    };
    let slot = ctx
        .trackbars
        .register(lua, &mut *ctx.windows()?, spec, callback)?;
    ctx.trackbars.dispatch(lua)?;
    (slot, ctx.trackbars.value(slot)).into_lua_multi(lua)
}

fn wait_key<'lua>(
    ctx: &Context,
    lua: &'lua Lua,
    delay: Option<i64>,
) -> mlua::Result<MultiValue<'lua>> {
    let delay = to_i32(delay.unwrap_or(0), "WaitKey", 1)?;
    let key = ctx.windows()?.wait_key(delay);
    ctx.trackbars.dispatch(lua)?;
    match key {
        Some(key) => (key & 0xFFFF, key >> 16).into_lua_multi(lua),
        None => Value::Nil.into_lua_multi(lua),
    }
}

pub(crate) fn register(lua: &Lua, module: &Table, ctx: &Rc<Context>) -> mlua::Result<()> {
    let c = Rc::clone(ctx);
    module.set(
        "NamedWindow",
        lua.create_function(move |_, (name, mode): (String, Option<String>)| {
            let mode = to_option(mode.as_deref(), Some(WindowMode::AutoSize), "NamedWindow", 2)?;
            c.windows()?
                .named_window(&name, mode)
                .map_err(BindingError::from)?;
            Ok(())
        })?,
    )?;

    let c = Rc::clone(ctx);
    module.set(
        "DestroyWindow",
        lua.create_function(move |_, name: String| {
            c.windows()?.destroy_window(&name);
            Ok(())
        })?,
    )?;

    let c = Rc::clone(ctx);
    module.set(
        "DestroyAllWindows",
        lua.create_function(move |_, ()| {
            c.windows()?.destroy_all_windows();
            Ok(())
        })?,
    )?;

    let c = Rc::clone(ctx);
    module.set(
        "MoveWindow",
        lua.create_function(move |_, (name, x, y): (String, i64, i64)| {
            let (x, y) = (to_i32(x, "MoveWindow", 2)?, to_i32(y, "MoveWindow", 3)?);
            c.windows()?
                .move_window(&name, x, y)
                .map_err(BindingError::from)?;
            Ok(())
        })?,
    )?;

    let c = Rc::clone(ctx);
    module.set(
        "ResizeWindow",
        lua.create_function(move |_, (name, width, height): (String, i64, i64)| {
            let width = dimension(width, "ResizeWindow", 2)?;
            let height = dimension(height, "ResizeWindow", 3)?;
            c.windows()?
                .resize_window(&name, width, height)
                .map_err(BindingError::from)?;
            Ok(())
        })?,
    )?;

    let c = Rc::clone(ctx);
    module.set(
        "ShowImage",
        lua.create_function(move |_, (name, image): (String, Value)| {
            let image = unwrap::<ImageHandle>(&image)?;
            let image = read_image(image.image())?;
            c.windows()?
                .show_image(&name, &image)
                .map_err(BindingError::from)?;
            Ok(())
        })?,
    )?;

    let c = Rc::clone(ctx);
    module.set(
        "CreateTrackbar",
        lua.create_function(move |lua, args| create_trackbar(&c, lua, args))?,
    )?;

    let c = Rc::clone(ctx);
    module.set(
        "GetTrackbarPos",
        lua.create_function(move |_, (name, window): (String, String)| {
            Ok(c.windows()?.trackbar_pos(&name, &window))
        })?,
    )?;

    let c = Rc::clone(ctx);
    module.set(
        "SetTrackbarPos",
        lua.create_function(move |lua, (name, window, pos): (String, String, i64)| {
            let pos = to_i32(pos, "SetTrackbarPos", 3)?;
            c.windows()?
                .set_trackbar_pos(&name, &window, pos)
                .map_err(BindingError::from)?;
            c.trackbars.dispatch(lua)
        })?,
    )?;

    let c = Rc::clone(ctx);
    module.set(
        "WaitKey",
        lua.create_function(move |lua, delay| wait_key(&c, lua, delay))?,
    )?;

    module.set(
        "ConvertImage",
        lua.create_function(|_, _: MultiValue| {
            Err::<(), _>(BindingError::NotYetImplemented("ConvertImage").into())
        })?,
    )?;
    module.set(
        "SetMouseCallback",
        lua.create_function(|_, _: MultiValue| {
            Err::<(), _>(BindingError::NotYetImplemented("SetMouseCallback").into())
        })?,
    )?;
    Ok(())
}
