//! Image files and capture devices.

use std::rc::Rc;

use luacv_core::{load_image, save_image, LoadMode, NamedOption};
use luacv_highgui::{Capture, CaptureError, CaptureProperty};
use mlua::{Lua, MetaMethod, Table, UserData, UserDataFields, UserDataMethods, Value};

use crate::args::{to_array, to_i32};
use crate::context::Context;
use crate::error::BindingError;
use crate::handle::{read_image, CaptureHandle, HandleKind, ImageHandle};

fn load(_: &Lua, (path, iscolor): (String, Option<i64>)) -> mlua::Result<Option<ImageHandle>> {
    let mode = LoadMode::from_flag(iscolor.unwrap_or(1));
    match load_image(&path, mode) {
        Ok(image) => Ok(Some(ImageHandle::owned(image))),
        Err(err) => {
            log::debug!("LoadImage('{path}'): {err}");
            Ok(None)
        }
    }
}

fn save<'lua>(_: &'lua Lua, (path, image): (String, Value<'lua>)) -> mlua::Result<bool> {
    let image = to_array(&image, "SaveImage", 2)?;
    save_image(&path, &*read_image(&image)?).map_err(BindingError::from)?;
    Ok(true)
}

fn opened(what: &str, capture: Result<Capture, CaptureError>) -> Option<CaptureHandle> {
    match capture {
        Ok(capture) => Some(CaptureHandle::new(capture)),
        Err(err) => {
            log::debug!("{what}: {err}");
            None
        }
    }
}

pub(crate) fn register(lua: &Lua, module: &Table, ctx: &Rc<Context>) -> mlua::Result<()> {
    module.set("LoadImage", lua.create_function(load)?)?;
    module.set("SaveImage", lua.create_function(save)?)?;

    let cameras = Rc::clone(ctx);
    module.set(
        "CaptureFromCAM",
        lua.create_function(move |_, index: Option<i64>| {
            let index = to_i32(index.unwrap_or(-1), "CaptureFromCAM", 1)?;
            Ok(opened(
                &format!("CaptureFromCAM({index})"),
                (cameras.open_camera)(index),
            ))
        })?,
    )?;
    module.set(
        "CaptureFromFile",
        lua.create_function(|_, path: String| {
            Ok(opened(
                &format!("CaptureFromFile('{path}')"),
                Capture::from_file(&path),
            ))
        })?,
    )?;
    Ok(())
}

fn property(key: &str, function: &'static str) -> Result<CaptureProperty, BindingError> {
    CaptureProperty::from_name(key).map_err(|err| BindingError::invalid(function, 2, err))
}

impl UserData for CaptureHandle {
    fn add_fields<'lua, F: UserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_meta_field(MetaMethod::Type, HandleKind::Capture.name());
    }

    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("GrabFrame", |_, this, ()| {
            Ok(this.device().capture()?.grab())
        });

        // Frames alias the device buffer and are borrowed from the device.
        methods.add_method("QueryFrame", |_, this, ()| {
            let frame = this.device().capture()?.query();
            Ok(frame.map(|frame| ImageHandle::borrowed(frame, Rc::clone(this.device()))))
        });

        methods.add_method("RetrieveFrame", |_, this, ()| {
            let frame = this.device().capture()?.retrieve();
            Ok(frame.map(|frame| ImageHandle::borrowed(frame, Rc::clone(this.device()))))
        });

        // Methods win; any other key is a property name.
        methods.add_meta_method(MetaMethod::Index, |_, this, key: String| {
            let prop = property(&key, "__index")?;
            Ok(this.device().capture()?.get(prop))
        });

        methods.add_meta_method(MetaMethod::NewIndex, |_, this, (key, value): (String, f64)| {
            let prop = property(&key, "__newindex")?;
            this.device().capture()?.set(prop, value);
            Ok(())
        });

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!(
                "{}({})",
                HandleKind::Capture.name(),
                this.device().capture()?.describe()
            ))
        });
    }
}
