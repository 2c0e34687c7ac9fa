//! Image and chessboard functions.

use std::rc::Rc;

use luacv_chessboard::{
    draw_chessboard_corners, find_chessboard_corners, find_corner_subpix, ChessboardParams,
};
use luacv_core::{convert_color, ColorConversion, Depth, Image};
use mlua::{IntoLuaMulti, Lua, LuaSerdeExt, MultiValue, Table, Value};
use serde::Deserialize;

use crate::args::{to_array, to_criteria, to_option, to_size};
use crate::context::Context;
use crate::error::BindingError;
use crate::handle::{read_image, unwrap, write_image, CornersHandle, ImageHandle};

/// Per-call detector settings; unset fields keep the configured values.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChessboardOverrides {
    #[serde(default)]
    ring_radius: Option<f32>,
    #[serde(default)]
    threshold_rel: Option<f32>,
    #[serde(default)]
    nms_radius: Option<u32>,
    #[serde(default)]
    spacing_tolerance: Option<f32>,
    #[serde(default)]
    orientation_tolerance_deg: Option<f32>,
    #[serde(default)]
    min_spacing_pix: Option<f32>,
}

impl ChessboardOverrides {
    fn apply(self, params: &mut ChessboardParams) {
        if let Some(ring_radius) = self.ring_radius {
            params.ring_radius = ring_radius;
        }
        if let Some(threshold_rel) = self.threshold_rel {
            params.threshold_rel = threshold_rel;
        }
        if let Some(nms_radius) = self.nms_radius {
            params.nms_radius = nms_radius;
        }
        if let Some(spacing_tolerance) = self.spacing_tolerance {
            params.spacing_tolerance = spacing_tolerance;
        }
        if let Some(orientation_tolerance_deg) = self.orientation_tolerance_deg {
            params.orientation_tolerance_deg = orientation_tolerance_deg;
        }
        if let Some(min_spacing_pix) = self.min_spacing_pix {
            params.min_spacing_pix = min_spacing_pix;
        }
    }
}

fn create_image<'lua>(
    _: &'lua Lua,
    (size, depth, channels): (Value<'lua>, Option<String>, Option<i64>),
) -> mlua::Result<ImageHandle> {
    const FN: &str = "CreateImage";
    let size = to_size(&size, FN, 1)?;
    let depth = to_option(depth.as_deref(), Some(Depth::U8), FN, 2)?;
    let channels = channels.unwrap_or(3);
    let channels = usize::try_from(channels)
        .ok()
        .filter(|c| (1..=4).contains(c))
        .ok_or_else(|| {
            BindingError::invalid(FN, 3, format!("channels must be 1..4, got {channels}"))
        })?;
    let image = Image::new(size, depth, channels).map_err(BindingError::from)?;
    Ok(ImageHandle::owned(image))
}

fn cvt_color<'lua>(
    _: &'lua Lua,
    (src, dst, code): (Value<'lua>, Value<'lua>, Option<String>),
) -> mlua::Result<()> {
    const FN: &str = "CvtColor";
    let src = to_array(&src, FN, 1)?;
    let dst = to_array(&dst, FN, 2)?;
    let code = to_option::<ColorConversion>(code.as_deref(), None, FN, 3)?;

    let result = if Rc::ptr_eq(&src, &dst) {
        let copy = read_image(&src)?.clone();
        convert_color(&copy, &mut *write_image(&dst)?, code)
    } else {
        convert_color(&*read_image(&src)?, &mut *write_image(&dst)?, code)
    };
    result.map_err(BindingError::from)?;
    Ok(())
}

fn get_size<'lua>(lua: &'lua Lua, arr: Value<'lua>) -> mlua::Result<Table<'lua>> {
    let image = to_array(&arr, "GetSize", 1)?;
    let size = read_image(&image)?.size();
    lua.create_sequence_from([size.width, size.height])
}

fn find_chessboard<'lua>(
    ctx: &Context,
    lua: &'lua Lua,
    (image, size, overrides): (Value<'lua>, Value<'lua>, Value<'lua>),
) -> mlua::Result<MultiValue<'lua>> {
    const FN: &str = "FindChessboardCorners";
    let image = to_array(&image, FN, 1)?;
    let pattern = to_size(&size, FN, 2)?;

    let mut params = ctx.config.chessboard.clone();
    if !overrides.is_nil() {
        let overrides: ChessboardOverrides = lua
            .from_value(overrides)
            .map_err(|err| BindingError::invalid(FN, 3, err))?;
        overrides.apply(&mut params);
    }

    let found = find_chessboard_corners(&*read_image(&image)?, pattern, &params)
        .map_err(|err| BindingError::invalid(FN, 2, err))?;
    match found {
        Some(points) => {
            let count = points.len();
            (CornersHandle::new(points, pattern), count).into_lua_multi(lua)
        }
        None => Value::Nil.into_lua_multi(lua),
    }
}

fn find_corner_sub_pix<'lua>(
    _: &'lua Lua,
    (image, corners, winsize, criteria): (Value<'lua>, Value<'lua>, i64, Value<'lua>),
) -> mlua::Result<()> {
    const FN: &str = "FindCornerSubPix";
    let image = to_array(&image, FN, 1)?;
    let corners = unwrap::<CornersHandle>(&corners)?;
    let criteria = to_criteria(&criteria, FN, 4)?;

    let image = read_image(&image)?;
    find_corner_subpix(&image, &mut *corners.points_mut()?, winsize, criteria)
        .map_err(|err| BindingError::invalid(FN, 3, err))?;
    Ok(())
}

fn draw_chessboard<'lua>(
    _: &'lua Lua,
    (image, size, corners): (Value<'lua>, Value<'lua>, Value<'lua>),
) -> mlua::Result<()> {
    const FN: &str = "DrawChessboardCorners";
    let image = unwrap::<ImageHandle>(&image)?;
    let pattern = to_size(&size, FN, 2)?;
    let corners = unwrap::<CornersHandle>(&corners)?;

    draw_chessboard_corners(
        &mut *write_image(image.image())?,
        pattern,
        &*corners.points()?,
    );
    Ok(())
}

pub(crate) fn register(lua: &Lua, module: &Table, ctx: &Rc<Context>) -> mlua::Result<()> {
    module.set("CreateImage", lua.create_function(create_image)?)?;
    module.set("CvtColor", lua.create_function(cvt_color)?)?;
    module.set("GetSize", lua.create_function(get_size)?)?;

    let detector = Rc::clone(ctx);
    module.set(
        "FindChessboardCorners",
        lua.create_function(move |lua, args| find_chessboard(&detector, lua, args))?,
    )?;
    module.set("FindCornerSubPix", lua.create_function(find_corner_sub_pix)?)?;
    module.set(
        "DrawChessboardCorners",
        lua.create_function(draw_chessboard)?,
    )?;
    Ok(())
}
