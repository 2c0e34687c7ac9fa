//! Conversions from Lua arguments to native values.

use std::cell::RefCell;
use std::rc::Rc;

use luacv_core::{Depth, Image, NamedOption, Size, TermCriteria};
use mlua::{Table, Value};

use crate::error::BindingError;
use crate::handle::{unwrap, ImageHandle};

/// `{w, h}` with both entries positive integers.
pub(crate) fn to_size(
    value: &Value<'_>,
    function: &'static str,
    position: usize,
) -> Result<Size, BindingError> {
    let Value::Table(table) = value else {
        return Err(BindingError::invalid(
            function,
            position,
            format!("table {{w, h}} expected, got {}", value.type_name()),
        ));
    };
    let side = |index: i64| -> Result<u32, BindingError> {
        let raw: Value = table
            .raw_get(index)
            .map_err(|err| BindingError::invalid(function, position, err))?;
        let n = integer(&raw).ok_or_else(|| {
            BindingError::invalid(
                function,
                position,
                format!("size entry {index} must be an integer, got {}", raw.type_name()),
            )
        })?;
        u32::try_from(n).ok().filter(|&n| n > 0).ok_or_else(|| {
            BindingError::invalid(
                function,
                position,
                format!("size entry {index} must be positive, got {n}"),
            )
        })
    };
    Ok(Size::new(side(1)?, side(2)?))
}

fn integer(value: &Value<'_>) -> Option<i64> {
    match *value {
        Value::Integer(i) => Some(i),
        Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Some(n as i64),
        _ => None,
    }
}

fn number(value: &Value<'_>) -> Option<f64> {
    match *value {
        Value::Integer(i) => Some(i as f64),
        Value::Number(n) => Some(n),
        _ => None,
    }
}

/// Look up a named option, falling back to `default` when the argument is
/// absent.
pub(crate) fn to_option<T: NamedOption>(
    name: Option<&str>,
    default: Option<T>,
    function: &'static str,
    position: usize,
) -> Result<T, BindingError> {
    match (name, default) {
        (Some(name), _) => {
            T::from_name(name).map_err(|err| BindingError::invalid(function, position, err))
        }
        (None, Some(default)) => Ok(default),
        (None, None) => Err(BindingError::invalid(
            function,
            position,
            format!("{} expected, got no value", T::KIND),
        )),
    }
}

/// An array argument: an image handle, or a table of rows of numbers read
/// as a single channel `64f` matrix.
pub(crate) fn to_array(
    value: &Value<'_>,
    function: &'static str,
    position: usize,
) -> Result<Rc<RefCell<Image>>, BindingError> {
    match value {
        Value::Table(rows) => {
            let matrix = matrix_from_rows(rows, function, position)?;
            Ok(Rc::new(RefCell::new(matrix)))
        }
        _ => Ok(Rc::clone(unwrap::<ImageHandle>(value)?.image())),
    }
}

fn matrix_from_rows(
    rows: &Table<'_>,
    function: &'static str,
    position: usize,
) -> Result<Image, BindingError> {
    let bad = |message: String| BindingError::invalid(function, position, message);

    let height = rows.raw_len();
    if height == 0 {
        return Err(bad("matrix has no rows".to_owned()));
    }
    let mut values = Vec::new();
    let mut width = 0;
    for r in 1..=height {
        let row: Value = rows.raw_get(r).map_err(|err| bad(err.to_string()))?;
        let Value::Table(row) = row else {
            return Err(bad(format!("row {r} must be a table, got {}", row.type_name())));
        };
        let len = row.raw_len();
        if r == 1 {
            width = len;
        }
        if len == 0 || len != width {
            return Err(bad(format!("row {r} has {len} entries, expected {width}")));
        }
        for c in 1..=len {
            let entry: Value = row.raw_get(c).map_err(|err| bad(err.to_string()))?;
            let entry = number(&entry).ok_or_else(|| {
                bad(format!(
                    "entry ({r}, {c}) must be a number, got {}",
                    entry.type_name()
                ))
            })?;
            values.push(entry);
        }
    }

    let size = Size::new(
        u32::try_from(width).map_err(|_| bad("matrix is too wide".to_owned()))?,
        u32::try_from(height).map_err(|_| bad("matrix is too tall".to_owned()))?,
    );
    let data = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
    Ok(Image::from_raw(size, Depth::F64, 1, data)?)
}

/// `{eps = number, iter = integer}`; either may be missing.
pub(crate) fn to_criteria(
    value: &Value<'_>,
    function: &'static str,
    position: usize,
) -> Result<TermCriteria, BindingError> {
    let table = match value {
        Value::Nil => return Ok(TermCriteria::default()),
        Value::Table(table) => table,
        other => {
            return Err(BindingError::invalid(
                function,
                position,
                format!("criteria table expected, got {}", other.type_name()),
            ))
        }
    };
    let field = |name: &str| {
        table
            .raw_get::<_, Value>(name)
            .map_err(|err| BindingError::invalid(function, position, err))
    };

    let epsilon = match field("eps")? {
        Value::Nil => None,
        v => Some(number(&v).ok_or_else(|| {
            BindingError::invalid(
                function,
                position,
                format!("eps must be a number, got {}", v.type_name()),
            )
        })?),
    };
    let max_iter = match field("iter")? {
        Value::Nil => None,
        v => {
            let n = integer(&v).ok_or_else(|| {
                BindingError::invalid(
                    function,
                    position,
                    format!("iter must be an integer, got {}", v.type_name()),
                )
            })?;
            Some(u32::try_from(n.max(0)).unwrap_or(u32::MAX))
        }
    };
    Ok(TermCriteria::new(max_iter, epsilon))
}

/// A script integer that must fit an `i32`.
pub(crate) fn to_i32(
    value: i64,
    function: &'static str,
    position: usize,
) -> Result<i32, BindingError> {
    i32::try_from(value)
        .map_err(|_| BindingError::invalid(function, position, format!("{value} is out of range")))
}
