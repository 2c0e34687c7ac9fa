//! Lua handles around native images, captures and corner arrays.
//!
//! An image handle either owns its pixels or borrows the frame buffer of a
//! capture device. A borrowed handle keeps the device alive and never frees
//! the frame; only the device does, when its last handle is collected.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use luacv_core::{Image, Size};
use luacv_highgui::Capture;
use mlua::{AnyUserData, MetaMethod, UserData, UserDataFields, UserDataMethods, Value};
use nalgebra::Point2;

use crate::error::BindingError;

/// The resource kinds scripts can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Image,
    Capture,
    Corners,
}

impl HandleKind {
    /// Metatable name (`__name`) of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            HandleKind::Image => "lcvImage",
            HandleKind::Capture => "lcvCapture",
            HandleKind::Corners => "lcvCorners",
        }
    }
}

thread_local! {
    static RELEASED: [Cell<usize>; 3] = const { [Cell::new(0), Cell::new(0), Cell::new(0)] };
}

fn slot(kind: HandleKind) -> usize {
    match kind {
        HandleKind::Image => 0,
        HandleKind::Capture => 1,
        HandleKind::Corners => 2,
    }
}

fn record_release(kind: HandleKind) {
    RELEASED.with(|counters| {
        let counter = &counters[slot(kind)];
        counter.set(counter.get() + 1);
    });
    log::trace!("released {}", kind.name());
}

/// Number of native resources of `kind` released on this thread.
///
/// Borrowed frames are not counted; they are released with their device.
pub fn released(kind: HandleKind) -> usize {
    RELEASED.with(|counters| counters[slot(kind)].get())
}

/// A handle type that can be recovered from a Lua value.
pub(crate) trait Handle: UserData + 'static {
    const KIND: HandleKind;
}

fn kind_of(ud: &AnyUserData) -> Option<HandleKind> {
    if ud.is::<ImageHandle>() {
        Some(HandleKind::Image)
    } else if ud.is::<CaptureHandle>() {
        Some(HandleKind::Capture)
    } else if ud.is::<CornersHandle>() {
        Some(HandleKind::Corners)
    } else {
        None
    }
}

/// Borrow the handle of type `T` behind `value`.
///
/// A handle of another kind is a `TypeMismatch`; any other value is an
/// `InvalidHandle`.
pub(crate) fn unwrap<'a, T: Handle>(value: &'a Value<'_>) -> Result<Ref<'a, T>, BindingError> {
    let expected = T::KIND.name();
    let Value::UserData(ud) = value else {
        return Err(BindingError::InvalidHandle {
            expected,
            got: value.type_name(),
        });
    };
    match kind_of(ud) {
        Some(kind) if kind == T::KIND => ud
            .borrow::<T>()
            .map_err(|err| BindingError::Native(err.to_string())),
        Some(kind) => Err(BindingError::TypeMismatch {
            expected,
            found: kind.name(),
        }),
        None => Err(BindingError::InvalidHandle {
            expected,
            got: "userdata",
        }),
    }
}

pub(crate) fn read_image(image: &RefCell<Image>) -> Result<Ref<'_, Image>, BindingError> {
    image
        .try_borrow()
        .map_err(|_| BindingError::Native("image is busy".to_owned()))
}

pub(crate) fn write_image(image: &RefCell<Image>) -> Result<RefMut<'_, Image>, BindingError> {
    image
        .try_borrow_mut()
        .map_err(|_| BindingError::Native("image is busy".to_owned()))
}

/// A capture device shared by its handle and the frames borrowed from it.
pub(crate) struct SharedCapture {
    capture: RefCell<Capture>,
}

impl SharedCapture {
    pub(crate) fn capture(&self) -> Result<RefMut<'_, Capture>, BindingError> {
        self.capture
            .try_borrow_mut()
            .map_err(|_| BindingError::Native("capture device is busy".to_owned()))
    }
}

impl Drop for SharedCapture {
    fn drop(&mut self) {
        record_release(HandleKind::Capture);
    }
}

pub(crate) enum Ownership {
    Owned(Rc<RefCell<Image>>),
    Borrowed {
        frame: Rc<RefCell<Image>>,
        owner: Rc<SharedCapture>,
    },
}

pub struct ImageHandle {
    ownership: Ownership,
}

impl ImageHandle {
    pub(crate) fn owned(image: Image) -> Self {
        Self {
            ownership: Ownership::Owned(Rc::new(RefCell::new(image))),
        }
    }

    pub(crate) fn borrowed(frame: Rc<RefCell<Image>>, owner: Rc<SharedCapture>) -> Self {
        Self {
            ownership: Ownership::Borrowed { frame, owner },
        }
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self.ownership, Ownership::Borrowed { .. })
    }

    pub(crate) fn image(&self) -> &Rc<RefCell<Image>> {
        match &self.ownership {
            Ownership::Owned(image) => image,
            Ownership::Borrowed { frame, .. } => frame,
        }
    }
}

impl Handle for ImageHandle {
    const KIND: HandleKind = HandleKind::Image;
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        if let Ownership::Owned(_) = self.ownership {
            record_release(HandleKind::Image);
        }
    }
}

impl UserData for ImageHandle {
    fn add_fields<'lua, F: UserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_meta_field(MetaMethod::Type, HandleKind::Image.name());
    }

    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            let image = read_image(this.image())?;
            Ok(format!(
                "{}({} {} x{}{})",
                HandleKind::Image.name(),
                image.size(),
                image.depth(),
                image.channels(),
                if this.is_borrowed() { ", borrowed" } else { "" }
            ))
        });
    }
}

pub struct CaptureHandle {
    device: Rc<SharedCapture>,
}

impl CaptureHandle {
    pub(crate) fn new(capture: Capture) -> Self {
        Self {
            device: Rc::new(SharedCapture {
                capture: RefCell::new(capture),
            }),
        }
    }

    pub(crate) fn device(&self) -> &Rc<SharedCapture> {
        &self.device
    }
}

impl Handle for CaptureHandle {
    const KIND: HandleKind = HandleKind::Capture;
}

/// Detected chessboard corners and the pattern they were detected for.
pub struct CornersHandle {
    points: RefCell<Vec<Point2<f32>>>,
    pattern: Size,
}

impl CornersHandle {
    pub(crate) fn new(points: Vec<Point2<f32>>, pattern: Size) -> Self {
        Self {
            points: RefCell::new(points),
            pattern,
        }
    }

    pub(crate) fn points(&self) -> Result<Ref<'_, Vec<Point2<f32>>>, BindingError> {
        self.points
            .try_borrow()
            .map_err(|_| BindingError::Native("corners are busy".to_owned()))
    }

    pub(crate) fn points_mut(&self) -> Result<RefMut<'_, Vec<Point2<f32>>>, BindingError> {
        self.points
            .try_borrow_mut()
            .map_err(|_| BindingError::Native("corners are busy".to_owned()))
    }

    pub fn pattern(&self) -> Size {
        self.pattern
    }
}

impl Handle for CornersHandle {
    const KIND: HandleKind = HandleKind::Corners;
}

impl Drop for CornersHandle {
    fn drop(&mut self) {
        record_release(HandleKind::Corners);
    }
}

impl UserData for CornersHandle {
    fn add_fields<'lua, F: UserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_meta_field(MetaMethod::Type, HandleKind::Corners.name());
    }

    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Len, |_, this, ()| Ok(this.points()?.len()));

        // corners[i] is the i-th corner (1-based) as {x, y}.
        methods.add_meta_method(MetaMethod::Index, |lua, this, key: Value| {
            let index = match key {
                Value::Integer(i) => i,
                Value::Number(n) if n.fract() == 0.0 => n as i64,
                _ => return Ok(None),
            };
            let points = this.points()?;
            let Some(point) = usize::try_from(index)
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| points.get(i))
            else {
                return Ok(None);
            };
            Ok(Some(lua.create_sequence_from([point.x, point.y])?))
        });

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!(
                "{}({} of {})",
                HandleKind::Corners.name(),
                this.points()?.len(),
                this.pattern
            ))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luacv_core::Depth;

    #[test]
    fn only_owned_images_count_as_released() {
        let before = released(HandleKind::Image);
        let image = Image::new(Size::new(2, 2), Depth::U8, 1).unwrap();
        drop(ImageHandle::owned(image.clone()));
        assert_eq!(before + 1, released(HandleKind::Image));

        let sequence = luacv_highgui::Capture::new(Box::new(Still(Some(image))));
        let device = CaptureHandle::new(sequence);
        let frame = Rc::new(RefCell::new(
            Image::new(Size::new(1, 1), Depth::U8, 1).unwrap(),
        ));
        let borrowed = ImageHandle::borrowed(frame, Rc::clone(device.device()));
        assert!(borrowed.is_borrowed());

        let captures = released(HandleKind::Capture);
        drop(device);
        assert_eq!(captures, released(HandleKind::Capture));
        drop(borrowed);
        assert_eq!(captures + 1, released(HandleKind::Capture));
        assert_eq!(before + 1, released(HandleKind::Image));
    }

    #[test]
    fn unwrap_reports_the_wrong_kind() {
        let lua = mlua::Lua::new();
        let corners = lua
            .create_userdata(CornersHandle::new(Vec::new(), Size::new(3, 3)))
            .unwrap();
        let value = Value::UserData(corners);
        let err = unwrap::<ImageHandle>(&value).err().unwrap();
        assert!(matches!(
            err,
            BindingError::TypeMismatch {
                expected: "lcvImage",
                found: "lcvCorners"
            }
        ));

        let err = unwrap::<ImageHandle>(&Value::Boolean(true)).err().unwrap();
        assert!(matches!(
            err,
            BindingError::InvalidHandle {
                expected: "lcvImage",
                got: "boolean"
            }
        ));
    }

    struct Still(Option<Image>);

    impl luacv_highgui::FrameSource for Still {
        fn grab(&mut self) -> bool {
            self.0.is_some()
        }

        fn retrieve(&mut self) -> Option<Image> {
            self.0.take()
        }

        fn get(&self, _: luacv_highgui::CaptureProperty) -> f64 {
            0.0
        }

        fn set(&mut self, _: luacv_highgui::CaptureProperty, _: f64) -> bool {
            false
        }

        fn describe(&self) -> String {
            "still".to_owned()
        }
    }
}
