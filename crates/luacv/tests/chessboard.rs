mod common;

use approx::assert_abs_diff_eq;
use luacv::{binding_error, released, BindingError, HandleKind};
use luacv_core::Size;

fn board_script(body: &str) -> (mlua::Lua, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.png");
    common::write_board(&path, Size::new(7, 5));
    let lua = common::lua();
    common::set_path(&lua, "board_path", &path);
    lua.load(body).exec().unwrap();
    (lua, dir)
}

#[test]
fn finds_every_corner_of_a_rendered_board() {
    let (lua, _dir) = board_script(
        r#"
        local img = luacv.LoadImage(board_path)
        corners, count = luacv.FindChessboardCorners(img, {7, 5})
        assert(corners ~= nil)
        assert(count == 35 and #corners == 35)
        assert(tostring(corners) == "lcvCorners(35 of 7x5)", tostring(corners))
        assert(corners[0] == nil and corners[36] == nil and corners.x == nil)
    "#,
    );

    let first: Vec<f64> = lua.load("corners[1]").eval().unwrap();
    let last: Vec<f64> = lua.load("corners[35]").eval().unwrap();
    let (x0, y0) = common::board_corner(0, 0);
    let (x1, y1) = common::board_corner(6, 4);
    assert_abs_diff_eq!(x0, first[0], epsilon = 0.75);
    assert_abs_diff_eq!(y0, first[1], epsilon = 0.75);
    assert_abs_diff_eq!(x1, last[0], epsilon = 0.75);
    assert_abs_diff_eq!(y1, last[1], epsilon = 0.75);
}

#[test]
fn no_board_is_nil() {
    let lua = common::lua();
    lua.load(
        r##"
        local blank = luacv.CreateImage({120, 90}, "8u", 1)
        local corners, count = luacv.FindChessboardCorners(blank, {7, 5})
        assert(corners == nil and count == nil)
        assert(select("#", luacv.FindChessboardCorners(blank, {7, 5})) == 1)
    "##,
    )
    .exec()
    .unwrap();
}

#[test]
fn wrong_pattern_and_bad_overrides() {
    let (lua, _dir) = board_script(
        r#"
        local img = luacv.LoadImage(board_path, 0)
        assert(luacv.FindChessboardCorners(img, {6, 5}) == nil)
        assert(luacv.FindChessboardCorners(img, {5, 7}) ~= nil)
        assert(luacv.FindChessboardCorners(img, {7, 5}, {spacing_tolerance = 0.3, nms_radius = 2}) ~= nil)
        image = img
    "#,
    );

    let err = lua
        .load("luacv.FindChessboardCorners(image, {2, 5})")
        .exec()
        .unwrap_err();
    assert!(matches!(
        binding_error(&err),
        Some(BindingError::InvalidArgument { position: 2, .. })
    ));

    let err = lua
        .load("luacv.FindChessboardCorners(image, {7, 5}, {nms_radius = 'wide'})")
        .exec()
        .unwrap_err();
    assert!(matches!(
        binding_error(&err),
        Some(BindingError::InvalidArgument { position: 3, .. })
    ));

    let err = lua
        .load("luacv.FindChessboardCorners(image, {7, 5}, {treshold_rel = 0.1})")
        .exec()
        .unwrap_err();
    assert!(
        matches!(
            binding_error(&err),
            Some(BindingError::InvalidArgument { position: 3, .. })
        ),
        "{err}"
    );
    assert!(err.to_string().contains("treshold_rel"), "{err}");
}

#[test]
fn subpixel_refinement_moves_corners_onto_the_board() {
    let (lua, _dir) = board_script(
        r#"
        local img = luacv.LoadImage(board_path)
        corners = luacv.FindChessboardCorners(img, {7, 5})
        luacv.FindCornerSubPix(img, corners, 5, {eps = 0.01, iter = 30})
        luacv.FindCornerSubPix(img, corners, 5, {iter = 10})
        luacv.FindCornerSubPix(img, corners, 5, {})
    "#,
    );

    for k in 0..35usize {
        let p: Vec<f64> = lua.load(format!("corners[{}]", k + 1)).eval().unwrap();
        let (x, y) = common::board_corner(k % 7, k / 7);
        let err = ((p[0] - x).powi(2) + (p[1] - y).powi(2)).sqrt();
        assert!(err < 0.2, "corner {k}: {p:?} vs ({x}, {y})");
    }

    lua.load(
        r#"
        local before = corners[1]
        local img = luacv.LoadImage(board_path)
        local ok, err = pcall(luacv.FindCornerSubPix, img, corners, 65535, {iter = 1})
        assert(not ok and tostring(err):find("bad argument #3 to 'FindCornerSubPix'"), tostring(err))
        assert(not pcall(luacv.FindCornerSubPix, img, corners, 78, {iter = 1}))
        assert(corners[1][1] == before[1] and corners[1][2] == before[2])
    "#,
    )
    .exec()
    .unwrap();

    let err = lua
        .load("luacv.FindCornerSubPix(luacv.CreateImage({4, 4}), corners, 0, {})")
        .exec()
        .unwrap_err();
    assert!(matches!(
        binding_error(&err),
        Some(BindingError::InvalidArgument { position: 3, .. })
    ));
}

#[test]
fn drawing_corners_marks_the_image() {
    let (lua, _dir) = board_script(
        r#"
        local img = luacv.LoadImage(board_path)
        local corners = luacv.FindChessboardCorners(img, {7, 5})
        luacv.DrawChessboardCorners(img, {7, 5}, corners)
        drawn = img

        local ok, err = pcall(luacv.DrawChessboardCorners, img, {7, 5}, img)
        assert(not ok and tostring(err):find("lcvCorners expected, got lcvImage"), tostring(err))
    "#,
    );
    let size: Vec<u32> = lua.load("luacv.GetSize(drawn)").eval().unwrap();
    assert_eq!(vec![210, 160], size);
}

#[test]
fn corner_arrays_are_released_once_collected() {
    let before = released(HandleKind::Corners);
    let (lua, _dir) = board_script(
        r#"
        local img = luacv.LoadImage(board_path)
        local a = luacv.FindChessboardCorners(img, {7, 5})
        local b = luacv.FindChessboardCorners(img, {7, 5})
        assert(a ~= nil and b ~= nil)
    "#,
    );
    lua.gc_collect().unwrap();
    lua.gc_collect().unwrap();
    assert_eq!(before + 2, released(HandleKind::Corners));
}
