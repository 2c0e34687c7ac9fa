mod common;

use luacv::{binding_error, BindingError, Config, DEFAULT_CAPACITY};
use luacv_core::Size;
use luacv_highgui::WindowMode;

#[test]
fn module_reports_version_and_capacity() {
    let lua = common::lua();
    let version: String = lua.load("luacv._VERSION").eval().unwrap();
    assert!(version.starts_with("luacv "), "{version}");
    let capacity: usize = lua.load("luacv.TRACKBAR_CAPACITY").eval().unwrap();
    assert_eq!(DEFAULT_CAPACITY, capacity);
    assert_eq!(24, capacity);
}

#[test]
fn windows_follow_what_is_shown() {
    let (lua, windows) = common::lua_with(Config::default());
    lua.load(
        r#"
        luacv.NamedWindow("view")
        luacv.NamedWindow("free", "normal")
        luacv.ShowImage("view", luacv.CreateImage({64, 48}))
        luacv.ShowImage("free", luacv.CreateImage({64, 48}))
        luacv.ResizeWindow("free", 320, 240)
        luacv.MoveWindow("view", 10, 20)
        luacv.ShowImage("implicit", luacv.CreateImage({8, 8}, "8u", 1))
        luacv.DestroyWindow("nobody")
    "#,
    )
    .exec()
    .unwrap();

    let ui = windows.borrow();
    let view = ui.window("view").unwrap();
    assert_eq!(WindowMode::AutoSize, view.mode);
    assert_eq!((10, 20), view.position);
    assert_eq!(Some((64, 48)), view.size);
    assert_eq!(Some(Size::new(64, 48)), view.last_frame);

    let free = ui.window("free").unwrap();
    assert_eq!(WindowMode::Normal, free.mode);
    assert_eq!(Some((320, 240)), free.size);
    assert_eq!(1, ui.window("implicit").unwrap().frames_shown);
    drop(ui);

    lua.load(r#"luacv.DestroyWindow("view")"#).exec().unwrap();
    assert_eq!(vec!["free", "implicit"], windows.borrow().window_names());
    lua.load("luacv.DestroyAllWindows()").exec().unwrap();
    assert!(windows.borrow().window_names().is_empty());
}

#[test]
fn window_errors_surface_as_lua_errors() {
    let lua = common::lua();
    lua.load(
        r#"
        local ok, err = pcall(luacv.NamedWindow, "w", "fullscreen")
        assert(not ok and tostring(err):find("invalid window mode 'fullscreen'"), tostring(err))
        ok, err = pcall(luacv.ResizeWindow, "w", -1, 10)
        assert(not ok and tostring(err):find("bad argument #2 to 'ResizeWindow'"), tostring(err))
    "#,
    )
    .exec()
    .unwrap();

    let err = lua.load("luacv.MoveWindow('ghost', 0, 0)").exec().unwrap_err();
    assert!(matches!(binding_error(&err), Some(BindingError::Native(_))));
}

#[test]
fn trackbar_callbacks_see_their_own_positions() {
    let lua = common::lua();
    lua.load(
        r#"
        luacv.NamedWindow("w")
        seen = {}
        local slot_a, pos_a = luacv.CreateTrackbar("a", "w", 5, 10, function(pos)
            seen[#seen + 1] = "a" .. pos
        end)
        local slot_b, pos_b = luacv.CreateTrackbar("b", "w", 50, 10, function(pos)
            seen[#seen + 1] = "b" .. pos
        end)
        assert(slot_a == 1 and pos_a == 5)
        assert(slot_b == 2 and pos_b == 10)

        luacv.SetTrackbarPos("b", "w", 3)
        luacv.SetTrackbarPos("a", "w", 99)
        assert(luacv.GetTrackbarPos("a", "w") == 10)
        assert(luacv.GetTrackbarPos("b", "w") == 3)
        assert(luacv.GetTrackbarPos("c", "w") == nil)
        assert(luacv.GetTrackbarPos("a", "elsewhere") == nil)
        assert(table.concat(seen, ",") == "b3,a10", table.concat(seen, ","))
    "#,
    )
    .exec()
    .unwrap();
}

#[test]
fn user_moves_are_delivered_by_wait_key() {
    let (lua, windows) = common::lua_with(Config::default());
    lua.load(
        r#"
        luacv.NamedWindow("w")
        seen = {}
        luacv.CreateTrackbar("t", "w", 0, 255, function(pos) seen[#seen + 1] = pos end)
    "#,
    )
    .exec()
    .unwrap();

    windows.borrow_mut().queue_trackbar_move("t", "w", 7);
    windows.borrow_mut().queue_trackbar_move("t", "w", 300);
    windows.borrow_mut().push_key(0x10071);
    lua.load(
        r#"
        assert(#seen == 0)
        local key, modifiers = luacv.WaitKey(10)
        assert(key == 0x71 and modifiers == 1, tostring(key))
        assert(seen[1] == 7 and seen[2] == 255 and #seen == 2)
        assert(luacv.WaitKey(1) == nil)
        assert(luacv.WaitKey() == nil)
    "#,
    )
    .exec()
    .unwrap();
}

#[test]
fn callbacks_may_drive_other_trackbars() {
    let lua = common::lua();
    lua.load(
        r#"
        luacv.NamedWindow("w")
        luacv.CreateTrackbar("low", "w", 0, 100, function(pos) low = pos end)
        luacv.CreateTrackbar("high", "w", 100, 100, function(pos)
            high = pos
            if luacv.GetTrackbarPos("low", "w") > pos then
                luacv.SetTrackbarPos("low", "w", pos)
            end
        end)
        luacv.SetTrackbarPos("low", "w", 60)
        luacv.SetTrackbarPos("high", "w", 40)
        assert(high == 40 and low == 40)
        assert(luacv.GetTrackbarPos("low", "w") == 40)
    "#,
    )
    .exec()
    .unwrap();
}

#[test]
fn the_twenty_fifth_trackbar_is_refused() {
    let lua = common::lua();
    lua.load(
        r#"
        luacv.NamedWindow("w")
        hits = {}
        for i = 1, 24 do
            local slot = luacv.CreateTrackbar("t" .. i, "w", 0, 10, function(pos)
                hits[#hits + 1] = i .. ":" .. pos
            end)
            assert(slot == i)
        end

        local ok, err = pcall(luacv.CreateTrackbar, "t25", "w", 0, 10, function() end)
        assert(not ok)
        assert(tostring(err):find("max number of trackbars %(24%) reached"), tostring(err))
        assert(luacv.GetTrackbarPos("t25", "w") == nil)

        luacv.SetTrackbarPos("t1", "w", 4)
        luacv.SetTrackbarPos("t24", "w", 9)
        assert(table.concat(hits, ",") == "1:4,24:9", table.concat(hits, ","))
    "#,
    )
    .exec()
    .unwrap();

    let err = lua
        .load(r#"luacv.CreateTrackbar("t26", "w", 0, 10, function() end)"#)
        .exec()
        .unwrap_err();
    assert!(matches!(
        binding_error(&err),
        Some(BindingError::CapacityExceeded { capacity: 24 })
    ));
}

#[test]
fn capacity_comes_from_the_config() {
    let config = Config {
        max_trackbars: 2,
        ..Config::default()
    };
    let (lua, _) = common::lua_with(config);
    lua.load(
        r#"
        assert(luacv.TRACKBAR_CAPACITY == 2)
        luacv.NamedWindow("w")

        -- a trackbar on a missing window does not use a slot
        assert(not pcall(luacv.CreateTrackbar, "x", "missing", 0, 1, print))

        assert(luacv.CreateTrackbar("a", "w", 0, 1, print) == 1)
        assert(luacv.CreateTrackbar("b", "w", 0, 1, print) == 2)
        local ok, err = pcall(luacv.CreateTrackbar, "c", "w", 0, 1, print)
        assert(not ok and tostring(err):find("%(2%)"), tostring(err))
    "#,
    )
    .exec()
    .unwrap();
}

#[test]
fn unimplemented_functions_say_so() {
    let lua = common::lua();
    for name in ["ConvertImage", "SetMouseCallback"] {
        let err = lua
            .load(format!("luacv.{name}('w', function() end)"))
            .exec()
            .unwrap_err();
        assert!(
            matches!(binding_error(&err), Some(BindingError::NotYetImplemented(n)) if *n == name),
            "{err}"
        );
    }
}
