/*
 *  tests/display_integration.rs
 *
 *  Integration tests for driver discovery and config resolution
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 */

use std::fs;
use std::path::{Path, PathBuf};

use omni_epd::display::MockDisplay;
use omni_epd::display::FileDisplay;
use omni_epd::{
    list_supported_displays, DisplayDriverFactory, DisplayFactoryError, EpdConfig,
    SupportedDisplays, CONFIG_FILE, EPD_CONFIG, IMAGE_DISPLAY,
};
use tempfile::TempDir;

const MOCK_DISPLAY: &str = "omni_epd.mock";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("ini").join(name)
}

/// Config directory seeded with fixtures, each as (fixture, file name)
fn config_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (src, dest) in files {
        fs::copy(fixture(src), dir.path().join(dest)).unwrap();
    }
    dir
}

fn factory(dir: &TempDir) -> DisplayDriverFactory {
    DisplayDriverFactory::builtin().with_config_dir(dir.path())
}

#[test_log::test]
fn test_supported_displays_sorted_and_unique() {
    let SupportedDisplays::Devices(ids) = list_supported_displays(false) else {
        panic!("expected a flat list");
    };

    let mut expected = ids.clone();
    expected.sort();
    expected.dedup();
    assert_eq!(ids, expected);
    assert_eq!(ids, vec!["omni_epd.mock", "omni_epd.pbm", "omni_epd.pgm"]);
}

#[test_log::test]
fn test_supported_displays_structured() {
    let SupportedDisplays::Classes(classes) = list_supported_displays(true) else {
        panic!("expected descriptors");
    };

    // FileDisplay is registered beneath MockDisplay and still reported
    let names: Vec<_> = classes.iter().map(|c| c.class.as_str()).collect();
    assert_eq!(names, vec!["MockDisplay", "FileDisplay"]);
    assert_eq!(classes[1].devices, vec!["omni_epd.pbm", "omni_epd.pgm"]);

    let total: usize = classes.iter().map(|c| c.devices.len()).sum();
    assert_eq!(total, list_supported_displays(false).len());

    let json = serde_json::to_value(&SupportedDisplays::Classes(classes)).unwrap();
    assert_eq!(json[0]["package"], "omni_epd");
    assert_eq!(json[0]["devices"][0], "omni_epd.mock");
}

#[test_log::test]
fn test_unknown_device_is_not_found() {
    let dir = config_dir(&[]);
    let err = factory(&dir).load_display_driver(Some("omni_epd.nope"), None).unwrap_err();
    assert!(matches!(err, DisplayFactoryError::DeviceNotFound(ref name) if name == "omni_epd.nope"));
    assert!(err.to_string().contains("omni_epd.nope"));
}

#[test_log::test]
fn test_load_mock_display() {
    let dir = config_dir(&[]);
    let driver = factory(&dir).load_display_driver(Some(MOCK_DISPLAY), None).unwrap();

    assert_eq!(driver.full_name(), MOCK_DISPLAY);
    assert_eq!(driver.device_name(), "mock");
    assert!(driver.as_any().downcast_ref::<MockDisplay>().is_some());

    // driver defaults are the lowest layer
    assert_eq!(driver.mode(), "bw");
    assert_eq!(driver.config().get(IMAGE_DISPLAY, "rotate"), Some("0"));
}

#[test_log::test]
fn test_top_level_entry_point() {
    let driver = omni_epd::load_display_driver(Some(MOCK_DISPLAY), None).unwrap();
    assert_eq!(driver.full_name(), MOCK_DISPLAY);
}

#[test_log::test]
fn test_global_config_applies() {
    let dir = config_dir(&[("omni-epd.ini", CONFIG_FILE)]);
    let driver = factory(&dir).load_display_driver(Some(MOCK_DISPLAY), None).unwrap();

    assert_eq!(driver.config().get_int(IMAGE_DISPLAY, "rotate").unwrap(), Some(90));
    assert_eq!(driver.config().get_bool(IMAGE_DISPLAY, "flip_horizontal").unwrap(), Some(true));
    assert!(driver.config().has_option(EPD_CONFIG, "type"));
    // not in the global file, default survives
    assert_eq!(driver.mode(), "bw");
}

#[test_log::test]
fn test_device_config_wins_over_global() {
    let dir = config_dir(&[("omni-epd.ini", CONFIG_FILE), ("omni_epd.mock.ini", "omni_epd.mock.ini")]);
    let driver = factory(&dir).load_display_driver(Some(MOCK_DISPLAY), None).unwrap();

    assert_eq!(driver.config().get_bool(IMAGE_DISPLAY, "flip_horizontal").unwrap(), Some(false));
    assert_eq!(driver.config().get_int(IMAGE_DISPLAY, "rotate").unwrap(), Some(90));
    assert_eq!(driver.mode(), "palette");
    assert_eq!(driver.palette_filter().unwrap().len(), 5);
}

#[test_log::test]
fn test_type_from_global_config() {
    let dir = config_dir(&[("omni-epd.ini", CONFIG_FILE), ("omni_epd.mock.ini", "omni_epd.mock.ini")]);
    let factory = factory(&dir);

    // no name: [EPD] type picks the mock and its device file
    let driver = factory.load_display_driver(None, None).unwrap();
    assert_eq!(driver.full_name(), MOCK_DISPLAY);
    assert_eq!(driver.mode(), "palette");

    // an explicit name is never replaced by type
    assert!(matches!(
        factory.load_display_driver(Some("omni_epd.invalid"), None),
        Err(DisplayFactoryError::DeviceNotFound(name)) if name == "omni_epd.invalid"
    ));
}

#[test_log::test]
fn test_invalid_mode_is_configuration_error() {
    let dir = config_dir(&[("bad_conf.ini", "omni_epd.mock.ini")]);
    let factory = factory(&dir);

    let err = factory.load_display_driver(Some(MOCK_DISPLAY), None).unwrap_err();
    match &err {
        DisplayFactoryError::Configuration { device, option, value } => {
            assert_eq!(device, MOCK_DISPLAY);
            assert_eq!(option, "mode");
            assert_eq!(value, "bad");
        }
        other => panic!("expected a configuration error, got {:?}", other),
    }
    assert_eq!(err.to_string(), "Option 'mode' has invalid value 'bad' for device omni_epd.mock");

    // overrides fix it
    let fixed = EpdConfig::new().with(EPD_CONFIG, "mode", "gray4");
    let driver = factory.load_display_driver(Some(MOCK_DISPLAY), Some(&fixed)).unwrap();
    assert_eq!(driver.mode(), "gray4");
}

#[test_log::test]
fn test_invalid_transform_is_configuration_error() {
    let dir = config_dir(&[]);
    let overrides = EpdConfig::new().with(IMAGE_DISPLAY, "rotate", "45");

    assert!(matches!(
        factory(&dir).load_display_driver(Some(MOCK_DISPLAY), Some(&overrides)),
        Err(DisplayFactoryError::Configuration { option, value, .. }) if option == "rotate" && value == "45"
    ));
}

#[test_log::test]
fn test_oversized_palette_is_configuration_error() {
    let dir = config_dir(&[]);
    let colors = vec!["[0, 0, 0]"; 300].join(", ");
    let overrides = EpdConfig::new()
        .with(EPD_CONFIG, "mode", "palette")
        .with(EPD_CONFIG, "palette_filter", format!("[{}]", colors));

    assert!(matches!(
        factory(&dir).load_display_driver(Some(MOCK_DISPLAY), Some(&overrides)),
        Err(DisplayFactoryError::Configuration { option, .. }) if option == "palette_filter"
    ));
}

#[test_log::test]
fn test_absurd_panel_size_is_configuration_error() {
    let dir = config_dir(&[]);
    let overrides = EpdConfig::new().with(EPD_CONFIG, "width", "4000000000");

    assert!(matches!(
        factory(&dir).load_display_driver(Some(MOCK_DISPLAY), Some(&overrides)),
        Err(DisplayFactoryError::Configuration { option, value, .. }) if option == "width" && value == "4000000000"
    ));
}

#[test_log::test]
fn test_override_type_keeps_device_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(CONFIG_FILE), "[EPD]\ntype = omni_epd.mock\n").unwrap();
    fs::write(dir.path().join("omni_epd.mock.ini"), "[EPD]\nmode = gray4\n").unwrap();
    fs::write(dir.path().join("omni_epd.pgm.ini"), "[EPD]\nmode = gray16\n").unwrap();

    let overrides = EpdConfig::new()
        .with(EPD_CONFIG, "type", "omni_epd.pgm")
        .with(EPD_CONFIG, "file", dir.path().join("out.pgm").display().to_string());
    let factory = DisplayDriverFactory::builtin().with_config_dir(dir.path());

    let resolved = factory.load_config(None, Some(&overrides)).unwrap();
    assert_eq!(resolved.device_file.as_deref(), Some(MOCK_DISPLAY));
    assert_eq!(resolved.device_name.as_deref(), Some("omni_epd.pgm"));

    // the pgm driver is loaded, configured from omni_epd.mock.ini
    let driver = factory.load_display_driver(None, Some(&overrides)).unwrap();
    assert_eq!(driver.full_name(), "omni_epd.pgm");
    assert!(driver.as_any().downcast_ref::<FileDisplay>().is_some());
    assert_eq!(driver.mode(), "gray4");
}

#[test_log::test]
fn test_file_display_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("frame.pbm");
    fs::write(
        dir.path().join("omni_epd.pbm.ini"),
        format!("[EPD]\nwidth = 4\nheight = 2\nfile = {}\n\n[Display]\nrotate = 180\n", target.display()),
    )
    .unwrap();

    let mut driver = DisplayDriverFactory::builtin()
        .with_config_dir(dir.path())
        .load_display_driver(Some("omni_epd.pbm"), None)
        .unwrap();

    driver.prepare().unwrap();
    let mut frame = driver.new_frame();
    frame.as_mut_slice()[0] = embedded_graphics::pixelcolor::Gray8::new(0);
    driver.display(&frame).unwrap();
    driver.sleep().unwrap();
    driver.close().unwrap();

    let text = fs::read_to_string(&target).unwrap();
    let rows: Vec<_> = text.lines().filter(|l| !l.starts_with('#')).collect();
    // top-left ink ends up bottom-right after a half turn
    assert_eq!(rows, vec!["P1", "4 2", "0 0 0 0", "0 0 0 1"]);
}
