//! SceneWriter tests.
//!
//! Write into temporary directories via `tempfile`; no media fixtures
//! required.

use scenecap::{CaptureError, Frame, SceneFormat, SceneWriter};

fn solid(width: u32, height: u32, value: u8) -> Frame {
    Frame::from_rgb(width, height, vec![value; (width * height * 3) as usize]).unwrap()
}

#[test]
fn filenames_are_zero_padded_and_sequential() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut writer = SceneWriter::create(dir.path(), SceneFormat::Png).unwrap();

    for expected_index in 0..5u32 {
        let saved = writer.write(&solid(8, 8, 50)).unwrap();
        assert_eq!(saved.index, expected_index);
        assert_eq!(
            saved.path.file_name().unwrap().to_str().unwrap(),
            format!("scene_{expected_index:03}.png"),
        );
        assert!(saved.path.exists());
    }

    assert_eq!(writer.scenes_written(), 5);
}

#[test]
fn lexicographic_order_equals_write_order() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut writer = SceneWriter::create(dir.path(), SceneFormat::Png).unwrap();

    let written: Vec<String> = (0..12)
        .map(|_| {
            writer
                .write(&solid(4, 4, 200))
                .unwrap()
                .path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();

    let mut listed: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    listed.sort();

    assert_eq!(listed, written);
}

#[test]
fn creates_missing_output_directory() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let nested = dir.path().join("a").join("b");

    let mut writer = SceneWriter::create(&nested, SceneFormat::Jpeg).unwrap();
    let saved = writer.write(&solid(8, 8, 10)).unwrap();

    assert!(nested.is_dir());
    assert!(saved.path.starts_with(&nested));
}

#[test]
fn written_image_is_readable_and_correct() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut writer = SceneWriter::create(dir.path(), SceneFormat::Png).unwrap();

    let saved = writer.write(&solid(6, 4, 128)).unwrap();
    let loaded = image::open(&saved.path).unwrap().into_rgb8();

    assert_eq!(loaded.dimensions(), (6, 4));
    assert!(loaded.pixels().all(|px| px.0 == [128, 128, 128]));
}

#[test]
fn unwritable_destination_propagates_scene_write_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut writer = SceneWriter::create(dir.path(), SceneFormat::Png).unwrap();

    // Turn the destination path into a directory so the image save fails.
    std::fs::create_dir(writer.next_path()).unwrap();

    let result = writer.write(&solid(4, 4, 0));
    assert!(matches!(result, Err(CaptureError::SceneWrite { .. })));

    // The failed write must not consume the index.
    assert_eq!(writer.scenes_written(), 0);
}

#[test]
fn formats_use_expected_extensions() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    for (format, ext) in [
        (SceneFormat::Jpeg, "jpg"),
        (SceneFormat::Png, "png"),
        (SceneFormat::Bmp, "bmp"),
    ] {
        let mut writer = SceneWriter::create(dir.path().join(ext), format).unwrap();
        let saved = writer.write(&solid(4, 4, 30)).unwrap();
        assert_eq!(saved.path.extension().unwrap().to_str().unwrap(), ext);
    }
}

#[test]
fn captions_are_one_based() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut writer = SceneWriter::create(dir.path(), SceneFormat::Png).unwrap();

    let first = writer.write(&solid(4, 4, 1)).unwrap();
    let second = writer.write(&solid(4, 4, 2)).unwrap();

    assert_eq!(first.caption(), "Scene 1");
    assert_eq!(second.caption(), "Scene 2");
}
