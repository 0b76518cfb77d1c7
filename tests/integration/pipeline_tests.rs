/*!
 * End-to-end tests: detection, export, OCR and assembly
 */

use std::fs;

use hardsub_ocr::app_config::Config;
use hardsub_ocr::app_controller::{Controller, OutputTarget};
use hardsub_ocr::channel::Channel;
use hardsub_ocr::ocr::OcrImage;
use hardsub_ocr::providers::mock::MockProvider;
use hardsub_ocr::subtitle::ASS_HEADER;

use crate::common;

fn read_by_channel(image: &OcrImage) -> String {
    if image.name.starts_with("top") {
        "Sign".to_string()
    } else {
        "Hello".to_string()
    }
}

fn dialogue_lines(document: &str) -> Vec<&str> {
    document.lines().filter(|line| line.starts_with("Dialogue:")).collect()
}

/// Test that a malformed name is left out while the document is still written
#[tokio::test]
async fn test_runOcr_malformedFilename_shouldSkipItAndWriteDocument() {
    let images_dir = common::create_temp_dir().unwrap();
    let output_dir = common::create_temp_dir().unwrap();

    common::create_test_image(images_dir.path(), &common::image_file_name(Channel::Bottom, 1_000, 2_000)).unwrap();
    common::create_test_image(images_dir.path(), &common::image_file_name(Channel::Bottom, 2_000, 3_000)).unwrap();
    common::create_test_image(images_dir.path(), &common::image_file_name(Channel::Top, 1_500, 2_500)).unwrap();
    common::create_test_image(images_dir.path(), "screenshot_final.png").unwrap();

    let controller = Controller::with_config(Config::default()).unwrap();
    let dispatcher = common::mock_dispatcher(MockProvider::working().with_custom_response(read_by_channel), 2, 0);

    let path = controller
        .run_ocr_with(&dispatcher, images_dir.path(), &OutputTarget::new(output_dir.path(), "episode"))
        .await
        .unwrap();

    assert_eq!(path, output_dir.path().join("episode.ass"));
    let document = fs::read_to_string(&path).unwrap();
    assert!(document.starts_with(ASS_HEADER));
    assert_eq!(
        dialogue_lines(&document),
        vec![
            "Dialogue: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,,Hello",
            "Dialogue: 0,0:00:01.50,0:00:02.50,Top,,0,0,0,,Sign",
        ]
    );
}

/// Test that a second run never overwrites the first document
#[tokio::test]
async fn test_runOcr_existingDocument_shouldWriteNumberedCopy() {
    let images_dir = common::create_temp_dir().unwrap();
    let output_dir = common::create_temp_dir().unwrap();
    common::create_test_image(images_dir.path(), &common::image_file_name(Channel::Bottom, 1_000, 2_000)).unwrap();
    common::create_test_file(output_dir.path(), "episode.ass", "keep me").unwrap();

    let controller = Controller::with_config(Config::default()).unwrap();
    let dispatcher = common::mock_dispatcher(MockProvider::working(), 10, 0);

    let path = controller
        .run_ocr_with(&dispatcher, images_dir.path(), &OutputTarget::new(output_dir.path(), "episode"))
        .await
        .unwrap();

    assert_eq!(path, output_dir.path().join("episode_1.ass"));
    assert_eq!(fs::read_to_string(output_dir.path().join("episode.ass")).unwrap(), "keep me");
}

/// Test that a failing backend still produces a (header-only) document
#[tokio::test]
async fn test_runOcr_failingBackend_shouldWriteEmptyDocument() {
    let images_dir = common::create_temp_dir().unwrap();
    let output_dir = common::create_temp_dir().unwrap();
    common::create_test_image(images_dir.path(), &common::image_file_name(Channel::Bottom, 1_000, 2_000)).unwrap();

    let controller = Controller::with_config(Config::default()).unwrap();
    let dispatcher = common::mock_dispatcher(MockProvider::failing(), 10, 1);

    let path = controller
        .run_ocr_with(&dispatcher, images_dir.path(), &OutputTarget::new(output_dir.path(), "episode"))
        .await
        .unwrap();

    let document = fs::read_to_string(&path).unwrap();
    assert!(dialogue_lines(&document).is_empty());
}

/// Test the whole pipeline from a signal file and decoded frames
#[tokio::test]
async fn test_runExtract_signalsAndFrames_shouldProduceTwoChannelDocument() {
    common::init_logging();
    let work_dir = common::create_temp_dir().unwrap();
    let frames_dir = work_dir.path().join("frames");
    let images_dir = work_dir.path().join("images");
    let output_dir = work_dir.path().join("out");
    fs::create_dir_all(&frames_dir).unwrap();

    // only the start frames are ever read; frame 60 is missing on purpose
    common::create_sized_image(&frames_dir, "10.png", 320, 180).unwrap();
    common::create_sized_image(&frames_dir, "24.png", 320, 180).unwrap();

    let signals: String = (0..=70u64)
        .map(|frame| {
            format!(
                "{{\"frame\": {}, \"bot\": {{\"score\": 0.95, \"scene_change_prev\": {}, \"scene_change_next\": {}}}, \"top\": {{\"score\": 0.95, \"scene_change_prev\": {}, \"scene_change_next\": {}}}}}\n",
                frame,
                frame == 24 || frame == 60,
                frame == 48 || frame == 70,
                frame == 10,
                frame == 40,
            )
        })
        .collect();
    let signals_path = common::create_test_file(work_dir.path(), "signals.jsonl", &signals).unwrap();

    let controller = Controller::with_config(Config::default()).unwrap();
    let dispatcher = common::mock_dispatcher(MockProvider::working().with_custom_response(read_by_channel), 50, 0);

    let path = controller
        .run_extract_with(
            &dispatcher,
            &signals_path,
            &frames_dir,
            &images_dir,
            &OutputTarget::new(&output_dir, "movie"),
        )
        .await
        .unwrap();

    assert!(images_dir.join("bot_0_00_01_00__0_00_02_00.jpg").exists());
    assert!(images_dir.join("top_0_00_00_42__0_00_01_67.jpg").exists());

    let document = fs::read_to_string(&path).unwrap();
    assert_eq!(
        dialogue_lines(&document),
        vec![
            "Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,Hello",
            "Dialogue: 0,0:00:00.42,0:00:01.67,Top,,0,0,0,,Sign",
        ]
    );
}

/// Test that a missing frames directory stops the run before anything is written
#[test]
fn test_runExtract_missingFramesDir_shouldFail() {
    let work_dir = common::create_temp_dir().unwrap();
    let signals_path = common::create_test_file(work_dir.path(), "signals.jsonl", "").unwrap();
    let controller = Controller::with_config(Config::default()).unwrap();
    let dispatcher = common::mock_dispatcher(MockProvider::working(), 10, 0);

    let result = tokio_test::block_on(async {
        controller
            .run_extract_with(
                &dispatcher,
                &signals_path,
                work_dir.path().join("frames"),
                work_dir.path().join("images"),
                &OutputTarget::new(work_dir.path(), "movie"),
            )
            .await
    });

    assert!(result.is_err());
    assert!(!work_dir.path().join("images").exists());
    assert!(!work_dir.path().join("movie.ass").exists());
}

fn bottom_signals(open: u64, close: u64, last_frame: u64) -> String {
    (0..=last_frame)
        .map(|frame| {
            format!(
                "{{\"frame\": {}, \"bot\": {{\"score\": 0.95, \"scene_change_prev\": {}, \"scene_change_next\": {}}}}}\n",
                frame,
                frame == open,
                frame == close,
            )
        })
        .collect()
}

/// Test that a second extract into the same images directory only sees its own captures
#[tokio::test]
async fn test_runExtract_twiceIntoSameImagesDir_shouldOnlyAssembleSecondRun() {
    let work_dir = common::create_temp_dir().unwrap();
    let images_dir = work_dir.path().join("images");
    let output_dir = work_dir.path().join("out");
    let first_frames = work_dir.path().join("first");
    let second_frames = work_dir.path().join("second");
    fs::create_dir_all(&first_frames).unwrap();
    fs::create_dir_all(&second_frames).unwrap();
    common::create_sized_image(&first_frames, "24.png", 320, 180).unwrap();
    common::create_sized_image(&second_frames, "100.png", 320, 180).unwrap();
    let first_signals = common::create_test_file(work_dir.path(), "first.jsonl", &bottom_signals(24, 48, 60)).unwrap();
    let second_signals =
        common::create_test_file(work_dir.path(), "second.jsonl", &bottom_signals(100, 120, 130)).unwrap();

    let controller = Controller::with_config(Config::default()).unwrap();
    let dispatcher = common::mock_dispatcher(MockProvider::working().with_custom_response(read_by_channel), 50, 0);

    controller
        .run_extract_with(&dispatcher, &first_signals, &first_frames, &images_dir, &OutputTarget::new(&output_dir, "first"))
        .await
        .unwrap();
    let path = controller
        .run_extract_with(&dispatcher, &second_signals, &second_frames, &images_dir, &OutputTarget::new(&output_dir, "second"))
        .await
        .unwrap();

    assert!(!images_dir.join("bot_0_00_01_00__0_00_02_00.jpg").exists());
    let document = fs::read_to_string(&path).unwrap();
    assert_eq!(
        dialogue_lines(&document),
        vec!["Dialogue: 0,0:00:04.17,0:00:05.01,Default,,0,0,0,,Hello"]
    );
}

/// Test that opting out of cleaning keeps earlier captures in the document
#[tokio::test]
async fn test_runExtract_keepImages_shouldAssembleBothRuns() {
    let work_dir = common::create_temp_dir().unwrap();
    let images_dir = work_dir.path().join("images");
    let frames_dir = work_dir.path().join("frames");
    fs::create_dir_all(&frames_dir).unwrap();
    common::create_sized_image(&frames_dir, "100.png", 320, 180).unwrap();
    fs::create_dir_all(&images_dir).unwrap();
    common::create_test_image(&images_dir, &common::image_file_name(Channel::Bottom, 1_000, 2_000)).unwrap();
    let signals = common::create_test_file(work_dir.path(), "signals.jsonl", &bottom_signals(100, 120, 130)).unwrap();

    let mut config = Config::default();
    config.export.clean_images = false;
    let controller = Controller::with_config(config).unwrap();
    let dispatcher = common::mock_dispatcher(MockProvider::working().with_custom_response(read_by_channel), 50, 0);

    let path = controller
        .run_extract_with(&dispatcher, &signals, &frames_dir, &images_dir, &OutputTarget::new(work_dir.path(), "movie"))
        .await
        .unwrap();

    let document = fs::read_to_string(&path).unwrap();
    assert_eq!(
        dialogue_lines(&document),
        vec!["Dialogue: 0,0:00:01.00,0:00:05.01,Default,,0,0,0,,Hello"]
    );
}
