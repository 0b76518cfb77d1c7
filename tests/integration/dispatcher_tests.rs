/*!
 * Tests for batched OCR dispatch against scripted backends
 */

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hardsub_ocr::channel::Channel;
use hardsub_ocr::ocr::{DispatchSummary, OcrResult};
use hardsub_ocr::providers::mock::MockProvider;

use crate::common;

fn write_images(dir: &std::path::Path, ranges: &[(Channel, u64, u64)]) -> Vec<PathBuf> {
    ranges
        .iter()
        .map(|&(channel, start, end)| {
            common::create_test_image(dir, &common::image_file_name(channel, start, end)).unwrap()
        })
        .collect()
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect()
}

/// Test that a persistent count mismatch ends in one empty result per image
#[tokio::test]
async fn test_dispatch_threeResultsForFourImages_shouldRetryThenReturnFourEmpty() {
    let temp_dir = common::create_temp_dir().unwrap();
    let paths = write_images(
        temp_dir.path(),
        &[
            (Channel::Bottom, 1_000, 2_000),
            (Channel::Bottom, 3_000, 4_000),
            (Channel::Bottom, 5_000, 6_000),
            (Channel::Bottom, 7_000, 8_000),
        ],
    );
    let mock = MockProvider::count_mismatch(1);
    let dispatcher = common::mock_dispatcher(mock.clone(), 4, 2);

    let (results, summary) = dispatcher.dispatch(&paths, |_, _| {}).await;

    let expected: Vec<OcrResult> = names(&paths).into_iter().map(OcrResult::empty).collect();
    assert_eq!(results, expected);
    assert_eq!(
        summary,
        DispatchSummary {
            batches: 1,
            failed: 1,
            retries: 2,
            images: 4,
        }
    );
    assert_eq!(mock.request_count(), 3);
}

/// Test that results from several batches come back in timecode order
#[tokio::test]
async fn test_dispatch_multipleBatches_shouldMergeAndSortByTimecode() {
    let temp_dir = common::create_temp_dir().unwrap();
    let mut paths = write_images(
        temp_dir.path(),
        &[
            (Channel::Top, 9_000, 9_500),
            (Channel::Bottom, 1_000, 2_000),
            (Channel::Bottom, 61_000, 62_000),
            (Channel::Top, 1_000, 1_500),
            (Channel::Bottom, 5_000, 6_000),
        ],
    );
    // enumeration order is by name, not by time
    paths.sort();
    let dispatcher = common::mock_dispatcher(MockProvider::working(), 2, 0);
    let progress = Arc::new(AtomicUsize::new(0));
    let progress_seen = progress.clone();

    let (results, summary) = dispatcher
        .dispatch(&paths, move |current, total| {
            assert_eq!(total, 3);
            progress_seen.fetch_max(current, Ordering::SeqCst);
        })
        .await;

    let ordered: Vec<&str> = results.iter().map(|r| r.image_name.as_str()).collect();
    assert_eq!(
        ordered,
        vec![
            "bot_0_00_01_00__0_00_02_00.png",
            "top_0_00_01_00__0_00_01_50.png",
            "bot_0_00_05_00__0_00_06_00.png",
            "top_0_00_09_00__0_00_09_50.png",
            "bot_0_01_01_00__0_01_02_00.png",
        ]
    );
    assert!(results.iter().all(|r| r.text == format!("[OCR] {}", r.image_name)));
    assert_eq!(summary.batches, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(progress.load(Ordering::SeqCst), 3);
}

/// Test that transient failures are retried until the batch succeeds
#[tokio::test]
async fn test_dispatch_transientFailures_shouldRecover() {
    let temp_dir = common::create_temp_dir().unwrap();
    let paths = write_images(temp_dir.path(), &[(Channel::Bottom, 1_000, 2_000)]);
    let mock = MockProvider::fail_first(2);
    let dispatcher = common::mock_dispatcher(mock.clone(), 10, 3);

    let (results, summary) = dispatcher.dispatch(&paths, |_, _| {}).await;

    assert_eq!(results[0].text, "[OCR] bot_0_00_01_00__0_00_02_00.png");
    assert_eq!(summary.retries, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(mock.request_count(), 3);
}

/// Test that prose instead of JSON is retried and then degrades to empty results
#[tokio::test]
async fn test_dispatch_malformedResponses_shouldRetryThenReturnEmpty() {
    let temp_dir = common::create_temp_dir().unwrap();
    let paths = write_images(
        temp_dir.path(),
        &[(Channel::Bottom, 1_000, 2_000), (Channel::Top, 1_000, 2_000), (Channel::Bottom, 3_000, 4_000)],
    );
    let mock = MockProvider::malformed();
    let dispatcher = common::mock_dispatcher(mock.clone(), 10, 2);

    let (results, summary) = dispatcher.dispatch(&paths, |_, _| {}).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.text.is_empty()));
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.retries, 2);
    // one first attempt plus two retries
    assert_eq!(mock.request_count(), 3);
}

/// Test that a batch recovers once the backend answers in JSON again
#[tokio::test]
async fn test_dispatch_malformedThenValid_shouldRecover() {
    let temp_dir = common::create_temp_dir().unwrap();
    let paths = write_images(
        temp_dir.path(),
        &[(Channel::Bottom, 1_000, 2_000), (Channel::Bottom, 3_000, 4_000)],
    );
    let mock = MockProvider::malformed_first(1);
    let dispatcher = common::mock_dispatcher(mock.clone(), 10, 3);

    let (results, summary) = dispatcher.dispatch(&paths, |_, _| {}).await;

    let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["[OCR] bot_0_00_01_00__0_00_02_00.png", "[OCR] bot_0_00_03_00__0_00_04_00.png"]
    );
    assert_eq!(summary.retries, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(mock.request_count(), 2);
}

/// Test that authentication errors are not retried
#[tokio::test]
async fn test_dispatch_authFailure_shouldFailBatchWithoutRetry() {
    let temp_dir = common::create_temp_dir().unwrap();
    let paths = write_images(
        temp_dir.path(),
        &[(Channel::Bottom, 1_000, 2_000), (Channel::Top, 1_000, 2_000)],
    );
    let mock = MockProvider::auth_failure();
    let dispatcher = common::mock_dispatcher(mock.clone(), 10, 5);

    let (results, summary) = dispatcher.dispatch(&paths, |_, _| {}).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.text.is_empty()));
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.retries, 0);
    assert_eq!(mock.request_count(), 1);
}

/// Test that overload notices in the body are retried like errors
#[tokio::test]
async fn test_dispatch_overloadedBackend_shouldExhaustRetries() {
    let temp_dir = common::create_temp_dir().unwrap();
    let paths = write_images(temp_dir.path(), &[(Channel::Bottom, 1_000, 2_000)]);
    let mock = MockProvider::overloaded();
    let dispatcher = common::mock_dispatcher(mock.clone(), 10, 1);

    let (results, summary) = dispatcher.dispatch(&paths, |_, _| {}).await;

    assert_eq!(results, vec![OcrResult::empty("bot_0_00_01_00__0_00_02_00.png")]);
    assert_eq!(summary.retries, 1);
    assert_eq!(mock.request_count(), 2);
}

/// Test that an unreadable image is dropped and the rest still submitted
#[tokio::test]
async fn test_run_corruptImage_shouldBeDroppedBeforeSubmission() {
    let temp_dir = common::create_temp_dir().unwrap();
    let nested = temp_dir.path().join("part2");
    std::fs::create_dir_all(&nested).unwrap();
    write_images(temp_dir.path(), &[(Channel::Bottom, 1_000, 2_000)]);
    write_images(&nested, &[(Channel::Bottom, 3_000, 4_000)]);
    common::create_test_file(
        temp_dir.path(),
        &common::image_file_name(Channel::Bottom, 5_000, 6_000),
        "not an image",
    )
    .unwrap();

    let dispatcher = common::mock_dispatcher(MockProvider::working(), 10, 0);
    let (results, summary) = dispatcher.run(temp_dir.path(), |_, _| {}).await.unwrap();

    let found: Vec<&str> = results.iter().map(|r| r.image_name.as_str()).collect();
    assert_eq!(
        found,
        vec!["bot_0_00_01_00__0_00_02_00.png", "bot_0_00_03_00__0_00_04_00.png"]
    );
    assert_eq!(summary.failed, 0);
}

/// Test that an empty directory produces an empty result set
#[tokio::test]
async fn test_run_emptyDirectory_shouldReturnNothing() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dispatcher = common::mock_dispatcher(MockProvider::working(), 10, 0);

    let (results, summary) = dispatcher.run(temp_dir.path(), |_, _| {}).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(summary, DispatchSummary::default());
}
