/*!
 * Tests for image names as time-range carriers
 */

use hardsub_ocr::app_config::ExportConfig;
use hardsub_ocr::channel::Channel;
use hardsub_ocr::detection::Interval;
use hardsub_ocr::export::ImageExporter;
use hardsub_ocr::subtitle::{ImageName, timecode_sort_key};
use hardsub_ocr::timecode::{FrameRate, Timecode};

/// Test that exported names decode back to the frame times within 10 ms
#[test]
fn test_exportedName_roundTrip_shouldStayWithinTenMilliseconds() {
    let frame_rate = FrameRate::new(24000, 1001).unwrap();
    let exporter = ImageExporter::new("unused", frame_rate, &ExportConfig::default());

    for start_frame in (0..200_000u64).step_by(997) {
        let interval = Interval {
            start_frame,
            end_frame: start_frame + 37,
            channel: Channel::Top,
        };
        let name = format!("{}.jpg", exporter.image_name(&interval).stem());
        let decoded = ImageName::decode(&name).unwrap();

        let exact_start = start_frame * 1001 * 1000 / 24000;
        let exact_end = (start_frame + 37) * 1001 * 1000 / 24000;
        assert!(decoded.start.as_millis().abs_diff(exact_start) <= 10, "{}", name);
        assert!(decoded.end.as_millis().abs_diff(exact_end) <= 10, "{}", name);
        assert_eq!(decoded.channel, Channel::Top);
    }
}

/// Test that names past one hour keep unpadded hours
#[test]
fn test_stem_pastOneHour_shouldDecode() {
    let name = ImageName::new(
        Channel::Bottom,
        Timecode::from_millis(3_723_450),
        Timecode::from_millis(36_000_000),
    );
    assert_eq!(name.stem(), "bot_1_02_03_45__10_00_00_00");
    assert_eq!(ImageName::decode(&format!("{}_2.jpg", name.stem())).unwrap(), name);
}

/// Test ordering of a mixed result set
#[test]
fn test_timecodeSortKey_shouldOrderByStartThenChannel() {
    let mut names = vec![
        "junk.png",
        "top_0_00_05_00__0_00_06_00.jpg",
        "0_00_01_00__0_00_02_00.jpg",
        "bot_0_00_05_00__0_00_06_00.jpg",
    ];
    names.sort_by_key(|name| timecode_sort_key(name));

    assert_eq!(
        names,
        vec![
            "0_00_01_00__0_00_02_00.jpg",
            "bot_0_00_05_00__0_00_06_00.jpg",
            "top_0_00_05_00__0_00_06_00.jpg",
            "junk.png",
        ]
    );
}
