use std::io::Write;

use station_vision::chart::{self, ChartLayout, ChartStyle, VIRIDIS_MAX};
use station_vision::codec::{self, ImageEncoding};
use station_vision::config::ImageSettings;
use station_vision::ScoreTable;

#[test]
fn baseline_chart_has_one_bar_per_class_in_order() {
    let table = ScoreTable::mission_baseline();
    let layout = ChartLayout::compute(&table, &ChartStyle::default()).expect("layout");

    let classes: Vec<&str> = layout.bars.iter().map(|b| b.class.as_str()).collect();
    assert_eq!(
        classes,
        [
            "OxygenTank",
            "NitrogenTank",
            "FirstAidBox",
            "FireAlarm",
            "SafetySwitchPanel",
            "EmergencyPhone",
            "FireExtinguisher",
        ]
    );
    let labels: Vec<&str> = layout.bars.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, ["0.77", "0.77", "0.75", "0.66", "0.73", "0.60", "0.81"]);

    let best: Vec<&str> = layout
        .bars
        .iter()
        .filter(|b| b.color == VIRIDIS_MAX)
        .map(|b| b.class.as_str())
        .collect();
    assert_eq!(best, ["FireExtinguisher"]);
}

#[test]
fn loads_scores_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp scores");
    file.write_all(br#"[{"class": "OxygenTank", "score": 0.5}, {"class": "FireAlarm", "score": 0.25}]"#)
        .expect("write scores");

    let table = ScoreTable::load_json(file.path()).expect("load scores");
    assert_eq!(table.len(), 2);
    assert_eq!(table.entries()[1].class, "FireAlarm");
    assert_eq!(table.normalized(0.5), 1.0);
}

#[test]
fn rejects_out_of_range_json_scores() {
    let mut file = tempfile::NamedTempFile::new().expect("temp scores");
    file.write_all(br#"[{"class": "OxygenTank", "score": 77.2}]"#)
        .expect("write scores");
    let err = ScoreTable::load_json(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("[0, 1]"), "{err:#}");
}

#[test]
fn renders_and_writes_png() {
    let img = chart::plot_scores(
        &["OxygenTank", "FireAlarm", "EmergencyPhone"],
        &[0.4, 0.5, 0.2],
        &ChartStyle {
            width: 640,
            height: 400,
            ..ChartStyle::default()
        },
        None,
    )
    .expect("render");
    assert_eq!(img.dimensions(), (640, 400));

    let dir = tempfile::tempdir().expect("temp dir");
    let out = dir.path().join("scores.png");
    let settings = ImageSettings {
        encoding: ImageEncoding::from_path(&out).expect("encoding"),
        quality: 90,
    };
    codec::write(&img, &settings, &out).expect("write chart");

    let decoded = image::open(&out).expect("decode chart").into_rgb8();
    assert_eq!(decoded.dimensions(), (640, 400));
    assert_eq!(decoded.as_raw(), img.as_raw());
}

#[test]
fn mismatched_inputs_fail_before_rendering() {
    let err = chart::plot_scores(&["OxygenTank"], &[0.4, 0.5], &ChartStyle::default(), None)
        .unwrap_err();
    assert!(err.to_string().contains("differ in length"));
}
