use proptest::prelude::*;
use std::collections::HashSet;
use wellpath::testing::{SbsFormat, SyntheticPlate};
use wellpath::{sequence, CalibrationRecord, GridSize, Pattern, PlateCorners, Point3};

fn scenario() -> CalibrationRecord {
    let corners = PlateCorners::new(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 10.0, 0.0),
        Point3::new(10.0, 0.0, 0.0),
        Point3::new(10.0, 10.0, 1.0),
    );
    CalibrationRecord::new("scenario", corners, GridSize::new(2, 2).unwrap()).unwrap()
}

fn plate(width: usize, depth: usize) -> CalibrationRecord {
    let corners = PlateCorners::new(
        Point3::new(0.0, 0.0, 100.0),
        Point3::new(0.0, 9.0 * (depth as f64 - 1.0), 100.0),
        Point3::new(9.0 * (width as f64 - 1.0), 0.0, 100.0),
        Point3::new(9.0 * (width as f64 - 1.0), 9.0 * (depth as f64 - 1.0), 100.0),
    );
    CalibrationRecord::new("plate", corners, GridSize::new(width, depth).unwrap()).unwrap()
}

#[test]
fn test_scenario_positions_and_labels() {
    let cal = scenario();
    assert_eq!(
        cal.positions(),
        &[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
            Point3::new(10.0, 10.0, 1.0),
        ]
    );
    assert_eq!(cal.labels(), &["A1", "A2", "B1", "B2"]);
}

#[test]
fn test_scenario_raster() {
    let cal = scenario();
    let seq = sequence(&cal, cal.labels(), Pattern::Raster);
    assert_eq!(seq.labels(), vec!["A1", "A2", "B1", "B2"]);
    let positions: Vec<Point3> = seq.steps.iter().map(|s| s.position).collect();
    assert_eq!(positions, cal.positions());
}

#[test]
fn test_scenario_snake() {
    let cal = scenario();
    let seq = sequence(&cal, cal.labels(), Pattern::Snake);
    assert_eq!(seq.labels(), vec!["A1", "A2", "B2", "B1"]);
    let xy: Vec<(f64, f64)> = seq.steps.iter().map(|s| (s.x(), s.y())).collect();
    assert_eq!(xy, vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
    assert_eq!(seq.z, Some(0.0));
}

#[test]
fn test_selection_order_does_not_matter() {
    let cal = plate(12, 8);
    let forward = sequence(&cal, cal.labels(), Pattern::Snake);
    let reversed: Vec<String> = cal.labels().iter().rev().cloned().collect();
    let backward = sequence(&cal, &reversed, Pattern::Snake);
    assert_eq!(forward.labels(), backward.labels());
}

#[test]
fn test_unknown_wells_are_reported_not_fatal() {
    let cal = plate(12, 8);
    let seq = sequence(&cal, &["A1", "I1", "A13", "H12"], Pattern::Raster);
    assert_eq!(seq.labels(), vec!["A1", "H12"]);
    assert_eq!(seq.skipped, vec!["I1", "A13"]);
}

#[test]
fn test_all_unknown_gives_empty_sequence() {
    let cal = plate(2, 2);
    let seq = sequence(&cal, &["Q7"], Pattern::Raster);
    assert!(seq.is_empty());
    assert_eq!(seq.z, None);
    assert_eq!(seq.skipped, vec!["Q7"]);
}

#[test]
fn test_snake_on_tilted_plate_uses_first_calibration_well_z() {
    let cal = SyntheticPlate::new(SbsFormat::Wells24, Point3::new(10.0, 90.0, 100.0))
        .tilted(0.01, 0.0)
        .calibration("tilted")
        .unwrap();
    let seq = sequence(&cal, &["D6", "A1"], Pattern::Snake);
    let d6 = cal.position_of("D6").unwrap();
    assert_eq!(seq.labels(), vec!["A1", "D6"]);
    assert_eq!(seq.z, Some(100.0));
    // Per-well Z is still available on each step.
    assert_eq!(seq.steps[1].position.z, d6.z);

    let seq = sequence(&cal, &["D6", "C2", "B4"], Pattern::Raster);
    assert_eq!(seq.z, Some(cal.position_of("B4").unwrap().z));
}

fn subset_strategy() -> impl Strategy<Value = (usize, usize, Vec<bool>)> {
    (1usize..14, 1usize..10).prop_flat_map(|(w, d)| {
        (Just(w), Just(d), proptest::collection::vec(any::<bool>(), w * d))
    })
}

proptest! {
    #[test]
    fn raster_is_strictly_increasing((w, d, mask) in subset_strategy()) {
        let cal = plate(w, d);
        let selected: Vec<&String> = cal.labels().iter().zip(&mask).filter(|(_, m)| **m).map(|(l, _)| l).collect();
        let seq = sequence(&cal, &selected, Pattern::Raster);
        for pair in seq.steps.windows(2) {
            prop_assert!(pair[0].index < pair[1].index);
        }
    }

    #[test]
    fn snake_rows_contiguous_and_alternating((w, d, mask) in subset_strategy()) {
        let cal = plate(w, d);
        let selected: Vec<&String> = cal.labels().iter().zip(&mask).filter(|(_, m)| **m).map(|(l, _)| l).collect();
        let seq = sequence(&cal, &selected, Pattern::Snake);

        let mut finished_rows = HashSet::new();
        for pair in seq.steps.windows(2) {
            let (a, b) = (pair[0].index, pair[1].index);
            if a.row == b.row {
                if a.row % 2 == 0 {
                    prop_assert!(a.col < b.col);
                } else {
                    prop_assert!(a.col > b.col);
                }
            } else {
                prop_assert!(a.row < b.row);
                prop_assert!(finished_rows.insert(a.row));
            }
        }
    }

    #[test]
    fn subset_visits_exactly_selected((w, d, mask) in subset_strategy(), snake in any::<bool>()) {
        let cal = plate(w, d);
        let selected: Vec<String> = cal.labels().iter().zip(&mask).filter(|(_, m)| **m).map(|(l, _)| l.clone()).collect();
        let pattern = if snake { Pattern::Snake } else { Pattern::Raster };
        let seq = sequence(&cal, &selected, pattern);

        prop_assert_eq!(seq.len(), selected.len());
        prop_assert!(seq.skipped.is_empty());
        let visited: HashSet<&str> = seq.steps.iter().map(|s| s.label.as_str()).collect();
        let wanted: HashSet<&str> = selected.iter().map(String::as_str).collect();
        prop_assert_eq!(visited, wanted);
        for step in &seq.steps {
            prop_assert_eq!(Some(step.position), cal.position_of(&step.label));
        }
    }
}
