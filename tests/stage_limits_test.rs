use wellpath::stage::Axis;
use wellpath::testing::{standard_96_well, SbsFormat, SyntheticPlate};
use wellpath::{
    sequence, traverse, AxisRange, AxisTarget, LimitPolicy, LimitedStage, Pattern,
    PositioningStage, Point3, SimulatedStage, StageError, WellPathError,
};

fn limited() -> LimitedStage<SimulatedStage> {
    LimitedStage::new(
        SimulatedStage::with_home(Point3::new(0.0, 80.0, 95.0)),
        LimitPolicy::default(),
    )
}

#[test]
fn test_traverse_visits_sequence_at_sequence_z() {
    let cal = standard_96_well().tilted(0.0, 0.01).calibration("tilted").unwrap();
    let seq = sequence(&cal, &["B1", "A1", "A2"], Pattern::Snake);
    let z = seq.z.unwrap();

    let mut stage = limited();
    let mut visited = Vec::new();
    let reached = traverse(&mut stage, &seq, Some(3000.0), |i, step| {
        visited.push((i, step.label.clone()));
        Ok::<(), WellPathError>(())
    })
    .unwrap();

    assert_eq!(reached, 3);
    assert_eq!(
        visited,
        vec![(0, "A1".to_string()), (1, "A2".to_string()), (2, "B1".to_string())]
    );
    let history = stage.inner().history();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|p| p.z == z));
    assert_eq!((history[2].x, history[2].y), (seq.steps[2].x(), seq.steps[2].y()));
    assert_eq!(stage.inner().feedrate(), Some(3000.0));
}

#[test]
fn test_traverse_stops_at_out_of_limit_well() {
    // Origin near the X limit, so the right half of the plate is unreachable.
    let cal = SyntheticPlate::new(SbsFormat::Wells96, Point3::new(150.0, 90.0, 120.0))
        .calibration("offset")
        .unwrap();
    let seq = sequence(&cal, cal.labels(), Pattern::Raster);

    let mut stage = limited();
    let mut arrivals = 0;
    let err = traverse(&mut stage, &seq, None, |_, _| {
        arrivals += 1;
        Ok::<(), WellPathError>(())
    })
    .unwrap_err();

    // Columns 1-6 sit at X 150..195; column 7 is at 204.
    assert_eq!(arrivals, 6);
    match err {
        WellPathError::Stage(StageError::OutOfLimits { axis, max, .. }) => {
            assert_eq!(axis, Axis::X);
            assert_eq!(max, 200.0);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(stage.inner().history().len(), 6);
}

#[test]
fn test_callback_error_stops_traverse() {
    let cal = standard_96_well().calibration("plate").unwrap();
    let seq = sequence(&cal, cal.labels(), Pattern::Snake);
    let mut stage = SimulatedStage::new();

    let result = traverse(&mut stage, &seq, None, |i, _| {
        if i == 2 {
            Err(WellPathError::Io("camera unplugged".to_string()))
        } else {
            Ok(())
        }
    });
    assert!(matches!(result, Err(WellPathError::Io(_))));
    assert_eq!(stage.history().len(), 3);
}

#[test]
fn test_relative_moves_checked_against_current_position() {
    let mut stage = limited();
    stage.move_absolute(AxisTarget::xy(195.0, 100.0), None).unwrap();

    let step = AxisTarget {
        x: Some(10.0),
        ..AxisTarget::default()
    };
    let err = stage.move_relative(step, None).unwrap_err();
    assert!(matches!(err, StageError::OutOfLimits { axis: Axis::X, value, .. } if value == 205.0));
    assert_eq!(stage.position().unwrap().x, 195.0);

    let back = AxisTarget {
        x: Some(-5.0),
        z: Some(10.0),
        ..AxisTarget::default()
    };
    stage.move_relative(back, None).unwrap();
    assert_eq!(stage.position().unwrap(), Point3::new(190.0, 100.0, 105.0));
}

#[test]
fn test_custom_policy() {
    let policy = LimitPolicy {
        x: AxisRange::new(-10.0, 10.0),
        y: AxisRange::new(-10.0, 10.0),
        z: AxisRange::new(0.0, 5.0),
    };
    let mut stage = LimitedStage::new(SimulatedStage::new(), policy);
    stage.home().unwrap();
    assert!(stage.move_absolute(AxisTarget::xyz(Point3::new(-10.0, 10.0, 5.0)), None).is_ok());
    assert!(stage.move_absolute(AxisTarget::xyz(Point3::new(0.0, 0.0, 5.1)), None).is_err());
    assert_eq!(stage.policy().z.max, 5.0);
}
