#[cfg(test)]
mod error_tests {
    use std::error::Error;
    use wellpath::stage::Axis;
    use wellpath::{StageError, WellPathError};

    #[test]
    fn test_validation_error_names_field() {
        let error = WellPathError::validation("width", "grid width must be at least 1");
        assert_eq!(
            error.to_string(),
            "Validation error in `width`: grid width must be at least 1"
        );
        assert_eq!(error.field(), Some("width"));
    }

    #[test]
    fn test_data_integrity_error_names_field() {
        let error = WellPathError::data_integrity("labels[4]", "duplicate label `B1`");
        assert!(error.to_string().contains("Data integrity error"));
        assert!(error.to_string().contains("labels[4]"));
        assert_eq!(error.field(), Some("labels[4]"));
    }

    #[test]
    fn test_error_debug_format() {
        let error = WellPathError::Io("Debug test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("Io"));
        assert!(debug_str.contains("Debug test"));
        assert_eq!(error.field(), None);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: WellPathError = io.into();
        assert!(matches!(error, WellPathError::Io(ref msg) if msg.contains("gone")));
    }

    #[test]
    fn test_stage_error_wraps_with_source() {
        let stage = StageError::OutOfLimits {
            axis: Axis::Z,
            value: 180.0,
            min: 95.0,
            max: 170.0,
        };
        assert_eq!(stage.to_string(), "Z target 180 is outside limits [95, 170]");

        let error: WellPathError = stage.clone().into();
        assert!(error.to_string().starts_with("Stage error: "));
        assert!(error.source().is_some());
        assert!(matches!(error, WellPathError::Stage(ref inner) if *inner == stage));
    }

    #[test]
    fn test_all_error_variants() {
        let errors = vec![
            WellPathError::validation("pattern", "unknown pattern"),
            WellPathError::data_integrity("labels", "count mismatch"),
            WellPathError::Io("IO error".to_string()),
            WellPathError::Serialization("Serialization error".to_string()),
            WellPathError::Stage(StageError::Motion("stalled".to_string())),
        ];

        for error in errors {
            let display_str = error.to_string();
            assert!(!display_str.is_empty());

            let debug_str = format!("{:?}", error);
            assert!(!debug_str.is_empty());

            let _error_trait: &dyn Error = &error;
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<WellPathError>();
        assert_send_sync::<StageError>();
    }
}
