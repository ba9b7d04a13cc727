use crate::*;

fn text<'a>(degrees: &'a str, minutes: &'a str, seconds: &'a str, hemisphere: &'a str) -> DmsText<'a> {
    DmsText {
        degrees,
        minutes,
        seconds,
        hemisphere,
    }
}

#[test]
fn placeholder_starts_at_origin_with_title_display() {
    let state = CoordinateState::placeholder(true);
    assert_eq!((state.latitude(), state.longitude()), (0.0, 0.0));
    assert!(state.title);
    assert!(!state.inline);
    assert!(!state.use_dms);
    assert!(state.from_missing_template);
    assert_eq!(CoordinateState::default(), CoordinateState::placeholder(false));
}

#[test]
fn decimal_hook_rejects_out_of_range_values() {
    let mut state = CoordinateState::placeholder(false);
    state.set_decimal(12.5, 100.25).unwrap();

    let err = state.set_decimal(90.5, 0.0).unwrap_err();
    assert!(matches!(
        err,
        Error::CoordinateOutOfRange {
            axis: Axis::Latitude,
            ..
        }
    ));
    assert!(state.set_decimal(0.0, -180.01).is_err());
    assert!(state.set_decimal(f64::NAN, 0.0).is_err());

    assert_eq!((state.latitude(), state.longitude()), (12.5, 100.25));
}

#[test]
fn decimal_text_hook_keeps_previous_value_on_bad_input() {
    let mut state = CoordinateState::placeholder(false);
    assert!(state.set_decimal_text("-37.7891", "175.2799"));
    assert_eq!((state.latitude(), state.longitude()), (-37.7891, 175.2799));

    assert!(!state.set_decimal_text("south", "175"));
    assert!(!state.set_decimal_text("-91", "175"));
    assert_eq!((state.latitude(), state.longitude()), (-37.7891, 175.2799));

    assert_eq!(
        state.decimal_text(4),
        ("-37.7891".to_string(), "175.2799".to_string())
    );
}

#[test]
fn dms_text_hook_parses_symbols_and_hemispheres() {
    let mut state = CoordinateState::placeholder(false);
    assert!(state.set_dms_text(text("40°", "41′", "21″", "N"), text("74", "2", "40", "w")));
    assert!((state.latitude() - 40.689167).abs() < 1e-6);
    assert!((state.longitude() + 74.044444).abs() < 1e-6);

    let (lat, lon) = state.dms();
    assert_eq!(lat, Dms::new(Sign::Positive, 40.0, 41.0, 21.0));
    assert_eq!(lon, Dms::new(Sign::Negative, 74.0, 2.0, 40.0));
}

#[test]
fn dms_text_hook_ignores_invalid_fields() {
    let mut state = CoordinateState::placeholder(false)
        .with_coordinates(1.0, 2.0)
        .unwrap();

    // Longitude hemisphere on the latitude axis.
    assert!(!state.set_dms_text(text("10", "0", "0", "E"), text("20", "0", "0", "E")));
    // Malformed seconds.
    assert!(!state.set_dms_text(text("10", "0", "1.2.3", "N"), text("20", "0", "0", "E")));
    // Out of range once combined.
    assert!(!state.set_dms_text(text("90", "30", "0", "S"), text("20", "0", "0", "E")));

    assert_eq!((state.latitude(), state.longitude()), (1.0, 2.0));
}

#[test]
fn empty_dms_fields_read_as_zero_north_east() {
    let mut state = CoordinateState::placeholder(false);
    assert!(state.set_dms_text(text("5", "", "", ""), text("", "30", "", "")));
    assert_eq!(state.latitude(), 5.0);
    assert_eq!(state.longitude(), 0.5);
}

#[test]
fn user_entered_dms_survives_until_decimal_edit() {
    let mut state = CoordinateState::placeholder(false);
    let lat = Dms::new(Sign::Positive, 48.0, 51.0, 29.6);
    let lon = Dms::new(Sign::Positive, 2.0, 17.0, 40.2);
    state.set_dms(lat, lon).unwrap();
    assert_eq!(state.dms(), (lat, lon));

    state.set_decimal(48.858222, 2.2945).unwrap();
    let (lat, lon) = state.dms();
    assert_eq!(lat, Dms::new(Sign::Positive, 48.0, 51.0, 30.0));
    assert_eq!(lon, Dms::new(Sign::Positive, 2.0, 17.0, 40.0));
}

#[test]
fn text_setters_treat_empty_as_absent() {
    let mut state = CoordinateState::placeholder(false);
    state.set_name(Some("Eiffel Tower"));
    state.set_qid(Some(""));
    state.set_notes(None);
    state.set_extra_parameters(Some("type:landmark"));
    assert_eq!(state.name.as_deref(), Some("Eiffel Tower"));
    assert_eq!(state.qid, None);
    assert_eq!(state.notes, None);
    assert_eq!(state.extra_parameters.as_deref(), Some("type:landmark"));

    state.set_name(Some(""));
    assert_eq!(state.name, None);
}

#[test]
fn from_existing_copies_template_options() {
    let existing = ExistingCoordinates {
        use_dms: true,
        display: Some((true, false)),
        extra_parameters: Some("region:FR".to_string()),
        name: None,
        notes: Some("note".to_string()),
        qid: Some("Q243".to_string()),
    };
    let state = CoordinateState::from_existing(existing, 48.8584, 2.2945).unwrap();
    assert!(state.use_dms);
    assert!(state.inline);
    assert!(!state.title);
    assert!(!state.from_missing_template);
    assert_eq!(state.extra_parameters.as_deref(), Some("region:FR"));
    assert_eq!(state.notes.as_deref(), Some("note"));
    assert_eq!(state.qid.as_deref(), Some("Q243"));
    assert_eq!((state.latitude(), state.longitude()), (48.8584, 2.2945));

    let without_display = ExistingCoordinates::default();
    let state = CoordinateState::from_existing(without_display, 0.0, 0.0).unwrap();
    assert!(state.title);
    assert!(!state.inline);
}
