use crate::params::{self, display_value, parse_display};
use crate::payload::TemplateInvocation;
use crate::*;
use serde_json::json;

fn statue() -> CoordinateState {
    CoordinateState::placeholder(false)
        .with_coordinates(40.68927, -74.04454)
        .unwrap()
}

fn pairs(params: &TemplateParams) -> Vec<(&str, &str)> {
    params
        .iter()
        .map(|(k, v)| (k.as_str(), v.wt.as_str()))
        .collect()
}

fn template(value: serde_json::Value) -> TemplateInvocation {
    serde_json::from_value(value).unwrap()
}

#[test]
fn decimal_parameters_use_five_fractional_digits() {
    let mut state = statue();
    state.set_display(false, false);
    let params = build_parameters(&state);
    assert_eq!(pairs(&params), vec![("1", "40.68927"), ("2", "-74.04454")]);
}

#[test]
fn decimal_parameters_round_ties_like_to_fixed() {
    let mut state = CoordinateState::placeholder(false)
        .with_coordinates(0.015625, -0.015625)
        .unwrap();
    state.set_display(false, false);
    assert_eq!(
        pairs(&build_parameters(&state)),
        vec![("1", "0.01563"), ("2", "-0.01563")]
    );
}

#[test]
fn dms_parameters_round_seconds() {
    let mut state = statue();
    state.set_use_dms(true);
    state.set_display(false, false);
    let params = build_parameters(&state);
    assert_eq!(
        pairs(&params),
        vec![
            ("1", "40"),
            ("2", "41"),
            ("3", "21"),
            ("4", "N"),
            ("5", "74"),
            ("6", "2"),
            ("7", "40"),
            ("8", "W"),
        ]
    );
}

#[test]
fn dms_parameters_are_recomputed_from_typed_fields() {
    let mut state = CoordinateState::placeholder(false);
    state.set_use_dms(true);
    state
        .set_dms(
            Dms::new(Sign::Negative, 33.0, 52.0, 7.68),
            Dms::new(Sign::Positive, 151.0, 12.0, 30.25),
        )
        .unwrap();
    // The editor fields keep the typed fractional seconds.
    assert_eq!(state.dms().0.seconds, 7.68);

    let params = build_parameters(&state);
    let values: Vec<&str> = params.values().map(|v| v.wt.as_str()).collect();
    assert_eq!(
        &values[..8],
        &["33", "52", "8", "S", "151", "12", "30", "E"]
    );
}

#[test]
fn dms_parameters_normalize_overflowing_minutes_and_seconds() {
    let text = |d, m, s, h| DmsText {
        degrees: d,
        minutes: m,
        seconds: s,
        hemisphere: h,
    };
    let mut state = CoordinateState::placeholder(false);
    state.set_use_dms(true);
    assert!(state.set_dms_text(text("40", "75", "90", "N"), text("74", "2", "40", "W")));
    assert!((state.latitude() - 41.275).abs() < 1e-9);

    let params = build_parameters(&state);
    let values: Vec<&str> = params.values().map(|v| v.wt.as_str()).collect();
    assert_eq!(
        &values[..8],
        &["41", "16", "30", "N", "74", "2", "40", "W"]
    );
}

#[test]
fn display_key_follows_the_flags() {
    assert_eq!(display_value(true, true), Some("inline,title"));
    assert_eq!(display_value(false, true), Some("title"));
    assert_eq!(display_value(true, false), None);
    assert_eq!(display_value(false, false), None);

    let mut state = statue();
    state.set_display(false, false);
    assert!(!build_parameters(&state).contains_key("display"));

    state.set_display(true, true);
    assert_eq!(build_parameters(&state)["display"].wt, "inline,title");

    // Fresh sessions default to title display.
    assert_eq!(build_parameters(&statue())["display"].wt, "title");
}

#[test]
fn extra_and_named_parameters_follow_positionals_in_order() {
    let mut state = statue();
    state.set_extra_parameters(Some("type:landmark_region:US-NY"));
    state.set_name(Some("Statue of Liberty"));
    state.set_notes(Some("<ref>NPS</ref>"));
    state.set_qid(Some("Q9202"));

    let params = build_parameters(&state);
    assert_eq!(
        pairs(&params),
        vec![
            ("1", "40.68927"),
            ("2", "-74.04454"),
            ("3", "type:landmark_region:US-NY"),
            ("display", "title"),
            ("name", "Statue of Liberty"),
            ("notes", "<ref>NPS</ref>"),
            ("qid", "Q9202"),
        ]
    );
}

#[test]
fn precision_is_configurable() {
    let params = params::build_parameters_with_precision(&statue(), 2);
    assert_eq!(params["1"].wt, "40.69");
    assert_eq!(params["2"].wt, "-74.04");
}

#[test]
fn negative_zero_prints_unsigned() {
    let state = CoordinateState::placeholder(false)
        .with_coordinates(-0.0, -0.0)
        .unwrap();
    let params = build_parameters(&state);
    assert_eq!(params["1"].wt, "0.00000");
    assert_eq!(params["2"].wt, "0.00000");
}

#[test]
fn parse_display_accepts_shorthands() {
    assert_eq!(parse_display("inline,title"), (true, true));
    assert_eq!(parse_display("title"), (false, true));
    assert_eq!(parse_display("inline"), (true, false));
    assert_eq!(parse_display("it"), (true, true));
    assert_eq!(parse_display("t"), (false, true));
    assert_eq!(parse_display(" Inline , T "), (true, true));
    assert_eq!(parse_display("nowhere"), (false, false));
}

#[test]
fn existing_coordinates_read_template_options() {
    let coord = template(json!({
        "target": { "wt": "Coord", "href": "./Template:Coord" },
        "params": {
            "1": { "wt": "40.68927" },
            "2": { "wt": "-74.04454" },
            "3": { "wt": "type:landmark_scale:2000" },
            "display": { "wt": "inline,title" },
            "name": { "wt": "Liberty Island" },
            "format": { "wt": "dms" },
            "qid": { "wt": "Q9202" }
        },
        "i": 0
    }));

    let existing = ExistingCoordinates::from_template(&coord, false);
    assert_eq!(
        existing,
        ExistingCoordinates {
            use_dms: true,
            display: Some((true, true)),
            extra_parameters: Some("type:landmark_scale:2000".to_string()),
            name: Some("Liberty Island".to_string()),
            notes: None,
            qid: Some("Q9202".to_string()),
        }
    );
}

#[test]
fn existing_format_falls_back_to_render_hint() {
    let without_format = template(json!({
        "target": { "wt": "Coord", "href": "./Template:Coord" },
        "params": { "1": { "wt": "1" }, "2": { "wt": "2" } }
    }));
    assert!(ExistingCoordinates::from_template(&without_format, true).use_dms);
    assert!(!ExistingCoordinates::from_template(&without_format, false).use_dms);

    let decimal_format = template(json!({
        "target": { "wt": "Coord", "href": "./Template:Coord" },
        "params": { "format": { "wt": "dec" } }
    }));
    assert!(!ExistingCoordinates::from_template(&decimal_format, true).use_dms);
}

#[test]
fn coordinates_from_params_reads_every_accepted_shape() {
    let decimal = template(json!({
        "target": { "wt": "Coord", "href": "./Template:Coord" },
        "params": { "2": { "wt": "-74.04454" }, "1": { "wt": " 40.68927 " } }
    }));
    assert_eq!(
        coordinates_from_params(&decimal),
        Some((40.68927, -74.04454))
    );

    let full_dms = template(json!({
        "target": { "wt": "Coord", "href": "./Template:Coord" },
        "params": {
            "1": { "wt": "40" }, "2": { "wt": "41" }, "3": { "wt": "21" }, "4": { "wt": "N" },
            "5": { "wt": "74" }, "6": { "wt": "2" }, "7": { "wt": "40" }, "8": { "wt": "W" },
            "9": { "wt": "type:landmark" }
        }
    }));
    let (lat, lon) = coordinates_from_params(&full_dms).unwrap();
    assert!((lat - 40.689167).abs() < 1e-6);
    assert!((lon + 74.044444).abs() < 1e-6);

    let degrees_only = template(json!({
        "target": { "wt": "Coord", "href": "./Template:Coord" },
        "params": {
            "1": { "wt": "10" }, "2": { "wt": "s" }, "3": { "wt": "20.5" }, "4": { "wt": "e" }
        }
    }));
    assert_eq!(coordinates_from_params(&degrees_only), Some((-10.0, 20.5)));

    let degrees_minutes = template(json!({
        "target": { "wt": "Coord", "href": "./Template:Coord" },
        "params": {
            "1": { "wt": "51" }, "2": { "wt": "30" }, "3": { "wt": "N" },
            "4": { "wt": "0" }, "5": { "wt": "6" }, "6": { "wt": "W" }
        }
    }));
    assert_eq!(coordinates_from_params(&degrees_minutes), Some((51.5, -0.1)));
}

#[test]
fn coordinates_from_params_rejects_malformed_input() {
    let out_of_range = template(json!({
        "target": { "wt": "Coord", "href": "./Template:Coord" },
        "params": { "1": { "wt": "91" }, "2": { "wt": "0" } }
    }));
    assert_eq!(coordinates_from_params(&out_of_range), None);

    let swapped_hemispheres = template(json!({
        "target": { "wt": "Coord", "href": "./Template:Coord" },
        "params": {
            "1": { "wt": "10" }, "2": { "wt": "E" }, "3": { "wt": "20" }, "4": { "wt": "N" }
        }
    }));
    assert_eq!(coordinates_from_params(&swapped_hemispheres), None);

    let words = template(json!({
        "target": { "wt": "Coord", "href": "./Template:Coord" },
        "params": { "1": { "wt": "north" }, "2": { "wt": "pole" } }
    }));
    assert_eq!(coordinates_from_params(&words), None);
}
