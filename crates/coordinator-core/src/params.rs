//! `{{Coord}}` parameters: building them from a [`CoordinateState`] and reading them back from
//! an existing template.

use crate::dms::{self, Axis, Dms, Hemisphere};
use crate::payload::{ParamValue, TemplateInvocation, TemplateParams};
use crate::state::CoordinateState;
use regex::Regex;

/// Fractional digits of decimal coordinates written to the template.
pub const DECIMAL_PRECISION: usize = 5;

fn coordinate_parameter_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"type|scale|dim|region|globe|source").expect("valid regex"))
}

/// Builds the full parameter map for `state` with [`DECIMAL_PRECISION`].
pub fn build_parameters(state: &CoordinateState) -> TemplateParams {
    build_parameters_with_precision(state, DECIMAL_PRECISION)
}

/// Builds the full parameter map for `state`.
///
/// Positional parameters come first (`"1"`, `"2"`, ...), followed by `display`, `name`, `notes`
/// and `qid` when applicable. The result replaces the template's parameters wholesale.
pub fn build_parameters_with_precision(
    state: &CoordinateState,
    decimal_precision: usize,
) -> TemplateParams {
    let mut positional: Vec<String> = Vec::with_capacity(9);
    if state.use_dms {
        // Typed DMS fields only feed the editor display; saved values come from the decimal pair.
        let lat = dms::to_dms(state.latitude()).unwrap_or_default();
        let lon = dms::to_dms(state.longitude()).unwrap_or_default();
        push_dms(&mut positional, &lat, Axis::Latitude);
        push_dms(&mut positional, &lon, Axis::Longitude);
    } else {
        positional.push(dms::format_fixed(state.latitude(), decimal_precision));
        positional.push(dms::format_fixed(state.longitude(), decimal_precision));
    }
    if let Some(extra) = &state.extra_parameters {
        positional.push(extra.clone());
    }

    let mut params: TemplateParams = positional
        .into_iter()
        .enumerate()
        .map(|(i, wt)| ((i + 1).to_string(), ParamValue::wikitext(wt)))
        .collect();

    if let Some(display) = display_value(state.inline, state.title) {
        params.insert("display".to_string(), ParamValue::wikitext(display));
    }
    for (key, value) in [
        ("name", &state.name),
        ("notes", &state.notes),
        ("qid", &state.qid),
    ] {
        if let Some(value) = value {
            params.insert(key.to_string(), ParamValue::wikitext(value.clone()));
        }
    }
    params
}

fn push_dms(out: &mut Vec<String>, value: &Dms, axis: Axis) {
    out.push(dms::format_js_number(value.degrees));
    out.push(dms::format_js_number(value.minutes));
    out.push(dms::format_js_number(value.seconds));
    out.push(value.hemisphere(axis).letter().to_string());
}

/// The `display` value for the given flags. Inline-only (and neither flag) leave the key out and
/// defer to the template's default.
pub fn display_value(inline: bool, title: bool) -> Option<&'static str> {
    match (inline, title) {
        (true, true) => Some("inline,title"),
        (false, true) => Some("title"),
        _ => None,
    }
}

/// Parses a `display` value into `(inline, title)`. Accepts the long forms and the `i`, `t`,
/// `it`/`ti` shorthands.
pub fn parse_display(value: &str) -> (bool, bool) {
    let mut inline = false;
    let mut title = false;
    for token in value.split(',') {
        match token.trim().to_ascii_lowercase().as_str() {
            "inline" | "i" => inline = true,
            "title" | "t" => title = true,
            "it" | "ti" => {
                inline = true;
                title = true;
            }
            _ => {}
        }
    }
    (inline, title)
}

/// Options carried by an existing `{{Coord}}` template, used to pre-populate the editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExistingCoordinates {
    pub use_dms: bool,
    /// `(inline, title)` when the template has a `display` parameter.
    pub display: Option<(bool, bool)>,
    pub extra_parameters: Option<String>,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub qid: Option<String>,
}

impl ExistingCoordinates {
    /// Reads the editable options of `template`. `renders_dms` is the page's render-time format,
    /// used when the template has no `format` parameter.
    pub fn from_template(template: &TemplateInvocation, renders_dms: bool) -> Self {
        let use_dms = match template.param("format") {
            Some(format) => format.trim().eq_ignore_ascii_case("dms"),
            None => renders_dms,
        };
        let display = template.param("display").map(parse_display);
        let extra_parameters = template
            .positional_params()
            .into_iter()
            .find(|(_, wt)| coordinate_parameter_regex().is_match(wt))
            .map(|(_, wt)| wt.to_string());

        Self {
            use_dms,
            display,
            extra_parameters,
            name: template.param("name").map(str::to_string),
            notes: template.param("notes").map(str::to_string),
            qid: template.param("qid").map(str::to_string),
        }
    }
}

/// Decodes the coordinate written in a template's positional parameters.
///
/// Accepts `lat|lon`, `d|H|d|H`, `d|m|H|d|m|H` and `d|m|s|H|d|m|s|H`. Returns `None` for anything
/// else, or when the result is out of range.
pub fn coordinates_from_params(template: &TemplateInvocation) -> Option<(f64, f64)> {
    let values: Vec<&str> = template
        .positional_params()
        .into_iter()
        .map(|(_, wt)| wt.trim())
        .collect();

    let (lat, lon) = match values.iter().position(|v| is_hemisphere(v, Axis::Latitude)) {
        Some(lat_end) => {
            let lat = read_dms(&values, 0, lat_end, Axis::Latitude)?;
            let lon_start = lat_end + 1;
            let lon_end = values
                .iter()
                .skip(lon_start)
                .position(|v| is_hemisphere(v, Axis::Longitude))?
                + lon_start;
            let lon = read_dms(&values, lon_start, lon_end, Axis::Longitude)?;
            (lat, lon)
        }
        None => {
            let lat = values.first()?.parse::<f64>().ok()?;
            let lon = values.get(1)?.parse::<f64>().ok()?;
            (lat, lon)
        }
    };

    (lat.is_finite()
        && lon.is_finite()
        && Axis::Latitude.contains(lat)
        && Axis::Longitude.contains(lon))
    .then_some((lat, lon))
}

fn is_hemisphere(value: &str, axis: Axis) -> bool {
    Hemisphere::from_letter(value).is_some_and(|h| h.axis() == axis)
}

/// Reads `values[start..end]` as 1-3 DMS components followed by the hemisphere at `end`.
fn read_dms(values: &[&str], start: usize, end: usize, axis: Axis) -> Option<f64> {
    let components = values.get(start..end)?;
    if components.is_empty() || components.len() > 3 {
        return None;
    }
    let mut parsed = [0.0f64; 3];
    for (slot, raw) in parsed.iter_mut().zip(components) {
        *slot = raw.parse::<f64>().ok()?;
    }
    let hemisphere = Hemisphere::from_letter(values.get(end)?)?;
    if hemisphere.axis() != axis {
        return None;
    }
    Some(Dms::new(hemisphere.sign(), parsed[0], parsed[1], parsed[2]).to_decimal())
}
