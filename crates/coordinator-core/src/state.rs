//! The mutable coordinate state of one editing session.

use crate::dms::{self, Axis, Dms, Hemisphere};
use crate::params::ExistingCoordinates;
use crate::{Error, Result};

/// The coordinate being edited, plus the template options that travel with it.
///
/// The decimal pair is always stored. When the user last edited the DMS fields, the exact DMS
/// values they typed are kept as well and are what [`CoordinateState::dms`] returns; otherwise
/// the DMS projection is derived from the decimal pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateState {
    latitude: f64,
    longitude: f64,
    dms_source: Option<(Dms, Dms)>,
    pub use_dms: bool,
    pub inline: bool,
    pub title: bool,
    pub name: Option<String>,
    pub extra_parameters: Option<String>,
    pub notes: Option<String>,
    pub qid: Option<String>,
    pub from_missing_template: bool,
}

impl Default for CoordinateState {
    fn default() -> Self {
        Self::placeholder(false)
    }
}

/// Raw text of one axis' DMS input fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct DmsText<'a> {
    pub degrees: &'a str,
    pub minutes: &'a str,
    pub seconds: &'a str,
    pub hemisphere: &'a str,
}

impl DmsText<'_> {
    /// Parses the fields for `axis`. Degrees and minutes are whole numbers, seconds may be
    /// fractional. The hemisphere letter must belong to `axis`; an empty one reads as N/E.
    pub fn parse(&self, axis: Axis) -> Option<Dms> {
        let degrees = dms::parse_component(self.degrees, false)?;
        let minutes = dms::parse_component(self.minutes, false)?;
        let seconds = dms::parse_component(self.seconds, true)?;
        let sign = if self.hemisphere.trim().is_empty() {
            dms::Sign::Positive
        } else {
            let hemisphere = Hemisphere::from_letter(self.hemisphere)?;
            if hemisphere.axis() != axis {
                return None;
            }
            hemisphere.sign()
        };
        Some(Dms::new(sign, degrees, minutes, seconds))
    }
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.is_empty()).map(str::to_string)
}

fn check_range(axis: Axis, value: f64) -> Result<f64> {
    if value.is_finite() && axis.contains(value) {
        return Ok(value);
    }
    let (min, max) = axis.bounds();
    Err(Error::CoordinateOutOfRange {
        axis,
        value,
        min,
        max,
    })
}

impl CoordinateState {
    /// A fresh state at `0, 0` with the editor's default options (title display only).
    pub fn placeholder(from_missing_template: bool) -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            dms_source: None,
            use_dms: false,
            inline: false,
            title: true,
            name: None,
            extra_parameters: None,
            notes: None,
            qid: None,
            from_missing_template,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Result<Self> {
        self.set_decimal(latitude, longitude)?;
        Ok(self)
    }

    /// A state pre-populated from an existing `{{Coord}}` template.
    pub fn from_existing(
        existing: ExistingCoordinates,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self> {
        let mut state = Self::placeholder(false).with_coordinates(latitude, longitude)?;
        state.use_dms = existing.use_dms;
        if let Some((inline, title)) = existing.display {
            state.inline = inline;
            state.title = title;
        }
        state.extra_parameters = existing.extra_parameters;
        state.name = existing.name;
        state.notes = existing.notes;
        state.qid = existing.qid;
        Ok(state)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Sets the coordinate from decimal degrees (map drag, decimal fields).
    pub fn set_decimal(&mut self, latitude: f64, longitude: f64) -> Result<()> {
        let latitude = check_range(Axis::Latitude, latitude)?;
        let longitude = check_range(Axis::Longitude, longitude)?;
        self.latitude = latitude;
        self.longitude = longitude;
        self.dms_source = None;
        Ok(())
    }

    /// Sets the coordinate from the decimal text fields. Invalid or out-of-range input is ignored
    /// and the previous value kept; returns whether the state changed.
    pub fn set_decimal_text(&mut self, latitude: &str, longitude: &str) -> bool {
        let (Some(lat), Some(lon)) = (
            dms::parse_decimal_field(latitude),
            dms::parse_decimal_field(longitude),
        ) else {
            tracing::debug!(latitude, longitude, "ignoring unparsable decimal input");
            return false;
        };
        match self.set_decimal(lat, lon) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%err, "ignoring decimal input");
                false
            }
        }
    }

    /// Sets the coordinate from DMS values. These become the source of truth until the decimal
    /// representation is edited again.
    pub fn set_dms(&mut self, latitude: Dms, longitude: Dms) -> Result<()> {
        let lat = check_range(Axis::Latitude, latitude.to_decimal())?;
        let lon = check_range(Axis::Longitude, longitude.to_decimal())?;
        self.latitude = lat;
        self.longitude = lon;
        self.dms_source = Some((latitude, longitude));
        Ok(())
    }

    /// Sets the coordinate from the DMS text fields. Invalid input is ignored; returns whether
    /// the state changed.
    pub fn set_dms_text(&mut self, latitude: DmsText<'_>, longitude: DmsText<'_>) -> bool {
        let (Some(lat), Some(lon)) = (
            latitude.parse(Axis::Latitude),
            longitude.parse(Axis::Longitude),
        ) else {
            tracing::debug!("ignoring unparsable DMS input");
            return false;
        };
        match self.set_dms(lat, lon) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%err, "ignoring DMS input");
                false
            }
        }
    }

    /// The DMS values shown in the editor fields: the user's own DMS values if those were
    /// edited last, otherwise derived from the decimal pair. Saved parameters never use these.
    pub fn dms(&self) -> (Dms, Dms) {
        if let Some(source) = self.dms_source {
            return source;
        }
        (
            dms::to_dms(self.latitude).unwrap_or_default(),
            dms::to_dms(self.longitude).unwrap_or_default(),
        )
    }

    /// The decimal pair as shown in the decimal text fields.
    pub fn decimal_text(&self, digits: usize) -> (String, String) {
        (
            dms::format_fixed(self.latitude, digits),
            dms::format_fixed(self.longitude, digits),
        )
    }

    pub fn set_use_dms(&mut self, use_dms: bool) {
        self.use_dms = use_dms;
    }

    pub fn set_display(&mut self, inline: bool, title: bool) {
        self.inline = inline;
        self.title = title;
    }

    /// Empty text clears the name.
    pub fn set_name(&mut self, text: Option<&str>) {
        self.name = non_empty(text);
    }

    /// Empty text clears the extra coordinate parameters.
    pub fn set_extra_parameters(&mut self, text: Option<&str>) {
        self.extra_parameters = non_empty(text);
    }

    pub fn set_notes(&mut self, text: Option<&str>) {
        self.notes = non_empty(text);
    }

    pub fn set_qid(&mut self, text: Option<&str>) {
        self.qid = non_empty(text);
    }
}
