#![forbid(unsafe_code)]

//! Coordinate template editing core (headless).
//!
//! Converts between decimal and degree-minute-second coordinates, locates the `{{Coord}}` (or
//! `{{Coord missing}}`) transclusion in a Parsoid document (or picks where a new one belongs),
//! builds its parameters from the edited [`CoordinateState`] and persists the result through
//! caller-supplied collaborators.
//!
//! Design goals:
//! - no singletons: every collaborator is passed in explicitly
//! - lossless edits: markup outside the touched transclusion is preserved byte-for-byte
//! - runtime-agnostic async APIs (no specific executor required)

pub mod aliases;
pub mod config;
pub mod dms;
pub mod document;
pub mod error;
pub mod locator;
pub mod params;
pub mod payload;
pub mod state;

pub use aliases::{RedirectResolver, TemplateAliases, TemplateMatcher};
pub use config::CoordinatorConfig;
pub use dms::{Axis, Dms, Hemisphere, Sign, to_decimal, to_dms};
pub use document::{DocumentProvider, DocumentTree, InsertPosition, NodeId, ParsoidDocument};
pub use error::{BoxError, Error, Result};
pub use locator::{Anchor, Placement, PlacementRules, Target, TemplateLocator};
pub use params::{ExistingCoordinates, build_parameters, coordinates_from_params};
pub use payload::{ParamValue, TemplateParams, TransclusionPayload};
pub use state::{CoordinateState, DmsText};

use serde::Serialize;

/// What the page shows where coordinates are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateIndicator {
    /// A `{{Coord}}` template is rendered.
    Present,
    /// A `{{Coord missing}}` placeholder is rendered.
    Missing,
    /// No coordinate element at all.
    #[default]
    Absent,
}

impl CoordinateIndicator {
    /// Reads the indicator off the rendered document, for hosts without render-time metadata.
    pub fn detect<D: DocumentTree>(doc: &D) -> Result<Self> {
        if doc.find_first(locator::COORD_MISSING_SELECTOR)?.is_some() {
            return Ok(Self::Missing);
        }
        if doc.find_first(locator::COORDINATES_SELECTOR)?.is_some() {
            return Ok(Self::Present);
        }
        Ok(Self::Absent)
    }
}

/// Render-time facts about the page, supplied by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadata {
    pub page: String,
    /// The coordinate the page currently displays, as `(latitude, longitude)`.
    pub coordinates: Option<(f64, f64)>,
    pub indicator: CoordinateIndicator,
    /// Whether the rendered coordinate uses DMS formatting.
    pub renders_dms: bool,
}

/// Commits page source.
#[allow(async_fn_in_trait)]
pub trait PageStore {
    async fn save(
        &self,
        page: &str,
        wikitext: &str,
        summary: &str,
    ) -> std::result::Result<(), BoxError>;
}

/// Result of a successful [`Coordinator::commit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitOutcome {
    pub target: Target,
    pub summary: String,
}

#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    config: CoordinatorConfig,
    aliases: TemplateAliases,
    rules: PlacementRules,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig, aliases: TemplateAliases) -> Self {
        Self {
            config,
            aliases,
            rules: PlacementRules::default_house_style(),
        }
    }

    /// Builds an engine after fetching the redirects of both configured templates.
    pub async fn with_resolver<R: RedirectResolver>(
        config: CoordinatorConfig,
        resolver: &R,
    ) -> Result<Self> {
        let aliases = TemplateAliases::resolve(
            resolver,
            &[
                config.templates.coord.as_str(),
                config.templates.coord_missing.as_str(),
            ],
        )
        .await?;
        Ok(Self::new(config, aliases))
    }

    pub fn with_rules(mut self, rules: PlacementRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn aliases(&self) -> &TemplateAliases {
        &self.aliases
    }

    pub fn rules(&self) -> &PlacementRules {
        &self.rules
    }

    pub fn locator(&self) -> TemplateLocator<'_> {
        TemplateLocator::new(&self.config.templates, &self.aliases, &self.rules)
    }

    /// Creates the editing state for a page.
    ///
    /// With a rendered `{{Coord}}`, the template's options are read from `doc` and the coordinate
    /// comes from `meta` (falling back to the template's own parameters). Otherwise a placeholder
    /// state at `0, 0` is returned.
    pub fn open<D: DocumentTree>(&self, meta: &PageMetadata, doc: &D) -> Result<CoordinateState> {
        let mut state = match meta.indicator {
            CoordinateIndicator::Missing => CoordinateState::placeholder(true),
            CoordinateIndicator::Absent => CoordinateState::placeholder(false),
            CoordinateIndicator::Present => {
                let template = self
                    .locator()
                    .existing_coord(doc)?
                    .ok_or_else(|| Error::template_not_found(&self.config.templates.coord))?;
                let (lat, lon) = meta
                    .coordinates
                    .or_else(|| coordinates_from_params(&template))
                    .unwrap_or_default();
                let existing = ExistingCoordinates::from_template(&template, meta.renders_dms);
                return CoordinateState::from_existing(existing, lat, lon);
            }
        };
        state.use_dms = self.config.default_dms;
        if let Some((lat, lon)) = meta.coordinates {
            state.set_decimal(lat, lon)?;
        }
        Ok(state)
    }

    /// The decimal text fields for `state`, at the configured display precision.
    pub fn decimal_text(&self, state: &CoordinateState) -> (String, String) {
        state.decimal_text(self.config.display_precision)
    }

    /// Locates the target in `doc` and writes the parameters built from `state` to it.
    pub fn apply<D: DocumentTree>(&self, state: &CoordinateState, doc: &mut D) -> Result<Target> {
        let locator = self.locator();
        let target = locator.locate(doc, state.from_missing_template)?;
        let params = params::build_parameters_with_precision(state, self.config.decimal_precision);
        locator.write(doc, &target, params)?;
        Ok(target)
    }

    /// Loads the page document, applies `state`, serializes the result and saves it.
    ///
    /// Nothing is saved when locating fails. Save failures surface as
    /// [`Error::Persistence`] without retrying.
    pub async fn commit<P, S>(
        &self,
        page: &str,
        state: CoordinateState,
        provider: &P,
        store: &S,
    ) -> Result<CommitOutcome>
    where
        P: DocumentProvider,
        S: PageStore,
    {
        let mut doc = provider
            .load(page)
            .await
            .map_err(|err| Error::Document {
                message: err.to_string(),
            })?;

        let target = self.apply(&state, &mut doc)?;

        let wikitext = provider
            .to_wikitext(&doc)
            .await
            .map_err(|err| Error::Document {
                message: err.to_string(),
            })?;

        let summary = self.config.summary_for(&state).to_string();
        store
            .save(page, &wikitext, &summary)
            .await
            .map_err(|err| {
                tracing::warn!(page, %err, "saving coordinates failed");
                Error::Persistence {
                    message: err.to_string(),
                }
            })?;

        tracing::info!(page, ?target, "saved coordinates");
        Ok(CommitOutcome { target, summary })
    }
}

#[cfg(test)]
mod tests;
