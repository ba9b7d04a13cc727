//! Template redirect sets and the name-or-redirect matching rule.

use crate::payload::TemplateInvocation;
use crate::{BoxError, Error, Result};
use rustc_hash::{FxHashMap, FxHashSet};

pub const TEMPLATE_NAMESPACE: &str = "Template:";

/// Resolves the alternate names (redirects) of a template on the current site.
///
/// Titles are returned as full page titles (`Template:Coordinates`).
#[allow(async_fn_in_trait)]
pub trait RedirectResolver {
    async fn redirects(&self, canonical: &str) -> std::result::Result<Vec<String>, BoxError>;
}

/// Strips a leading `Template:` namespace, if present.
pub fn strip_template_namespace(title: &str) -> &str {
    title.strip_prefix(TEMPLATE_NAMESPACE).unwrap_or(title)
}

/// The Parsoid `href` for a template title (`./Template:Coord_missing`).
pub fn template_href(template_title: &str) -> String {
    format!("./{}", underscore_whitespace(template_title))
}

fn underscore_whitespace(title: &str) -> String {
    title
        .chars()
        .map(|ch| if ch.is_whitespace() { '_' } else { ch })
        .collect()
}

/// Normalized form used for comparisons: `./` + title with whitespace as `_`, lower-cased.
pub fn normalized_href(template_title: &str) -> String {
    template_href(template_title).to_lowercase()
}

/// Pre-fetched redirect titles, keyed by canonical template title.
#[derive(Debug, Clone, Default)]
pub struct TemplateAliases {
    redirects: FxHashMap<String, Vec<String>>,
}

impl TemplateAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, canonical: impl Into<String>, redirects: Vec<String>) {
        self.redirects.insert(canonical.into(), redirects);
    }

    pub fn with(mut self, canonical: impl Into<String>, redirects: Vec<String>) -> Self {
        self.insert(canonical, redirects);
        self
    }

    pub fn redirects(&self, canonical: &str) -> &[String] {
        self.redirects
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Fetches the redirects of each canonical title, in order.
    pub async fn resolve<R: RedirectResolver>(
        resolver: &R,
        canonical_titles: &[&str],
    ) -> Result<Self> {
        let mut out = Self::new();
        for &title in canonical_titles {
            let redirects = resolver
                .redirects(title)
                .await
                .map_err(|err| Error::Redirects {
                    message: err.to_string(),
                })?;
            tracing::debug!(template = title, count = redirects.len(), "loaded redirects");
            out.insert(title, redirects);
        }
        Ok(out)
    }

    /// Matcher accepting `canonical` and every known redirect of it.
    pub fn matcher(&self, canonical: &str) -> TemplateMatcher {
        TemplateMatcher::new(canonical, self.redirects(canonical))
    }
}

/// Matches template parts by canonical name or redirect, case-insensitively, treating spaces and
/// underscores alike.
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    canonical: String,
    hrefs: FxHashSet<String>,
}

impl TemplateMatcher {
    pub fn new(canonical: &str, redirects: &[String]) -> Self {
        let hrefs = std::iter::once(canonical)
            .chain(redirects.iter().map(String::as_str))
            .map(normalized_href)
            .collect();
        Self {
            canonical: canonical.to_string(),
            hrefs,
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn matches_href(&self, href: &str) -> bool {
        self.hrefs.contains(&href.to_lowercase())
    }

    /// Parts without an `href` (e.g. dynamically built targets) never match.
    pub fn matches(&self, template: &TemplateInvocation) -> bool {
        template
            .target
            .href
            .as_deref()
            .is_some_and(|href| self.matches_href(href))
    }
}
