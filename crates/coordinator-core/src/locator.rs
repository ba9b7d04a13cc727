//! Finds the template node that carries the page coordinates, or picks where a new `{{Coord}}`
//! should go.

use crate::aliases::{TemplateAliases, TemplateMatcher};
use crate::config::TemplateNames;
use crate::document::{DocumentTree, InsertPosition, NodeId, escape_attribute_value};
use crate::payload::{TemplateInvocation, TemplateParams, TemplateTarget, TransclusionPayload};
use crate::{Error, Result};
use serde::Serialize;

/// The rendered coordinate indicator (present for both `{{Coord}}` and `{{Coord missing}}`).
pub const COORDINATES_SELECTOR: &str = "#coordinates";
pub const COORD_MISSING_SELECTOR: &str = "#coordinates.coord-missing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Occurrence {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRule {
    pub id: &'static str,
    pub selector: &'static str,
    pub occurrence: Occurrence,
    pub position: InsertPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    Node(NodeId),
    DocumentEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub rule: &'static str,
    pub anchor: Anchor,
    pub position: InsertPosition,
}

/// The outcome of locating: which branch applies and where it writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "branch", rename_all = "kebab-case")]
pub enum Target {
    /// Retarget the `{{Coord missing}}` part at `part` of `node`'s payload to `{{Coord}}`.
    ReplaceMissing { node: NodeId, part: usize },
    /// Replace the parameters of the `{{Coord}}` part at `part` of `node`'s payload.
    UpdateExisting { node: NodeId, part: usize },
    /// Insert a new `{{Coord}}` transclusion.
    Insert(Placement),
}

/// Ordered insertion rules: the first rule whose selector matches decides the insertion point.
#[derive(Debug, Clone)]
pub struct PlacementRules {
    rules: Vec<PlacementRule>,
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self::default_house_style()
    }
}

impl PlacementRules {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add(&mut self, rule: PlacementRule) {
        self.rules.push(rule);
    }

    pub fn add_rule(
        &mut self,
        id: &'static str,
        selector: &'static str,
        occurrence: Occurrence,
        position: InsertPosition,
    ) {
        self.add(PlacementRule {
            id,
            selector,
            occurrence,
            position,
        });
    }

    pub fn rules(&self) -> &[PlacementRule] {
        &self.rules
    }

    /// The page-bottom layout order: coordinates sit as low as possible, above the sort key,
    /// categories and stub templates and below the navigation furniture.
    pub fn default_house_style() -> Self {
        use InsertPosition::{AfterEnd, BeforeBegin, BeforeEnd};
        use Occurrence::{First, Last};

        let mut rules = Self::new();

        // The rule order is significant.
        rules.add_rule(
            "defaultsort",
            r#"[property="mw:PageProp/categorydefaultsort"]"#,
            First,
            BeforeBegin,
        );
        rules.add_rule(
            "categories",
            r#"[rel="mw:PageProp/Category"]"#,
            First,
            BeforeBegin,
        );
        rules.add_rule("stub", ".stub", First, BeforeBegin);
        rules.add_rule("authority-control", ".authority-control", Last, AfterEnd);
        rules.add_rule(
            "taxon-bar",
            r#".navbox[aria-labelledby="Taxon_identifiers"]"#,
            Last,
            AfterEnd,
        );
        rules.add_rule("portal-bar", ".portal-bar", Last, AfterEnd);
        rules.add_rule("navbox", ".navbox", Last, AfterEnd);
        rules.add_rule("succession-box", ".succession-box", Last, AfterEnd);
        // Sometimes placed at the top of the page, hence its low priority.
        rules.add_rule(
            "improve-categories",
            ".box-Improve_categories",
            First,
            BeforeBegin,
        );
        rules.add_rule("last-section", "section", Last, BeforeEnd);

        rules
    }

    /// Evaluates the rules in order. Never fails to place: without any match the template goes
    /// at the end of `body`, or at the end of the document when there is no `body` either.
    pub fn choose<D: DocumentTree>(&self, doc: &D) -> Result<Placement> {
        for rule in &self.rules {
            let found = match rule.occurrence {
                Occurrence::First => doc.find_first(rule.selector)?,
                Occurrence::Last => doc.find_last(rule.selector)?,
            };
            let Some(node) = found else {
                continue;
            };
            let anchor = widen_to_transclusion(doc, node, rule.position)?;
            tracing::debug!(rule = rule.id, %anchor, "placement rule matched");
            return Ok(Placement {
                rule: rule.id,
                anchor: Anchor::Node(anchor),
                position: rule.position,
            });
        }

        if let Some(body) = doc.find_first("body")? {
            tracing::debug!("no placement rule matched; appending to body");
            return Ok(Placement {
                rule: "body",
                anchor: Anchor::Node(body),
                position: InsertPosition::BeforeEnd,
            });
        }
        tracing::debug!("no placement rule matched; appending to document");
        Ok(Placement {
            rule: "document-end",
            anchor: Anchor::DocumentEnd,
            position: InsertPosition::BeforeEnd,
        })
    }
}

/// Moves an outside anchor to the edge of its transclusion group so that an insertion never lands
/// between two elements of the same template's output.
fn widen_to_transclusion<D: DocumentTree>(
    doc: &D,
    node: NodeId,
    position: InsertPosition,
) -> Result<NodeId> {
    let group = match position {
        InsertPosition::BeforeBegin | InsertPosition::AfterEnd => doc.transclusion_group(node)?,
        InsertPosition::AfterBegin | InsertPosition::BeforeEnd => return Ok(node),
    };
    let edge = match position {
        InsertPosition::BeforeBegin => group.first(),
        _ => group.last(),
    };
    Ok(edge.copied().unwrap_or(node))
}

/// Locates coordinate templates by canonical name or redirect and writes parameter maps back.
#[derive(Debug, Clone)]
pub struct TemplateLocator<'a> {
    templates: &'a TemplateNames,
    rules: &'a PlacementRules,
    coord: TemplateMatcher,
    coord_missing: TemplateMatcher,
}

impl<'a> TemplateLocator<'a> {
    pub fn new(
        templates: &'a TemplateNames,
        aliases: &TemplateAliases,
        rules: &'a PlacementRules,
    ) -> Self {
        Self {
            templates,
            rules,
            coord: aliases.matcher(&templates.coord),
            coord_missing: aliases.matcher(&templates.coord_missing),
        }
    }

    pub fn locate<D: DocumentTree>(&self, doc: &D, from_missing_template: bool) -> Result<Target> {
        if from_missing_template {
            let (node, part) = self
                .find_part(doc, COORD_MISSING_SELECTOR, &self.coord_missing)?
                .ok_or_else(|| Error::template_not_found(self.coord_missing.canonical()))?;
            tracing::debug!(%node, part, "replacing coordinates placeholder");
            return Ok(Target::ReplaceMissing { node, part });
        }

        if doc.find_first(COORDINATES_SELECTOR)?.is_some() {
            let (node, part) = self
                .find_part(doc, COORDINATES_SELECTOR, &self.coord)?
                .ok_or_else(|| Error::template_not_found(self.coord.canonical()))?;
            tracing::debug!(%node, part, "updating existing coordinates");
            return Ok(Target::UpdateExisting { node, part });
        }

        Ok(Target::Insert(self.rules.choose(doc)?))
    }

    /// The existing `{{Coord}}` invocation rendered at `#coordinates`, if any.
    pub fn existing_coord<D: DocumentTree>(&self, doc: &D) -> Result<Option<TemplateInvocation>> {
        let Some((node, part)) = self.find_part(doc, COORDINATES_SELECTOR, &self.coord)? else {
            return Ok(None);
        };
        let Some(payload) = doc.payload(node)? else {
            return Ok(None);
        };
        Ok(payload
            .parts
            .get(part)
            .and_then(|p| p.as_template())
            .cloned())
    }

    fn find_part<D: DocumentTree>(
        &self,
        doc: &D,
        selector: &str,
        matcher: &TemplateMatcher,
    ) -> Result<Option<(NodeId, usize)>> {
        let Some(indicator) = doc.find_first(selector)? else {
            return Ok(None);
        };
        let Some(owner) = doc.transclusion_owner(indicator)? else {
            return Ok(None);
        };
        let Some(payload) = doc.payload(owner)? else {
            return Ok(None);
        };
        Ok(payload
            .position_of_template(|t| matcher.matches(t))
            .map(|part| (owner, part)))
    }

    /// Writes `params` to the located target. Returns the node now carrying the `{{Coord}}`
    /// transclusion.
    pub fn write<D: DocumentTree>(
        &self,
        doc: &mut D,
        target: &Target,
        params: TemplateParams,
    ) -> Result<NodeId> {
        match target {
            Target::ReplaceMissing { node, part } => {
                self.rewrite_part(doc, *node, *part, &self.coord_missing, |template| {
                    let extra = std::mem::take(&mut template.target.extra);
                    template.target = TemplateTarget::for_title(&self.templates.coord);
                    template.target.extra = extra;
                    template.params = params;
                })
            }
            Target::UpdateExisting { node, part } => {
                self.rewrite_part(doc, *node, *part, &self.coord, |template| {
                    template.params = params;
                })
            }
            Target::Insert(placement) => {
                let mut template =
                    TemplateInvocation::new(TemplateTarget::for_title(&self.templates.coord), params);
                template.i = Some(0);
                let payload = TransclusionPayload::single_template(template);
                let html = format!(
                    r#"<span about="{}" typeof="mw:Transclusion" data-mw="{}"></span>"#,
                    escape_attribute_value(&doc.next_about_id()?),
                    escape_attribute_value(&payload.to_json_string()?),
                );
                match placement.anchor {
                    Anchor::Node(anchor) => doc.insert_adjacent(anchor, placement.position, &html),
                    Anchor::DocumentEnd => doc.append_to_document(&html),
                }
            }
        }
    }

    fn rewrite_part<D: DocumentTree>(
        &self,
        doc: &mut D,
        node: NodeId,
        part: usize,
        matcher: &TemplateMatcher,
        edit: impl FnOnce(&mut TemplateInvocation),
    ) -> Result<NodeId> {
        let not_found = || Error::template_not_found(matcher.canonical());
        let mut payload = doc.payload(node)?.ok_or_else(not_found)?;
        let template = payload.template_mut(part).ok_or_else(not_found)?;
        edit(template);
        doc.set_payload(node, &payload)?;
        Ok(node)
    }
}

impl std::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anchor::Node(node) => write!(f, "node {node}"),
            Anchor::DocumentEnd => f.write_str("document end"),
        }
    }
}
