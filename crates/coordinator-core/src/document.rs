//! Structured document tree over Parsoid HTML.
//!
//! [`DocumentTree`] is the capability surface the locator needs. [`ParsoidDocument`] implements it
//! over serialized HTML: a streaming `lol_html` pass indexes every element (tag, decoded
//! attributes, parent, subtree extent) and edits are applied as targeted rewrites, so markup
//! outside the edited element is preserved byte-for-byte.

use crate::payload::TransclusionPayload;
use crate::{BoxError, Error, Result};
use lol_html::html_content::{ContentType, Element, EndTag};
use lol_html::{RewriteStrSettings, Selector, element, end, rewrite_str};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

pub const DATA_MW: &str = "data-mw";
pub const ABOUT: &str = "about";

const MATCH_MARKER: &str = "data-coordinator-match";

/// Handle to an element of a [`DocumentTree`]: its ordinal in document order.
///
/// Structural edits (insertions) renumber the elements that follow the insertion point; attribute
/// writes keep every handle valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where to insert content relative to an element (the DOM `insertAdjacentElement` positions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

/// Loads a page's structured document and turns an edited document back into page source.
#[allow(async_fn_in_trait)]
pub trait DocumentProvider {
    type Document: DocumentTree;

    async fn load(&self, page: &str) -> std::result::Result<Self::Document, BoxError>;

    async fn to_wikitext(&self, document: &Self::Document) -> std::result::Result<String, BoxError>;
}

pub trait DocumentTree {
    /// All elements matching a CSS selector, in document order.
    fn find_all(&self, selector: &str) -> Result<Vec<NodeId>>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn tag_name(&self, node: NodeId) -> Option<&str>;

    /// Decoded attribute value.
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    /// Inserts an HTML fragment next to (or inside) `node`. Returns the handle of the first
    /// element of the fragment.
    fn insert_adjacent(&mut self, node: NodeId, position: InsertPosition, html: &str)
    -> Result<NodeId>;

    /// Appends an HTML fragment at the very end of the document.
    fn append_to_document(&mut self, html: &str) -> Result<NodeId>;

    fn serialize(&self) -> String;

    fn find_first(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.find_all(selector)?.first().copied())
    }

    fn find_last(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.find_all(selector)?.last().copied())
    }

    fn payload(&self, node: NodeId) -> Result<Option<TransclusionPayload>> {
        let Some(raw) = self.attribute(node, DATA_MW) else {
            return Ok(None);
        };
        Ok(Some(TransclusionPayload::from_json_str(raw)?))
    }

    fn set_payload(&mut self, node: NodeId, payload: &TransclusionPayload) -> Result<()> {
        let raw = payload.to_json_string()?;
        self.set_attribute(node, DATA_MW, &raw)
    }

    /// The element carrying the `data-mw` of the transclusion that produced `node`.
    ///
    /// Walks up from `node` until an element either carries `data-mw` itself or has an `about`
    /// id; in the latter case the first element sharing that id and carrying `data-mw` wins.
    fn transclusion_owner(&self, node: NodeId) -> Result<Option<NodeId>> {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if self.attribute(id, DATA_MW).is_some() {
                return Ok(Some(id));
            }
            if let Some(about) = self.attribute(id, ABOUT) {
                let selector = format!(
                    "[{ABOUT}=\"{}\"][{DATA_MW}]",
                    escape_selector_value(about)
                );
                return self.find_first(&selector);
            }
            cur = self.parent(id);
        }
        Ok(None)
    }

    /// The sibling elements produced by the same transclusion as `node` (sharing its `about`
    /// id), in document order. Elements without an `about` id form a group of one.
    fn transclusion_group(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let Some(about) = self.attribute(node, ABOUT) else {
            return Ok(vec![node]);
        };
        let selector = format!("[{ABOUT}=\"{}\"]", escape_selector_value(about));
        let parent = self.parent(node);
        let group: Vec<NodeId> = self
            .find_all(&selector)?
            .into_iter()
            .filter(|&id| self.parent(id) == parent)
            .collect();
        if group.is_empty() {
            return Ok(vec![node]);
        }
        Ok(group)
    }

    /// A fresh Parsoid `about` id (`#mwtN`) not used anywhere in the document.
    fn next_about_id(&self) -> Result<String> {
        let next = self
            .find_all(&format!("[{ABOUT}]"))?
            .into_iter()
            .filter_map(|id| self.attribute(id, ABOUT))
            .filter_map(|about| about_id_regex().captures(about))
            .filter_map(|caps| caps[1].parse::<u64>().ok())
            .max()
            .map_or(1, |n| n + 1);
        Ok(format!("#mwt{next}"))
    }
}

fn about_id_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#mwt(\d+)$").expect("valid regex"))
}

fn escape_selector_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escapes an attribute value for a double-quoted HTML attribute.
pub fn escape_attribute_value(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[derive(Debug, Clone, PartialEq)]
struct ElementRecord {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    /// Exclusive end of this element's subtree, in element ordinals.
    end: usize,
}

impl ElementRecord {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A Parsoid HTML document held as serialized markup plus an element index.
///
/// The input is expected to be serializer output with explicit end tags (as Parsoid produces);
/// elements whose end tag never appears are treated as extending to the end of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsoidDocument {
    html: String,
    elements: Vec<ElementRecord>,
}

impl ParsoidDocument {
    pub fn parse(html: impl Into<String>) -> Result<Self> {
        let html = html.into();
        let elements = index_elements(&html)?;
        Ok(Self { html, elements })
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    /// Number of elements in the document.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn record(&self, node: NodeId) -> Result<&ElementRecord> {
        self.elements
            .get(node.0)
            .ok_or(Error::UnknownNode { node: node.0 })
    }

    /// Applies `edit` to the element at `node` and re-indexes the result.
    fn rewrite_element(&mut self, node: NodeId, edit: ElementEdit<'_>) -> Result<()> {
        self.record(node)?;

        let mut ordinal = 0usize;
        let mut pending = Some(edit);
        let handler = element!("*", |el: &mut Element<'_, '_>| {
            let current = ordinal;
            ordinal += 1;
            if current != node.0 {
                return Ok(());
            }
            match pending.take() {
                Some(ElementEdit::SetAttribute { name, value }) => {
                    el.set_attribute(name, &escape_attribute_value(value))?;
                }
                Some(ElementEdit::Insert { position, html }) => match position {
                    InsertPosition::BeforeBegin => el.before(html, ContentType::Html),
                    InsertPosition::AfterBegin => el.prepend(html, ContentType::Html),
                    InsertPosition::BeforeEnd => el.append(html, ContentType::Html),
                    InsertPosition::AfterEnd => el.after(html, ContentType::Html),
                },
                None => {}
            }
            Ok(())
        });

        let html = rewrite_str(
            &self.html,
            RewriteStrSettings {
                element_content_handlers: vec![handler],
                strict: false,
                ..RewriteStrSettings::new()
            },
        )
        .map_err(|err| Error::Rewrite {
            message: err.to_string(),
        })?;

        self.reindex(html)
    }

    fn reindex(&mut self, html: String) -> Result<()> {
        self.elements = index_elements(&html)?;
        self.html = html;
        Ok(())
    }
}

enum ElementEdit<'a> {
    SetAttribute { name: &'a str, value: &'a str },
    Insert { position: InsertPosition, html: &'a str },
}

impl DocumentTree for ParsoidDocument {
    fn find_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        // `element!` panics on selectors it cannot parse, so reject them up front.
        selector
            .parse::<Selector>()
            .map_err(|err| Error::InvalidSelector {
                selector: selector.to_string(),
                message: err.to_string(),
            })?;

        // Mark matches in a scratch copy, then read the marks back through the regular index so
        // ordinals line up with `self.elements`.
        let marker = element!(selector, |el: &mut Element<'_, '_>| {
            el.set_attribute(MATCH_MARKER, "")?;
            Ok(())
        });
        let marked = rewrite_str(
            &self.html,
            RewriteStrSettings {
                element_content_handlers: vec![marker],
                strict: false,
                ..RewriteStrSettings::new()
            },
        )
        .map_err(|err| Error::Rewrite {
            message: err.to_string(),
        })?;

        Ok(index_elements(&marked)?
            .iter()
            .enumerate()
            .filter(|(_, el)| el.attribute(MATCH_MARKER).is_some())
            .map(|(i, _)| NodeId(i))
            .collect())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.elements.get(node.0)?.parent
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.elements.get(node.0).map(|el| el.tag.as_str())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.elements.get(node.0)?.attribute(name)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.rewrite_element(node, ElementEdit::SetAttribute { name, value })
    }

    fn insert_adjacent(
        &mut self,
        node: NodeId,
        position: InsertPosition,
        html: &str,
    ) -> Result<NodeId> {
        let record = self.record(node)?;
        let inserted_at = match position {
            InsertPosition::BeforeBegin => node.0,
            InsertPosition::AfterBegin => node.0 + 1,
            InsertPosition::BeforeEnd | InsertPosition::AfterEnd => record.end,
        };
        self.rewrite_element(node, ElementEdit::Insert { position, html })?;
        Ok(NodeId(inserted_at))
    }

    fn append_to_document(&mut self, html: &str) -> Result<NodeId> {
        let inserted_at = self.elements.len();
        let out = rewrite_str(
            &self.html,
            RewriteStrSettings {
                document_content_handlers: vec![end!(|doc_end| {
                    doc_end.append(html, ContentType::Html);
                    Ok(())
                })],
                strict: false,
                ..RewriteStrSettings::new()
            },
        )
        .map_err(|err| Error::Rewrite {
            message: err.to_string(),
        })?;
        self.reindex(out)?;
        Ok(NodeId(inserted_at))
    }

    fn serialize(&self) -> String {
        self.html.clone()
    }
}

fn index_elements(html: &str) -> Result<Vec<ElementRecord>> {
    let records: Rc<RefCell<Vec<ElementRecord>>> = Rc::default();
    let open: Rc<RefCell<Vec<NodeId>>> = Rc::default();

    let handler = {
        let records = Rc::clone(&records);
        let open = Rc::clone(&open);
        element!("*", move |el: &mut Element<'_, '_>| {
            let id = NodeId(records.borrow().len());
            let parent = open.borrow().last().copied();
            let attributes = el
                .attributes()
                .iter()
                .map(|attr| (attr.name(), htmlize::unescape(attr.value()).into_owned()))
                .collect();
            records.borrow_mut().push(ElementRecord {
                tag: el.tag_name(),
                attributes,
                parent,
                end: id.0 + 1,
            });

            if let Some(handlers) = el.end_tag_handlers() {
                open.borrow_mut().push(id);
                let records = Rc::clone(&records);
                let open = Rc::clone(&open);
                handlers.push(Box::new(move |_end: &mut EndTag<'_>| {
                    open.borrow_mut().pop();
                    let mut records = records.borrow_mut();
                    let len = records.len();
                    records[id.0].end = len;
                    Ok(())
                }));
            }
            Ok(())
        })
    };

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![handler],
            strict: false,
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|err| Error::Rewrite {
        message: err.to_string(),
    })?;

    let mut records = records.take();
    let len = records.len();
    for id in open.take() {
        records[id.0].end = len;
    }
    Ok(records)
}
