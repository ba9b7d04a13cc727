//! Typed view of Parsoid's `data-mw` transclusion payload.
//!
//! Only the keys the editor touches are typed; everything else is kept in `extra` maps (or as a
//! raw [`Value`] for non-template parts) so that a read-modify-write cycle is lossless.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Template parameters in source order, keyed by name (`"1"`, `"2"`, `"display"`, ...).
pub type TemplateParams = IndexMap<String, ParamValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransclusionPayload {
    #[serde(default)]
    pub parts: Vec<TransclusionPart>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransclusionPart {
    Template {
        template: TemplateInvocation,
    },
    /// Literal wikitext between templates, template arguments, or anything unrecognised.
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInvocation {
    pub target: TemplateTarget,
    #[serde(default)]
    pub params: TemplateParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub i: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateTarget {
    pub wt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub href: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamValue {
    pub wt: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParamValue {
    /// A plain-wikitext parameter value.
    pub fn wikitext(wt: impl Into<String>) -> Self {
        Self {
            wt: wt.into(),
            extra: Map::new(),
        }
    }
}

impl TransclusionPayload {
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// A payload holding a single template invocation.
    pub fn single_template(template: TemplateInvocation) -> Self {
        Self {
            parts: vec![TransclusionPart::Template { template }],
            extra: Map::new(),
        }
    }

    pub fn templates(&self) -> impl Iterator<Item = &TemplateInvocation> {
        self.parts.iter().filter_map(TransclusionPart::as_template)
    }

    /// Index (into `parts`) of the first template part accepted by `pred`.
    pub fn position_of_template(
        &self,
        mut pred: impl FnMut(&TemplateInvocation) -> bool,
    ) -> Option<usize> {
        self.parts
            .iter()
            .position(|part| part.as_template().is_some_and(&mut pred))
    }

    pub fn template_mut(&mut self, index: usize) -> Option<&mut TemplateInvocation> {
        self.parts.get_mut(index)?.as_template_mut()
    }
}

impl TransclusionPart {
    pub fn as_template(&self) -> Option<&TemplateInvocation> {
        match self {
            TransclusionPart::Template { template } => Some(template),
            TransclusionPart::Other(_) => None,
        }
    }

    pub fn as_template_mut(&mut self) -> Option<&mut TemplateInvocation> {
        match self {
            TransclusionPart::Template { template } => Some(template),
            TransclusionPart::Other(_) => None,
        }
    }
}

impl TemplateInvocation {
    pub fn new(target: TemplateTarget, params: TemplateParams) -> Self {
        Self {
            target,
            params,
            i: None,
            extra: Map::new(),
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|v| v.wt.as_str())
    }

    /// Positional parameters (`"1"`, `"2"`, ...) in ascending index order.
    pub fn positional_params(&self) -> Vec<(usize, &str)> {
        let mut out: Vec<(usize, &str)> = self
            .params
            .iter()
            .filter_map(|(k, v)| {
                let idx = k.trim().parse::<usize>().ok()?;
                Some((idx, v.wt.as_str()))
            })
            .collect();
        out.sort_by_key(|(idx, _)| *idx);
        out
    }
}

impl TemplateTarget {
    /// Builds a target from a `Template:`-prefixed page title.
    pub fn for_title(template_title: &str) -> Self {
        Self {
            wt: crate::aliases::strip_template_namespace(template_title).to_string(),
            href: Some(crate::aliases::template_href(template_title)),
            extra: Map::new(),
        }
    }
}
