use crate::dms::Axis;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by collaborator implementations (network clients, file stores, ...).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "We couldn't find the {{{{{template}}}}} template anywhere in the page. Please edit the page manually."
    )]
    TemplateNotFound { template: String },

    #[error("Something wrong happened when saving the page: {message}")]
    Persistence { message: String },

    #[error("Failed to load or serialize the page document: {message}")]
    Document { message: String },

    #[error("Failed to resolve template redirects: {message}")]
    Redirects { message: String },

    #[error("Invalid transclusion payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("HTML rewrite failed: {message}")]
    Rewrite { message: String },

    #[error("Node {node} does not exist in the document")]
    UnknownNode { node: usize },

    #[error("{axis} {value} is outside of [{min}, {max}]")]
    CoordinateOutOfRange {
        axis: Axis,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    /// Builds a [`Error::TemplateNotFound`] from a `Template:`-prefixed page title.
    pub fn template_not_found(template_title: &str) -> Self {
        Self::TemplateNotFound {
            template: crate::aliases::strip_template_namespace(template_title).to_string(),
        }
    }
}
