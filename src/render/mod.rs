//! Page rendering.
//!
//! The renderer is a seam: the cache and engine only see `Renderer`, a pure
//! function from a `PageContext` to a finished HTML string. The production
//! implementation renders askama templates and minifies the result; tests
//! substitute deterministic stubs.

pub mod cache;
pub mod context;
mod minify;

use thiserror::Error;

use crate::presentation::views::{IndexTemplate, ListTemplate};
use crate::render::context::{PageContext, PageKind};

use askama::Template;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
    #[error("minification failed: {0}")]
    Minify(String),
}

pub trait Renderer: Send + Sync {
    fn render(&self, context: &PageContext) -> Result<String, RenderError>;
}

/// Askama-backed production renderer.
pub struct AskamaRenderer;

impl Renderer for AskamaRenderer {
    fn render(&self, context: &PageContext) -> Result<String, RenderError> {
        let html = match context.kind {
            PageKind::Index => IndexTemplate::from_context(context).render()?,
            PageKind::Category(category) => {
                ListTemplate::from_context(category, context).render()?
            }
        };
        minify::minify_html(&html)
    }
}
