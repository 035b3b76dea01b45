//! The `partial` template helper.

use std::sync::{Arc, Mutex, PoisonError};

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderErrorReason,
};

use crate::engine::{RenderScope, TemplateEngine};
use crate::error::TemplateError;

/// Maximum nesting of `{{partial}}` calls within one render.
pub const MAX_PARTIAL_DEPTH: usize = 32;

/// `{{partial "name"}}`: render a sibling template of the current layout.
///
/// The partial is resolved against the layout of the render scope, compiled
/// through the shared cache, and rendered with the root data. Its output is
/// inserted without escaping.
///
/// Handlebars only reports render errors as strings, so the typed error of a
/// failed partial is parked in `failure` for the engine to return.
pub(crate) struct PartialHelper {
    engine: TemplateEngine,
    scope: Arc<RenderScope>,
    failure: Arc<Mutex<Option<TemplateError>>>,
    depth: usize,
}

impl PartialHelper {
    pub(crate) fn new(
        engine: TemplateEngine,
        scope: Arc<RenderScope>,
        failure: Arc<Mutex<Option<TemplateError>>>,
        depth: usize,
    ) -> Self {
        Self {
            engine,
            scope,
            failure,
            depth,
        }
    }

    fn render_partial(&self, name: &str) -> Result<String, TemplateError> {
        if self.depth >= MAX_PARTIAL_DEPTH {
            return Err(TemplateError::PartialDepth {
                name: name.to_owned(),
                limit: MAX_PARTIAL_DEPTH,
            });
        }
        let path = self
            .engine
            .resolve_partial(name, self.scope.layout_file())?;
        let template = self.engine.template(&path)?;
        tracing::debug!(partial = name, path = %path.display(), "Rendering partial");
        self.engine
            .render_at_depth(&template, &self.scope, self.depth + 1)
    }

    /// Keep the first failure; later ones are consequences of it.
    fn record(&self, err: TemplateError) {
        let mut slot = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}

impl HelperDef for PartialHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let param = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("partial", 0))?;
        let name = param.value().as_str().ok_or_else(|| {
            RenderErrorReason::Other(format!(
                "partial name must be a string, got {}",
                param.value()
            ))
        })?;

        match self.render_partial(name) {
            Ok(html) => {
                out.write(&html)
                    .map_err(|e| RenderErrorReason::Other(e.to_string()))?;
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                self.record(err);
                Err(RenderErrorReason::Other(message).into())
            }
        }
    }
}
