//! Re-rendering a template whenever its data changes.
//!
//! The sync layer calls [`LiveView::notify`] for every incoming update and
//! [`LiveView::flush`] once it has applied them to the store. Notifications
//! between two flushes collapse into one render.

use std::sync::Arc;

use dashstache_ast::Template;

use crate::options::RenderOptions;
use crate::renderer::{self, Rendered};
use crate::store::DataStore;

/// Receives rendered output, e.g. to hand it to a display.
pub trait RenderSink {
    fn publish(&mut self, rendered: &Rendered);
}

impl<F> RenderSink for F
where
    F: FnMut(&Rendered),
{
    fn publish(&mut self, rendered: &Rendered) {
        self(rendered)
    }
}

/// Keeps every published text, newest last.
impl RenderSink for Vec<String> {
    fn publish(&mut self, rendered: &Rendered) {
        self.push(rendered.text());
    }
}

/// One template bound to a sink.
pub struct LiveView<S> {
    template: Arc<Template>,
    options: RenderOptions,
    sink: S,
    dirty: bool,
    render_count: usize,
}

impl<S: RenderSink> LiveView<S> {
    /// A new view renders on its first flush.
    pub fn new(template: Arc<Template>, options: RenderOptions, sink: S) -> Self {
        Self {
            template,
            options,
            sink,
            dirty: true,
            render_count: 0,
        }
    }

    /// Mark the view stale.
    pub fn notify(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Render and publish if anything changed since the last render.
    /// Returns whether a render happened.
    pub fn flush(&mut self, store: &DataStore) -> bool {
        if !self.dirty {
            return false;
        }
        self.refresh(store);
        true
    }

    /// Render and publish unconditionally.
    pub fn refresh(&mut self, store: &DataStore) -> Rendered {
        let rendered = renderer::render(&self.template, store, &self.options);
        self.sink.publish(&rendered);
        self.dirty = false;
        self.render_count += 1;
        tracing::trace!(renders = self.render_count, "published live view");
        rendered
    }

    /// Swap in a new template, e.g. after the cache rebuilt it.
    pub fn replace_template(&mut self, template: Arc<Template>) {
        if !Arc::ptr_eq(&self.template, &template) {
            self.template = template;
            self.dirty = true;
        }
    }

    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn render_count(&self) -> usize {
        self.render_count
    }
}
