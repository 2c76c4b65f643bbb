//! `tracing` layer forwarding events into a swappable [`Pipeline`].

use super::pipeline::Pipeline;
use super::record::{FieldVisitor, RawEvent, Record, SpanFields};
use super::render::Renderer;
use super::sink::SinkKind;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::span::{Attributes, Id};
use tracing::subscriber::Interest;
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Installed sink as reported by [`PipelineHandle::sinks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkInfo {
    pub kind: SinkKind,
    pub renderer: Renderer,
}

type Shared = Arc<RwLock<Option<Pipeline>>>;

/// Swaps the pipeline behind a [`PipelineLayer`].
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    pipeline: Shared,
}

impl PipelineHandle {
    /// Replace the whole pipeline, returning the previous one. The old sinks
    /// (and the file they hold open) drop with it.
    pub fn replace(&self, pipeline: Option<Pipeline>) -> Option<Pipeline> {
        let mut current = self.pipeline.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, pipeline)
    }

    pub fn is_configured(&self) -> bool {
        self.pipeline
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn sinks(&self) -> Vec<SinkInfo> {
        let current = self.pipeline.read().unwrap_or_else(PoisonError::into_inner);
        current
            .as_ref()
            .map(|pipeline| {
                pipeline
                    .sinks()
                    .iter()
                    .map(|sink| SinkInfo {
                        kind: sink.kind(),
                        renderer: sink.renderer(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Layer whose behavior is entirely defined by the current pipeline.
/// Without a pipeline every event is discarded.
#[derive(Debug, Clone)]
pub struct PipelineLayer {
    pipeline: Shared,
}

impl PipelineLayer {
    pub fn new(pipeline: Option<Pipeline>) -> Self {
        Self {
            pipeline: Arc::new(RwLock::new(pipeline)),
        }
    }

    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<S> Layer<S> for PipelineLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    // Thresholds change whenever the pipeline is replaced, so no callsite
    // interest may be cached.
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        if metadata.is_span() {
            return true;
        }
        // Bridged `log` records carry their real target in a field, so they
        // are filtered in `on_event` instead.
        if metadata.target() == "log" {
            return true;
        }
        self.pipeline
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|pipeline| pipeline.might_enable(metadata.target(), metadata.level()))
    }

    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = Record::new();
        attrs.record(&mut FieldVisitor::new(&mut fields));
        span.extensions_mut().insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &tracing::span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(SpanFields(fields)) = extensions.get_mut::<SpanFields>() {
            values.record(&mut FieldVisitor::new(fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let current = self.pipeline.read().unwrap_or_else(PoisonError::into_inner);
        let Some(pipeline) = current.as_ref() else {
            return;
        };

        let metadata = event.metadata();
        let mut raw = RawEvent::new(metadata.target(), *metadata.level());
        event.record(&mut FieldVisitor::with_errors(
            &mut raw.fields,
            &mut raw.error_chain,
        ));
        raw.normalize_log_bridge();

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanFields(fields)) = span.extensions().get::<SpanFields>() {
                    raw.context
                        .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        pipeline.dispatch(&raw);
    }
}
