//! Recording layer for asserting spans and events in tests.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    span::{Attributes, Id, Record},
};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

/// Layer capturing closed spans and emitted events for later assertions.
///
/// Install it on a `tracing_subscriber::registry()` with
/// `tracing::subscriber::with_default` so captures stay scoped to one test.
#[derive(Clone, Default)]
pub struct RecordingLayer {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
    events: Arc<Mutex<Vec<EventRecord>>>,
}

impl RecordingLayer {
    /// Closed spans, in completion order.
    ///
    /// # Examples
    /// ```
    /// use k33audit_test_support::tracing::RecordingLayer;
    ///
    /// let layer = RecordingLayer::default();
    /// assert!(layer.spans().is_empty());
    /// ```
    #[must_use]
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Emitted events, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Closed spans called `name`.
    #[must_use]
    pub fn spans_named(&self, name: &str) -> Vec<SpanRecord> {
        self.spans()
            .into_iter()
            .filter(|span| span.name == name)
            .collect()
    }

    /// Events emitted at `level`.
    #[must_use]
    pub fn events_at(&self, level: Level) -> Vec<EventRecord> {
        self.events()
            .into_iter()
            .filter(|event| event.level == level)
            .collect()
    }
}

/// A closed span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRecord {
    /// Span name.
    pub name: String,
    /// Name of the parent span, if any.
    pub parent: Option<String>,
    /// Fields recorded at creation or later through `Span::record`.
    pub fields: HashMap<String, String>,
}

/// An emitted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Event level.
    pub level: Level,
    /// Event target.
    pub target: String,
    /// Name of the span the event was emitted in, if any.
    pub span: Option<String>,
    /// Structured fields, including `message`.
    pub fields: HashMap<String, String>,
}

impl EventRecord {
    /// The formatted event message, or an empty string.
    #[must_use]
    pub fn message(&self) -> &str {
        self.fields.get("message").map_or("", String::as_str)
    }
}

struct SpanData {
    name: String,
    parent: Option<String>,
    fields: HashMap<String, String>,
}

impl<S> Layer<S> for RecordingLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut data = SpanData {
            name: attrs.metadata().name().to_owned(),
            parent: span.parent().map(|parent| parent.name().to_owned()),
            fields: HashMap::new(),
        };
        attrs.record(&mut FieldRecorder {
            fields: &mut data.fields,
        });
        span.extensions_mut().insert(data);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        let Some(data) = extensions.get_mut::<SpanData>() else {
            return;
        };
        values.record(&mut FieldRecorder {
            fields: &mut data.fields,
        });
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let Some(data) = span.extensions_mut().remove::<SpanData>() else {
            return;
        };
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SpanRecord {
                name: data.name,
                parent: data.parent,
                fields: data.fields,
            });
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        event.record(&mut FieldRecorder {
            fields: &mut fields,
        });
        let span = ctx.event_span(event).map(|span| span.name().to_owned());
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(EventRecord {
                level: *event.metadata().level(),
                target: event.metadata().target().to_owned(),
                span,
                fields,
            });
    }
}

struct FieldRecorder<'a> {
    fields: &'a mut HashMap<String, String>,
}

impl FieldRecorder<'_> {
    fn insert(&mut self, field: &Field, value: String) {
        self.fields.insert(field.name().to_owned(), value);
    }
}

impl Visit for FieldRecorder<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_owned());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tracing::{info, info_span};
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn records_parents_fields_and_messages() {
        let layer = RecordingLayer::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        tracing::subscriber::with_default(subscriber, || {
            let outer = info_span!("outer", record = 3_u64);
            let _outer = outer.enter();
            let inner = info_span!("inner", done = tracing::field::Empty);
            let _inner = inner.enter();
            info!(edge = "{2, 4}", "trial finished");
            inner.record("done", true);
        });

        let inner = layer.spans_named("inner");
        let inner = inner.first().expect("inner span closed");
        assert_eq!(inner.parent.as_deref(), Some("outer"));
        assert_eq!(inner.fields.get("done").map(String::as_str), Some("true"));

        let events = layer.events_at(Level::INFO);
        let event = events.first().expect("event recorded");
        assert_eq!(event.message(), "trial finished");
        assert_eq!(event.span.as_deref(), Some("inner"));
        assert_eq!(event.fields.get("edge").map(String::as_str), Some("{2, 4}"));
    }
}
