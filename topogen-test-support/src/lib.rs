//! Shared test utilities used across topogen crates.
//!
//! Exposes a [`tracing::RecordingLayer`] for asserting builder
//! instrumentation and a [`proptest_profile::ProptestRunProfile`] so property
//! suites read the same environment overrides.

pub mod proptest_profile;

pub mod tracing {
    //! Recording layer that captures closed spans and emitted events.
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex, PoisonError};

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::registry::LookupSpan;

    /// Layer installed during tests to capture spans and events.
    ///
    /// Clones share the same buffers, so a test keeps one handle for
    /// assertions while the subscriber owns another.
    ///
    /// # Examples
    /// ```
    /// use topogen_test_support::tracing::RecordingLayer;
    /// use tracing_subscriber::layer::SubscriberExt;
    ///
    /// let layer = RecordingLayer::default();
    /// let subscriber = tracing_subscriber::registry().with(layer.clone());
    /// tracing::subscriber::with_default(subscriber, || {
    ///     let _span = tracing::info_span!("topology.demo", nodes = 3).entered();
    ///     tracing::info!(links = 2, "built");
    /// });
    /// assert!(layer.span_named("topology.demo").is_some());
    /// assert_eq!(layer.events().len(), 1);
    /// ```
    #[derive(Clone, Default)]
    pub struct RecordingLayer {
        spans: Arc<Mutex<Vec<SpanRecord>>>,
        events: Arc<Mutex<Vec<EventRecord>>>,
    }

    impl RecordingLayer {
        /// Returns the closed spans in completion order.
        #[must_use]
        pub fn spans(&self) -> Vec<SpanRecord> {
            self.spans
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Returns the emitted events in emission order.
        #[must_use]
        pub fn events(&self) -> Vec<EventRecord> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Returns the first closed span called `name`, if any.
        #[must_use]
        pub fn span_named(&self, name: &str) -> Option<SpanRecord> {
            self.spans().into_iter().find(|span| span.name == name)
        }

        /// Returns the events recorded at `level`.
        #[must_use]
        pub fn events_at(&self, level: Level) -> Vec<EventRecord> {
            self.events()
                .into_iter()
                .filter(|event| event.level == level)
                .collect()
        }
    }

    /// Snapshot of a closed span and its recorded fields.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SpanRecord {
        /// Span name from the tracing metadata.
        pub name: String,
        /// Structured fields recorded against the span, rendered as strings.
        pub fields: HashMap<String, String>,
    }

    impl SpanRecord {
        /// Returns the rendered value of `field`, if it was recorded.
        #[must_use]
        pub fn field(&self, field: &str) -> Option<&str> {
            self.fields.get(field).map(String::as_str)
        }
    }

    /// Snapshot of an emitted event.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EventRecord {
        /// Level of the event.
        pub level: Level,
        /// Target string from the metadata.
        pub target: String,
        /// Structured fields attached to the event, including `message`.
        pub fields: HashMap<String, String>,
    }

    impl EventRecord {
        /// Returns the rendered value of `field`, if it was recorded.
        #[must_use]
        pub fn field(&self, field: &str) -> Option<&str> {
            self.fields.get(field).map(String::as_str)
        }
    }

    #[derive(Default)]
    struct PendingSpan {
        name: String,
        fields: HashMap<String, String>,
    }

    impl<S> Layer<S> for RecordingLayer
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            id: &tracing::span::Id,
            ctx: Context<'_, S>,
        ) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut pending = PendingSpan {
                name: attrs.metadata().name().to_owned(),
                fields: HashMap::new(),
            };
            attrs.record(&mut FieldCollector(&mut pending.fields));
            span.extensions_mut().insert(pending);
        }

        fn on_record(
            &self,
            id: &tracing::span::Id,
            values: &tracing::span::Record<'_>,
            ctx: Context<'_, S>,
        ) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut extensions = span.extensions_mut();
            if let Some(pending) = extensions.get_mut::<PendingSpan>() {
                values.record(&mut FieldCollector(&mut pending.fields));
            }
        }

        fn on_close(&self, id: tracing::span::Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(&id) else {
                return;
            };
            let Some(pending) = span.extensions_mut().remove::<PendingSpan>() else {
                return;
            };
            self.spans
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(SpanRecord {
                    name: pending.name,
                    fields: pending.fields,
                });
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = HashMap::new();
            event.record(&mut FieldCollector(&mut fields));
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(EventRecord {
                    level: *event.metadata().level(),
                    target: event.metadata().target().to_owned(),
                    fields,
                });
        }
    }

    struct FieldCollector<'a>(&'a mut HashMap<String, String>);

    impl FieldCollector<'_> {
        fn put(&mut self, field: &Field, value: String) {
            self.0.insert(field.name().to_owned(), value);
        }
    }

    impl Visit for FieldCollector<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.put(field, format!("{value:?}"));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.put(field, value.to_owned());
        }

        fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
            self.put(field, value.to_string());
        }

        fn record_bool(&mut self, field: &Field, value: bool) {
            self.put(field, value.to_string());
        }

        fn record_i64(&mut self, field: &Field, value: i64) {
            self.put(field, value.to_string());
        }

        fn record_u64(&mut self, field: &Field, value: u64) {
            self.put(field, value.to_string());
        }

        fn record_f64(&mut self, field: &Field, value: f64) {
            self.put(field, value.to_string());
        }
    }
}
