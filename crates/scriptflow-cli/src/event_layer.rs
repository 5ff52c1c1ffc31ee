//! Tracing layer forwarding auto-save outcomes to the REPL.
//!
//! Auto-save writes finish in background tasks; this layer turns their
//! log events into channel messages the REPL prints between prompts.

use scriptflow_application::AUTOSAVE_TARGET;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// One auto-save outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoSaveEvent {
    pub level: Level,
    /// `upsert` or `delete`.
    pub op: Option<String>,
    /// Screen id the write touched.
    pub id: Option<String>,
    pub message: String,
}

impl AutoSaveEvent {
    pub fn is_failure(&self) -> bool {
        self.level == Level::ERROR
    }
}

/// Sends every auto-save event carrying an `op` field to a channel.
pub struct AutoSaveEventLayer {
    sender: mpsc::UnboundedSender<AutoSaveEvent>,
}

impl AutoSaveEventLayer {
    pub fn new(sender: mpsc::UnboundedSender<AutoSaveEvent>) -> Self {
        Self { sender }
    }
}

impl<S> Layer<S> for AutoSaveEventLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != AUTOSAVE_TARGET {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
        let Some(op) = text("op") else {
            return;
        };

        let forwarded = AutoSaveEvent {
            level: *event.metadata().level(),
            op: Some(op),
            id: text("id"),
            message: text("message").unwrap_or_default(),
        };

        // Receiver gone means the REPL is shutting down.
        let _ = self.sender.send(forwarded);
    }
}

struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), Value::from(format!("{:?}", value)));
    }
}
