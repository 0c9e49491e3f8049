//! Captures tracing events emitted during a test.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// One captured event.
#[derive(Debug, Clone)]
pub struct Captured {
    pub level: Level,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl Captured {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Events captured so far.
#[derive(Debug, Clone, Default)]
pub struct Records(Arc<Mutex<Vec<Captured>>>);

impl Records {
    /// The request log records.
    pub fn http_requests(&self) -> Vec<Captured> {
        self.0
            .lock()
            .iter()
            .filter(|e| e.message == "HTTP request")
            .cloned()
            .collect()
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

struct CaptureLayer(Records);

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        (self.0).0.lock().push(Captured {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// Routes events on the current thread into the returned records until
/// the guard is dropped.
pub fn capture_logs() -> (Records, DefaultGuard) {
    let records = Records::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer(records.clone()));
    let guard = tracing::subscriber::set_default(subscriber);
    (records, guard)
}
