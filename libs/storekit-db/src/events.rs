//! Record lifecycle notifications.

use storekit_query::Fields;

/// Receiver of "record created" notifications.
///
/// Called after the backend accepted the insert, inside the caller's scope.
/// Implementations must not block and cannot fail the operation.
pub trait RecordEvents: Send + Sync {
    fn record_created(&self, entity: &str, fields: &Fields);
}

/// Emits each notification as a `tracing` event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEvents;

impl RecordEvents for TracingEvents {
    fn record_created(&self, entity: &str, fields: &Fields) {
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        tracing::debug!(entity, fields = ?names, "record created");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use storekit_query::Value;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_tracing_events_logs_entity_and_fields() {
        let mut fields = Fields::new();
        fields.insert("fullname".to_owned(), Value::from("Ada"));

        TracingEvents.record_created("account", &fields);

        assert!(logs_contain("record created"));
        assert!(logs_contain("account"));
        assert!(logs_contain("fullname"));
        assert!(!logs_contain("Ada"));
    }
}
