//! Amazon EventBridge backend.

use async_trait::async_trait;
use aws_sdk_eventbridge::error::DisplayErrorContext;
use aws_sdk_eventbridge::primitives::DateTime;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use tracing::{info, warn};

use super::EventBus;
use crate::error::BusError;
use crate::event::BusEntry;

/// Publishes each batch with a single `PutEvents` call.
#[derive(Debug, Clone)]
pub struct EventBridgeBus {
    client: aws_sdk_eventbridge::Client,
}

impl EventBridgeBus {
    /// Create a bus client from a loaded AWS SDK configuration.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_eventbridge::Client::new(sdk_config),
        }
    }

    /// Create a bus around an existing client.
    pub fn from_client(client: aws_sdk_eventbridge::Client) -> Self {
        Self { client }
    }
}

fn to_request_entry(entry: &BusEntry) -> PutEventsRequestEntry {
    PutEventsRequestEntry::builder()
        .event_bus_name(&entry.event_bus_name)
        .source(&entry.source)
        .time(DateTime::from_millis(entry.time.timestamp_millis()))
        .detail_type(&entry.detail_type)
        .detail(&entry.detail)
        .build()
}

#[async_trait]
impl EventBus for EventBridgeBus {
    async fn put_entries(&self, entries: &[BusEntry]) -> Result<(), BusError> {
        let request_entries: Vec<PutEventsRequestEntry> =
            entries.iter().map(to_request_entry).collect();

        let output = self
            .client
            .put_events()
            .set_entries(Some(request_entries))
            .send()
            .await
            .map_err(|e| BusError::Publish(DisplayErrorContext(&e).to_string()))?;

        let failed = output.failed_entry_count().max(0) as usize;
        if failed > 0 {
            let first_error = output
                .entries()
                .iter()
                .find_map(|e| e.error_message())
                .unwrap_or("unknown");
            warn!(
                failed = failed,
                total = entries.len(),
                first_error = %first_error,
                "eventbridge_entries_rejected"
            );
            return Err(BusError::PartialFailure {
                failed,
                total: entries.len(),
            });
        }

        info!(entries = entries.len(), "eventbridge_put_events_ok");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_eventbridge::operation::put_events::PutEventsOutput;
    use aws_sdk_eventbridge::types::PutEventsResultEntry;
    use aws_smithy_mocks::{mock, mock_client};
    use chrono::TimeZone;

    fn entry(detail_type: &str) -> BusEntry {
        BusEntry {
            event_bus_name: "hooks-bus".to_string(),
            source: "asana".to_string(),
            time: chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            detail_type: detail_type.to_string(),
            detail: "{}".to_string(),
        }
    }

    #[test]
    fn test_to_request_entry() {
        let request = to_request_entry(&entry("TaskChanged"));
        assert_eq!(request.event_bus_name(), Some("hooks-bus"));
        assert_eq!(request.source(), Some("asana"));
        assert_eq!(request.detail_type(), Some("TaskChanged"));
        assert_eq!(request.detail(), Some("{}"));
        assert_eq!(request.time().map(|t| t.secs()), Some(1_704_067_200));
    }

    #[tokio::test]
    async fn test_batch_sent_in_one_call() {
        let rule = mock!(aws_sdk_eventbridge::Client::put_events)
            .match_requests(|req| {
                let types: Vec<_> = req.entries().iter().filter_map(|e| e.detail_type()).collect();
                types == ["TaskChanged", "StoryAdded"]
            })
            .then_output(|| {
                PutEventsOutput::builder()
                    .failed_entry_count(0)
                    .entries(PutEventsResultEntry::builder().event_id("a").build())
                    .entries(PutEventsResultEntry::builder().event_id("b").build())
                    .build()
            });
        let bus = EventBridgeBus::from_client(mock_client!(aws_sdk_eventbridge, [&rule]));

        bus.put_entries(&[entry("TaskChanged"), entry("StoryAdded")])
            .await
            .unwrap();
        assert_eq!(rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_entries_are_an_error() {
        let rule = mock!(aws_sdk_eventbridge::Client::put_events).then_output(|| {
            PutEventsOutput::builder()
                .failed_entry_count(1)
                .entries(PutEventsResultEntry::builder().event_id("a").build())
                .entries(
                    PutEventsResultEntry::builder()
                        .error_code("InternalFailure")
                        .error_message("entry rejected")
                        .build(),
                )
                .build()
        });
        let bus = EventBridgeBus::from_client(mock_client!(aws_sdk_eventbridge, [&rule]));

        let err = bus
            .put_entries(&[entry("TaskChanged"), entry("TaskChanged")])
            .await
            .unwrap_err();

        assert!(matches!(err, BusError::PartialFailure { failed: 1, total: 2 }));
        assert!(err.is_retryable());
    }
}
