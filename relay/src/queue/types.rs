//! Queue constants for the verified-delivery channel.
//!
//! Messages on `verified_deliveries` carry the raw request body of an
//! authenticated webhook call, byte for byte, with the identity as the
//! AMQP message id.

use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};

/// Queue name for authenticated deliveries awaiting emission.
pub const FORWARD_QUEUE: &str = "verified_deliveries";

/// Where deliveries go once they are rejected or exhaust their retries.
pub const DEAD_LETTER_QUEUE: &str = "verified_deliveries.dead";

/// Redeliveries allowed before the broker dead-letters a delivery.
pub const DELIVERY_LIMIT: i32 = 5;

/// Consumer tag used by the emitter.
pub const EMITTER_CONSUMER_TAG: &str = "hookrelay-emitter";

/// Declare arguments for `FORWARD_QUEUE`.
///
/// A quorum queue counts redeliveries, so a delivery the bus keeps refusing
/// is moved to `DEAD_LETTER_QUEUE` after `DELIVERY_LIMIT` attempts. A nack
/// without requeue goes there directly.
pub fn forward_queue_arguments() -> FieldTable {
    let mut args = FieldTable::default();
    args.insert(
        ShortString::from("x-queue-type"),
        AMQPValue::LongString(LongString::from("quorum")),
    );
    args.insert(
        ShortString::from("x-delivery-limit"),
        AMQPValue::LongInt(DELIVERY_LIMIT),
    );
    args.insert(
        ShortString::from("x-dead-letter-exchange"),
        AMQPValue::LongString(LongString::from("")),
    );
    args.insert(
        ShortString::from("x-dead-letter-routing-key"),
        AMQPValue::LongString(LongString::from(DEAD_LETTER_QUEUE)),
    );
    args
}
