//! HookRelay Emitter - verified delivery publisher.
//!
//! This binary:
//! 1. Consumes verified raw payloads from the verified_deliveries queue
//! 2. Parses them into domain events
//! 3. Publishes the events to the event bus in batches of at most 10
//!
//! A delivery whose publish fails is requeued whole, so the bus sees it at
//! least once. The broker dead-letters it after `DELIVERY_LIMIT` attempts.
//! Malformed payloads are dead-lettered straight away.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use lapin::{
    options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions},
    types::FieldTable,
    Connection, ConnectionProperties,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hookrelay::queue::declare_queues;
use hookrelay::queue::types::EMITTER_CONSUMER_TAG;
use hookrelay::{process_delivery, BatchEmitter, Config, EventBridgeBus, FORWARD_QUEUE};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("emitter_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        concurrency = config.emitter_concurrency,
        event_bus_name = %config.event_bus_name,
        event_source = %config.event_source,
        "config_loaded"
    );

    run(config).await?;

    Ok(())
}

/// Run the emitter.
async fn run(config: Config) -> Result<()> {
    let sdk_config = aws_config::from_env().load().await;
    let bus = EventBridgeBus::new(&sdk_config);
    let emitter = Arc::new(BatchEmitter::new(
        Arc::new(bus),
        config.event_bus_name.clone(),
        config.event_source.clone(),
    ));

    info!(url_length = config.amqp_url.len(), "rabbitmq_connecting");

    let conn = Connection::connect(&config.amqp_url, ConnectionProperties::default())
        .await
        .context("Failed to connect to RabbitMQ")?;

    info!("rabbitmq_connected");

    let channel = conn
        .create_channel()
        .await
        .context("Failed to create channel")?;

    info!("rabbitmq_channel_created");

    // Bound the number of deliveries in flight
    let prefetch_count = config.emitter_concurrency.clamp(1, u16::MAX as usize) as u16;
    channel
        .basic_qos(prefetch_count, BasicQosOptions::default())
        .await
        .context("Failed to set QoS")?;

    info!(prefetch_count = prefetch_count, "rabbitmq_qos_set");

    declare_queues(&channel).await?;

    let mut consumer = channel
        .basic_consume(
            FORWARD_QUEUE,
            EMITTER_CONSUMER_TAG,
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .context("Failed to start consumer")?;

    info!(queue = FORWARD_QUEUE, "rabbitmq_consumer_started");
    info!("emitter_ready");

    let channel = Arc::new(channel);

    let shutdown = async {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received SIGINT"),
            _ = terminate => info!("Received SIGTERM"),
        }
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("emitter_stopping");
                break;
            }
            delivery = consumer.next() => {
                match delivery {
                    Some(Ok(delivery)) => {
                        let delivery_tag = delivery.delivery_tag;
                        let identity = delivery
                            .properties
                            .message_id()
                            .as_ref()
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| "unknown".to_string());

                        info!(
                            queue = FORWARD_QUEUE,
                            identity = %identity,
                            delivery_tag = delivery_tag,
                            body_length = delivery.data.len(),
                            "rabbitmq_delivery_received"
                        );

                        let emitter = Arc::clone(&emitter);
                        let channel = Arc::clone(&channel);

                        // Deliveries are independent; events within one stay ordered
                        tokio::spawn(async move {
                            match process_delivery(&emitter, &delivery.data).await {
                                Ok(batches) => {
                                    if let Err(e) = channel
                                        .basic_ack(delivery_tag, BasicAckOptions::default())
                                        .await
                                    {
                                        error!(
                                            delivery_tag = delivery_tag,
                                            error = %e,
                                            "rabbitmq_ack_failed"
                                        );
                                    } else {
                                        info!(
                                            identity = %identity,
                                            batches = batches,
                                            "delivery_emitted"
                                        );
                                    }
                                }
                                Err(e) => {
                                    let requeue = e.is_retryable();
                                    error!(
                                        identity = %identity,
                                        error = %e,
                                        requeue = requeue,
                                        body_preview = %String::from_utf8_lossy(
                                            &delivery.data[..delivery.data.len().min(500)]
                                        ),
                                        "delivery_emit_failed"
                                    );

                                    if let Err(nack_err) = channel
                                        .basic_nack(
                                            delivery_tag,
                                            BasicNackOptions {
                                                requeue,
                                                ..Default::default()
                                            },
                                        )
                                        .await
                                    {
                                        error!(
                                            delivery_tag = delivery_tag,
                                            error = %nack_err,
                                            "rabbitmq_nack_failed"
                                        );
                                    }
                                }
                            }
                        });
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "rabbitmq_delivery_error");
                    }
                    None => {
                        warn!("rabbitmq_consumer_closed");
                        break;
                    }
                }
            }
        }
    }

    if let Err(e) = conn.close(200, "Normal shutdown").await {
        warn!(error = %e, "rabbitmq_connection_close_error");
    }

    info!("emitter_shutdown_complete");
    Ok(())
}
