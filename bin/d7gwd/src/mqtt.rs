//! ---
//! gw_section: "06-daemon"
//! gw_subsection: "binary"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "MQTT publish-bus adapter."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use rumqttc::{
    AsyncClient, ClientError, ConnectionError, Event, MqttOptions, Outgoing, Packet, QoS, Transport,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use d7gw_common::MqttConfig;
use d7gw_msg::{PublishError, PublishIntent, Publisher, QualityOfService};

const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// What the event loop does after one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopStep {
    Continue,
    Backoff,
    Stop,
}

/// Requests leave the channel in order, so an outgoing DISCONNECT means every
/// publish queued before `close` has been written.
fn next_step(polled: &Result<Event, ConnectionError>, closing: bool) -> LoopStep {
    match polled {
        Ok(Event::Outgoing(Outgoing::Disconnect)) => LoopStep::Stop,
        Ok(_) => LoopStep::Continue,
        Err(_) if closing => LoopStep::Stop,
        Err(_) => LoopStep::Backoff,
    }
}

fn qos(level: QualityOfService) -> QoS {
    match level {
        QualityOfService::AtMostOnce => QoS::AtMostOnce,
        QualityOfService::AtLeastOnce => QoS::AtLeastOnce,
        QualityOfService::ExactlyOnce => QoS::ExactlyOnce,
    }
}

/// Publisher backed by a `rumqttc` client. Publishing only enqueues into
/// the client's request channel; the event loop task does the I/O.
pub struct MqttPublisher {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    closing: Arc<AtomicBool>,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl MqttPublisher {
    /// Connect and wait, at most `connect_timeout`, for the broker's CONNACK.
    pub async fn connect(config: &MqttConfig) -> Result<Self> {
        config.validate()?;
        let mut options = MqttOptions::new(&config.client_id, &config.broker, config.port);
        options.set_keep_alive(config.keep_alive);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }
        if config.tls {
            options.set_transport(Transport::tls_with_default_config());
        }

        let (client, mut eventloop) = AsyncClient::new(options, config.request_capacity);
        let connected = Arc::new(AtomicBool::new(false));
        let (ready_tx, mut ready_rx) = watch::channel(false);

        let closing = Arc::new(AtomicBool::new(false));
        let flag = connected.clone();
        let stopping = closing.clone();
        let event_loop = tokio::spawn(async move {
            loop {
                let polled = eventloop.poll().await;
                let step = next_step(&polled, stopping.load(Ordering::SeqCst));
                match &polled {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        info!(code = ?ack.code, "mqtt connected");
                        flag.store(true, Ordering::SeqCst);
                        let _ = ready_tx.send(true);
                    }
                    Ok(Event::Incoming(Packet::PubAck(ack))) => {
                        info!(pkid = ack.pkid, "published message acknowledged");
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        flag.store(false, Ordering::SeqCst);
                        warn!("mqtt broker closed the session");
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                        flag.store(false, Ordering::SeqCst);
                        info!("mqtt disconnect sent");
                    }
                    Ok(event) => debug!(?event, "mqtt event"),
                    Err(err) if step == LoopStep::Stop => {
                        flag.store(false, Ordering::SeqCst);
                        debug!(error = %err, "mqtt connection ended while closing");
                    }
                    Err(err) => {
                        if flag.swap(false, Ordering::SeqCst) {
                            warn!(error = %err, "mqtt disconnected");
                        } else {
                            debug!(error = %err, "mqtt connection attempt failed");
                        }
                    }
                }
                match step {
                    LoopStep::Continue => {}
                    LoopStep::Backoff => tokio::time::sleep(RECONNECT_BACKOFF).await,
                    LoopStep::Stop => break,
                }
            }
        });

        let waited = tokio::time::timeout(config.connect_timeout, async {
            ready_rx.wait_for(|ready| *ready).await.map(|_| ())
        })
        .await;
        match waited {
            Ok(Ok(_)) => {}
            Ok(Err(_)) => {
                event_loop.abort();
                return Err(anyhow!("mqtt event loop stopped before connecting"));
            }
            Err(_) => {
                event_loop.abort();
                return Err(anyhow!(
                    "no connection acknowledgement from {}:{} within {:?}",
                    config.broker,
                    config.port,
                    config.connect_timeout
                ));
            }
        }

        Ok(Self {
            client,
            connected,
            closing,
            event_loop: Mutex::new(Some(event_loop)),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send DISCONNECT after everything already queued, then wait for the
    /// event loop to finish. The loop is aborted if it has not stopped
    /// within [`CLOSE_TIMEOUT`].
    pub async fn close(&self) {
        self.closing.store(true, Ordering::SeqCst);
        if let Err(err) = self.client.disconnect().await {
            debug!(error = %err, "mqtt disconnect request failed");
        }
        let Some(mut handle) = self.event_loop.lock().take() else {
            return;
        };
        match tokio::time::timeout(CLOSE_TIMEOUT, &mut handle).await {
            Ok(Ok(())) => debug!("mqtt event loop stopped"),
            Ok(Err(err)) => warn!(error = %err, "mqtt event loop failed"),
            Err(_) => {
                warn!(
                    timeout = ?CLOSE_TIMEOUT,
                    "mqtt event loop did not stop, queued messages may be lost"
                );
                handle.abort();
            }
        }
    }
}

impl Publisher for MqttPublisher {
    fn publish(&self, intent: &PublishIntent) -> d7gw_msg::Result<()> {
        if !self.is_connected() {
            return Err(PublishError::Disconnected);
        }
        self.client
            .try_publish(
                intent.topic(),
                qos(intent.qos()),
                intent.retain(),
                intent.payload().to_vec(),
            )
            .map_err(|err| match err {
                ClientError::TryRequest(_) => PublishError::QueueFull {
                    topic: intent.topic().to_owned(),
                },
                other => PublishError::Rejected {
                    transport: "mqtt",
                    reason: other.to_string(),
                },
            })
    }

    fn name(&self) -> &'static str {
        "mqtt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_stops_once_disconnect_is_written() {
        let sent = Ok(Event::Outgoing(Outgoing::Disconnect));
        assert_eq!(next_step(&sent, true), LoopStep::Stop);
        assert_eq!(next_step(&sent, false), LoopStep::Stop);

        let publish = Ok(Event::Outgoing(Outgoing::Publish(1)));
        assert_eq!(next_step(&publish, true), LoopStep::Continue);
    }

    #[test]
    fn errors_reconnect_unless_closing() {
        assert_eq!(
            next_step(&Err(ConnectionError::RequestsDone), false),
            LoopStep::Backoff
        );
        assert_eq!(
            next_step(&Err(ConnectionError::RequestsDone), true),
            LoopStep::Stop
        );
    }

    #[tokio::test]
    async fn close_joins_event_loop_without_broker() {
        // No broker: the loop keeps failing to connect until close is requested.
        let mut options = MqttOptions::new("d7gw-close", "127.0.0.1", 1);
        options.set_keep_alive(Duration::from_secs(5));
        let (client, mut eventloop) = AsyncClient::new(options, 4);
        let closing = Arc::new(AtomicBool::new(false));
        let stopping = closing.clone();
        let handle = tokio::spawn(async move {
            loop {
                let polled = eventloop.poll().await;
                if next_step(&polled, stopping.load(Ordering::SeqCst)) == LoopStep::Stop {
                    break;
                }
            }
        });
        let publisher = MqttPublisher {
            client,
            connected: Arc::new(AtomicBool::new(false)),
            closing,
            event_loop: Mutex::new(Some(handle)),
        };

        tokio::time::timeout(Duration::from_secs(10), publisher.close())
            .await
            .expect("close returns within its own bound");
        assert!(publisher.event_loop.lock().is_none());
        assert!(!publisher.is_connected());
    }
}
