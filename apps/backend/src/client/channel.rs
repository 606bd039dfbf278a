use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::domain::DomainError;
use crate::ws::hub::{BroadcastHub, Subscription};
use crate::ws::protocol::{ClientMsg, Envelope, ServerNotice, Topic};

/// Publish/subscribe over the three broadcast topics, as seen by a client
/// session. Delivery is at-least-once and unordered.
pub trait BroadcastChannel: Send + Sync {
    fn publish(&self, envelope: Envelope);
    fn subscribe(&self, topic: Topic) -> Subscription;
    fn unsubscribe(&self, topic: Topic, id: Uuid);
}

/// Channel backed by the in-process hub.
#[derive(Clone)]
pub struct HubChannel {
    hub: Arc<BroadcastHub>,
}

impl HubChannel {
    pub fn new(hub: Arc<BroadcastHub>) -> Self {
        Self { hub }
    }
}

impl BroadcastChannel for HubChannel {
    fn publish(&self, envelope: Envelope) {
        self.hub.publish(envelope);
    }

    fn subscribe(&self, topic: Topic) -> Subscription {
        self.hub.subscribe(topic)
    }

    fn unsubscribe(&self, topic: Topic, id: Uuid) {
        self.hub.unsubscribe(topic, id);
    }
}

type RelayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Channel over the server's `/api/ws` relay.
///
/// Inbound envelopes are fanned out through a local hub. Publishing sends a
/// `publish` frame; the server echoes accepted signals back to every
/// connection, this one included, so nothing is delivered locally.
/// Dropping the channel closes the socket.
pub struct WsChannel {
    local: Arc<BroadcastHub>,
    outbound: mpsc::UnboundedSender<Envelope>,
    token: CancellationToken,
}

impl WsChannel {
    /// Connect to a relay URL such as `ws://localhost:3001/api/ws`.
    pub async fn connect(url: &str) -> Result<Self, DomainError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| DomainError::persistence(format!("broadcast relay unreachable: {e}")))?;
        info!(url, "broadcast relay connected");

        let local = Arc::new(BroadcastHub::new());
        let (outbound, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        tokio::spawn(pump(stream, Arc::clone(&local), rx, token.clone()));

        Ok(Self {
            local,
            outbound,
            token,
        })
    }

    /// False once the socket has closed or failed.
    pub fn is_connected(&self) -> bool {
        !self.outbound.is_closed()
    }
}

impl BroadcastChannel for WsChannel {
    fn publish(&self, envelope: Envelope) {
        let topic = envelope.topic();
        if self.outbound.send(envelope).is_err() {
            warn!(topic = topic.as_str(), "broadcast relay closed, publish dropped");
        }
    }

    fn subscribe(&self, topic: Topic) -> Subscription {
        self.local.subscribe(topic)
    }

    fn unsubscribe(&self, topic: Topic, id: Uuid) {
        self.local.unsubscribe(topic, id);
    }
}

impl Drop for WsChannel {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn pump(
    stream: RelayStream,
    local: Arc<BroadcastHub>,
    mut outbound: mpsc::UnboundedReceiver<Envelope>,
    token: CancellationToken,
) {
    let (mut sink, mut inbound) = stream.split();
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                sink.close().await.ok();
                break;
            }
            next = outbound.recv() => {
                let Some(envelope) = next else { break };
                let frame = match serde_json::to_string(&ClientMsg::Publish { envelope }) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize publish frame");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::text(frame)).await {
                    warn!(error = %e, "broadcast relay send failed");
                    break;
                }
            }
            frame = inbound.next() => match frame {
                Some(Ok(Message::Text(text))) => dispatch(&local, text.as_str()),
                Some(Ok(Message::Close(_))) | None => {
                    info!("broadcast relay closed");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "broadcast relay read failed");
                    break;
                }
            },
        }
    }
}

fn dispatch(local: &BroadcastHub, text: &str) {
    if let Ok(envelope) = serde_json::from_str::<Envelope>(text) {
        local.publish(envelope);
        return;
    }
    match serde_json::from_str::<ServerNotice>(text) {
        Ok(ServerNotice::Pong) => debug!("relay pong"),
        Ok(ServerNotice::Error { code, message }) => {
            warn!(%code, %message, "broadcast relay rejected a frame");
        }
        Err(_) => warn!(frame = text, "unrecognised relay frame"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_forwards_envelopes_and_swallows_notices() {
        let local = BroadcastHub::new();
        let mut signals = local.subscribe(Topic::UpdateRound);

        dispatch(&local, r#"{"topic":"updateRound","data":{"gameId":"g1"}}"#);
        dispatch(&local, r#"{"type":"pong"}"#);
        dispatch(&local, r#"{"type":"error","code":"rejected","message":"finished"}"#);
        dispatch(&local, "not json");

        assert_eq!(signals.receiver.try_recv().unwrap(), Envelope::round_signal("g1"));
        assert!(signals.receiver.try_recv().is_err());
    }
}
