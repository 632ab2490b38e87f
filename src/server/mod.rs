// ============================================================
// Layer 7 — WebSocket Serving Loop
// ============================================================
// Serves the trained policy to a running game over WebSocket.
//
// Protocol, one message pair per game tick:
//   client → server: the current car state as JSON
//       {"x":512,"y":384,"vx":150,"vy":0,"angle":0.0,
//        "rayDistances":[0.8,0.6,1.0]}
//   server → client: the control decision
//       {"steering":-0.12,"throttle":0.97}
//
// One task per connection; the engine is shared behind an Arc.
// predict takes &self and mutates nothing, so no locking is
// needed. A malformed message or a frame missing the cues the
// snapshot's feature mode requires degrades only that request:
// we log a warning and keep reading. Only a close frame or a
// transport error ends the connection task.
//
// The ndarray backend's tensors are not Sync, so the engine must
// stay on one thread. Connection tasks therefore run on a
// current-thread runtime via a LocalSet: still one task per
// connection, interleaved on a single thread. A prediction is a
// sub-millisecond CPU forward pass, so one thread keeps up with
// game-tick traffic comfortably.
//
// Reference: tokio-tungstenite accept_async examples,
//            tokio LocalSet documentation

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::domain::telemetry::CarState;
use crate::domain::traits::ActionPolicy;
use crate::ml::inferencer::InferenceEngine;

/// Bind the listener and serve until killed. Builds its own
/// Tokio runtime so the CLI stays synchronous.
pub fn run(bind: &str, engine: Arc<InferenceEngine>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, serve(bind, engine))
}

async fn serve(bind: &str, engine: Arc<InferenceEngine>) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Cannot bind WebSocket server to '{bind}'"))?;

    tracing::info!("Policy server listening on ws://{bind}");
    println!("Policy server ready on ws://{bind} — press Ctrl-C to stop");

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::info!("Connection from {peer}");
                let engine = Arc::clone(&engine);
                // spawn_local, not spawn: the engine's tensors are
                // not Sync, so the task must not cross threads.
                tokio::task::spawn_local(async move {
                    if let Err(e) = handle_connection(stream, engine).await {
                        tracing::warn!("Connection {peer} ended with error: {e:#}");
                    }
                });
            }
            Err(e) => {
                tracing::warn!("Accept failed: {e}");
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, engine: Arc<InferenceEngine>) -> Result<()> {
    let ws = tokio_tungstenite::accept_async(stream)
        .await
        .context("WebSocket handshake failed")?;
    let (mut sink, mut source) = ws.split();

    while let Some(message) = source.next().await {
        match message? {
            Message::Text(text) => {
                if let Some(reply) = handle_message(engine.as_ref(), &text) {
                    sink.send(Message::Text(reply)).await?;
                }
            }
            Message::Ping(payload) => sink.send(Message::Pong(payload)).await?,
            Message::Close(_) => break,
            _ => {}
        }
    }

    tracing::info!("Connection closed");
    Ok(())
}

/// Turn one incoming text message into one reply, or None when
/// the request is degraded. Generic over the policy so tests can
/// exercise the message handling without a trained snapshot.
fn handle_message<P: ActionPolicy>(policy: &P, text: &str) -> Option<String> {
    let state: CarState = match serde_json::from_str(text) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("Skipping malformed state message: {e}");
            return None;
        }
    };

    let action = match policy.predict(&state) {
        Ok(action) => action,
        Err(e) => {
            tracing::warn!("Skipping frame: {e}");
            return None;
        }
    };

    // Action serializes to exactly the wire shape.
    match serde_json::to_string(&action) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to encode reply: {e}");
            None
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action::Action;
    use crate::domain::error::MalformedFrameError;

    /// Canned policy so message handling is testable without a
    /// trained snapshot on disk.
    struct FixedPolicy;

    impl ActionPolicy for FixedPolicy {
        fn predict(&self, state: &CarState) -> Result<Action, MalformedFrameError> {
            if state.ray_distances.is_none() {
                return Err(MalformedFrameError { mode: "rays", missing: "rayDistances" });
            }
            Ok(Action { steering: -0.25, throttle: 1.0 })
        }
    }

    #[test]
    fn well_formed_message_gets_a_reply() {
        let text = r#"{"x":512,"y":384,"vx":150,"vy":0,"angle":0.0,"rayDistances":[0.8,0.6,1.0]}"#;
        let reply = handle_message(&FixedPolicy, text).unwrap();
        assert_eq!(reply, r#"{"steering":-0.25,"throttle":1.0}"#);
    }

    #[test]
    fn malformed_json_is_skipped_not_fatal() {
        assert!(handle_message(&FixedPolicy, "not json at all").is_none());
        // The handler stays serviceable afterwards
        let text = r#"{"x":0,"y":0,"vx":0,"vy":0,"angle":0,"rayDistances":[1.0]}"#;
        assert!(handle_message(&FixedPolicy, text).is_some());
    }

    #[test]
    fn frame_missing_cues_degrades_only_that_request() {
        let text = r#"{"x":512,"y":384,"vx":150,"vy":0,"angle":0.0}"#;
        assert!(handle_message(&FixedPolicy, text).is_none());
    }

    #[test]
    fn serves_predictions_over_a_real_websocket() {
        use crate::data::features::{FeatureConfig, FeatureMode};
        use crate::infra::metrics::TrainingHistory;
        use crate::infra::snapshot::{NetworkMeta, SnapshotMeta, SnapshotStore};
        use crate::ml::model::PolicyNetConfig;

        // A fresh (untrained) snapshot is enough — the property
        // under test is the full parse → predict → reply loop over
        // an actual connection.
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_str().unwrap()).unwrap();
        let features = FeatureConfig {
            canvas_width:  1024.0,
            canvas_height: 768.0,
            max_speed:     300.0,
            mode:          FeatureMode::Rays { count: 3 },
        };
        let network = NetworkMeta { input_size: 9, hidden_sizes: vec![8], dropout: 0.0 };
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let model = PolicyNetConfig::new(9, vec![8]).init::<burn::backend::NdArray>(&device);
        let meta = SnapshotMeta::new(features, network, TrainingHistory::default());
        store.save(&model, "best", &meta).unwrap();

        // The engine is built inside the server thread: it is Send
        // but not Sync, so an Arc to it cannot cross threads.
        let bind = "127.0.0.1:49731";
        let snapshot_dir = dir.path().to_str().unwrap().to_string();
        std::thread::spawn(move || {
            let store = SnapshotStore::new(snapshot_dir).unwrap();
            let engine = Arc::new(InferenceEngine::from_snapshot(&store, "best").unwrap());
            let _ = run(bind, engine);
        });

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let reply = runtime.block_on(async {
            let mut ws = None;
            for _ in 0..100 {
                match tokio_tungstenite::connect_async(format!("ws://{bind}")).await {
                    Ok((stream, _)) => {
                        ws = Some(stream);
                        break;
                    }
                    Err(_) => tokio::time::sleep(Duration::from_millis(50)).await,
                }
            }
            let mut ws = ws.expect("server never came up");

            let state =
                r#"{"x":512,"y":384,"vx":150,"vy":0,"angle":0.0,"rayDistances":[0.8,0.6,1.0]}"#;
            ws.send(Message::Text(state.to_string())).await.unwrap();

            loop {
                match ws.next().await.unwrap().unwrap() {
                    Message::Text(text) => break text,
                    _ => {}
                }
            }
        });

        let action: Action = serde_json::from_str(&reply).unwrap();
        assert!((-1.0..=1.0).contains(&action.steering));
        assert!((0.0..=1.0).contains(&action.throttle));
    }
}
