// Tests for the read loop over a local WebSocket

use super::test_helpers::*;

#[cfg(test)]
mod event_loop_tests {
    use super::*;
    use crate::lcu::events::{run_event_loop, subscribe, subscribe_frame};
    use crate::lcu::policy::AutomationPolicy;
    use crate::lcu::types::GamePhase;
    use futures_util::{SinkExt, StreamExt};
    use reqwest::Method;
    use serde_json::json;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_util::sync::CancellationToken;

    fn event(uri: &str, data: serde_json::Value) -> Message {
        Message::Text(json!([8, "OnJsonApiEvent", {"uri": uri, "data": data}]).to_string())
    }

    /// Test: Events flow from the socket to the tracker
    ///
    /// Scenario: The server checks the subscription, sends a junk frame, a phase change and a
    /// ready check, then closes.
    /// Expected: The loop ends on close and the match is accepted exactly once.
    #[tokio::test]
    async fn test_loop_dispatches_until_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            let first = ws.next().await.unwrap().unwrap();
            assert_eq!(first, Message::Text(subscribe_frame()));

            ws.send(Message::Text(r#"[0,"session",1,"server"]"#.to_string()))
                .await
                .unwrap();
            ws.send(event("/lol-gameflow/v1/gameflow-phase", json!("ReadyCheck")))
                .await
                .unwrap();
            ws.send(event(
                "/lol-matchmaking/v1/ready-check",
                json!({"state": "InProgress", "playerResponse": "None"}),
            ))
            .await
            .unwrap();
            ws.send(event("/lol-matchmaking/v1/ready-check", json!(true)))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        });

        let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
            .await
            .unwrap();
        subscribe(&mut socket).await.unwrap();

        let (tracker, api) = create_tracker(AutomationPolicy {
            auto_accept_enabled: true,
            ..Default::default()
        });
        run_event_loop(socket, tracker.clone(), CancellationToken::new()).await;
        server.await.unwrap();

        assert_eq!(tracker.phase(), GamePhase::ReadyCheck);
        wait_for_calls(&api, 1).await;
        // Give a duplicate accept the chance to show up
        tokio::time::sleep(Duration::from_millis(50)).await;
        let accepts = api.calls_to(Method::POST, "/lol-matchmaking/v1/ready-check/accept");
        assert_eq!(accepts.len(), 1);
    }

    /// Test: Stop signal ends the loop
    ///
    /// Scenario: The server stays silent and the stop token is cancelled.
    /// Expected: The loop returns and the server sees the socket close.
    #[tokio::test]
    async fn test_loop_stops_on_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let mut saw_close = false;
            while let Some(msg) = ws.next().await {
                match msg {
                    Ok(Message::Close(_)) | Err(_) => {
                        saw_close = true;
                        break;
                    }
                    Ok(_) => {}
                }
            }
            saw_close
        });

        let (socket, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
            .await
            .unwrap();
        let (tracker, _api) = create_tracker(AutomationPolicy::default());
        let stop = CancellationToken::new();
        let event_loop = tokio::spawn(run_event_loop(socket, tracker, stop.clone()));

        stop.cancel();
        tokio::time::timeout(Duration::from_secs(2), event_loop)
            .await
            .unwrap()
            .unwrap();
        assert!(server.await.unwrap());
    }
}
