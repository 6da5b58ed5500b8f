//! End-to-end relay scenarios across registry, proximity and audio components

use assert_approx_eq::assert_approx_eq;
use bytes::Bytes;
use proximity_voice_relay::app::AppState;
use proximity_voice_relay::config::Config;
use proximity_voice_relay::proximity::{broadcast_user_lists, Position};
use proximity_voice_relay::session::{Outbound, Transport};
use proximity_voice_relay::ws::dispatch::{handle_binary, handle_text, Dispatch};
use serde_json::Value;
use tokio::sync::mpsc::Receiver;

fn connect(state: &AppState, name: &str) -> Receiver<Outbound> {
    let (transport, rx) = Transport::channel(16);
    state.registry.register(name, transport).unwrap();
    rx
}

fn drain_user_lists(rx: &mut Receiver<Outbound>) -> Vec<Value> {
    let mut lists = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let Outbound::Text(text) = msg {
            lists.push(serde_json::from_str(&text).unwrap());
        }
    }
    lists
}

fn set_position(x: f64, y: f64, z: f64) -> String {
    serde_json::json!({"type": "setPosition", "position": {"x": x, "y": y, "z": z}}).to_string()
}

/// PROXIMITY TOPOLOGY
mod topology {
    use super::*;

    /// B walks out of A's range and A's next user list no longer lists B
    #[tokio::test]
    async fn walking_out_of_range_drops_the_peer() {
        let state = AppState::new(Config::default()).unwrap();
        let mut a_rx = connect(&state, "a");
        let _b_rx = connect(&state, "b");

        handle_text(&state, "b", &set_position(10.0, 0.0, 0.0));
        let lists = drain_user_lists(&mut a_rx);
        let latest = lists.last().unwrap();
        assert_eq!(latest["users"][0]["username"], "b");
        assert_approx_eq!(latest["users"][0]["distance"].as_f64().unwrap(), 10.0);

        handle_text(&state, "b", &set_position(100.0, 0.0, 0.0));
        let lists = drain_user_lists(&mut a_rx);
        assert!(lists.last().unwrap()["users"].as_array().unwrap().is_empty());
    }

    /// A leave is visible to everyone on the next broadcast
    #[tokio::test]
    async fn disconnect_removes_peer_everywhere() {
        let state = AppState::new(Config::default()).unwrap();
        let mut a_rx = connect(&state, "a");
        let mut b_rx = connect(&state, "b");
        let _c_rx = connect(&state, "c");

        state.registry.unregister("c");
        broadcast_user_lists(&state.registry, &state.engine);

        for rx in [&mut a_rx, &mut b_rx] {
            let lists = drain_user_lists(rx);
            let users = lists.last().unwrap()["users"].as_array().unwrap().clone();
            assert_eq!(users.len(), 1);
            assert_ne!(users[0]["username"], "c");
        }
    }

    /// A malformed update neither moves the sender nor wakes anyone
    #[tokio::test]
    async fn malformed_update_is_silent() {
        let state = AppState::new(Config::default()).unwrap();
        let mut a_rx = connect(&state, "a");
        let mut b_rx = connect(&state, "b");

        let outcome = handle_text(&state, "a", r#"{"type":"setPosition","position":{"x":1,"y":2}}"#);
        assert_eq!(outcome, Dispatch::Dropped);
        assert_eq!(state.registry.get("a").unwrap().position, Position::ORIGIN);
        assert!(drain_user_lists(&mut a_rx).is_empty());
        assert!(drain_user_lists(&mut b_rx).is_empty());
    }
}

/// AUDIO FAN-OUT
mod audio {
    use super::*;

    fn ogg_frame(samples: &[i16]) -> Bytes {
        let mut frame = b"OggS".to_vec();
        frame.resize(50, 0x11);
        for s in samples {
            frame.extend_from_slice(&s.to_le_bytes());
        }
        Bytes::from(frame)
    }

    fn binary(rx: &mut Receiver<Outbound>) -> Option<Bytes> {
        while let Ok(msg) = rx.try_recv() {
            if let Outbound::Binary(b) = msg {
                return Some(b);
            }
        }
        None
    }

    /// Each listener gets its own gain; the preamble is never touched
    #[tokio::test]
    async fn listeners_hear_distance_scaled_audio() {
        let state = AppState::new(Config::default()).unwrap();
        let _speaker = connect(&state, "speaker");
        let mut close = connect(&state, "close");
        let mut halfway = connect(&state, "halfway");
        let mut distant = connect(&state, "distant");
        state.registry.update_position("halfway", Position::new(0.0, 15.0, 0.0));
        state.registry.update_position("distant", Position::new(0.0, 0.0, 31.0));

        let frame = ogg_frame(&[4096, -4096]);
        handle_binary(&state, "speaker", frame.clone());

        let close_frame = binary(&mut close).unwrap();
        assert_eq!(close_frame, frame);

        let half_frame = binary(&mut halfway).unwrap();
        assert_eq!(&half_frame[..50], &frame[..50]);
        assert_eq!(i16::from_le_bytes([half_frame[50], half_frame[51]]), 2048);
        assert_eq!(i16::from_le_bytes([half_frame[52], half_frame[53]]), -2048);

        assert!(binary(&mut distant).is_none());
    }

    /// A listener that hung up costs nothing to the others
    #[tokio::test]
    async fn hung_up_listener_is_skipped() {
        let state = AppState::new(Config::default()).unwrap();
        let _speaker = connect(&state, "speaker");
        let gone = connect(&state, "gone");
        let mut stays = connect(&state, "stays");
        drop(gone);

        match handle_binary(&state, "speaker", ogg_frame(&[100])) {
            Dispatch::Relayed(report) => {
                assert_eq!(report.delivered, 1);
                assert_eq!(report.unreachable, 1);
            }
            other => panic!("expected relay, got {:?}", other),
        }
        assert!(binary(&mut stays).is_some());
    }
}
