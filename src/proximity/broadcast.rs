//! Fan-out of recomputed nearby sets to every session

use tracing::{debug, error};

use crate::session::{Outbound, SessionRegistry};
use crate::ws::protocol::ServerMsg;

use super::ProximityEngine;

/// Outcome of one broadcast pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub unreachable: usize,
}

/// Send every session its current `userList`.
///
/// All nearby sets come from a single snapshot taken on entry, so the pass
/// reflects every mutation made before the call. A failing recipient is
/// logged and skipped.
pub fn broadcast_user_lists(registry: &SessionRegistry, engine: &ProximityEngine) -> BroadcastReport {
    let snapshot = registry.snapshot();
    let mut report = BroadcastReport::default();

    for session in snapshot.iter() {
        let msg = ServerMsg::UserList {
            users: engine.nearby_in(&snapshot, session.identity()),
        };

        let outbound = match Outbound::json(&msg) {
            Ok(outbound) => outbound,
            Err(e) => {
                error!(identity = %session.identity(), error = %e, "Failed to encode user list");
                report.unreachable += 1;
                continue;
            }
        };

        match session.transport.send(outbound) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                debug!(identity = %session.identity(), error = %e, "User list not delivered");
                report.unreachable += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proximity::Position;
    use crate::session::Transport;
    use serde_json::Value;
    use tokio::sync::mpsc::Receiver;

    fn user_list(rx: &mut Receiver<Outbound>) -> Value {
        match rx.try_recv() {
            Ok(Outbound::Text(text)) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    #[test]
    fn every_session_gets_its_own_view() {
        let registry = SessionRegistry::new();
        let (ta, mut ra) = Transport::channel(4);
        let (tb, mut rb) = Transport::channel(4);
        let (tc, mut rc) = Transport::channel(4);
        registry.register("a", ta).unwrap();
        registry.register("b", tb).unwrap();
        registry.register("c", tc).unwrap();
        registry.update_position("b", Position::new(10.0, 0.0, 0.0));
        registry.update_position("c", Position::new(500.0, 0.0, 0.0));

        let report = broadcast_user_lists(&registry, &ProximityEngine::default());
        assert_eq!(report, BroadcastReport { delivered: 3, unreachable: 0 });

        let a = user_list(&mut ra);
        assert_eq!(a["type"], "userList");
        assert_eq!(a["users"].as_array().unwrap().len(), 1);
        assert_eq!(a["users"][0]["username"], "b");
        assert_eq!(a["users"][0]["distance"], 10.0);
        assert!(a["users"][0]["volume"].is_number());

        assert_eq!(user_list(&mut rb)["users"][0]["username"], "a");
        assert!(user_list(&mut rc)["users"].as_array().unwrap().is_empty());
    }

    #[test]
    fn closed_recipient_does_not_stop_the_others() {
        let registry = SessionRegistry::new();
        let (ta, mut ra) = Transport::channel(4);
        let (tb, rb) = Transport::channel(4);
        let (tc, mut rc) = Transport::channel(4);
        registry.register("a", ta).unwrap();
        registry.register("b", tb).unwrap();
        registry.register("c", tc).unwrap();
        drop(rb);

        let report = broadcast_user_lists(&registry, &ProximityEngine::default());
        assert_eq!(report, BroadcastReport { delivered: 2, unreachable: 1 });

        assert_eq!(user_list(&mut ra)["users"].as_array().unwrap().len(), 2);
        assert_eq!(user_list(&mut rc)["users"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn empty_registry_is_a_no_op() {
        let report = broadcast_user_lists(&SessionRegistry::new(), &ProximityEngine::default());
        assert_eq!(report, BroadcastReport::default());
    }
}
