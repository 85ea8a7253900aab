use crate::models::{CertificateId, PoolId, TournamentId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Notifications emitted by the engine for downstream indexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    RoundBoundsSet {
        tournament_id: TournamentId,
        round: u32,
        start: i64,
        end: i64,
    },
    RoundAdvanced {
        tournament_id: TournamentId,
        round: u32,
    },
    RoundReverted {
        tournament_id: TournamentId,
        round: u32,
    },
    TruthRevealed {
        tournament_id: TournamentId,
        revealed_slots: usize,
    },
    FinalsScoreSet {
        tournament_id: TournamentId,
        finals_score_sum: u32,
    },
    CertificateScored {
        certificate_id: CertificateId,
        round: u32,
        round_score: u64,
        total_score: u64,
    },
    PredictionsUpdated {
        certificate_id: CertificateId,
        start_index: usize,
        update_count: u32,
    },
    ScoresFinalized {
        pool_id: PoolId,
        inserted: usize,
        entries: usize,
        digest: String,
    },
    RewardClaimed {
        pool_id: PoolId,
        certificate_id: CertificateId,
        amount: u128,
    },
}

impl EngineEvent {
    /// Short name used by the audit trail
    pub fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::RoundBoundsSet { .. } => "round_bounds_set",
            EngineEvent::RoundAdvanced { .. } => "round_advanced",
            EngineEvent::RoundReverted { .. } => "round_reverted",
            EngineEvent::TruthRevealed { .. } => "truth_revealed",
            EngineEvent::FinalsScoreSet { .. } => "finals_score_set",
            EngineEvent::CertificateScored { .. } => "certificate_scored",
            EngineEvent::PredictionsUpdated { .. } => "predictions_updated",
            EngineEvent::ScoresFinalized { .. } => "scores_finalized",
            EngineEvent::RewardClaimed { .. } => "reward_claimed",
        }
    }

    /// Channel the event belongs to: "tournament:{id}", "pool:{id}" or "certificate:{id}"
    pub fn channel(&self) -> String {
        match self {
            EngineEvent::RoundBoundsSet { tournament_id, .. }
            | EngineEvent::RoundAdvanced { tournament_id, .. }
            | EngineEvent::RoundReverted { tournament_id, .. }
            | EngineEvent::TruthRevealed { tournament_id, .. }
            | EngineEvent::FinalsScoreSet { tournament_id, .. } => {
                format!("tournament:{}", tournament_id)
            }
            EngineEvent::CertificateScored { certificate_id, .. }
            | EngineEvent::PredictionsUpdated { certificate_id, .. } => {
                format!("certificate:{}", certificate_id)
            }
            EngineEvent::ScoresFinalized { pool_id, .. }
            | EngineEvent::RewardClaimed { pool_id, .. } => format!("pool:{}", pool_id),
        }
    }
}

/// Broadcast hub for engine events
///
/// Publishing never fails: events are advisory and a missing or lagging
/// subscriber must not affect the engine.
#[derive(Debug, Clone)]
pub struct EventNotifier {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventNotifier {
    /// Create a notifier buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: EngineEvent) {
        let channel = event.channel();
        if self.tx.send(event).is_err() {
            debug!("No subscribers for event on {}", channel);
        }
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let notifier = EventNotifier::new(4);
        notifier.publish(EngineEvent::RoundAdvanced {
            tournament_id: 1,
            round: 2,
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_in_order() {
        let notifier = EventNotifier::new(4);
        let mut rx = notifier.subscribe();
        notifier.publish(EngineEvent::RoundAdvanced {
            tournament_id: 1,
            round: 2,
        });
        notifier.publish(EngineEvent::RoundReverted {
            tournament_id: 1,
            round: 1,
        });

        assert_eq!(rx.recv().await.unwrap().event_type(), "round_advanced");
        assert_eq!(rx.recv().await.unwrap().event_type(), "round_reverted");
    }

    #[test]
    fn test_event_json_shape() {
        let event = EngineEvent::CertificateScored {
            certificate_id: 9,
            round: 1,
            round_score: 32,
            total_score: 32,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "certificate_scored");
        assert_eq!(json["round_score"], 32);
        assert_eq!(event.channel(), "certificate:9");
    }
}
