//! Position update fan-out over bounded channels
//!
//! Every successfully applied fill produces one [`PositionUpdate`] carrying a
//! detached snapshot. Updates are `try_send`-ed so the single writer never
//! blocks on a slow reader: a full channel drops the update, a disconnected
//! channel is pruned.

use crate::core::{FillOutcome, Position, PositionSnapshot, Side};
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One applied fill and the resulting position state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    /// Strictly increasing per manager, starting at 1
    pub sequence: u64,
    pub side: Side,
    pub fill_qty: Decimal,
    pub fill_price: Decimal,
    pub outcome: FillOutcome,
    /// Position after the fill, marked at the fill price
    pub snapshot: PositionSnapshot,
}

/// Fan-out of position updates to any number of channels
#[derive(Debug, Default)]
pub struct UpdatePublisher {
    senders: Vec<Sender<PositionUpdate>>,
    sequence: u64,
    dropped: u64,
}

impl UpdatePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new bounded update channel
    pub fn channel(&mut self, capacity: usize) -> Receiver<PositionUpdate> {
        let (sender, receiver) = bounded(capacity.max(1));
        self.senders.push(sender);
        receiver
    }

    /// Number of channels still attached
    pub fn listener_count(&self) -> usize {
        self.senders.len()
    }

    /// Last sequence number assigned
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Updates dropped because a channel was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Assign the next sequence number and send the update to every channel
    ///
    /// The snapshot is only built when at least one channel is attached.
    pub fn publish(
        &mut self,
        side: Side,
        fill_qty: Decimal,
        fill_price: Decimal,
        outcome: FillOutcome,
        position: &Position,
    ) {
        self.sequence += 1;

        if self.senders.is_empty() {
            return;
        }

        let update = PositionUpdate {
            sequence: self.sequence,
            side,
            fill_qty,
            fill_price,
            outcome,
            snapshot: position.snapshot(fill_price),
        };

        let mut dropped = 0;
        self.senders.retain(|sender| match sender.try_send(update.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                dropped += 1;
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("Position update channel disconnected, removing");
                false
            }
        });

        if dropped > 0 {
            self.dropped += dropped;
            warn!(
                "Position update {} for {} dropped on {} full channel(s) (total dropped: {})",
                update.sequence, update.snapshot.symbol, dropped, self.dropped
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CostBasisMethod;
    use rust_decimal_macros::dec;

    fn filled_position() -> (Position, FillOutcome) {
        let mut pos = Position::new("BTCUSDT", CostBasisMethod::WeightedAverage);
        let outcome = pos.apply_fill(Side::Buy, dec!(1), dec!(50000)).unwrap();
        (pos, outcome)
    }

    #[test]
    fn test_publish_without_listeners_advances_sequence() {
        let mut publisher = UpdatePublisher::new();
        let (pos, outcome) = filled_position();

        publisher.publish(Side::Buy, dec!(1), dec!(50000), outcome, &pos);
        publisher.publish(Side::Buy, dec!(1), dec!(50000), outcome, &pos);

        assert_eq!(publisher.sequence(), 2);
        assert_eq!(publisher.listener_count(), 0);
    }

    #[test]
    fn test_publish_reaches_every_channel() {
        let mut publisher = UpdatePublisher::new();
        let rx1 = publisher.channel(4);
        let rx2 = publisher.channel(4);
        let (pos, outcome) = filled_position();

        publisher.publish(Side::Buy, dec!(1), dec!(50000), outcome, &pos);

        let u1 = rx1.try_recv().unwrap();
        let u2 = rx2.try_recv().unwrap();
        assert_eq!(u1, u2);
        assert_eq!(u1.sequence, 1);
        assert_eq!(u1.snapshot.size, dec!(1));
        assert_eq!(u1.snapshot.mark_price, dec!(50000));
    }

    #[test]
    fn test_full_channel_drops_update() {
        let mut publisher = UpdatePublisher::new();
        let rx = publisher.channel(1);
        let (pos, outcome) = filled_position();

        publisher.publish(Side::Buy, dec!(1), dec!(50000), outcome, &pos);
        publisher.publish(Side::Buy, dec!(1), dec!(50000), outcome, &pos);

        assert_eq!(publisher.dropped(), 1);
        assert_eq!(publisher.listener_count(), 1);
        assert_eq!(rx.try_recv().unwrap().sequence, 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disconnected_channel_is_pruned() {
        let mut publisher = UpdatePublisher::new();
        let rx = publisher.channel(4);
        drop(rx);
        let (pos, outcome) = filled_position();

        publisher.publish(Side::Buy, dec!(1), dec!(50000), outcome, &pos);

        assert_eq!(publisher.listener_count(), 0);
        assert_eq!(publisher.dropped(), 0);
    }
}
