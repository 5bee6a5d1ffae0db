//! Payout calculation and round result types.

use crate::hand::{DealerHand, Hand, HandStatus};
use crate::options::TableOptions;
use crate::records::{HandSlot, RecordId};

/// Result of a single hand after settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandOutcome {
    /// Player wins (dealer busts or player has higher value).
    Win,
    /// Player loses (player busts or dealer has higher value).
    Lose,
    /// Push (tie).
    Push,
    /// Natural blackjack paid at the bonus rate.
    Blackjack,
}

/// The dealer's final position, all a payout needs to know about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DealerOutcome {
    /// Final total.
    pub value: u8,
    /// Number of cards held.
    pub card_count: usize,
}

impl DealerOutcome {
    /// Reads the outcome off a finished dealer hand.
    #[must_use]
    pub fn of(dealer: &DealerHand) -> Self {
        Self {
            value: dealer.value(),
            card_count: dealer.len(),
        }
    }

    /// Two cards totalling 21.
    #[must_use]
    pub const fn is_blackjack(&self) -> bool {
        self.card_count == 2 && self.value == 21
    }

    /// Over 21.
    #[must_use]
    pub const fn is_bust(&self) -> bool {
        self.value > 21
    }
}

/// Settles one hand against the dealer.
///
/// Returns the outcome and the chips to credit, stake included. A hand in the
/// split slot never earns the blackjack bonus.
///
/// # Example
///
/// ```
/// use bjtable::payout::{DealerOutcome, HandOutcome, settle_hand};
/// use bjtable::records::HandSlot;
/// use bjtable::{Card, Hand, Suit, TableOptions};
///
/// let hand = Hand::dealt(Card::new(Suit::Hearts, 1), Card::new(Suit::Spades, 13), 100);
/// let dealer = DealerOutcome { value: 19, card_count: 3 };
/// let options = TableOptions::default();
///
/// assert_eq!(
///     settle_hand(&hand, HandSlot::Main, dealer, &options),
///     (HandOutcome::Blackjack, 250)
/// );
/// ```
#[must_use]
pub fn settle_hand(
    hand: &Hand,
    slot: HandSlot,
    dealer: DealerOutcome,
    options: &TableOptions,
) -> (HandOutcome, u64) {
    let bet = hand.bet();
    let natural = hand.status() == HandStatus::Blackjack && slot == HandSlot::Main;

    if hand.status() == HandStatus::Busted {
        return (HandOutcome::Lose, 0);
    }

    if natural {
        if dealer.is_blackjack() {
            return (HandOutcome::Push, bet);
        }
        #[expect(
            clippy::cast_precision_loss,
            reason = "f64 has sufficient precision for chip amounts"
        )]
        let bonus = options
            .rounding_blackjack
            .apply(bet as f64 * options.blackjack_pays);
        return (HandOutcome::Blackjack, bet + bonus);
    }

    if dealer.is_blackjack() {
        (HandOutcome::Lose, 0)
    } else if dealer.is_bust() || hand.value() > dealer.value {
        (HandOutcome::Win, bet * 2)
    } else if hand.value() == dealer.value {
        (HandOutcome::Push, bet)
    } else {
        (HandOutcome::Lose, 0)
    }
}

/// Result for a single hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandResult {
    /// Which hand this was.
    pub slot: HandSlot,
    /// The outcome of the hand.
    pub outcome: HandOutcome,
    /// The stake on this hand.
    pub bet: u64,
    /// Chips credited back, stake included.
    pub payout: u64,
    /// The player's hand value.
    pub player_value: u8,
    /// The dealer's hand value.
    pub dealer_value: u8,
}

/// Result for a single player after settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerResult {
    /// The player record id.
    pub player_id: RecordId,
    /// Seat the player sat in.
    pub seat_position: u8,
    /// Results for each hand (two if split).
    pub hands: Vec<HandResult>,
    /// Total credited for all hands.
    pub total_payout: u64,
    /// Net result for the round (positive = profit, negative = loss).
    pub net: i64,
}

/// Result of the entire round after settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    /// Round that was settled.
    pub round_number: u64,
    /// Results for each bettor in seat order.
    pub players: Vec<PlayerResult>,
    /// The dealer's final hand value.
    pub dealer_value: u8,
    /// Whether the dealer busted.
    pub dealer_bust: bool,
    /// Whether the dealer had blackjack.
    pub dealer_blackjack: bool,
}

impl RoundResult {
    /// Result for one player.
    #[must_use]
    pub fn player(&self, player_id: &str) -> Option<&PlayerResult> {
        self.players.iter().find(|p| p.player_id == player_id)
    }
}
