//! Round phases and the pure view clients derive from a poll.

use crate::payout::RoundResult;
use crate::records::{GameRecord, GameStatus, PlayerRecord, RecordId, TurnOwner};

/// Phase of the current round, derived from the shared records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Accepting seats and bets.
    Waiting,
    /// Cards are being dealt to the bettors.
    Dealing,
    /// Seated players act in seat order.
    PlayerTurns,
    /// Dealer reveals the hole card and draws.
    DealerTurn,
    /// Dealer finished; payouts are being credited.
    Settlement,
    /// The table is closed.
    Closed,
}

/// First player to act after the deal: the lowest seat with a playable hand.
#[must_use]
pub fn first_to_act(players: &[PlayerRecord]) -> TurnOwner {
    players
        .iter()
        .filter(|p| p.awaits_turn())
        .min_by_key(|p| p.seat_position)
        .map_or(TurnOwner::Dealer, |p| TurnOwner::Player(p.id.clone()))
}

/// Next player to act after `seat`: the lowest seat strictly above it with a
/// playable hand, or the dealer once nobody is left.
#[must_use]
pub fn next_to_act(players: &[PlayerRecord], seat: u8) -> TurnOwner {
    players
        .iter()
        .filter(|p| p.awaits_turn() && p.seat_position > seat)
        .min_by_key(|p| p.seat_position)
        .map_or(TurnOwner::Dealer, |p| TurnOwner::Player(p.id.clone()))
}

/// One poll of the table: the game plus its active players in seat order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    /// The game record.
    pub game: GameRecord,
    /// Active players sorted by seat.
    pub players: Vec<PlayerRecord>,
    /// The polling user, if any.
    pub viewer: Option<String>,
    /// Total the dealer stands on.
    pub dealer_stands_on: u8,
}

impl TableSnapshot {
    /// Current phase of the round.
    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        match self.game.status {
            GameStatus::Finished => RoundPhase::Closed,
            GameStatus::Waiting => {
                if self.bettors().any(|p| !p.hand.is_empty()) {
                    RoundPhase::Dealing
                } else {
                    RoundPhase::Waiting
                }
            }
            GameStatus::Playing if self.game.settled => RoundPhase::Settlement,
            GameStatus::Playing if self.game.is_dealer_turn() => {
                let dealer = &self.game.dealer;
                if dealer.is_hole_revealed() && !dealer.must_draw(self.dealer_stands_on) {
                    RoundPhase::Settlement
                } else {
                    RoundPhase::DealerTurn
                }
            }
            GameStatus::Playing => RoundPhase::PlayerTurns,
        }
    }

    /// The viewer's own seat.
    #[must_use]
    pub fn my_player(&self) -> Option<&PlayerRecord> {
        let viewer = self.viewer.as_deref()?;
        self.players.iter().find(|p| p.created_by == viewer)
    }

    /// Player by record id.
    #[must_use]
    pub fn player(&self, id: &str) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Player in a seat.
    #[must_use]
    pub fn player_at(&self, seat: u8) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.seat_position == seat)
    }

    /// Players with a bet on this round.
    pub fn bettors(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.iter().filter(|p| p.bet() > 0)
    }

    /// Returns whether `player` holds the turn with a hand still to play.
    #[must_use]
    pub fn is_turn_of(&self, player: &PlayerRecord) -> bool {
        self.game.is_turn_of(&player.id) && player.active().is_some_and(|hand| hand.is_playing())
    }

    /// Returns whether the viewer may act now.
    #[must_use]
    pub fn is_my_turn(&self) -> bool {
        self.my_player().is_some_and(|p| self.is_turn_of(p))
    }

    /// Player holding the turn.
    #[must_use]
    pub fn turn_holder(&self) -> Option<&PlayerRecord> {
        let id = self.game.current_turn.as_ref()?.player_id()?;
        self.player(id)
    }

    /// Returns whether a playing round has a live turn owner.
    ///
    /// Only a seated bettor with a playable hand counts. The dealer sequence
    /// runs inside one client's call and cannot be picked up by another.
    #[must_use]
    pub fn has_coherent_turn(&self) -> bool {
        self.turn_holder().is_some_and(PlayerRecord::awaits_turn)
    }

    /// Returns whether a round is `playing` with nobody able to drive it.
    #[must_use]
    pub fn is_stuck(&self) -> bool {
        self.game.status == GameStatus::Playing && !self.has_coherent_turn()
    }

    /// Returns whether the viewer went broke and must rebuy or leave.
    ///
    /// Only holds once every payout is credited. A bettor still waiting on
    /// a payout shows zero chips while the round is being paid out.
    #[must_use]
    pub fn awaiting_rebuy(&self) -> bool {
        self.game.status == GameStatus::Playing
            && self.game.settled
            && self.my_player().is_some_and(PlayerRecord::is_broke)
    }

    /// One-line table status for display.
    #[must_use]
    pub fn status_line(&self) -> &'static str {
        if self.awaiting_rebuy() {
            return "Out of chips!";
        }
        match self.phase() {
            RoundPhase::Waiting => "Join a seat and place your bet!",
            RoundPhase::Dealing => "Dealing...",
            RoundPhase::PlayerTurns if self.is_my_turn() => "Your turn",
            RoundPhase::PlayerTurns => "Game in progress",
            RoundPhase::DealerTurn => "Dealer's turn...",
            RoundPhase::Settlement => "Paying out...",
            RoundPhase::Closed => "Table closed",
        }
    }
}

/// What a player action led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Ignored: the turn or the hand had already moved on.
    Stale,
    /// The same hand is still in play.
    Continue,
    /// Play moved on to the player's split hand.
    SplitHand,
    /// The turn passed to another player.
    NextPlayer(RecordId),
    /// Nobody was left to act; the dealer played and the round settled.
    RoundSettled(Settlement),
}

/// What happens after payouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextRound {
    /// The table is back to waiting with this round number.
    Started {
        /// The new round number.
        round_number: u64,
    },
    /// The acting client's player is broke and must rebuy or leave first.
    RebuyRequired,
}

/// A settled round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Payouts per bettor.
    pub result: RoundResult,
    /// What the table does next.
    pub next: NextRound,
}

/// Result of dealing a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundStart {
    /// Who acts first.
    pub first_turn: TurnOwner,
    /// Present when nobody could act and the round settled at once.
    pub settlement: Option<Settlement>,
}
