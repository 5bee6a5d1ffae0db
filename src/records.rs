//! Typed views of the shared `games` and `players` documents.
//!
//! Reads decode a whole document. Writes go through [`PlayerPatch`] and
//! [`GamePatch`], which only carry the fields being changed so concurrent
//! writers touching other fields are not clobbered.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::card::Card;
use crate::hand::{DealerHand, Hand, HandStatus};
use crate::store::Fields;

/// Identifier assigned by the record store.
pub type RecordId = String;

/// Sentinel stored in `current_turn` while the dealer plays.
pub const DEALER_TURN: &str = "dealer";

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Accepting seats and bets.
    #[default]
    Waiting,
    /// A round is in progress.
    Playing,
    /// The table is closed.
    Finished,
}

/// Whose turn it is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TurnOwner {
    /// The player record with this id.
    Player(RecordId),
    /// The dealer.
    Dealer,
}

impl TurnOwner {
    /// Returns the player id, if a player holds the turn.
    #[must_use]
    pub fn player_id(&self) -> Option<&str> {
        match self {
            Self::Player(id) => Some(id),
            Self::Dealer => None,
        }
    }
}

impl From<String> for TurnOwner {
    fn from(value: String) -> Self {
        if value == DEALER_TURN {
            Self::Dealer
        } else {
            Self::Player(value)
        }
    }
}

impl From<TurnOwner> for String {
    fn from(owner: TurnOwner) -> Self {
        match owner {
            TurnOwner::Player(id) => id,
            TurnOwner::Dealer => Self::from(DEALER_TURN),
        }
    }
}

/// Which of a player's two hands is being acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HandSlot {
    /// The original hand (index 0).
    #[default]
    Main,
    /// The hand created by a split (index 1).
    Split,
}

impl HandSlot {
    /// Persisted `active_hand_index`.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Main => 0,
            Self::Split => 1,
        }
    }

    /// Slot for a persisted `active_hand_index`; anything but 1 is the main hand.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        if index == 1 { Self::Split } else { Self::Main }
    }
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PlayerFields", into = "PlayerFields")]
pub struct PlayerRecord {
    /// Record id.
    pub id: RecordId,
    /// Table this seat belongs to.
    pub game_id: RecordId,
    /// Seat number, from 1.
    pub seat_position: u8,
    /// Owning user.
    pub created_by: String,
    /// Chips not currently at risk.
    pub chips: u64,
    /// Total bought in this session, for P/L.
    pub initial_buy_in: u64,
    /// Buy-in the seat was taken with; sets the minimum bet.
    pub table_limit: u64,
    /// Main hand; its bet is the main wager.
    pub hand: Hand,
    /// Second hand after a split.
    pub split: Option<Hand>,
    /// Hand currently being acted on.
    pub active_hand: HandSlot,
    /// Still seated.
    pub is_active: bool,
    /// Creation time in milliseconds.
    pub created_date: i64,
}

impl PlayerRecord {
    /// A freshly seated player with `buy_in` chips and no hand.
    #[must_use]
    pub fn seated(game_id: &str, seat_position: u8, user: &str, buy_in: u64) -> Self {
        Self {
            id: RecordId::new(),
            game_id: game_id.to_owned(),
            seat_position,
            created_by: user.to_owned(),
            chips: buy_in,
            initial_buy_in: buy_in,
            table_limit: buy_in,
            hand: Hand::default(),
            split: None,
            active_hand: HandSlot::Main,
            is_active: true,
            created_date: 0,
        }
    }

    /// Main wager.
    #[must_use]
    pub const fn bet(&self) -> u64 {
        self.hand.bet()
    }

    /// Returns whether the player has split this round.
    #[must_use]
    pub const fn has_split(&self) -> bool {
        self.split.is_some()
    }

    /// Hand in the given slot.
    #[must_use]
    pub const fn hand_in(&self, slot: HandSlot) -> Option<&Hand> {
        match slot {
            HandSlot::Main => Some(&self.hand),
            HandSlot::Split => self.split.as_ref(),
        }
    }

    /// Mutable hand in the given slot.
    pub const fn hand_in_mut(&mut self, slot: HandSlot) -> Option<&mut Hand> {
        match slot {
            HandSlot::Main => Some(&mut self.hand),
            HandSlot::Split => self.split.as_mut(),
        }
    }

    /// Hand currently being acted on.
    #[must_use]
    pub const fn active(&self) -> Option<&Hand> {
        self.hand_in(self.active_hand)
    }

    /// Chips escrowed across both hands.
    #[must_use]
    pub fn stake(&self) -> u64 {
        self.hand.bet() + self.split.as_ref().map_or(0, Hand::bet)
    }

    /// Returns whether either hand can still act.
    #[must_use]
    pub fn has_playing_hand(&self) -> bool {
        self.hand.is_playing() || self.split.as_ref().is_some_and(Hand::is_playing)
    }

    /// Returns whether this player is owed a turn this round.
    #[must_use]
    pub fn awaits_turn(&self) -> bool {
        self.is_active && self.bet() > 0 && self.has_playing_hand()
    }

    /// Session profit or loss.
    #[must_use]
    pub fn net_result(&self) -> i64 {
        #[expect(clippy::cast_possible_wrap, reason = "chip counts fit in i64")]
        let net = self.chips as i64 - self.initial_buy_in as i64;
        net
    }

    /// Returns whether the player has run out of chips.
    #[must_use]
    pub const fn is_broke(&self) -> bool {
        self.chips == 0
    }
}

/// Flat persisted layout of a player document.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct PlayerFields {
    id: RecordId,
    game_id: RecordId,
    seat_position: u8,
    created_by: String,
    chips: u64,
    bet: u64,
    initial_buy_in: u64,
    table_limit: u64,
    cards: Vec<Card>,
    hand_value: u8,
    status: HandStatus,
    has_split: bool,
    split_cards: Vec<Card>,
    split_hand_value: u8,
    split_bet: u64,
    split_status: HandStatus,
    active_hand_index: u8,
    is_active: bool,
    created_date: i64,
}

impl From<PlayerFields> for PlayerRecord {
    fn from(fields: PlayerFields) -> Self {
        let split = fields
            .has_split
            .then(|| Hand::from_parts(fields.split_cards, fields.split_status, fields.split_bet));
        Self {
            id: fields.id,
            game_id: fields.game_id,
            seat_position: fields.seat_position,
            created_by: fields.created_by,
            chips: fields.chips,
            initial_buy_in: fields.initial_buy_in,
            table_limit: fields.table_limit,
            hand: Hand::from_parts(fields.cards, fields.status, fields.bet),
            split,
            active_hand: HandSlot::from_index(fields.active_hand_index),
            is_active: fields.is_active,
            created_date: fields.created_date,
        }
    }
}

impl From<PlayerRecord> for PlayerFields {
    fn from(record: PlayerRecord) -> Self {
        let has_split = record.split.is_some();
        let split = record.split.unwrap_or_default();
        Self {
            id: record.id,
            game_id: record.game_id,
            seat_position: record.seat_position,
            created_by: record.created_by,
            chips: record.chips,
            bet: record.hand.bet(),
            initial_buy_in: record.initial_buy_in,
            table_limit: record.table_limit,
            hand_value: record.hand.value(),
            status: record.hand.status(),
            cards: record.hand.cards().to_vec(),
            has_split,
            split_hand_value: split.value(),
            split_bet: split.bet(),
            split_status: split.status(),
            split_cards: split.cards().to_vec(),
            active_hand_index: record.active_hand.index(),
            is_active: record.is_active,
            created_date: record.created_date,
        }
    }
}

/// Partial update of a player document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerPatch {
    fields: Fields,
}

impl PlayerPatch {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The per-round fields back at their waiting defaults.
    #[must_use]
    pub fn reset_round() -> Self {
        Self::new()
            .hand(&Hand::default())
            .split_hand(None)
            .active_hand(HandSlot::Main)
    }

    fn set(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_owned(), value);
        self
    }

    /// Sets the chip count.
    #[must_use]
    pub fn chips(self, chips: u64) -> Self {
        self.set("chips", Value::from(chips))
    }

    /// Sets the main wager.
    #[must_use]
    pub fn bet(self, bet: u64) -> Self {
        self.set("bet", Value::from(bet))
    }

    /// Sets the session buy-in total.
    #[must_use]
    pub fn initial_buy_in(self, amount: u64) -> Self {
        self.set("initial_buy_in", Value::from(amount))
    }

    /// Sets whether the player is still seated.
    #[must_use]
    pub fn is_active(self, active: bool) -> Self {
        self.set("is_active", Value::from(active))
    }

    /// Sets the hand being acted on.
    #[must_use]
    pub fn active_hand(self, slot: HandSlot) -> Self {
        self.set("active_hand_index", Value::from(slot.index()))
    }

    /// Writes the main hand: cards, value, status and bet.
    #[must_use]
    pub fn hand(self, hand: &Hand) -> Self {
        self.set("cards", json!(hand.cards()))
            .set("hand_value", Value::from(hand.value()))
            .set("status", json!(hand.status()))
            .set("bet", Value::from(hand.bet()))
    }

    /// Writes the split hand, or clears it.
    #[must_use]
    pub fn split_hand(self, split: Option<&Hand>) -> Self {
        let empty = Hand::default();
        let hand = split.unwrap_or(&empty);
        self.set("has_split", Value::from(split.is_some()))
            .set("split_cards", json!(hand.cards()))
            .set("split_hand_value", Value::from(hand.value()))
            .set("split_status", json!(hand.status()))
            .set("split_bet", Value::from(hand.bet()))
    }

    /// Writes whichever hand lives in `slot`.
    #[must_use]
    pub fn hand_in(self, slot: HandSlot, hand: &Hand) -> Self {
        match slot {
            HandSlot::Main => self.hand(hand),
            HandSlot::Split => self.split_hand(Some(hand)),
        }
    }

    /// Returns whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The fields to merge.
    #[must_use]
    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

const fn first_round() -> u64 {
    1
}

/// A table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Record id.
    #[serde(default)]
    pub id: RecordId,
    /// Table status.
    #[serde(default)]
    pub status: GameStatus,
    /// Dealer's cards; the hole card is hidden until the dealer plays.
    #[serde(default, rename = "dealer_cards")]
    pub dealer: DealerHand,
    /// Whose turn it is; `None` while waiting.
    #[serde(default)]
    pub current_turn: Option<TurnOwner>,
    /// Round counter, from 1.
    #[serde(default = "first_round")]
    pub round_number: u64,
    /// Sum of main bets when the round was dealt.
    #[serde(default)]
    pub pot: u64,
    /// Set once every payout of the round has been credited.
    #[serde(default)]
    pub settled: bool,
    /// Creation time in milliseconds.
    #[serde(default)]
    pub created_date: i64,
}

impl GameRecord {
    /// A new, empty table waiting for its first round.
    #[must_use]
    pub fn new_table() -> Self {
        Self {
            id: RecordId::new(),
            status: GameStatus::Waiting,
            dealer: DealerHand::new(),
            current_turn: None,
            round_number: first_round(),
            pot: 0,
            settled: false,
            created_date: 0,
        }
    }

    /// Returns whether the given player holds the turn.
    #[must_use]
    pub fn is_turn_of(&self, player_id: &str) -> bool {
        self.status == GameStatus::Playing
            && self
                .current_turn
                .as_ref()
                .and_then(TurnOwner::player_id)
                .is_some_and(|id| id == player_id)
    }

    /// Returns whether the dealer holds the turn.
    #[must_use]
    pub fn is_dealer_turn(&self) -> bool {
        self.status == GameStatus::Playing && self.current_turn == Some(TurnOwner::Dealer)
    }
}

/// Partial update of a game document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GamePatch {
    fields: Fields,
}

impl GamePatch {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_owned(), value);
        self
    }

    /// Sets the table status.
    #[must_use]
    pub fn status(self, status: GameStatus) -> Self {
        self.set("status", json!(status))
    }

    /// Writes the dealer's cards.
    #[must_use]
    pub fn dealer(self, dealer: &DealerHand) -> Self {
        self.set("dealer_cards", json!(dealer.cards()))
    }

    /// Sets or clears the turn owner.
    #[must_use]
    pub fn current_turn(self, owner: Option<&TurnOwner>) -> Self {
        let value = owner.map_or(Value::Null, |owner| Value::from(String::from(owner.clone())));
        self.set("current_turn", value)
    }

    /// Sets the round counter.
    #[must_use]
    pub fn round_number(self, round: u64) -> Self {
        self.set("round_number", Value::from(round))
    }

    /// Sets the informational pot.
    #[must_use]
    pub fn pot(self, pot: u64) -> Self {
        self.set("pot", Value::from(pot))
    }

    /// Marks the round's payouts as credited, or clears the mark.
    #[must_use]
    pub fn settled(self, settled: bool) -> Self {
        self.set("settled", Value::from(settled))
    }

    /// The fields to merge.
    #[must_use]
    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

/// Audit entry written to `adminLogs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminLogEntry {
    /// What was done.
    pub action: String,
    /// Table affected.
    pub game_id: RecordId,
    /// User who triggered it.
    pub performed_by: String,
    /// Free-form detail.
    pub details: String,
}
