//! Player and dealer hand representations.

use serde::{Deserialize, Serialize};

use crate::card::Card;

/// Scores a hand.
///
/// Every Ace starts at 11 and is reduced to 1, one at a time, while the total
/// is over 21.
#[must_use]
pub fn score_hand(cards: &[Card]) -> u8 {
    let mut value: u8 = 0;
    let mut aces: u8 = 0;

    for card in cards {
        if card.is_ace() {
            aces += 1;
        }
        value = value.saturating_add(card.value());
    }

    while value > 21 && aces > 0 {
        value -= 10;
        aces -= 1;
    }
    value
}

/// Hand status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandStatus {
    /// No cards dealt this round.
    #[default]
    Waiting,
    /// Hand is in play and can take actions.
    Playing,
    /// Player has stood, doubled, or reached 21.
    Standing,
    /// Hand has busted (over 21).
    Busted,
    /// Hand is a natural blackjack from the initial deal.
    Blackjack,
}

/// A player's hand: cards, their score, status and the stake riding on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hand {
    cards: Vec<Card>,
    value: u8,
    status: HandStatus,
    bet: u64,
}

impl Hand {
    /// Creates a hand from persisted parts, rescoring the cards.
    #[must_use]
    pub fn from_parts(cards: Vec<Card>, status: HandStatus, bet: u64) -> Self {
        let value = score_hand(&cards);
        Self {
            cards,
            value,
            status,
            bet,
        }
    }

    /// Creates a hand from the two cards of the initial deal.
    ///
    /// A 21 here is a natural blackjack.
    #[must_use]
    pub fn dealt(first: Card, second: Card, bet: u64) -> Self {
        let mut hand = Self::from_parts(vec![first, second], HandStatus::Playing, bet);
        if hand.value == 21 {
            hand.status = HandStatus::Blackjack;
        }
        hand
    }

    /// Creates one half of a split pair: the kept card plus a fresh one.
    ///
    /// A split hand is never a natural, so 21 stands.
    #[must_use]
    pub fn from_split(kept: Card, drawn: Card, bet: u64) -> Self {
        let mut hand = Self::from_parts(vec![kept, drawn], HandStatus::Playing, bet);
        hand.settle_status();
        hand
    }

    fn settle_status(&mut self) {
        if self.value > 21 {
            self.status = HandStatus::Busted;
        } else if self.value == 21 {
            self.status = HandStatus::Standing;
        }
    }

    /// Adds a drawn card (hit), rescoring the hand.
    ///
    /// Over 21 busts; exactly 21 stands.
    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
        self.value = score_hand(&self.cards);
        self.settle_status();
    }

    /// Stands on the hand.
    pub const fn stand(&mut self) {
        self.status = HandStatus::Standing;
    }

    /// Doubles the stake, takes exactly one card and stands unless busted.
    pub fn double_down(&mut self, card: Card) {
        self.bet *= 2;
        self.add_card(card);
        if self.status == HandStatus::Playing {
            self.status = HandStatus::Standing;
        }
    }

    /// Returns the cards in the hand.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Returns the scored value of the hand.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Returns the current status of the hand.
    #[must_use]
    pub const fn status(&self) -> HandStatus {
        self.status
    }

    /// Returns the stake on this hand.
    #[must_use]
    pub const fn bet(&self) -> u64 {
        self.bet
    }

    /// Replaces the stake (betting phase only).
    pub const fn set_bet(&mut self, bet: u64) {
        self.bet = bet;
    }

    /// Returns whether the hand can still act.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status == HandStatus::Playing
    }

    /// Returns whether the hand can be split.
    #[must_use]
    pub fn can_split(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].rank == self.cards[1].rank
    }

    /// Returns the number of cards in the hand.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns whether the hand is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Removes both cards of a splittable pair.
    pub fn take_pair(&mut self) -> Option<(Card, Card)> {
        if !self.can_split() {
            return None;
        }
        let second = self.cards.pop()?;
        let first = self.cards.pop()?;
        self.value = 0;
        Some((first, second))
    }
}

/// The dealer's hand. The hole card stays hidden until the dealer turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealerHand {
    cards: Vec<Card>,
}

impl DealerHand {
    /// Creates a new empty dealer hand.
    #[must_use]
    pub const fn new() -> Self {
        Self { cards: Vec::new() }
    }

    /// Creates the opening hand: the up card and a face-down hole card.
    #[must_use]
    pub fn opening(up: Card, hole: Card) -> Self {
        Self {
            cards: vec![up.face_up(), hole.face_down()],
        }
    }

    /// Adds a face-up card to the hand.
    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card.face_up());
    }

    /// Returns all cards in the hand.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Returns whether every card is face up.
    #[must_use]
    pub fn is_hole_revealed(&self) -> bool {
        self.cards.iter().all(|card| !card.hidden)
    }

    /// Reveals the hole card.
    pub fn reveal_hole(&mut self) {
        for card in &mut self.cards {
            card.hidden = false;
        }
    }

    /// Value of the face-up cards only.
    #[must_use]
    pub fn visible_value(&self) -> u8 {
        let visible: Vec<Card> = self.cards.iter().filter(|c| !c.hidden).copied().collect();
        score_hand(&visible)
    }

    /// Calculates the full value of the hand.
    #[must_use]
    pub fn value(&self) -> u8 {
        score_hand(&self.cards)
    }

    /// Returns whether the dealer must draw, standing on all totals of `stand_at` or more.
    #[must_use]
    pub fn must_draw(&self, stand_at: u8) -> bool {
        self.value() < stand_at
    }

    /// Returns whether the hand is a blackjack.
    #[must_use]
    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.value() == 21
    }

    /// Returns whether the hand is bust.
    #[must_use]
    pub fn is_bust(&self) -> bool {
        self.value() > 21
    }

    /// Returns the number of cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns whether the hand is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
