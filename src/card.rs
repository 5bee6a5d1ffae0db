//! Card types.

use serde::{Deserialize, Serialize};

/// Card suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    /// Hearts.
    Hearts,
    /// Diamonds.
    Diamonds,
    /// Clubs.
    Clubs,
    /// Spades.
    Spades,
}

impl Suit {
    /// All four suits in deck order.
    pub const ALL: [Self; 4] = [Self::Hearts, Self::Diamonds, Self::Clubs, Self::Spades];
}

/// A playing card.
///
/// Persisted as `{"suit": "hearts", "rank": "A", "value": 11, "hidden": false}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "CardFields", try_from = "CardFields")]
pub struct Card {
    /// The suit of the card.
    pub suit: Suit,
    /// The rank of the card (1 = Ace, 11 = Jack, 12 = Queen, 13 = King).
    pub rank: u8,
    /// Whether the card is dealt face down.
    pub hidden: bool,
}

impl Card {
    /// Creates a new face-up card.
    ///
    /// Note: This function does not validate the rank. Values outside 1..=13
    /// are accepted but score as zero.
    #[must_use]
    pub const fn new(suit: Suit, rank: u8) -> Self {
        Self {
            suit,
            rank,
            hidden: false,
        }
    }

    /// Returns the same card dealt face down.
    #[must_use]
    pub const fn face_down(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Returns the same card turned face up.
    #[must_use]
    pub const fn face_up(mut self) -> Self {
        self.hidden = false;
        self
    }

    /// Blackjack value with every Ace counted as 11.
    #[must_use]
    pub const fn value(&self) -> u8 {
        match self.rank {
            1 => 11,
            2..=10 => self.rank,
            11..=13 => 10,
            _ => 0,
        }
    }

    /// Returns whether the card is an Ace.
    #[must_use]
    pub const fn is_ace(&self) -> bool {
        self.rank == 1
    }

    /// Rank label as stored in records (`"A"`, `"2"` .. `"10"`, `"J"`, `"Q"`, `"K"`).
    #[must_use]
    pub const fn rank_label(&self) -> &'static str {
        match self.rank {
            1 => "A",
            2 => "2",
            3 => "3",
            4 => "4",
            5 => "5",
            6 => "6",
            7 => "7",
            8 => "8",
            9 => "9",
            10 => "10",
            11 => "J",
            12 => "Q",
            13 => "K",
            _ => "?",
        }
    }
}

fn parse_rank(label: &str) -> Option<u8> {
    match label {
        "A" => Some(1),
        "J" => Some(11),
        "Q" => Some(12),
        "K" => Some(13),
        other => other.parse().ok().filter(|rank| (2..=10).contains(rank)),
    }
}

#[derive(Serialize, Deserialize)]
struct CardFields {
    suit: Suit,
    rank: String,
    value: u8,
    #[serde(default)]
    hidden: bool,
}

impl From<Card> for CardFields {
    fn from(card: Card) -> Self {
        Self {
            suit: card.suit,
            rank: card.rank_label().to_owned(),
            value: card.value(),
            hidden: card.hidden,
        }
    }
}

impl TryFrom<CardFields> for Card {
    type Error = String;

    fn try_from(fields: CardFields) -> Result<Self, Self::Error> {
        let rank = parse_rank(&fields.rank).ok_or_else(|| format!("unknown rank {}", fields.rank))?;
        Ok(Self {
            suit: fields.suit,
            rank,
            hidden: fields.hidden,
        })
    }
}

/// Number of cards per deck.
pub const DECK_SIZE: usize = 52;
