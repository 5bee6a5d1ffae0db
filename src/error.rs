//! Error types for table operations.
//!
//! Validation failures perform no mutation. Store failures abort the flow
//! without assuming the write happened; the next poll reconciles.

use thiserror::Error;

/// Errors raised by a [`RecordStore`](crate::store::RecordStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// No record with this id exists.
    #[error("{collection} record {id} not found")]
    NotFound {
        /// Collection name.
        collection: &'static str,
        /// Record id.
        id: String,
    },
    /// A record could not be encoded or decoded.
    #[error("malformed record: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Errors that can occur when taking a seat.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// The table has been closed.
    #[error("table is closed")]
    TableClosed,
    /// No such seat at this table.
    #[error("seat {0} does not exist")]
    InvalidSeat(u8),
    /// Another player occupies the seat.
    #[error("seat {0} is taken")]
    SeatTaken(u8),
    /// The user already sits at this table.
    #[error("already sitting at seat {0}")]
    AlreadySeated(u8),
    /// Buy-in below the table minimum.
    #[error("need at least ${minimum} to join")]
    BuyInTooSmall {
        /// Smallest accepted buy-in.
        minimum: u64,
    },
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that can occur during betting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BetError {
    /// Bets are only taken while the table is waiting.
    #[error("invalid game state for betting")]
    InvalidState,
    /// The user has no seat at this table.
    #[error("player not found")]
    PlayerNotFound,
    /// Bet below the player's table minimum.
    #[error("minimum bet is ${minimum}")]
    BelowMinimum {
        /// Smallest accepted bet.
        minimum: u64,
    },
    /// Bet exceeds chips plus the current bet.
    #[error("not enough chips")]
    InsufficientFunds,
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that can occur when starting a round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DealError {
    /// A round is already running or the table is closed.
    #[error("invalid game state for dealing")]
    InvalidState,
    /// No players have placed bets.
    #[error("need at least one bet to start")]
    NoBets,
    /// A bettor is below their table minimum.
    #[error("all players must bet at least table minimum (seat {seat})")]
    BelowMinimum {
        /// Seat holding the short bet.
        seat: u8,
    },
    /// Not enough cards in the deck.
    #[error("not enough cards in the deck")]
    NotEnoughCards,
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that can occur during player actions.
///
/// Out-of-turn and stale actions are not errors; they report
/// [`ActionOutcome::Stale`](crate::table::ActionOutcome::Stale).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The user has no seat at this table.
    #[error("player not found")]
    PlayerNotFound,
    /// Cannot double down on this hand.
    #[error("cannot double down")]
    CannotDouble,
    /// Cannot split this hand.
    #[error("cannot split")]
    CannotSplit,
    /// No cards left in the deck.
    #[error("no cards left in the deck")]
    NoCards,
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that can occur when leaving the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveError {
    /// The user has no seat at this table.
    #[error("player not found")]
    PlayerNotFound,
    /// The player has a bet riding on the current round.
    #[error("please wait for the current round to finish before leaving")]
    RoundInProgress,
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that can occur when buying back in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RebuyError {
    /// The user has no seat at this table.
    #[error("player not found")]
    PlayerNotFound,
    /// Only a broke player can rebuy.
    #[error("player still has chips")]
    NotBroke,
    /// Rebuy below the table minimum.
    #[error("need at least ${minimum} to rebuy")]
    BuyInTooSmall {
        /// Smallest accepted rebuy.
        minimum: u64,
    },
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that can occur when closing a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseError {
    /// Only a waiting table can be closed.
    #[error("cannot close a table mid-round")]
    RoundInProgress,
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

macro_rules! status_message {
    ($($error:ty),+ $(,)?) => {
        $(
            impl $error {
                /// Transient text to show the user.
                ///
                /// Persistence failures collapse to a generic retry message.
                #[must_use]
                pub fn status_message(&self) -> String {
                    match self {
                        Self::Store(_) => String::from("Action failed"),
                        other => other.to_string(),
                    }
                }

                /// Returns whether the failure came from the record store.
                #[must_use]
                pub const fn is_store_failure(&self) -> bool {
                    matches!(self, Self::Store(_))
                }
            }
        )+
    };
}

status_message!(
    JoinError,
    BetError,
    DealError,
    ActionError,
    LeaveError,
    RebuyError,
    CloseError,
);
