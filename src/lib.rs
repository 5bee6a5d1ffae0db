//! A shared-table multiplayer blackjack round engine.
//!
//! Up to five players share one table. There is no server: every client runs
//! a [`Table`] session against a common [`RecordStore`], polls it with
//! [`Table::snapshot`], and advances the round (betting, dealing, player turns,
//! dealer play, settlement) only while it holds the turn.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bjtable::{MemoryStore, Table, TableOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let table = Table::open(store, TableOptions::default(), "alice", 42).await?;
//!
//! table.join_seat(1, 1000).await?;
//! table.place_bet(100).await?;
//! let start = table.start_round().await?;
//! if start.settlement.is_none() {
//!     table.stand().await?;
//! }
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod card;
pub mod deck;
pub mod error;
pub mod hand;
pub mod options;
pub mod overview;
pub mod payout;
pub mod records;
pub mod store;
pub mod table;
mod sync;

// Re-export main types
pub use card::{Card, DECK_SIZE, Suit};
pub use deck::Deck;
pub use error::{
    ActionError, BetError, CloseError, DealError, JoinError, LeaveError, RebuyError, StoreError,
};
pub use hand::{DealerHand, Hand, HandStatus, score_hand};
pub use options::{RoundingMode, TableOptions};
pub use payout::{HandOutcome, HandResult, PlayerResult, RoundResult};
pub use records::{GameRecord, GameStatus, HandSlot, PlayerRecord, RecordId, TurnOwner};
pub use store::{MemoryStore, RecordStore};
pub use table::{
    ActionOutcome, NextRound, PlayerAction, RoundPhase, RoundStart, Settlement, Table,
    TableSnapshot,
};
