//! Client-side table session and round state machine.
//!
//! There is no central coordinator. Every client runs a [`Table`] against the
//! shared records, polls with [`Table::snapshot`], and drives the round
//! forward only while it holds the turn. Each operation re-reads the records
//! it depends on right before writing.

use std::fmt::Display;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use crate::card::Card;
use crate::deck::Deck;
use crate::error::StoreError;
use crate::options::TableOptions;
use crate::records::{
    GamePatch, GameRecord, GameStatus, PlayerPatch, PlayerRecord, RecordId,
};
use crate::store::{self, Collection, OrderBy, RecordStore, predicate};
use crate::sync::Mutex;

mod actions;
mod bet;
mod dealer;
mod seat;
pub mod state;

pub use actions::PlayerAction;
pub use state::{
    ActionOutcome, NextRound, RoundPhase, RoundStart, Settlement, TableSnapshot, first_to_act,
    next_to_act,
};

/// Games scanned when looking for an open table.
const OPEN_TABLE_SCAN: usize = 10;

/// One user's session at a table.
///
/// The session owns its own deck and RNG; everything else lives in the
/// record store and is shared with the other clients.
pub struct Table<S> {
    store: S,
    /// Table options.
    pub options: TableOptions,
    game_id: RecordId,
    user: String,
    deck: Mutex<RoundDeck>,
    rng: Mutex<ChaCha8Rng>,
}

/// The session's cards, tagged with the round they were shuffled for.
#[derive(Debug)]
struct RoundDeck {
    /// Zero until the session first plays a round.
    round: u64,
    cards: Deck,
}

impl<S: RecordStore> Table<S> {
    /// Opens the current table, creating one if none is open.
    ///
    /// The most recent game that is not finished is used. A game found
    /// `playing` with nobody able to drive it is reset to waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub async fn open(
        store: S,
        options: TableOptions,
        user: &str,
        seed: u64,
    ) -> Result<Self, StoreError> {
        let games = store
            .list(Collection::Games, &OrderBy::newest_first(), OPEN_TABLE_SCAN)
            .await?;

        let mut open_game = None;
        for fields in games {
            let game: GameRecord = store::decode(fields)?;
            if game.status != GameStatus::Finished {
                open_game = Some(game);
                break;
            }
        }

        let game_id = match open_game {
            Some(game) => game.id,
            None => {
                let created = store
                    .create(Collection::Games, store::encode(&GameRecord::new_table())?)
                    .await?;
                let game: GameRecord = store::decode(created)?;
                tracing::info!(game_id = %game.id, "created table");
                game.id
            }
        };

        let table = Self::attach(store, options, user, game_id, seed);
        table.recover_if_stuck().await?;
        Ok(table)
    }

    /// Joins a known table without any discovery or recovery.
    #[must_use]
    pub fn attach(store: S, options: TableOptions, user: &str, game_id: RecordId, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let deck = Deck::shuffled(&mut rng);

        Self {
            store,
            options,
            game_id,
            user: user.to_owned(),
            deck: Mutex::new(RoundDeck { round: 0, cards: deck }),
            rng: Mutex::new(rng),
        }
    }

    /// The table's game record id.
    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// The user this session acts for.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The underlying record store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Reads the game and its active players.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn snapshot(&self) -> Result<TableSnapshot, StoreError> {
        let game = self.load_game().await?;
        let players = self.load_players().await?;
        Ok(TableSnapshot {
            game,
            players,
            viewer: Some(self.user.clone()),
            dealer_stands_on: self.options.dealer_stands_on,
        })
    }

    async fn load_game(&self) -> Result<GameRecord, StoreError> {
        let fields = self
            .store
            .filter(Collection::Games, &predicate([("id", Value::from(self.game_id.as_str()))]))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                collection: Collection::Games.name(),
                id: self.game_id.clone(),
            })?;
        store::decode(fields)
    }

    /// Every player record of this game, seated or not, sorted by seat.
    async fn load_all_players(&self) -> Result<Vec<PlayerRecord>, StoreError> {
        let records = self
            .store
            .filter(
                Collection::Players,
                &predicate([("game_id", Value::from(self.game_id.as_str()))]),
            )
            .await?;
        let mut players = records
            .into_iter()
            .map(store::decode)
            .collect::<Result<Vec<PlayerRecord>, _>>()?;
        players.sort_by_key(|p| p.seat_position);
        Ok(players)
    }

    /// Active players sorted by seat.
    async fn load_players(&self) -> Result<Vec<PlayerRecord>, StoreError> {
        let records = self
            .store
            .filter(
                Collection::Players,
                &predicate([
                    ("game_id", Value::from(self.game_id.as_str())),
                    ("is_active", Value::from(true)),
                ]),
            )
            .await?;
        let mut players = records
            .into_iter()
            .map(store::decode)
            .collect::<Result<Vec<PlayerRecord>, _>>()?;
        players.sort_by_key(|p| p.seat_position);
        Ok(players)
    }

    /// This user's active seat, if any.
    async fn load_my_player(&self) -> Result<Option<PlayerRecord>, StoreError> {
        Ok(self
            .load_players()
            .await?
            .into_iter()
            .find(|p| p.created_by == self.user))
    }

    async fn write_player(&self, player_id: &str, patch: PlayerPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.store
            .update(Collection::Players, player_id, patch.into_fields())
            .await
    }

    async fn write_game(&self, patch: GamePatch) -> Result<(), StoreError> {
        self.store
            .update(Collection::Games, &self.game_id, patch.into_fields())
            .await
    }

    /// Waits so polling clients can observe intermediate state.
    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Cards left in this session's deck.
    #[must_use]
    pub fn cards_remaining(&self) -> usize {
        self.deck.lock().cards.remaining()
    }

    /// Draws from this session's deck.
    fn draw(&self) -> Option<Card> {
        self.deck.lock().cards.draw()
    }

    fn fresh_deck(&self) -> Deck {
        Deck::shuffled(&mut *self.rng.lock())
    }

    /// Makes `cards` the deck for `round`.
    fn use_deck(&self, round: u64, cards: Deck) {
        *self.deck.lock() = RoundDeck { round, cards };
    }

    /// Reshuffles unless the deck was already shuffled or dealt for `round`.
    ///
    /// A session that never deals still draws for hits, doubles, splits and
    /// the dealer, so it starts every round it plays from a full deck.
    fn deck_for_round(&self, round: u64) {
        let mut deck = self.deck.lock();
        if deck.round != round {
            deck.cards = self.fresh_deck();
            deck.round = round;
            tracing::debug!(game_id = %self.game_id, user = %self.user, round, "reshuffled deck");
        }
    }

    /// Reads one player record by id, seated or not.
    async fn load_player(&self, player_id: &str) -> Result<Option<PlayerRecord>, StoreError> {
        let records = self
            .store
            .filter(Collection::Players, &predicate([("id", Value::from(player_id))]))
            .await?;
        records.into_iter().next().map(store::decode).transpose()
    }

    fn report(&self, operation: &'static str, store_failure: bool, err: &impl Display) {
        if store_failure {
            tracing::error!(game_id = %self.game_id, user = %self.user, operation, %err, "store failure");
        } else {
            tracing::debug!(game_id = %self.game_id, user = %self.user, operation, %err, "rejected");
        }
    }
}
