use crate::deck::Deck;
use crate::error::{BetError, DealError};
use crate::hand::{DealerHand, Hand};
use crate::records::{GamePatch, GameStatus, HandSlot, PlayerPatch, PlayerRecord, TurnOwner};
use crate::store::RecordStore;

use super::{RoundStart, Table, first_to_act};

impl<S: RecordStore> Table<S> {
    /// Places (or replaces) this user's bet for the next round.
    ///
    /// A bet of zero clears the current bet and returns it to the stack. Bets
    /// are escrowed: chips become `chips + old bet - amount`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is not waiting, the user is not seated,
    /// the bet is below the player's minimum or above chips plus the current
    /// bet, or the store fails.
    pub async fn place_bet(&self, amount: u64) -> Result<PlayerRecord, BetError> {
        self.escrow_bet(amount)
            .await
            .inspect_err(|err| self.report("place_bet", err.is_store_failure(), err))
    }

    async fn escrow_bet(&self, amount: u64) -> Result<PlayerRecord, BetError> {
        let snapshot = self.snapshot().await?;
        if snapshot.game.status != GameStatus::Waiting {
            return Err(BetError::InvalidState);
        }
        let player = snapshot.my_player().ok_or(BetError::PlayerNotFound)?;

        let available = player.chips + player.bet();
        if amount > 0 {
            let minimum = self.options.min_bet(player.table_limit);
            if amount < minimum {
                return Err(BetError::BelowMinimum { minimum });
            }
            if amount > available {
                return Err(BetError::InsufficientFunds);
            }
        }

        let patch = PlayerPatch::new().bet(amount).chips(available - amount);
        self.write_player(&player.id, patch).await?;
        tracing::debug!(game_id = %self.game_id, user = %self.user, amount, "bet placed");

        let mut updated = player.clone();
        updated.hand.set_bet(amount);
        updated.chips = available - amount;
        Ok(updated)
    }

    /// Deals a new round from a freshly shuffled deck.
    ///
    /// # Errors
    ///
    /// See [`Table::start_round_with_deck`].
    pub async fn start_round(&self) -> Result<RoundStart, DealError> {
        let deck = self.fresh_deck();
        self.start_round_with_deck(deck).await
    }

    /// Deals a new round from the given deck, which this session keeps
    /// drawing from for the rest of the round.
    ///
    /// Every bettor gets two cards in seat order, then the dealer gets an up
    /// card and a hidden hole card. If nobody can act, the dealer plays and
    /// the round settles before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is not waiting, nobody has bet, a bet is
    /// below its minimum, the deck is too short, or the store fails.
    pub async fn start_round_with_deck(&self, deck: Deck) -> Result<RoundStart, DealError> {
        self.deal(deck)
            .await
            .inspect_err(|err| self.report("start_round", err.is_store_failure(), err))
    }

    async fn deal(&self, deck: Deck) -> Result<RoundStart, DealError> {
        let snapshot = self.snapshot().await?;
        if snapshot.game.status != GameStatus::Waiting {
            return Err(DealError::InvalidState);
        }

        let bettors: Vec<PlayerRecord> = snapshot.bettors().cloned().collect();
        if bettors.is_empty() {
            return Err(DealError::NoBets);
        }
        if let Some(short) = bettors
            .iter()
            .find(|p| p.bet() < self.options.min_bet(p.table_limit))
        {
            return Err(DealError::BelowMinimum {
                seat: short.seat_position,
            });
        }
        if deck.remaining() < (bettors.len() + 1) * 2 {
            return Err(DealError::NotEnoughCards);
        }

        self.use_deck(snapshot.game.round_number, deck);

        for player in &bettors {
            let (Some(first), Some(second)) = (self.draw(), self.draw()) else {
                return Err(DealError::NotEnoughCards);
            };
            let hand = Hand::dealt(first, second, player.bet());
            tracing::debug!(
                game_id = %self.game_id,
                seat = player.seat_position,
                value = hand.value(),
                status = ?hand.status(),
                "dealt hand"
            );
            let patch = PlayerPatch::new()
                .hand(&hand)
                .split_hand(None)
                .active_hand(HandSlot::Main);
            self.write_player(&player.id, patch).await?;
            self.pause(self.options.deal_delay).await;
        }

        let (Some(up), Some(hole)) = (self.draw(), self.draw()) else {
            return Err(DealError::NotEnoughCards);
        };
        let dealer = DealerHand::opening(up, hole);

        // Decide the first turn from what was actually stored.
        let players = self.load_players().await?;
        let first_turn = first_to_act(&players);
        let pot = players.iter().map(PlayerRecord::bet).sum();

        self.write_game(
            GamePatch::new()
                .status(GameStatus::Playing)
                .dealer(&dealer)
                .current_turn(Some(&first_turn))
                .pot(pot)
                .settled(false),
        )
        .await?;

        tracing::info!(
            game_id = %self.game_id,
            round = snapshot.game.round_number,
            bettors = bettors.len(),
            first_turn = ?first_turn,
            "round dealt"
        );

        let settlement = if first_turn == TurnOwner::Dealer {
            Some(self.play_dealer().await?)
        } else {
            None
        };

        Ok(RoundStart {
            first_turn,
            settlement,
        })
    }
}
