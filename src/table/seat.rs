use crate::error::{CloseError, JoinError, LeaveError, RebuyError};
use crate::records::{GamePatch, GameStatus, PlayerPatch, PlayerRecord};
use crate::store::{self, Collection, RecordStore};

use super::Table;

impl<S: RecordStore> Table<S> {
    /// Takes a seat with the given buy-in.
    ///
    /// The buy-in becomes the player's chips and table limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is closed, the seat does not exist or is
    /// taken, the user is already seated, the buy-in is below the minimum, or
    /// the store fails.
    pub async fn join_seat(&self, seat: u8, buy_in: u64) -> Result<PlayerRecord, JoinError> {
        self.seat_player(seat, buy_in)
            .await
            .inspect_err(|err| self.report("join_seat", err.is_store_failure(), err))
    }

    async fn seat_player(&self, seat: u8, buy_in: u64) -> Result<PlayerRecord, JoinError> {
        if seat == 0 || seat > self.options.seats {
            return Err(JoinError::InvalidSeat(seat));
        }
        if buy_in < self.options.min_buy_in {
            return Err(JoinError::BuyInTooSmall {
                minimum: self.options.min_buy_in,
            });
        }

        let snapshot = self.snapshot().await?;
        if snapshot.game.status == GameStatus::Finished {
            return Err(JoinError::TableClosed);
        }
        if let Some(mine) = snapshot.my_player() {
            return Err(JoinError::AlreadySeated(mine.seat_position));
        }
        if snapshot.player_at(seat).is_some() {
            return Err(JoinError::SeatTaken(seat));
        }

        let player = PlayerRecord::seated(&self.game_id, seat, &self.user, buy_in);
        let created = self
            .store
            .create(Collection::Players, store::encode(&player)?)
            .await?;
        let player: PlayerRecord = store::decode(created)?;

        tracing::info!(game_id = %self.game_id, user = %self.user, seat, buy_in, "joined seat");
        Ok(player)
    }

    /// Leaves the table.
    ///
    /// Allowed while the table is waiting, once the player's bet is settled,
    /// or from the rebuy prompt. An unplayed bet is returned to the stack.
    /// Leaving from the rebuy prompt lets the next round start.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not seated, still has a bet in play, or
    /// the store fails.
    pub async fn leave(&self) -> Result<(), LeaveError> {
        self.unseat()
            .await
            .inspect_err(|err| self.report("leave", err.is_store_failure(), err))
    }

    async fn unseat(&self) -> Result<(), LeaveError> {
        let snapshot = self.snapshot().await?;
        let player = snapshot.my_player().ok_or(LeaveError::PlayerNotFound)?;
        let rebuy_prompt = snapshot.awaiting_rebuy();

        let mut patch = PlayerPatch::reset_round().is_active(false);
        match snapshot.game.status {
            GameStatus::Waiting => {
                if player.bet() > 0 {
                    patch = patch.chips(player.chips + player.bet());
                }
            }
            _ if player.bet() == 0 || rebuy_prompt => {}
            _ => return Err(LeaveError::RoundInProgress),
        }

        self.write_player(&player.id, patch).await?;
        tracing::info!(game_id = %self.game_id, user = %self.user, seat = player.seat_position, "left table");

        if rebuy_prompt {
            self.prepare_next_round().await?;
        }
        Ok(())
    }

    /// Buys back in after going broke, then lets the next round start.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not seated, still has chips, the amount
    /// is below the minimum buy-in, or the store fails.
    pub async fn rebuy(&self, amount: u64) -> Result<PlayerRecord, RebuyError> {
        self.buy_back_in(amount)
            .await
            .inspect_err(|err| self.report("rebuy", err.is_store_failure(), err))
    }

    async fn buy_back_in(&self, amount: u64) -> Result<PlayerRecord, RebuyError> {
        if amount < self.options.min_buy_in {
            return Err(RebuyError::BuyInTooSmall {
                minimum: self.options.min_buy_in,
            });
        }

        let snapshot = self.snapshot().await?;
        let player = snapshot.my_player().ok_or(RebuyError::PlayerNotFound)?;
        let rebuy_prompt = snapshot.awaiting_rebuy();
        let broke_between_rounds =
            snapshot.game.status == GameStatus::Waiting && player.is_broke() && player.bet() == 0;
        if !rebuy_prompt && !broke_between_rounds {
            return Err(RebuyError::NotBroke);
        }

        let patch = PlayerPatch::new()
            .chips(player.chips + amount)
            .initial_buy_in(player.initial_buy_in + amount)
            .is_active(true);
        self.write_player(&player.id, patch).await?;
        tracing::info!(game_id = %self.game_id, user = %self.user, amount, "rebought");

        if rebuy_prompt {
            self.prepare_next_round().await?;
        }

        self.load_my_player()
            .await?
            .ok_or(RebuyError::PlayerNotFound)
    }

    /// Closes a waiting table so it is no longer offered to new sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if a round is in progress or the store fails.
    pub async fn close(&self) -> Result<(), CloseError> {
        self.close_table()
            .await
            .inspect_err(|err| self.report("close", err.is_store_failure(), err))
    }

    async fn close_table(&self) -> Result<(), CloseError> {
        let game = self.load_game().await?;
        match game.status {
            GameStatus::Finished => return Ok(()),
            GameStatus::Playing => return Err(CloseError::RoundInProgress),
            GameStatus::Waiting => {}
        }

        self.write_game(GamePatch::new().status(GameStatus::Finished))
            .await?;
        tracing::info!(game_id = %self.game_id, user = %self.user, "closed table");
        Ok(())
    }
}
