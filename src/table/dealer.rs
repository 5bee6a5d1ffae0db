use crate::error::StoreError;
use crate::hand::DealerHand;
use crate::payout::{DealerOutcome, HandResult, PlayerResult, RoundResult, settle_hand};
use crate::records::{AdminLogEntry, GamePatch, GameStatus, HandSlot, PlayerPatch, PlayerRecord};
use crate::store::{self, Collection, RecordStore};

use super::{NextRound, RoundPhase, Settlement, Table};

impl<S: RecordStore> Table<S> {
    /// Dealer plays their hand, then the round settles.
    ///
    /// The hole card is revealed, then the dealer draws while under the stand
    /// total. Every step is persisted so polling clients can follow along.
    pub(super) async fn play_dealer(&self) -> Result<Settlement, StoreError> {
        self.pause(self.options.dealer_delay).await;

        let game = self.load_game().await?;
        self.deck_for_round(game.round_number);
        let mut dealer = game.dealer;
        dealer.reveal_hole();
        self.write_game(GamePatch::new().dealer(&dealer)).await?;

        while dealer.must_draw(self.options.dealer_stands_on) {
            self.pause(self.options.dealer_delay).await;
            let Some(card) = self.draw() else {
                tracing::warn!(game_id = %self.game_id, value = dealer.value(), "deck ran out during dealer turn");
                break;
            };
            dealer.add_card(card);
            self.write_game(GamePatch::new().dealer(&dealer)).await?;
        }

        tracing::debug!(
            game_id = %self.game_id,
            value = dealer.value(),
            cards = dealer.len(),
            "dealer stands"
        );

        self.settle(DealerOutcome::of(&dealer)).await
    }

    async fn settle(&self, dealer: DealerOutcome) -> Result<Settlement, StoreError> {
        let game = self.load_game().await?;
        let bettors: Vec<PlayerRecord> = self
            .load_players()
            .await?
            .into_iter()
            .filter(|p| p.bet() > 0)
            .collect();

        let mut players = Vec::with_capacity(bettors.len());
        for player in &bettors {
            let result = self.settle_player(player, dealer);
            if result.total_payout > 0 {
                // Credit on top of the stored stack, not the one read above.
                let chips = self
                    .load_player(&player.id)
                    .await?
                    .map_or(player.chips, |current| current.chips);
                self.write_player(
                    &player.id,
                    PlayerPatch::new().chips(chips + result.total_payout),
                )
                .await?;
                self.pause(self.options.payout_delay).await;
            }
            players.push(result);
        }

        let result = RoundResult {
            round_number: game.round_number,
            players,
            dealer_value: dealer.value,
            dealer_bust: dealer.is_bust(),
            dealer_blackjack: dealer.is_blackjack(),
        };
        tracing::info!(
            game_id = %self.game_id,
            round = result.round_number,
            dealer_value = result.dealer_value,
            bettors = result.players.len(),
            "round settled"
        );

        let mut self_broke = false;
        for player in self.load_players().await? {
            if !player.is_broke() {
                continue;
            }
            if player.created_by == self.user {
                self_broke = true;
            } else {
                self.write_player(&player.id, PlayerPatch::reset_round().is_active(false))
                    .await?;
                tracing::info!(game_id = %self.game_id, seat = player.seat_position, "busted out");
            }
        }

        let next = if self_broke {
            self.write_game(GamePatch::new().settled(true)).await?;
            tracing::info!(game_id = %self.game_id, user = %self.user, "waiting on rebuy");
            NextRound::RebuyRequired
        } else {
            NextRound::Started {
                round_number: self.prepare_next_round().await?,
            }
        };

        Ok(Settlement { result, next })
    }

    fn settle_player(&self, player: &PlayerRecord, dealer: DealerOutcome) -> PlayerResult {
        let hands: Vec<HandResult> = [HandSlot::Main, HandSlot::Split]
            .into_iter()
            .filter_map(|slot| player.hand_in(slot).map(|hand| (slot, hand)))
            .map(|(slot, hand)| {
                let (outcome, payout) = settle_hand(hand, slot, dealer, &self.options);
                HandResult {
                    slot,
                    outcome,
                    bet: hand.bet(),
                    payout,
                    player_value: hand.value(),
                    dealer_value: dealer.value,
                }
            })
            .collect();

        let total_payout = hands.iter().map(|h| h.payout).sum();
        #[expect(clippy::cast_possible_wrap, reason = "chip counts fit in i64")]
        let net = total_payout as i64 - player.stake() as i64;

        PlayerResult {
            player_id: player.id.clone(),
            seat_position: player.seat_position,
            hands,
            total_payout,
            net,
        }
    }

    /// Puts every active player's round fields back to their waiting defaults.
    ///
    /// Applying it again changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn reset_players(&self) -> Result<(), StoreError> {
        for player in self.load_players().await? {
            self.write_player(&player.id, PlayerPatch::reset_round())
                .await?;
        }
        Ok(())
    }

    /// Resets the players and opens the next round for betting.
    ///
    /// Returns the new round number.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn prepare_next_round(&self) -> Result<u64, StoreError> {
        self.reset_players().await?;

        let round_number = self.load_game().await?.round_number + 1;
        self.write_game(waiting_round(round_number)).await?;

        tracing::info!(game_id = %self.game_id, round = round_number, "next round open for bets");
        Ok(round_number)
    }

    /// Abandons the current round and returns the table to waiting.
    ///
    /// Stakes still in play are refunded unless the round had already been
    /// paid out. Every player of the game is reset, and an audit entry is
    /// written to `adminLogs`. Returns the new round number.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn force_reset(&self) -> Result<u64, StoreError> {
        self.reset_table()
            .await
            .inspect_err(|err| self.report("force_reset", true, err))
    }

    async fn reset_table(&self) -> Result<u64, StoreError> {
        let snapshot = self.snapshot().await?;
        let refund = snapshot.phase() != RoundPhase::Settlement;

        let mut refunded = 0;
        for player in self.load_all_players().await? {
            let mut patch = PlayerPatch::reset_round();
            if refund && player.stake() > 0 {
                refunded += player.stake();
                patch = patch.chips(player.chips + player.stake());
            }
            self.write_player(&player.id, patch).await?;
        }

        let round_number = snapshot.game.round_number + 1;
        self.write_game(waiting_round(round_number)).await?;

        let entry = AdminLogEntry {
            action: String::from("reset_game"),
            game_id: self.game_id.clone(),
            performed_by: self.user.clone(),
            details: format!(
                "reset round {} (was {:?}), refunded {refunded}",
                snapshot.game.round_number,
                snapshot.game.status
            ),
        };
        self.store
            .create(Collection::AdminLogs, store::encode(&entry)?)
            .await?;

        tracing::warn!(
            game_id = %self.game_id,
            user = %self.user,
            round = round_number,
            refunded,
            "table force reset"
        );
        Ok(round_number)
    }

    /// Resets a round that is `playing` with nobody able to drive it.
    pub(super) async fn recover_if_stuck(&self) -> Result<bool, StoreError> {
        let snapshot = self.snapshot().await?;
        if !snapshot.is_stuck() {
            return Ok(false);
        }
        tracing::warn!(
            game_id = %self.game_id,
            turn = ?snapshot.game.current_turn,
            "round stuck without a turn owner"
        );
        self.force_reset().await?;
        Ok(true)
    }
}

/// Game fields for a table back to taking bets.
fn waiting_round(round_number: u64) -> GamePatch {
    GamePatch::new()
        .status(GameStatus::Waiting)
        .dealer(&DealerHand::new())
        .current_turn(None)
        .pot(0)
        .settled(false)
        .round_number(round_number)
}
