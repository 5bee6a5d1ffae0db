use crate::error::{ActionError, StoreError};
use crate::hand::Hand;
use crate::records::{GamePatch, HandSlot, PlayerPatch, PlayerRecord, TurnOwner};
use crate::store::RecordStore;

use super::{ActionOutcome, Table, next_to_act};

/// A decision on the active hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    /// Take one card.
    Hit,
    /// Keep the hand.
    Stand,
    /// Double the stake, take exactly one card and stand.
    Double,
    /// Split a pair into two hands.
    Split,
}

impl PlayerAction {
    const fn name(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Stand => "stand",
            Self::Double => "double_down",
            Self::Split => "split",
        }
    }
}

impl<S: RecordStore> Table<S> {
    /// Player action: Hit.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not seated, the deck is empty, or the
    /// store fails.
    pub async fn hit(&self) -> Result<ActionOutcome, ActionError> {
        self.perform(PlayerAction::Hit).await
    }

    /// Player action: Stand.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not seated or the store fails.
    pub async fn stand(&self) -> Result<ActionOutcome, ActionError> {
        self.perform(PlayerAction::Stand).await
    }

    /// Player action: Double down.
    ///
    /// Only on a two-card hand, and only if the player can cover the stake
    /// again.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not seated, the hand cannot be doubled,
    /// the deck is empty, or the store fails.
    pub async fn double_down(&self) -> Result<ActionOutcome, ActionError> {
        self.perform(PlayerAction::Double).await
    }

    /// Player action: Split a pair.
    ///
    /// Each card starts a new hand with one more card drawn to it and the
    /// original stake. The main hand plays first.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not seated, the hand is not a pair or
    /// was already split, the player cannot cover a second stake, the deck is
    /// short, or the store fails.
    pub async fn split(&self) -> Result<ActionOutcome, ActionError> {
        self.perform(PlayerAction::Split).await
    }

    /// Applies `action` to the active hand if this user holds the turn.
    ///
    /// Out-of-turn and repeated actions change nothing and report
    /// [`ActionOutcome::Stale`].
    ///
    /// # Errors
    ///
    /// See the individual actions.
    pub async fn perform(&self, action: PlayerAction) -> Result<ActionOutcome, ActionError> {
        self.apply(action)
            .await
            .inspect_err(|err| self.report(action.name(), err.is_store_failure(), err))
    }

    async fn apply(&self, action: PlayerAction) -> Result<ActionOutcome, ActionError> {
        let snapshot = self.snapshot().await?;
        let player = snapshot.my_player().ok_or(ActionError::PlayerNotFound)?;
        if !snapshot.is_turn_of(player) {
            tracing::debug!(
                game_id = %self.game_id,
                user = %self.user,
                action = action.name(),
                "stale action ignored"
            );
            return Ok(ActionOutcome::Stale);
        }

        self.deck_for_round(snapshot.game.round_number);
        let mut player = player.clone();
        let patch = match action {
            PlayerAction::Hit => self.hit_hand(&mut player)?,
            PlayerAction::Stand => stand_hand(&mut player),
            PlayerAction::Double => self.double_hand(&mut player)?,
            PlayerAction::Split => self.split_hand(&mut player)?,
        };
        self.write_player(&player.id, patch).await?;

        tracing::debug!(
            game_id = %self.game_id,
            seat = player.seat_position,
            action = action.name(),
            slot = ?player.active_hand,
            value = player.active().map_or(0, Hand::value),
            "player acted"
        );

        Ok(self.advance(&player).await?)
    }

    fn hit_hand(&self, player: &mut PlayerRecord) -> Result<PlayerPatch, ActionError> {
        let slot = player.active_hand;
        let card = self.draw().ok_or(ActionError::NoCards)?;
        let hand = player.hand_in_mut(slot).ok_or(ActionError::PlayerNotFound)?;
        hand.add_card(card);
        Ok(PlayerPatch::new().hand_in(slot, hand))
    }

    fn double_hand(&self, player: &mut PlayerRecord) -> Result<PlayerPatch, ActionError> {
        let slot = player.active_hand;
        let chips = player.chips;
        let hand = player.hand_in_mut(slot).ok_or(ActionError::PlayerNotFound)?;
        if hand.len() != 2 || chips < hand.bet() {
            return Err(ActionError::CannotDouble);
        }

        let card = self.draw().ok_or(ActionError::NoCards)?;
        let extra = hand.bet();
        hand.double_down(card);
        let patch = PlayerPatch::new().hand_in(slot, hand);

        player.chips = chips - extra;
        Ok(patch.chips(player.chips))
    }

    fn split_hand(&self, player: &mut PlayerRecord) -> Result<PlayerPatch, ActionError> {
        let bet = player.bet();
        if player.active_hand != HandSlot::Main
            || player.has_split()
            || !player.hand.can_split()
            || player.chips < bet
        {
            return Err(ActionError::CannotSplit);
        }
        if self.cards_remaining() < 2 {
            return Err(ActionError::NoCards);
        }

        let (kept, moved) = player.hand.take_pair().ok_or(ActionError::CannotSplit)?;
        let (Some(first), Some(second)) = (self.draw(), self.draw()) else {
            return Err(ActionError::NoCards);
        };
        let main = Hand::from_split(kept, first, bet);
        let split = Hand::from_split(moved, second, bet);

        let patch = PlayerPatch::new()
            .hand(&main)
            .split_hand(Some(&split))
            .chips(player.chips - bet)
            .active_hand(HandSlot::Main);

        player.chips -= bet;
        player.hand = main;
        player.split = Some(split);
        player.active_hand = HandSlot::Main;
        Ok(patch)
    }

    /// Moves play on once the active hand is done.
    async fn advance(&self, player: &PlayerRecord) -> Result<ActionOutcome, StoreError> {
        if player.active().is_some_and(Hand::is_playing) {
            return Ok(ActionOutcome::Continue);
        }

        let split_pending = player.split.as_ref().is_some_and(Hand::is_playing);
        if player.active_hand == HandSlot::Main && split_pending {
            self.write_player(&player.id, PlayerPatch::new().active_hand(HandSlot::Split))
                .await?;
            return Ok(ActionOutcome::SplitHand);
        }

        let players = self.load_players().await?;
        let next = next_to_act(&players, player.seat_position);
        self.write_game(GamePatch::new().current_turn(Some(&next)))
            .await?;

        match next {
            TurnOwner::Player(id) => {
                tracing::debug!(game_id = %self.game_id, next = %id, "turn passed");
                Ok(ActionOutcome::NextPlayer(id))
            }
            TurnOwner::Dealer => Ok(ActionOutcome::RoundSettled(self.play_dealer().await?)),
        }
    }
}

fn stand_hand(player: &mut PlayerRecord) -> PlayerPatch {
    let slot = player.active_hand;
    match player.hand_in_mut(slot) {
        Some(hand) => {
            hand.stand();
            PlayerPatch::new().hand_in(slot, hand)
        }
        None => PlayerPatch::new(),
    }
}
