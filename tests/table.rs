//! Table round flow against a shared in-memory store.

use std::sync::Arc;
use std::time::Duration;

use bjtable::overview::list_tables;
use bjtable::store::{Collection, Fields};
use bjtable::{
    ActionError, ActionOutcome, BetError, Card, CloseError, DealError, Deck, GameStatus,
    HandOutcome, HandSlot, HandStatus, JoinError, LeaveError, MemoryStore, NextRound,
    PlayerRecord, RebuyError, RecordStore, RoundPhase, StoreError, Suit, Table, TableOptions,
    TurnOwner,
};
use serde_json::json;

type Session = Table<Arc<MemoryStore>>;

const fn card(suit: Suit, rank: u8) -> Card {
    Card::new(suit, rank)
}

fn ranks(ranks: &[u8]) -> Vec<Card> {
    ranks
        .iter()
        .enumerate()
        .map(|(i, &rank)| card(Suit::ALL[i % 4], rank))
        .collect()
}

fn options() -> TableOptions {
    TableOptions::default().without_delays()
}

async fn open(store: &Arc<MemoryStore>, user: &str) -> Session {
    Table::open(Arc::clone(store), options(), user, 7).await.unwrap()
}

async fn me(table: &Session) -> PlayerRecord {
    table.snapshot().await.unwrap().my_player().unwrap().clone()
}

fn fields(value: serde_json::Value) -> Fields {
    value.as_object().unwrap().clone()
}

#[tokio::test]
async fn sessions_share_the_open_table() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let bob = open(&store, "bob").await;

    assert_eq!(alice.game_id(), bob.game_id());
    assert_eq!(store.records(Collection::Games).await.len(), 1);

    let game = alice.snapshot().await.unwrap().game;
    assert_eq!(game.status, GameStatus::Waiting);
    assert_eq!(game.round_number, 1);
    assert_eq!(game.pot, 0);
    assert!(game.dealer.is_empty());
}

#[tokio::test]
async fn closed_tables_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    alice.close().await.unwrap();
    alice.close().await.unwrap();

    assert_eq!(alice.join_seat(1, 1000).await, Err(JoinError::TableClosed));
    assert_eq!(alice.snapshot().await.unwrap().phase(), RoundPhase::Closed);

    let bob = open(&store, "bob").await;
    assert_ne!(bob.game_id(), alice.game_id());
    assert_eq!(store.records(Collection::Games).await.len(), 2);
}

#[tokio::test]
async fn join_seat_validation() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let bob = open(&store, "bob").await;

    assert_eq!(alice.join_seat(0, 1000).await, Err(JoinError::InvalidSeat(0)));
    assert_eq!(alice.join_seat(6, 1000).await, Err(JoinError::InvalidSeat(6)));
    assert_eq!(
        alice.join_seat(1, 50).await,
        Err(JoinError::BuyInTooSmall { minimum: 100 })
    );

    let player = alice.join_seat(1, 1000).await.unwrap();
    assert_eq!(player.seat_position, 1);
    assert_eq!(player.chips, 1000);
    assert_eq!(player.table_limit, 1000);
    assert_eq!(player.initial_buy_in, 1000);
    assert_eq!(player.hand.status(), HandStatus::Waiting);
    assert!(!player.id.is_empty());

    assert_eq!(alice.join_seat(2, 1000).await, Err(JoinError::AlreadySeated(1)));
    assert_eq!(bob.join_seat(1, 500).await, Err(JoinError::SeatTaken(1)));
    assert!(bob.join_seat(2, 500).await.is_ok());

    let err = bob.join_seat(3, 500).await.unwrap_err();
    assert_eq!(err.status_message(), "already sitting at seat 2");
}

#[tokio::test]
async fn bets_are_escrowed_and_validated() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;

    assert_eq!(alice.place_bet(100).await, Err(BetError::PlayerNotFound));
    alice.join_seat(1, 1000).await.unwrap();

    assert_eq!(
        alice.place_bet(5).await,
        Err(BetError::BelowMinimum { minimum: 10 })
    );
    assert_eq!(alice.place_bet(1001).await, Err(BetError::InsufficientFunds));
    assert_eq!(me(&alice).await.chips, 1000);

    let player = alice.place_bet(100).await.unwrap();
    assert_eq!((player.chips, player.bet()), (900, 100));

    alice.place_bet(1000).await.unwrap();
    let player = me(&alice).await;
    assert_eq!((player.chips, player.bet()), (0, 1000));

    alice.place_bet(0).await.unwrap();
    let player = me(&alice).await;
    assert_eq!((player.chips, player.bet()), (1000, 0));
}

#[tokio::test]
async fn deal_validation() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    alice.join_seat(1, 1000).await.unwrap();

    assert_eq!(alice.start_round().await, Err(DealError::NoBets));

    alice.place_bet(100).await.unwrap();
    let short = Deck::stacked(&ranks(&[10, 6, 10]));
    assert_eq!(
        alice.start_round_with_deck(short).await,
        Err(DealError::NotEnoughCards)
    );
    assert_eq!(alice.snapshot().await.unwrap().game.status, GameStatus::Waiting);

    let deck = Deck::stacked(&ranks(&[10, 6, 10, 7]));
    alice.start_round_with_deck(deck).await.unwrap();
    assert_eq!(alice.start_round().await, Err(DealError::InvalidState));
    assert_eq!(alice.place_bet(50).await, Err(BetError::InvalidState));
}

#[tokio::test]
async fn natural_blackjack_pays_three_to_two_and_opens_the_next_round() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let player = alice.join_seat(1, 1000).await.unwrap();
    alice.place_bet(100).await.unwrap();

    let deck = Deck::stacked(&ranks(&[1, 13, 9, 8]));
    let start = alice.start_round_with_deck(deck).await.unwrap();
    assert_eq!(start.first_turn, TurnOwner::Dealer);

    let settlement = start.settlement.unwrap();
    assert_eq!(settlement.next, NextRound::Started { round_number: 2 });
    assert_eq!(settlement.result.round_number, 1);
    assert_eq!(settlement.result.dealer_value, 17);

    let result = settlement.result.player(&player.id).unwrap();
    assert_eq!(result.total_payout, 250);
    assert_eq!(result.net, 150);
    assert_eq!(result.hands[0].outcome, HandOutcome::Blackjack);

    let snapshot = alice.snapshot().await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::Waiting);
    assert_eq!(snapshot.game.round_number, 2);
    assert_eq!(snapshot.game.current_turn, None);
    assert_eq!(snapshot.game.pot, 0);
    assert!(snapshot.game.dealer.is_empty());

    let player = snapshot.my_player().unwrap();
    assert_eq!(player.chips, 1150);
    assert_eq!(player.bet(), 0);
    assert!(player.hand.is_empty());
    assert_eq!(player.hand.status(), HandStatus::Waiting);
    assert!(!player.has_split());
    assert_eq!(player.active_hand, HandSlot::Main);
    assert_eq!(player.net_result(), 150);
}

#[tokio::test]
async fn dealer_draws_below_seventeen() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let player = alice.join_seat(1, 1000).await.unwrap();
    alice.place_bet(100).await.unwrap();

    let deck = Deck::stacked(&ranks(&[10, 10, 10, 6, 5]));
    let start = alice.start_round_with_deck(deck).await.unwrap();
    assert_eq!(start.first_turn, TurnOwner::Player(player.id.clone()));

    let snapshot = alice.snapshot().await.unwrap();
    assert_eq!(snapshot.phase(), RoundPhase::PlayerTurns);
    assert_eq!(snapshot.game.pot, 100);
    assert!(!snapshot.game.dealer.is_hole_revealed());
    assert_eq!(snapshot.game.dealer.visible_value(), 10);
    assert_eq!(snapshot.status_line(), "Your turn");

    let ActionOutcome::RoundSettled(settlement) = alice.stand().await.unwrap() else {
        panic!("round should settle once the only player stands");
    };
    assert_eq!(settlement.result.dealer_value, 21);
    assert!(!settlement.result.dealer_blackjack);
    assert_eq!(settlement.result.player(&player.id).unwrap().net, -100);
    assert_eq!(me(&alice).await.chips, 900);
}

#[tokio::test]
async fn split_eights_escrows_a_second_stake() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    alice.join_seat(1, 1000).await.unwrap();
    alice.place_bet(50).await.unwrap();

    let deck = Deck::stacked(&[
        card(Suit::Hearts, 8),
        card(Suit::Spades, 8),
        card(Suit::Clubs, 10),
        card(Suit::Diamonds, 7),
        card(Suit::Hearts, 3),
        card(Suit::Spades, 2),
    ]);
    alice.start_round_with_deck(deck).await.unwrap();

    assert_eq!(alice.split().await, Ok(ActionOutcome::Continue));

    let player = me(&alice).await;
    assert_eq!(player.chips, 900);
    assert_eq!(player.bet(), 50);
    assert!(player.has_split());
    assert_eq!(player.active_hand, HandSlot::Main);
    assert_eq!(player.hand.cards(), &[card(Suit::Hearts, 8), card(Suit::Hearts, 3)]);
    assert_eq!(player.hand.value(), 11);

    let split = player.split.as_ref().unwrap();
    assert_eq!(split.bet(), 50);
    assert_eq!(split.cards(), &[card(Suit::Spades, 8), card(Suit::Spades, 2)]);
    assert_eq!(split.value(), 10);
    assert_eq!(player.stake(), 100);

    assert_eq!(alice.split().await, Err(ActionError::CannotSplit));

    assert_eq!(alice.stand().await, Ok(ActionOutcome::SplitHand));
    assert_eq!(me(&alice).await.active_hand, HandSlot::Split);

    let ActionOutcome::RoundSettled(settlement) = alice.stand().await.unwrap() else {
        panic!("round should settle after the split hand stands");
    };
    let result = &settlement.result.players[0];
    assert_eq!(result.hands.len(), 2);
    assert_eq!(result.total_payout, 0);
    assert_eq!(result.net, -100);
    assert_eq!(me(&alice).await.chips, 900);
}

#[tokio::test]
async fn split_hands_pass_the_turn_to_the_next_seat() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let bob = open(&store, "bob").await;
    alice.join_seat(1, 1000).await.unwrap();
    let bob_seat = bob.join_seat(2, 1000).await.unwrap();
    alice.place_bet(50).await.unwrap();
    bob.place_bet(50).await.unwrap();

    let deck = Deck::stacked(&ranks(&[8, 8, 10, 6, 10, 7, 3, 2]));
    alice.start_round_with_deck(deck).await.unwrap();

    assert_eq!(alice.split().await, Ok(ActionOutcome::Continue));
    assert_eq!(bob.stand().await, Ok(ActionOutcome::Stale));
    assert_eq!(alice.stand().await, Ok(ActionOutcome::SplitHand));
    assert_eq!(
        alice.stand().await,
        Ok(ActionOutcome::NextPlayer(bob_seat.id.clone()))
    );

    let snapshot = bob.snapshot().await.unwrap();
    assert_eq!(snapshot.phase(), RoundPhase::PlayerTurns);
    assert_eq!(snapshot.game.current_turn, Some(TurnOwner::Player(bob_seat.id.clone())));
    assert!(snapshot.is_my_turn());

    let ActionOutcome::RoundSettled(settlement) = bob.stand().await.unwrap() else {
        panic!("round should settle after the last seat stands");
    };
    assert_eq!(settlement.result.players.len(), 2);
    assert_eq!(settlement.result.players[0].hands.len(), 2);
    assert_eq!(settlement.result.players[0].net, -100);
    assert_eq!(me(&alice).await.chips, 900);
    assert_eq!(me(&bob).await.chips, 950);
}

#[tokio::test]
async fn doubling_both_split_hands_spends_the_whole_stack() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let player = alice.join_seat(1, 200).await.unwrap();
    alice.place_bet(50).await.unwrap();

    let deck = Deck::stacked(&ranks(&[5, 5, 10, 7, 6, 4, 10, 10]));
    alice.start_round_with_deck(deck).await.unwrap();

    assert_eq!(alice.split().await, Ok(ActionOutcome::Continue));
    assert_eq!(me(&alice).await.chips, 100);

    assert_eq!(alice.double_down().await, Ok(ActionOutcome::SplitHand));
    let doubled = me(&alice).await;
    assert_eq!(doubled.chips, 50);
    assert_eq!(doubled.hand.bet(), 100);
    assert_eq!(doubled.hand.value(), 21);

    let ActionOutcome::RoundSettled(settlement) = alice.double_down().await.unwrap() else {
        panic!("doubling the split hand should settle the round");
    };
    let result = settlement.result.player(&player.id).unwrap();
    let bets: Vec<u64> = result.hands.iter().map(|hand| hand.bet).collect();
    assert_eq!(bets, [100, 100]);
    assert!(result.hands.iter().all(|hand| hand.outcome == HandOutcome::Win));
    assert_eq!(result.total_payout, 400);
    assert_eq!(result.net, 200);
    assert_eq!(me(&alice).await.chips, 400);
}

#[tokio::test]
async fn split_at_the_chip_limit_cannot_double() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    alice.join_seat(1, 100).await.unwrap();
    alice.place_bet(50).await.unwrap();

    let deck = Deck::stacked(&ranks(&[5, 5, 10, 7, 6, 4]));
    alice.start_round_with_deck(deck).await.unwrap();

    assert_eq!(alice.split().await, Ok(ActionOutcome::Continue));
    assert_eq!(alice.double_down().await, Err(ActionError::CannotDouble));
    let player = me(&alice).await;
    assert_eq!(player.chips, 0);
    assert_eq!(player.stake(), 100);
    assert_eq!(player.hand.len(), 2);

    assert_eq!(alice.stand().await, Ok(ActionOutcome::SplitHand));
    assert_eq!(alice.double_down().await, Err(ActionError::CannotDouble));
    let ActionOutcome::RoundSettled(settlement) = alice.stand().await.unwrap() else {
        panic!("round should settle after the split hand stands");
    };
    assert_eq!(settlement.next, NextRound::RebuyRequired);
    assert_eq!(settlement.result.players[0].net, -100);
    assert!(alice.snapshot().await.unwrap().awaiting_rebuy());
}

#[tokio::test]
async fn turn_passes_up_the_seats() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let bob = open(&store, "bob").await;
    let carol = open(&store, "carol").await;

    alice.join_seat(1, 1000).await.unwrap();
    let bob_seat = bob.join_seat(2, 1000).await.unwrap();
    let carol_seat = carol.join_seat(3, 1000).await.unwrap();
    for table in [&alice, &bob, &carol] {
        table.place_bet(100).await.unwrap();
    }

    let deck = Deck::stacked(&ranks(&[10, 6, 10, 7, 10, 8, 10, 7]));
    alice.start_round_with_deck(deck).await.unwrap();

    assert_eq!(bob.hit().await, Ok(ActionOutcome::Stale));
    assert_eq!(me(&bob).await.hand.len(), 2);

    assert_eq!(
        alice.stand().await,
        Ok(ActionOutcome::NextPlayer(bob_seat.id.clone()))
    );
    assert_eq!(alice.stand().await, Ok(ActionOutcome::Stale));
    assert!(bob.snapshot().await.unwrap().is_my_turn());

    assert_eq!(
        bob.stand().await,
        Ok(ActionOutcome::NextPlayer(carol_seat.id.clone()))
    );
    let game = carol.snapshot().await.unwrap().game;
    assert_eq!(game.current_turn, Some(TurnOwner::Player(carol_seat.id.clone())));

    let ActionOutcome::RoundSettled(settlement) = carol.stand().await.unwrap() else {
        panic!("round should settle after the last seat stands");
    };
    assert_eq!(settlement.next, NextRound::Started { round_number: 2 });
    assert_eq!(settlement.result.players.len(), 3);

    assert_eq!(me(&alice).await.chips, 900);
    assert_eq!(me(&bob).await.chips, 1000);
    assert_eq!(me(&carol).await.chips, 1100);
}

#[tokio::test]
async fn first_turn_skips_naturals() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let bob = open(&store, "bob").await;
    alice.join_seat(1, 1000).await.unwrap();
    let bob_seat = bob.join_seat(2, 1000).await.unwrap();
    alice.place_bet(100).await.unwrap();
    bob.place_bet(100).await.unwrap();

    let deck = Deck::stacked(&ranks(&[1, 12, 10, 6, 10, 7]));
    let start = alice.start_round_with_deck(deck).await.unwrap();

    assert_eq!(start.first_turn, TurnOwner::Player(bob_seat.id));
    assert!(start.settlement.is_none());
    assert_eq!(me(&alice).await.hand.status(), HandStatus::Blackjack);
    assert_eq!(alice.hit().await, Ok(ActionOutcome::Stale));
}

#[tokio::test]
async fn double_down_takes_one_card() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let player = alice.join_seat(1, 1000).await.unwrap();
    alice.place_bet(100).await.unwrap();

    let deck = Deck::stacked(&ranks(&[5, 6, 10, 7, 10]));
    alice.start_round_with_deck(deck).await.unwrap();

    let ActionOutcome::RoundSettled(settlement) = alice.double_down().await.unwrap() else {
        panic!("doubling the only hand should settle the round");
    };
    let result = settlement.result.player(&player.id).unwrap();
    assert_eq!(result.hands[0].bet, 200);
    assert_eq!(result.hands[0].player_value, 21);
    assert_eq!(result.total_payout, 400);
    assert_eq!(result.net, 200);
    assert_eq!(me(&alice).await.chips, 1200);
}

#[tokio::test]
async fn double_down_needs_two_cards_and_chips() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    alice.join_seat(1, 1000).await.unwrap();
    alice.place_bet(100).await.unwrap();

    let deck = Deck::stacked(&ranks(&[2, 3, 10, 7, 4]));
    alice.start_round_with_deck(deck).await.unwrap();

    assert_eq!(alice.hit().await, Ok(ActionOutcome::Continue));
    assert_eq!(alice.double_down().await, Err(ActionError::CannotDouble));
    assert_eq!(alice.hit().await, Err(ActionError::NoCards));

    let player = me(&alice).await;
    assert_eq!(player.hand.value(), 9);
    assert_eq!(player.chips, 900);

    let bob = open(&store, "bob").await;
    bob.join_seat(2, 100).await.unwrap();
    assert_eq!(bob.place_bet(100).await, Err(BetError::InvalidState));
}

#[tokio::test]
async fn busting_out_waits_for_a_rebuy() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    alice.join_seat(1, 100).await.unwrap();
    alice.place_bet(100).await.unwrap();
    assert_eq!(alice.rebuy(200).await, Err(RebuyError::NotBroke));

    let deck = Deck::stacked(&ranks(&[10, 6, 10, 7, 10]));
    alice.start_round_with_deck(deck).await.unwrap();

    let ActionOutcome::RoundSettled(settlement) = alice.hit().await.unwrap() else {
        panic!("busting the only hand should settle the round");
    };
    assert_eq!(settlement.next, NextRound::RebuyRequired);

    let snapshot = alice.snapshot().await.unwrap();
    assert_eq!(snapshot.phase(), RoundPhase::Settlement);
    assert!(snapshot.awaiting_rebuy());
    assert_eq!(snapshot.status_line(), "Out of chips!");

    assert_eq!(
        alice.rebuy(50).await,
        Err(RebuyError::BuyInTooSmall { minimum: 100 })
    );

    let player = alice.rebuy(200).await.unwrap();
    assert_eq!(player.chips, 200);
    assert_eq!(player.initial_buy_in, 300);
    assert_eq!(player.bet(), 0);
    assert!(player.is_active);
    assert_eq!(player.net_result(), -100);

    let game = alice.snapshot().await.unwrap().game;
    assert_eq!(game.status, GameStatus::Waiting);
    assert_eq!(game.round_number, 2);
}

#[tokio::test]
async fn rebuy_waits_until_every_payout_is_credited() {
    let store = Arc::new(MemoryStore::new());
    let paced = options().with_delays(Duration::ZERO, Duration::ZERO, Duration::from_millis(300));
    let bob = Table::open(Arc::clone(&store), paced, "bob", 7).await.unwrap();
    let alice = open(&store, "alice").await;
    bob.join_seat(1, 1000).await.unwrap();
    alice.join_seat(2, 100).await.unwrap();
    bob.place_bet(100).await.unwrap();
    alice.place_bet(100).await.unwrap();

    // Bob is paid first, so alice shows zero chips while his payout pauses.
    let deck = Deck::stacked(&ranks(&[10, 9, 1, 13, 10, 7]));
    alice.start_round_with_deck(deck).await.unwrap();

    let (stood, (during, rebuy, leave)) = tokio::join!(bob.stand(), async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        (
            alice.snapshot().await.unwrap(),
            alice.rebuy(500).await,
            alice.leave().await,
        )
    });

    assert_eq!(during.phase(), RoundPhase::Settlement);
    assert_eq!(during.my_player().unwrap().chips, 0);
    assert!(!during.awaiting_rebuy());
    assert_eq!(during.status_line(), "Paying out...");
    assert_eq!(rebuy, Err(RebuyError::NotBroke));
    assert_eq!(leave, Err(LeaveError::RoundInProgress));

    let ActionOutcome::RoundSettled(settlement) = stood.unwrap() else {
        panic!("round should settle after the last playable seat stands");
    };
    assert_eq!(settlement.next, NextRound::Started { round_number: 2 });

    let player = me(&alice).await;
    assert_eq!(player.chips, 250);
    assert_eq!(player.initial_buy_in, 100);
    assert_eq!(me(&bob).await.chips, 1100);

    let game = alice.snapshot().await.unwrap().game;
    assert_eq!(game.status, GameStatus::Waiting);
    assert_eq!(game.round_number, 2);
    assert!(!game.settled);
}

#[tokio::test]
async fn a_session_that_never_deals_keeps_drawing_across_rounds() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let bob = Table::open(Arc::clone(&store), options(), "bob", 11).await.unwrap();
    alice.join_seat(1, 1000).await.unwrap();
    bob.join_seat(2, 1000).await.unwrap();

    for round in 1..=30_u64 {
        alice.place_bet(10).await.unwrap();
        bob.place_bet(10).await.unwrap();
        alice.start_round().await.unwrap();

        // Bob hits every hand out; alice stands whenever she holds the turn.
        for _ in 0..16 {
            let snapshot = bob.snapshot().await.unwrap();
            if snapshot.game.status != GameStatus::Playing {
                break;
            }
            let outcome = if snapshot.is_my_turn() {
                bob.hit().await
            } else {
                alice.stand().await
            };
            assert!(outcome.is_ok(), "round {round}: {outcome:?}");
        }

        let game = bob.snapshot().await.unwrap().game;
        assert_eq!(game.status, GameStatus::Waiting, "round {round}");
        assert_eq!(game.round_number, round + 1);
    }
}

#[tokio::test]
async fn leaving_from_the_rebuy_prompt_opens_the_next_round() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    alice.join_seat(1, 100).await.unwrap();
    alice.place_bet(100).await.unwrap();

    let deck = Deck::stacked(&ranks(&[10, 6, 10, 9]));
    alice.start_round_with_deck(deck).await.unwrap();
    alice.stand().await.unwrap();
    assert!(alice.snapshot().await.unwrap().awaiting_rebuy());

    alice.leave().await.unwrap();

    let snapshot = alice.snapshot().await.unwrap();
    assert!(snapshot.my_player().is_none());
    assert_eq!(snapshot.game.status, GameStatus::Waiting);
    assert_eq!(snapshot.game.round_number, 2);
}

#[tokio::test]
async fn broke_players_at_other_seats_are_unseated() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let bob = open(&store, "bob").await;
    alice.join_seat(1, 100).await.unwrap();
    bob.join_seat(2, 1000).await.unwrap();
    alice.place_bet(100).await.unwrap();
    bob.place_bet(100).await.unwrap();

    let deck = Deck::stacked(&ranks(&[10, 6, 10, 9, 10, 8]));
    alice.start_round_with_deck(deck).await.unwrap();
    alice.stand().await.unwrap();

    let ActionOutcome::RoundSettled(settlement) = bob.stand().await.unwrap() else {
        panic!("round should settle after the last seat stands");
    };
    assert_eq!(settlement.next, NextRound::Started { round_number: 2 });

    let snapshot = bob.snapshot().await.unwrap();
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.my_player().unwrap().chips, 1100);
    assert!(alice.snapshot().await.unwrap().my_player().is_none());

    let alice_record = store
        .records(Collection::Players)
        .await
        .into_iter()
        .find(|record| record.get("created_by") == Some(&json!("alice")))
        .unwrap();
    assert_eq!(alice_record.get("is_active"), Some(&json!(false)));
    assert_eq!(alice_record.get("bet"), Some(&json!(0)));
}

#[tokio::test]
async fn leave_rules() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let bob = open(&store, "bob").await;

    assert_eq!(alice.leave().await, Err(LeaveError::PlayerNotFound));

    alice.join_seat(1, 1000).await.unwrap();
    bob.join_seat(2, 1000).await.unwrap();
    alice.place_bet(100).await.unwrap();
    bob.place_bet(100).await.unwrap();
    bob.leave().await.unwrap();

    let bob_record = store
        .records(Collection::Players)
        .await
        .into_iter()
        .find(|record| record.get("created_by") == Some(&json!("bob")))
        .unwrap();
    assert_eq!(bob_record.get("chips"), Some(&json!(1000)));
    assert_eq!(bob_record.get("bet"), Some(&json!(0)));
    assert_eq!(bob_record.get("is_active"), Some(&json!(false)));

    let deck = Deck::stacked(&ranks(&[10, 6, 10, 7]));
    alice.start_round_with_deck(deck).await.unwrap();
    assert_eq!(alice.snapshot().await.unwrap().players.len(), 1);
    assert_eq!(alice.leave().await, Err(LeaveError::RoundInProgress));

    bob.join_seat(2, 500).await.unwrap();
    bob.leave().await.unwrap();
    assert!(alice.snapshot().await.unwrap().is_my_turn());
}

#[tokio::test]
async fn force_reset_refunds_stakes_and_logs() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    alice.join_seat(1, 1000).await.unwrap();
    alice.place_bet(100).await.unwrap();

    let deck = Deck::stacked(&ranks(&[10, 6, 10, 7]));
    alice.start_round_with_deck(deck).await.unwrap();
    assert_eq!(me(&alice).await.chips, 900);

    assert_eq!(alice.force_reset().await, Ok(2));

    let snapshot = alice.snapshot().await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::Waiting);
    assert_eq!(snapshot.game.current_turn, None);
    assert!(snapshot.game.dealer.is_empty());
    let player = snapshot.my_player().unwrap();
    assert_eq!(player.chips, 1000);
    assert_eq!(player.bet(), 0);
    assert_eq!(player.hand.status(), HandStatus::Waiting);

    let logs = store.records(Collection::AdminLogs).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].get("action"), Some(&json!("reset_game")));
    assert_eq!(logs[0].get("performed_by"), Some(&json!("alice")));
    assert_eq!(logs[0].get("game_id"), Some(&json!(alice.game_id())));
}

#[tokio::test]
async fn opening_a_stuck_table_resets_it() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    alice.join_seat(1, 1000).await.unwrap();
    alice.place_bet(100).await.unwrap();

    let deck = Deck::stacked(&ranks(&[10, 6, 10, 7]));
    alice.start_round_with_deck(deck).await.unwrap();

    store
        .update(
            Collection::Games,
            alice.game_id(),
            fields(json!({ "current_turn": "dealer" })),
        )
        .await
        .unwrap();
    assert!(alice.snapshot().await.unwrap().is_stuck());

    let bob = open(&store, "bob").await;
    assert_eq!(bob.game_id(), alice.game_id());

    let snapshot = alice.snapshot().await.unwrap();
    assert!(!snapshot.is_stuck());
    assert_eq!(snapshot.game.status, GameStatus::Waiting);
    assert_eq!(snapshot.game.round_number, 2);
    assert_eq!(snapshot.my_player().unwrap().chips, 1000);
    assert_eq!(store.records(Collection::AdminLogs).await.len(), 1);
}

#[tokio::test]
async fn resetting_players_twice_changes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    alice.join_seat(1, 1000).await.unwrap();
    alice.place_bet(100).await.unwrap();

    let deck = Deck::stacked(&ranks(&[10, 6, 10, 7]));
    alice.start_round_with_deck(deck).await.unwrap();

    alice.reset_players().await.unwrap();
    let once = store.records(Collection::Players).await;
    alice.reset_players().await.unwrap();
    let twice = store.records(Collection::Players).await;

    assert_eq!(once, twice);
    let player = me(&alice).await;
    assert_eq!(player.bet(), 0);
    assert_eq!(player.hand.status(), HandStatus::Waiting);
}

#[tokio::test]
async fn store_failures_surface_as_action_failed() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    alice.join_seat(1, 1000).await.unwrap();

    store.set_unavailable(true);
    let err = alice.place_bet(100).await.unwrap_err();
    assert!(matches!(err, BetError::Store(StoreError::Unavailable(_))));
    assert!(err.is_store_failure());
    assert_eq!(err.status_message(), "Action failed");

    let err = alice.close().await.unwrap_err();
    assert!(matches!(err, CloseError::Store(_)));
    assert!(alice.snapshot().await.is_err());

    store.set_unavailable(false);
    let player = me(&alice).await;
    assert_eq!((player.chips, player.bet()), (1000, 0));
}

#[tokio::test]
async fn overview_lists_recent_tables() {
    let store = Arc::new(MemoryStore::new());
    let alice = open(&store, "alice").await;
    let bob = open(&store, "bob").await;
    bob.join_seat(3, 500).await.unwrap();
    alice.join_seat(1, 1000).await.unwrap();

    let tables = list_tables(store.as_ref(), 5, 17).await.unwrap();
    assert_eq!(tables.len(), 1);

    let table = &tables[0];
    assert_eq!(table.game.id, alice.game_id());
    assert!(table.viewer.is_none());
    let seats: Vec<u8> = table.players.iter().map(|p| p.seat_position).collect();
    assert_eq!(seats, [1, 3]);
    assert_eq!(table.status_line(), "Join a seat and place your bet!");
}
