use session_engine::domain::{BackColor, Card, CardId, GameSession, LayoutRules, Rank, SlotId, Suit};
use session_engine::engine::{init_turn_for_game, MoveEventKind, StarterReason};
use session_engine::time_ctrl::{BonusGrant, TimeProfile, TimeRules, TurnState};

const NOW: u64 = 1_000_000;

#[test]
fn begin_starts_running_clock() {
    let t = TurnState::begin(10, 1, NOW, 15_000);
    assert_eq!(t.ends_at, NOW + 15_000);
    assert!(!t.paused);
    assert_eq!(t.remaining(NOW + 5_000), 10_000);
    assert_eq!(t.remaining(NOW + 20_000), 0);
}

#[test]
fn pause_freezes_and_resume_restores_exact_remaining() {
    let mut t = TurnState::begin(10, 1, NOW, 15_000);

    assert!(t.pause(NOW + 4_000));
    assert!(!t.pause(NOW + 5_000));
    assert!(t.paused);
    assert_eq!(t.remaining_ms, 11_000);
    assert_eq!(t.remaining(NOW + 50_000), 11_000);
    assert!(!t.is_expired(NOW + 1_000_000));

    assert!(t.resume(NOW + 60_000, None));
    assert!(!t.resume(NOW + 61_000, None));
    assert!(!t.paused);
    assert_eq!(t.ends_at, NOW + 60_000 + 11_000);
    assert_eq!(t.remaining(NOW + 60_000), 11_000);
}

#[test]
fn resume_with_override() {
    let mut t = TurnState::begin(10, 1, NOW, 15_000);
    t.pause(NOW + 1_000);
    t.resume(NOW + 2_000, Some(3_000));
    assert_eq!(t.ends_at, NOW + 5_000);
}

#[test]
fn bonus_is_capped_by_turn_duration() {
    let mut t = TurnState::begin(10, 1, NOW, 15_000);

    // полный ход: добавлять некуда
    assert_eq!(t.add_bonus(1_000, NOW, 15_000), BonusGrant::none());

    let grant = t.add_bonus(1_000, NOW + 5_000, 15_000);
    assert_eq!(grant.granted_ms, 1_000);
    assert!(grant.is_active());
    assert_eq!(t.remaining(NOW + 5_000), 11_000);

    let grant = t.add_bonus(1_000, NOW + 14_500, 15_000);
    assert_eq!(grant.granted_ms, 1_000);
    assert_eq!(t.remaining(NOW + 14_500), 2_500);
}

#[test]
fn partial_bonus_near_cap() {
    let mut t = TurnState::begin(10, 1, NOW, 15_000);
    let grant = t.add_bonus(1_000, NOW + 400, 15_000);
    assert_eq!(grant.granted_ms, 400);
    assert_eq!(t.remaining(NOW + 400), 15_000);
}

#[test]
fn no_bonus_while_paused() {
    let mut t = TurnState::begin(10, 1, NOW, 15_000);
    t.pause(NOW + 5_000);
    assert_eq!(t.add_bonus(1_000, NOW + 6_000, 15_000), BonusGrant::none());
    assert_eq!(t.remaining_ms, 10_000);
}

#[test]
fn expiry_is_inclusive_and_ignores_unset_clock() {
    let t = TurnState::begin(10, 1, NOW, 15_000);
    assert!(!t.is_expired(NOW + 14_999));
    assert!(t.is_expired(NOW + 15_000));

    let unset = TurnState {
        ends_at: 0,
        ..t.clone()
    };
    assert!(!unset.is_expired(NOW));
}

#[test]
fn signature_changes_with_state() {
    let mut t = TurnState::begin(10, 1, NOW, 15_000);
    let before = t.signature();
    t.pause(NOW + 1);
    assert_ne!(before, t.signature());
}

#[test]
fn time_profiles() {
    assert_eq!(TimeRules::standard(), TimeRules::new(15_000, 1_000, 250));
    assert_eq!(TimeRules::blitz().turn_ms, 8_000);
    assert_eq!(TimeRules::from_profile(TimeProfile::Blitz), TimeRules::blitz());
    assert_eq!(TimeRules::default(), TimeRules::standard());
}

//
// выбор первого игрока
//
fn deck_session(deck1: &[Rank], deck2: &[Rank]) -> GameSession {
    let mut s = GameSession::new_empty(1, [10, 20], &LayoutRules::standard());
    let mut id: CardId = 1;
    // ранги перечислены снизу вверх
    for (seat, ranks) in [(1u8, deck1), (2u8, deck2)] {
        for rank in ranks {
            s.add_card(Card::new(id, *rank, Suit::Clubs, BackColor::Blue), SlotId::deck(seat));
            id += 1;
        }
    }
    s
}

#[test]
fn starter_by_deck_top() {
    let mut s = deck_session(&[Rank::Two, Rank::Ace], &[Rank::Ace, Rank::King]);
    let init = init_turn_for_game(&mut s, NOW, &TimeRules::standard());

    assert_eq!(init.starter, 10);
    assert_eq!(init.reason, StarterReason::DeckTop);

    let turn = s.turn.as_ref().unwrap();
    assert_eq!(turn.current, 10);
    assert_eq!(turn.number, 1);
    assert_eq!(turn.ends_at, NOW + 15_000);
    assert_eq!(
        s.history.events.last().map(|e| e.kind.clone()),
        Some(MoveEventKind::TurnStarted { starter: 10 })
    );
}

#[test]
fn starter_second_player_wins_top() {
    let mut s = deck_session(&[Rank::Ten], &[Rank::Jack]);
    let init = init_turn_for_game(&mut s, NOW, &TimeRules::standard());
    assert_eq!(init.starter, 20);
    assert_eq!(init.reason, StarterReason::DeckTop);
}

#[test]
fn starter_tie_broken_by_second_card() {
    let mut s = deck_session(&[Rank::Three, Rank::Five], &[Rank::Queen, Rank::Five]);
    let init = init_turn_for_game(&mut s, NOW, &TimeRules::standard());
    assert_eq!(init.starter, 20);
    assert_eq!(init.reason, StarterReason::SecondCard);
}

#[test]
fn starter_full_tie_goes_to_first_seat() {
    let mut s = deck_session(&[Rank::Four, Rank::Five], &[Rank::Four, Rank::Five]);
    let init = init_turn_for_game(&mut s, NOW, &TimeRules::blitz());
    assert_eq!(init.starter, 10);
    assert_eq!(init.reason, StarterReason::TieDefault);
    assert_eq!(s.turn.as_ref().unwrap().duration_ms, 8_000);
}
