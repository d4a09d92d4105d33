use session_engine::api::{ApiError, Command, MoveCardCommand, Query, QueryResponse};
use session_engine::broadcast::{MessageKind, OutboundEvent, RecordingSink};
use session_engine::domain::{
    BackColor, Card, CardId, GameEndReason, GameSession, LayoutRules, PlayerId, Rank, SessionId,
    SlotId, Suit,
};
use session_engine::engine::RandomSource;
use session_engine::infra::{
    DeterministicRng, InMemorySessionStore, PersistenceError, SessionStore,
};
use session_engine::presence::{absent_for, PresenceChange};
use session_engine::time_ctrl::TurnState;
use session_engine::{EngineConfig, SessionRegistry};

const SID: u64 = 1;
const P1: PlayerId = 10;
const P2: PlayerId = 20;
const SPECTATOR: PlayerId = 99;
const NOW: u64 = 1_000_000;

#[derive(Default)]
struct DummyRng;

impl RandomSource for DummyRng {
    fn shuffle<T>(&mut self, _slice: &mut [T]) {}
}

fn card(id: CardId, rank: Rank) -> Card {
    Card::new(id, rank, Suit::Hearts, BackColor::Red)
}

/// Рука P1: [7(1), A(2)]. Рука P2: [8(12), A(11)]. По три карты в колодах, десять в пиле.
/// Ходит P2.
fn session() -> GameSession {
    session_for(SID, [P1, P2])
}

/// Та же раскладка для произвольной сессии; ходит второй игрок.
fn session_for(id: SessionId, players: [PlayerId; 2]) -> GameSession {
    let mut s = GameSession::new_empty(id, players, &LayoutRules::standard());
    s.add_card(card(1, Rank::Seven), SlotId::hand(1));
    s.add_card(card(2, Rank::Ace), SlotId::hand(1));
    s.add_card(card(12, Rank::Eight), SlotId::hand(2));
    s.add_card(card(11, Rank::Ace), SlotId::hand(2));
    for i in 0..3 {
        s.add_card(card(20 + i, Rank::Nine), SlotId::deck(1));
        s.add_card(card(30 + i, Rank::Ten), SlotId::deck(2));
    }
    for id in 100..110 {
        s.add_card(card(id, Rank::Six), SlotId::pile());
    }
    s.turn = Some(TurnState::begin(players[1], 1, NOW, 15_000));
    s
}

/// Хранилище, которое отказывает в записи для выбранных сессий.
#[derive(Default)]
struct FlakyStore {
    inner: InMemorySessionStore,
    down: Vec<SessionId>,
}

impl FlakyStore {
    fn down_for(ids: &[SessionId]) -> Self {
        Self {
            inner: InMemorySessionStore::new(),
            down: ids.to_vec(),
        }
    }
}

impl SessionStore for FlakyStore {
    fn save(&mut self, id: SessionId, session: &GameSession) -> Result<(), PersistenceError> {
        if self.down.contains(&id) {
            return Err(PersistenceError::Unavailable("down".into()));
        }
        self.inner.save(id, session)
    }

    fn load(&self, id: SessionId) -> Option<GameSession> {
        self.inner.load(id)
    }

    fn delete(&mut self, id: SessionId) {
        self.inner.delete(id);
    }
}

struct Harness {
    registry: SessionRegistry,
    sink: RecordingSink,
    store: InMemorySessionStore,
    rng: DummyRng,
}

impl Harness {
    fn new() -> Self {
        Self::with(session())
    }

    fn with(s: GameSession) -> Self {
        let mut registry = SessionRegistry::new(EngineConfig::standard());
        registry.insert(s);
        Self {
            registry,
            sink: RecordingSink::new(),
            store: InMemorySessionStore::new(),
            rng: DummyRng,
        }
    }

    fn play(&mut self, user: PlayerId, card_id: CardId, from: &str, to: &str, now: u64) -> Result<session_engine::api::MoveResponseDto, ApiError> {
        let cmd = MoveCardCommand {
            session_id: SID,
            user,
            card_id,
            from_slot_id: from.to_string(),
            to_slot_id: to.to_string(),
        };
        self.registry
            .handle_move(&cmd, now, &mut self.rng, &mut self.sink, &mut self.store)
    }

    fn session(&self) -> &GameSession {
        self.registry.get(SID).expect("сессия в памяти")
    }

    fn names_for(&self, user: PlayerId) -> Vec<&'static str> {
        self.sink.for_user(user).iter().map(|e| e.name()).collect()
    }

    fn snapshot_reasons_for(&self, user: PlayerId) -> Vec<String> {
        self.sink
            .for_user(user)
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::StateSnapshot { reason, .. } => Some(reason.clone()),
                _ => None,
            })
            .collect()
    }

    fn message_codes_for(&self, user: PlayerId) -> Vec<(MessageKind, String)> {
        self.sink
            .for_user(user)
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::GameMessage(m) => Some((m.kind, m.code.clone())),
                _ => None,
            })
            .collect()
    }
}

//
// создание
//
#[test]
fn start_session_deals_and_registers_players() {
    let mut registry = SessionRegistry::new(EngineConfig::standard());
    let init = registry.start_session(7, [P1, P2], NOW, &mut DeterministicRng::from_seed(1));

    let s = registry.get(7).unwrap();
    assert_eq!(s.slots.total_cards(), 104);
    assert_eq!(s.turn.as_ref().unwrap().current, init.starter);
    assert_eq!(registry.session_of(P1), Some(7));
    assert_eq!(registry.session_of(P2), Some(7));
    assert_eq!(registry.len(), 1);
}

//
// ход
//
#[test]
fn move_uses_client_frame_both_ways() {
    let mut h = Harness::new();

    let resp = h.play(P2, 11, "1:HAND:1", "0:TABLE:1", NOW + 1_000).unwrap();

    assert_eq!(resp.card_id, 11);
    assert_eq!(resp.from_slot_id, "1:HAND:1");
    assert_eq!(resp.to_slot_id, "0:TABLE:1");
    assert!(!resp.turn_ended);
    assert_eq!(resp.winner, None);

    assert_eq!(h.session().slots.stack_of(&SlotId::table(1)), &[11]);
    assert!(!h.session().slots.stack_of(&SlotId::hand(2)).contains(&11));

    // сопернику рука P2 приходит как "2:HAND:1"
    let p1_slots: Vec<String> = h
        .sink
        .for_user(P1)
        .into_iter()
        .filter_map(|e| match e {
            OutboundEvent::SlotState { slot_id, .. } => Some(slot_id.clone()),
            _ => None,
        })
        .collect();
    assert!(p1_slots.contains(&"2:HAND:1".to_string()));
    assert_eq!(h.names_for(P1)[0], "table_sync");

    assert!(h.store.raw(SID).is_some());
}

#[test]
fn bench_move_passes_turn_and_announces_it() {
    let mut s = session();
    s.slots.remove(&SlotId::hand(2), 11);
    let mut h = Harness::with(s);

    let resp = h.play(P2, 12, "1:HAND:1", "1:BENCH:2", NOW + 1_000).unwrap();

    assert!(resp.turn_ended);
    assert_eq!(resp.to_slot_id, "1:BENCH:2");
    assert_eq!(h.session().slots.stack_of(&SlotId::bench(2, 2)), &[12]);
    assert_eq!(h.session().turn.as_ref().unwrap().current, P1);
    assert!(h
        .message_codes_for(P1)
        .contains(&(MessageKind::Info, "TURN_START".to_string())));
    assert!(h.message_codes_for(P2).is_empty());
}

#[test]
fn rule_denial_reaches_client_with_code() {
    let mut h = Harness::new();
    let err = h.play(P1, 2, "1:HAND:1", "0:TABLE:1", NOW).unwrap_err();

    match err {
        ApiError::MoveDenied { code, .. } => assert_eq!(code, "RULE_NOT_YOUR_TURN"),
        other => panic!("неожиданная ошибка: {other:?}"),
    }
    assert!(h.sink.sent.is_empty());
}

#[test]
fn malformed_or_unknown_slot_is_bad_request() {
    let mut h = Harness::new();
    assert!(matches!(
        h.play(P2, 11, "HAND", "0:TABLE:1", NOW),
        Err(ApiError::BadRequest(_))
    ));
    assert!(matches!(
        h.play(P2, 11, "1:HAND:1", "0:TABLE:5", NOW),
        Err(ApiError::BadRequest(_))
    ));
}

#[test]
fn outsiders_and_unknown_sessions_are_rejected() {
    let mut h = Harness::new();
    assert_eq!(
        h.play(SPECTATOR, 11, "1:HAND:1", "0:TABLE:1", NOW).unwrap_err(),
        ApiError::NotAPlayer(SPECTATOR)
    );

    let cmd = MoveCardCommand {
        session_id: 404,
        user: P1,
        card_id: 1,
        from_slot_id: "1:HAND:1".into(),
        to_slot_id: "0:TABLE:1".into(),
    };
    let err = h
        .registry
        .handle_move(&cmd, NOW, &mut h.rng, &mut h.sink, &mut h.store)
        .unwrap_err();
    assert_eq!(err, ApiError::SessionNotFound(404));
}

#[test]
fn expired_turn_is_closed_before_the_move() {
    let mut h = Harness::new();

    let err = h.play(P2, 12, "1:HAND:1", "1:BENCH:1", NOW + 15_000).unwrap_err();

    match err {
        ApiError::MoveDenied { code, .. } => assert_eq!(code, "RULE_NOT_YOUR_TURN"),
        other => panic!("неожиданная ошибка: {other:?}"),
    }
    assert_eq!(h.session().turn.as_ref().unwrap().current, P1);
    // туз P2 ушёл на стол по таймауту
    assert_eq!(h.session().slots.stack_of(&SlotId::table(1)), &[11]);
    assert!(h
        .message_codes_for(P2)
        .contains(&(MessageKind::Warn, "TURN_TIMEOUT".to_string())));
}

#[test]
fn winning_move_ends_game_once() {
    let mut s = session();
    while s.slots.pop_top(&SlotId::deck(2)).is_some() {}
    s.add_card(card(40, Rank::King), SlotId::deck(2));
    let mut h = Harness::with(s);

    let resp = h.play(P2, 40, "1:DECK:1", "0:TABLE:1", NOW).unwrap();

    assert_eq!(resp.winner, Some(P2));
    assert_eq!(resp.game_end_reason, Some(GameEndReason::DeckEmpty));

    let result = h.session().meta.result().cloned().expect("итог записан");
    assert_eq!(result.winner, Some(P2));
    assert_eq!(result.by, Some(P2));
    assert_eq!(result.at, NOW);

    let p1 = h.names_for(P1);
    let end_pos = p1.iter().position(|n| *n == "game_end").expect("game_end");
    assert_eq!(p1[end_pos + 1], "state_snapshot");
    assert_eq!(p1.iter().filter(|n| **n == "game_end").count(), 1);

    assert!(h.store.load(SID).unwrap().meta.result().is_some());
    assert_eq!(
        h.play(P2, 12, "1:HAND:1", "1:BENCH:1", NOW + 1).unwrap_err(),
        ApiError::GameEnded
    );
}

//
// таймауты
//
#[test]
fn sweep_expires_turn_and_resyncs_everyone() {
    let mut h = Harness::new();

    let none = h
        .registry
        .sweep_turn_timeouts(NOW + 14_000, &mut h.rng, &mut h.sink, &mut h.store);
    assert!(none.is_empty());

    let expired = h
        .registry
        .sweep_turn_timeouts(NOW + 15_000, &mut h.rng, &mut h.sink, &mut h.store);

    assert_eq!(expired.len(), 1);
    let (id, report) = &expired[0];
    assert_eq!(*id, SID);
    assert_eq!(report.prev, P2);
    assert_eq!(report.next, P1);

    assert_eq!(h.message_codes_for(P2), vec![(MessageKind::Warn, "TURN_TIMEOUT".to_string())]);
    assert_eq!(h.message_codes_for(P1), vec![(MessageKind::Info, "TURN_START".to_string())]);
    assert_eq!(h.snapshot_reasons_for(P1), vec!["turn_timeout".to_string()]);
    assert!(h.store.raw(SID).is_some());
}

#[test]
fn sweep_keeps_going_when_one_session_cannot_be_saved() {
    let mut registry = SessionRegistry::new(EngineConfig::standard());
    registry.insert(session_for(1, [P1, P2]));
    registry.insert(session_for(2, [30, 40]));
    let mut sink = RecordingSink::new();
    let mut store = FlakyStore::down_for(&[1]);

    let expired = registry.sweep_turn_timeouts(NOW + 15_000, &mut DummyRng, &mut sink, &mut store);

    assert_eq!(expired.len(), 1);
    let (id, report) = &expired[0];
    assert_eq!(*id, 2);
    assert_eq!(report.prev, 40);
    assert_eq!(report.next, 30);
    assert!(store.inner.raw(2).is_some());
    assert!(store.inner.raw(1).is_none());

    // первая сессия всё равно закрыла ход, просто не сохранилась
    assert_eq!(registry.get(1).unwrap().turn.as_ref().unwrap().current, P1);
}

#[test]
fn failed_save_after_timeout_does_not_reject_the_move() {
    let mut registry = SessionRegistry::new(EngineConfig::standard());
    registry.insert(session());
    let mut sink = RecordingSink::new();
    let mut store = FlakyStore::down_for(&[SID]);

    // ход P2 истёк, его туз ушёл на стол 1, ходит P1
    let cmd = MoveCardCommand {
        session_id: SID,
        user: P1,
        card_id: 2,
        from_slot_id: "1:HAND:1".into(),
        to_slot_id: "0:TABLE:2".into(),
    };
    let resp = registry
        .handle_move(&cmd, NOW + 15_000, &mut DummyRng, &mut sink, &mut store)
        .expect("ход принят, несмотря на сбой хранилища");

    assert_eq!(resp.to_slot_id, "0:TABLE:2");
    let s = registry.get(SID).unwrap();
    assert_eq!(s.slots.stack_of(&SlotId::table(1)), &[11]);
    assert_eq!(s.slots.stack_of(&SlotId::table(2)), &[2]);
    assert_eq!(s.turn.as_ref().unwrap().current, P1);
    assert!(store.inner.is_empty());
}

#[test]
fn sweep_skips_paused_sessions() {
    let mut h = Harness::new();
    h.registry.handle_disconnect(P1, NOW + 1_000, &mut h.sink, &mut h.store);

    let expired = h
        .registry
        .sweep_turn_timeouts(NOW + 60_000, &mut h.rng, &mut h.sink, &mut h.store);
    assert!(expired.is_empty());
    assert_eq!(h.session().turn.as_ref().unwrap().current, P2);
}

//
// присутствие
//
#[test]
fn disconnect_pauses_and_reconnect_resumes_with_same_remaining() {
    let mut h = Harness::new();

    let change = h.registry.handle_disconnect(P1, NOW + 4_000, &mut h.sink, &mut h.store);
    assert_eq!(
        change,
        PresenceChange::Player {
            session_id: SID,
            clock_changed: true
        }
    );

    let turn = h.session().turn.clone().unwrap();
    assert!(turn.paused);
    assert_eq!(turn.remaining_ms, 11_000);
    assert!(h.session().meta.disconnected.contains(&P1));
    assert_eq!(h.session().meta.last_seen.get(&P1), Some(&(NOW + 4_000)));
    assert_eq!(absent_for(h.session(), P1, NOW + 10_000), 6_000);
    assert_eq!(absent_for(h.session(), P2, NOW + 10_000), 0);

    assert!(h.names_for(P2).contains(&"opponent_disconnected"));
    assert_eq!(h.snapshot_reasons_for(P2), vec!["opponent_disconnect_pause".to_string()]);

    // на паузе ходить нельзя
    assert_eq!(
        h.play(P2, 11, "1:HAND:1", "0:TABLE:1", NOW + 5_000).unwrap_err(),
        ApiError::GamePaused
    );

    h.sink.clear();
    let change = h
        .registry
        .handle_reconnect(P1, NOW + 100_000, &mut h.sink, &mut h.store)
        .unwrap();
    assert_eq!(
        change,
        PresenceChange::Player {
            session_id: SID,
            clock_changed: true
        }
    );

    let turn = h.session().turn.clone().unwrap();
    assert!(!turn.paused);
    assert_eq!(turn.ends_at, NOW + 100_000 + 11_000);
    assert!(h.session().meta.disconnected.is_empty());
    assert_eq!(absent_for(h.session(), P1, NOW + 100_000), 0);

    assert_eq!(h.names_for(P1)[0], "start_game");
    assert_eq!(h.snapshot_reasons_for(P1), vec!["opponent_rejoined_resume".to_string()]);
    assert!(h.names_for(P2).contains(&"opponent_rejoined"));
}

#[test]
fn clock_resumes_only_when_everyone_is_back() {
    let mut h = Harness::new();
    h.registry.handle_disconnect(P1, NOW + 1_000, &mut h.sink, &mut h.store);
    h.registry.handle_disconnect(P2, NOW + 2_000, &mut h.sink, &mut h.store);

    let change = h
        .registry
        .handle_reconnect(P1, NOW + 3_000, &mut h.sink, &mut h.store)
        .unwrap();
    assert_eq!(
        change,
        PresenceChange::Player {
            session_id: SID,
            clock_changed: false
        }
    );
    assert!(h.session().is_paused());

    h.registry
        .handle_reconnect(P2, NOW + 4_000, &mut h.sink, &mut h.store)
        .unwrap();
    assert!(!h.session().is_paused());
    assert_eq!(h.session().turn.as_ref().unwrap().ends_at, NOW + 4_000 + 14_000);
}

#[test]
fn reconnect_restores_unloaded_session_from_store() {
    let mut h = Harness::new();
    h.registry.handle_disconnect(P2, NOW + 5_000, &mut h.sink, &mut h.store);
    h.registry.unload(SID);
    assert!(h.registry.get(SID).is_none());

    let change = h
        .registry
        .handle_reconnect(P2, NOW + 50_000, &mut h.sink, &mut h.store)
        .unwrap();

    assert_eq!(
        change,
        PresenceChange::Player {
            session_id: SID,
            clock_changed: true
        }
    );
    assert_eq!(h.session().turn.as_ref().unwrap().ends_at, NOW + 50_000 + 10_000);
}

#[test]
fn reconnect_without_save_reports_missing_session() {
    let mut h = Harness::new();
    h.registry.unload(SID);

    let err = h
        .registry
        .handle_reconnect(P1, NOW, &mut h.sink, &mut h.store)
        .unwrap_err();
    assert_eq!(err, ApiError::SessionNotFound(SID));
    assert_eq!(h.registry.session_of(P1), None);
}

#[test]
fn unknown_users_are_untracked() {
    let mut h = Harness::new();
    assert_eq!(
        h.registry.handle_disconnect(555, NOW, &mut h.sink, &mut h.store),
        PresenceChange::Untracked
    );
    assert_eq!(
        h.registry.handle_reconnect(555, NOW, &mut h.sink, &mut h.store).unwrap(),
        PresenceChange::Untracked
    );
}

//
// зрители
//
#[test]
fn spectator_joins_gets_snapshot_and_diffs() {
    let mut h = Harness::new();

    h.registry
        .attach_spectator(SPECTATOR, SID, NOW, &mut h.sink)
        .unwrap();
    assert_eq!(h.names_for(SPECTATOR), vec!["start_game", "state_snapshot"]);
    assert_eq!(h.registry.spectated_by(SPECTATOR), Some(SID));

    h.play(P2, 11, "1:HAND:1", "0:TABLE:1", NOW + 1_000).unwrap();
    let spectator_slots: Vec<String> = h
        .sink
        .for_user(SPECTATOR)
        .into_iter()
        .filter_map(|e| match e {
            OutboundEvent::SlotState { slot_id, .. } => Some(slot_id.clone()),
            _ => None,
        })
        .collect();
    assert!(spectator_slots.contains(&"2:HAND:1".to_string()));

    // уход зрителя не ставит паузу
    assert_eq!(
        h.registry.handle_disconnect(SPECTATOR, NOW + 2_000, &mut h.sink, &mut h.store),
        PresenceChange::Spectator(SID)
    );
    assert!(!h.session().is_paused());
    assert!(h.session().meta.spectators.is_empty());
}

#[test]
fn player_cannot_spectate_own_game() {
    let mut h = Harness::new();
    assert!(matches!(
        h.registry.attach_spectator(P1, SID, NOW, &mut h.sink),
        Err(ApiError::BadRequest(_))
    ));
    assert_eq!(
        h.registry.attach_spectator(SPECTATOR, 404, NOW, &mut h.sink).unwrap_err(),
        ApiError::SessionNotFound(404)
    );
}

//
// конец партии
//
#[test]
fn abandon_gives_win_to_opponent() {
    let mut h = Harness::new();

    let result = h
        .registry
        .abandon(SID, P1, NOW + 500, &mut h.sink, &mut h.store)
        .unwrap();

    assert_eq!(result.winner, Some(P2));
    assert_eq!(result.reason, GameEndReason::Abandon);
    assert_eq!(result.by, Some(P1));
    assert!(h.names_for(P2).contains(&"game_end"));

    assert_eq!(
        h.registry
            .abandon(SID, P2, NOW + 600, &mut h.sink, &mut h.store)
            .unwrap_err(),
        ApiError::GameEnded
    );
}

#[test]
fn both_acks_destroy_session_and_save() {
    let mut h = Harness::new();
    h.registry
        .abandon(SID, P2, NOW, &mut h.sink, &mut h.store)
        .unwrap();

    assert!(!h.registry.acknowledge_game_end(SID, P1, &mut h.store).unwrap());
    assert!(h.registry.get(SID).is_some());

    assert!(h.registry.acknowledge_game_end(SID, P2, &mut h.store).unwrap());
    assert!(h.registry.get(SID).is_none());
    assert!(h.store.raw(SID).is_none());
    assert_eq!(h.registry.session_of(P1), None);
}

#[test]
fn spectators_keep_finished_session_alive() {
    let mut h = Harness::new();
    h.registry
        .attach_spectator(SPECTATOR, SID, NOW, &mut h.sink)
        .unwrap();
    h.registry
        .abandon(SID, P2, NOW, &mut h.sink, &mut h.store)
        .unwrap();

    h.registry.acknowledge_game_end(SID, P1, &mut h.store).unwrap();
    assert!(!h.registry.acknowledge_game_end(SID, P2, &mut h.store).unwrap());
    assert!(h.registry.get(SID).is_some());
}

#[test]
fn ack_before_end_is_rejected() {
    let mut h = Harness::new();
    assert!(matches!(
        h.registry.acknowledge_game_end(SID, P1, &mut h.store),
        Err(ApiError::BadRequest(_))
    ));
}

//
// команды и запросы
//
#[test]
fn commands_and_queries_dispatch() {
    let mut h = Harness::new();

    let cmd = Command::MoveCard(MoveCardCommand {
        session_id: SID,
        user: P2,
        card_id: 11,
        from_slot_id: "1:HAND:1".into(),
        to_slot_id: "0:TABLE:1".into(),
    });
    let resp = h
        .registry
        .execute(cmd, NOW, &mut h.rng, &mut h.sink, &mut h.store)
        .unwrap();
    assert_eq!(resp.map(|r| r.card_id), Some(11));

    match h.registry.query(Query::GetTurn { session_id: SID }, NOW).unwrap() {
        QueryResponse::Turn(t) => assert_eq!(t.current, Some(P2)),
        other => panic!("неожиданный ответ: {other:?}"),
    }

    match h
        .registry
        .query(Query::GetSnapshot { session_id: SID, user: P1 }, NOW)
        .unwrap()
    {
        QueryResponse::Snapshot(snap) => {
            assert_eq!(snap.slots["2:HAND:1"].len(), 1);
            assert_eq!(snap.slots["0:TABLE:1"][0].card_id, 11);
        }
        other => panic!("неожиданный ответ: {other:?}"),
    }

    let none = h
        .registry
        .execute(
            Command::Abandon { session_id: SID, user: P1 },
            NOW,
            &mut h.rng,
            &mut h.sink,
            &mut h.store,
        )
        .unwrap();
    assert!(none.is_none());
}
