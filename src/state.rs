//! Реестр сессий: кто в какой партии, кто за какой наблюдает,
//! и поток обработки запросов поверх движка.
//!
//! Однопоточная модель: все вызовы идут последовательно из одного цикла
//! событий, поэтому сессии лежат в обычных коллекциях без блокировок.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::commands::{Command, MoveCardCommand};
use crate::api::dto::{MoveResponseDto, TurnDto};
use crate::api::errors::ApiError;
use crate::api::queries::{build_snapshot, Query, QueryResponse, Viewer};
use crate::broadcast::{DiffBroadcaster, EventSink, GameMessage, MessageKind, OutboundEvent};
use crate::config::EngineConfig;
use crate::domain::{
    create_session, GameEndReason, GameResult, GameSession, PlayerId, SessionId,
};
use crate::engine::{
    init_turn_for_game, orchestrate, try_expire_turn, ExpiryReport, GameEnd, MoveDenial,
    MoveEventKind, MoveIntent, RandomSource, TurnInit,
};
use crate::infra::mapping::{map_slot_for_viewer, map_slot_from_client};
use crate::infra::persistence::{PersistenceError, SessionStore};

/// Ошибка обработки одной сессии (в том числе внутри общего прохода по таймаутам).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Сессия {0} не найдена")]
    NotFound(SessionId),

    #[error(transparent)]
    Denial(#[from] MoveDenial),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    pub(crate) config: EngineConfig,
    pub(crate) sessions: BTreeMap<SessionId, GameSession>,
    pub(crate) user_to_session: HashMap<PlayerId, SessionId>,
    pub(crate) spectating: HashMap<PlayerId, SessionId>,
}

impl SessionRegistry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Создать партию, раздать карты и назначить первый ход.
    pub fn start_session<R: RandomSource>(
        &mut self,
        id: SessionId,
        players: [PlayerId; 2],
        now: u64,
        rng: &mut R,
    ) -> TurnInit {
        let mut session = create_session(id, players, &self.config.layout, rng);
        let init = init_turn_for_game(&mut session, now, &self.config.time);
        self.insert(session);
        info!(session_id = id, ?players, starter = init.starter, "партия создана");
        init
    }

    /// Положить готовую сессию в реестр и привязать к ней игроков.
    pub fn insert(&mut self, session: GameSession) {
        for player in session.players {
            self.user_to_session.insert(player, session.id);
        }
        self.sessions.insert(session.id, session);
    }

    pub fn get(&self, id: SessionId) -> Option<&GameSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut GameSession> {
        self.sessions.get_mut(&id)
    }

    pub fn session_of(&self, user: PlayerId) -> Option<SessionId> {
        self.user_to_session.get(&user).copied()
    }

    pub fn spectated_by(&self, user: PlayerId) -> Option<SessionId> {
        self.spectating.get(&user).copied()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Выгрузить сессию из памяти (привязки игроков сохраняются для переподключения).
    pub fn unload(&mut self, id: SessionId) -> Option<GameSession> {
        self.sessions.remove(&id)
    }

    /// Удалить сессию совсем.
    pub fn destroy(&mut self, id: SessionId) -> Option<GameSession> {
        let session = self.sessions.remove(&id)?;
        self.user_to_session.retain(|_, sid| *sid != id);
        self.spectating.retain(|_, sid| *sid != id);
        info!(session_id = id, "сессия удалена");
        Some(session)
    }

    /// Подключить зрителя и отправить ему полный снимок.
    pub fn attach_spectator<S: EventSink>(
        &mut self,
        user: PlayerId,
        id: SessionId,
        now: u64,
        sink: &mut S,
    ) -> Result<(), ApiError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(ApiError::SessionNotFound(id))?;
        if session.is_player(user) {
            return Err(ApiError::BadRequest(format!(
                "игрок {user} не может наблюдать за своей партией"
            )));
        }

        if let Some(prev) = self.spectating.insert(user, id) {
            if prev != id {
                if let Some(old) = self.sessions.get_mut(&prev) {
                    old.meta.spectators.remove(&user);
                }
            }
        }

        let Some(session) = self.sessions.get_mut(&id) else {
            return Err(ApiError::SessionNotFound(id));
        };
        session.meta.spectators.insert(user);

        let mut out = DiffBroadcaster::new(session, sink, now);
        out.send_to(
            user,
            OutboundEvent::StartGame {
                session_id: id,
                spectator: true,
            },
        );
        out.snapshot_to(user, "spectator_join");
        debug!(session_id = id, user, "зритель подключён");
        Ok(())
    }

    /// Отключить зрителя. Возвращает сессию, за которой он наблюдал.
    pub fn detach_spectator(&mut self, user: PlayerId) -> Option<SessionId> {
        let id = self.spectating.remove(&user)?;
        if let Some(session) = self.sessions.get_mut(&id) {
            session.meta.spectators.remove(&user);
        }
        debug!(session_id = id, user, "зритель отключён");
        Some(id)
    }

    /// Ход игрока: проверки запроса, сначала истечение таймера, затем оркестрация
    /// и рассылка. Слоты в команде и ответе - в системе координат игрока.
    pub fn handle_move<R, S, St>(
        &mut self,
        cmd: &MoveCardCommand,
        now: u64,
        rng: &mut R,
        sink: &mut S,
        store: &mut St,
    ) -> Result<MoveResponseDto, ApiError>
    where
        R: RandomSource,
        S: EventSink,
        St: SessionStore,
    {
        let config = self.config;
        let session = self
            .sessions
            .get_mut(&cmd.session_id)
            .ok_or(ApiError::SessionNotFound(cmd.session_id))?;

        let Some(seat) = session.seat_of(cmd.user) else {
            return Err(ApiError::NotAPlayer(cmd.user));
        };
        if session.is_ended() {
            return Err(ApiError::GameEnded);
        }
        if session.is_paused() {
            return Err(ApiError::GamePaused);
        }

        // Истёкший ход закрываем до того, как смотреть на запрос.
        // Ход к этому моменту уже сменился и разослан: сбой записи запрос не отменяет.
        match expire_turn_and_broadcast(session, now, &config, rng, sink, store) {
            Ok(_) => {}
            Err(SessionError::Persistence(err)) => {
                warn!(session_id = session.id, %err, "не удалось сохранить сессию после таймаута");
            }
            Err(err) => return Err(ApiError::Internal(err.to_string())),
        }
        if session.is_ended() {
            return Err(ApiError::GameEnded);
        }

        let from = map_slot_from_client(session, &cmd.from_slot_id, seat)
            .ok_or_else(|| ApiError::BadRequest(format!("неверный слот: {}", cmd.from_slot_id)))?;
        let to = map_slot_from_client(session, &cmd.to_slot_id, seat)
            .ok_or_else(|| ApiError::BadRequest(format!("неверный слот: {}", cmd.to_slot_id)))?;

        let intent = MoveIntent {
            card_id: cmd.card_id,
            from,
            to,
        };

        let outcome = match orchestrate(session, cmd.user, intent, now, &config, rng) {
            Ok(outcome) => outcome,
            Err(denial) => {
                if !denial.is_user() {
                    warn!(session_id = session.id, user = cmd.user, %denial, "техническая ошибка хода");
                }
                return Err(denial.into());
            }
        };

        {
            let mut out = DiffBroadcaster::new(session, sink, now);
            for batch in outcome.updates.iter().cloned() {
                out.flush(batch);
            }
        }

        if let Some(end) = outcome.game_end {
            finish_game(session, end, Some(cmd.user), now, sink);
        }
        if let Err(err) = store.save(session.id, session) {
            warn!(session_id = session.id, %err, "не удалось сохранить сессию после хода");
        }

        Ok(MoveResponseDto {
            card_id: outcome.card_id,
            from_slot_id: map_slot_for_viewer(&outcome.from, seat).to_string(),
            to_slot_id: map_slot_for_viewer(&outcome.to, seat).to_string(),
            turn_ended: outcome.turn_ended,
            winner: outcome.winner(),
            game_end_reason: outcome.game_end.map(|g| g.reason),
        })
    }

    /// Игрок покидает партию: победа сопернику.
    pub fn abandon<S: EventSink, St: SessionStore>(
        &mut self,
        id: SessionId,
        user: PlayerId,
        now: u64,
        sink: &mut S,
        store: &mut St,
    ) -> Result<GameResult, ApiError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(ApiError::SessionNotFound(id))?;
        let opponent = session.opponent_of(user).ok_or(ApiError::NotAPlayer(user))?;
        if session.is_ended() {
            return Err(ApiError::GameEnded);
        }

        let end = GameEnd {
            winner: Some(opponent),
            reason: GameEndReason::Abandon,
        };
        finish_game(session, end, Some(user), now, sink);
        if let Err(err) = store.save(id, session) {
            warn!(session_id = id, %err, "не удалось сохранить брошенную партию");
        }

        session
            .meta
            .result()
            .cloned()
            .ok_or_else(|| ApiError::Internal("итог партии не записан".into()))
    }

    /// Игрок подтвердил конец партии. Когда подтвердили оба и зрителей нет,
    /// сессия и её сохранение удаляются. Возвращает `true`, если удалили.
    pub fn acknowledge_game_end<St: SessionStore>(
        &mut self,
        id: SessionId,
        user: PlayerId,
        store: &mut St,
    ) -> Result<bool, ApiError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(ApiError::SessionNotFound(id))?;
        if !session.is_player(user) {
            return Err(ApiError::NotAPlayer(user));
        }
        if !session.is_ended() {
            return Err(ApiError::BadRequest("партия ещё идёт".into()));
        }

        session.meta.end_acks.insert(user);
        self.user_to_session.remove(&user);

        let all_acked = session
            .players
            .iter()
            .all(|p| session.meta.end_acks.contains(p));
        if all_acked && session.meta.spectators.is_empty() {
            self.destroy(id);
            store.delete(id);
            return Ok(true);
        }
        Ok(false)
    }

    /// Выполнить команду клиента. Ответ есть только у хода.
    pub fn execute<R, S, St>(
        &mut self,
        command: Command,
        now: u64,
        rng: &mut R,
        sink: &mut S,
        store: &mut St,
    ) -> Result<Option<MoveResponseDto>, ApiError>
    where
        R: RandomSource,
        S: EventSink,
        St: SessionStore,
    {
        match command {
            Command::MoveCard(cmd) => self.handle_move(&cmd, now, rng, sink, store).map(Some),
            Command::Abandon { session_id, user } => {
                self.abandon(session_id, user, now, sink, store)?;
                Ok(None)
            }
            Command::AcknowledgeGameEnd { session_id, user } => {
                self.acknowledge_game_end(session_id, user, store)?;
                Ok(None)
            }
        }
    }

    /// Запрос "только чтение".
    pub fn query(&self, query: Query, now: u64) -> Result<QueryResponse, ApiError> {
        match query {
            Query::GetSnapshot { session_id, user } => {
                let session = self
                    .sessions
                    .get(&session_id)
                    .ok_or(ApiError::SessionNotFound(session_id))?;
                let viewer = Viewer::for_user(session, user);
                Ok(QueryResponse::Snapshot(build_snapshot(session, viewer, now)))
            }
            Query::GetTurn { session_id } => {
                let session = self
                    .sessions
                    .get(&session_id)
                    .ok_or(ApiError::SessionNotFound(session_id))?;
                Ok(QueryResponse::Turn(TurnDto::from_turn(session.turn.as_ref(), now)))
            }
        }
    }

    /// Проверка истёкших ходов по всем сессиям. Ошибка одной сессии
    /// логируется и не мешает остальным.
    pub fn sweep_turn_timeouts<R, S, St>(
        &mut self,
        now: u64,
        rng: &mut R,
        sink: &mut S,
        store: &mut St,
    ) -> Vec<(SessionId, ExpiryReport)>
    where
        R: RandomSource,
        S: EventSink,
        St: SessionStore,
    {
        let config = self.config;
        let mut expired = Vec::new();

        for (id, session) in self.sessions.iter_mut() {
            match expire_turn_and_broadcast(session, now, &config, rng, sink, store) {
                Ok(Some(report)) => expired.push((*id, report)),
                Ok(None) => {}
                Err(err) => warn!(session_id = *id, %err, "таймаут хода не обработан"),
            }
        }

        expired
    }
}

/// Закрыть истёкший ход одной сессии и разослать результат.
/// Сессии на паузе и законченные пропускаются.
pub fn expire_turn_and_broadcast<R, S, St>(
    session: &mut GameSession,
    now: u64,
    config: &EngineConfig,
    rng: &mut R,
    sink: &mut S,
    store: &mut St,
) -> Result<Option<ExpiryReport>, SessionError>
where
    R: RandomSource,
    S: EventSink,
    St: SessionStore,
{
    if session.turn.is_none() || session.is_paused() || session.is_ended() {
        return Ok(None);
    }

    let Some(report) = try_expire_turn(session, now, config, rng)? else {
        return Ok(None);
    };

    {
        let mut out = DiffBroadcaster::new(session, sink, now);
        out.send_to(
            report.prev,
            OutboundEvent::GameMessage(GameMessage::new(MessageKind::Warn, "TURN_TIMEOUT")),
        );
        out.send_to(
            report.next,
            OutboundEvent::GameMessage(
                GameMessage::new(MessageKind::Info, "TURN_START")
                    .with_param("turn_number", report.turn.number),
            ),
        );
    }

    if let Some(end) = report.game_end {
        finish_game(session, end, Some(report.prev), now, sink);
    } else {
        DiffBroadcaster::new(session, sink, now).snapshots_to_audience("turn_timeout");
    }

    store.save(session.id, session)?;
    Ok(Some(report))
}

/// Записать итог (один раз), разослать `game_end` и свежие снимки.
fn finish_game<S: EventSink>(
    session: &mut GameSession,
    end: GameEnd,
    by: Option<PlayerId>,
    now: u64,
    sink: &mut S,
) {
    let written = session.meta.set_result(GameResult {
        winner: end.winner,
        reason: end.reason,
        by,
        at: now,
    });
    if !written {
        return;
    }

    session.history.push(MoveEventKind::GameEnded {
        winner: end.winner,
        reason: end.reason,
    });
    info!(session_id = session.id, winner = ?end.winner, reason = end.reason.as_str(), "партия закончена");

    DiffBroadcaster::new(session, sink, now).game_end_then_snapshot();
}
