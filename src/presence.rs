//! Присутствие игроков: отключение ставит таймер хода на паузу,
//! возвращение всех игроков снимает паузу с тем же остатком.

use tracing::{info, warn};

use crate::api::errors::ApiError;
use crate::broadcast::{DiffBroadcaster, EventSink, OutboundEvent};
use crate::domain::{GameSession, PlayerId, SessionId};
use crate::infra::persistence::SessionStore;
use crate::state::SessionRegistry;

/// Что произошло с сессией при смене присутствия.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceChange {
    /// Пользователь не связан ни с одной сессией.
    Untracked,
    /// Зритель ушёл или пришёл, на игру это не влияет.
    Spectator(SessionId),
    /// Игрок ушёл или вернулся. `clock_changed` - таймер встал на паузу или пошёл.
    Player {
        session_id: SessionId,
        clock_changed: bool,
    },
}

impl SessionRegistry {
    /// Пользователь отключился.
    pub fn handle_disconnect<S: EventSink, St: SessionStore>(
        &mut self,
        user: PlayerId,
        now: u64,
        sink: &mut S,
        store: &mut St,
    ) -> PresenceChange {
        if let Some(id) = self.detach_spectator(user) {
            return PresenceChange::Spectator(id);
        }

        let Some(id) = self.session_of(user) else {
            return PresenceChange::Untracked;
        };
        let Some(session) = self.sessions.get_mut(&id) else {
            return PresenceChange::Untracked;
        };

        session.meta.disconnected.insert(user);
        session.meta.last_seen.insert(user, now);

        let paused = !session.is_ended()
            && session.turn.as_mut().is_some_and(|turn| turn.pause(now));

        if let Err(err) = store.save(id, session) {
            warn!(session_id = id, user, %err, "не удалось сохранить сессию при отключении");
        }

        let audience = session.audience();
        let mut out = DiffBroadcaster::new(session, sink, now);
        if paused {
            out.snapshots_to_audience("opponent_disconnect_pause");
        }
        for to in others(audience, user) {
            out.send_to(to, OutboundEvent::OpponentDisconnected { user });
        }

        info!(session_id = id, user, paused, "игрок отключился");
        PresenceChange::Player {
            session_id: id,
            clock_changed: paused,
        }
    }

    /// Пользователь вернулся. Сессия, выгруженная из памяти, поднимается из хранилища.
    pub fn handle_reconnect<S: EventSink, St: SessionStore>(
        &mut self,
        user: PlayerId,
        now: u64,
        sink: &mut S,
        store: &mut St,
    ) -> Result<PresenceChange, ApiError> {
        if let Some(id) = self.spectated_by(user) {
            return Ok(PresenceChange::Spectator(id));
        }

        let Some(id) = self.session_of(user) else {
            return Ok(PresenceChange::Untracked);
        };

        if !self.sessions.contains_key(&id) {
            match store.load(id) {
                Some(loaded) => {
                    info!(session_id = id, user, "сессия поднята из хранилища");
                    self.insert(loaded);
                }
                None => {
                    self.user_to_session.remove(&user);
                    return Err(ApiError::SessionNotFound(id));
                }
            }
        }

        let Some(session) = self.sessions.get_mut(&id) else {
            return Err(ApiError::SessionNotFound(id));
        };

        session.meta.disconnected.remove(&user);
        session.meta.last_seen.insert(user, now);

        let resumed = session.meta.disconnected.is_empty()
            && !session.is_ended()
            && session.turn.as_mut().is_some_and(|turn| turn.resume(now, None));

        if let Err(err) = store.save(id, session) {
            warn!(session_id = id, user, %err, "не удалось сохранить сессию при возвращении");
        }

        let audience = session.audience();
        let mut out = DiffBroadcaster::new(session, sink, now);
        out.send_to(
            user,
            OutboundEvent::StartGame {
                session_id: id,
                spectator: false,
            },
        );
        if resumed {
            out.snapshots_to_audience("opponent_rejoined_resume");
        } else {
            out.snapshot_to(user, "reconnect");
        }
        for to in others(audience, user) {
            out.send_to(to, OutboundEvent::OpponentRejoined { user });
        }

        info!(session_id = id, user, resumed, "игрок вернулся");
        Ok(PresenceChange::Player {
            session_id: id,
            clock_changed: resumed,
        })
    }
}

fn others(audience: Vec<PlayerId>, user: PlayerId) -> impl Iterator<Item = PlayerId> {
    audience.into_iter().filter(move |u| *u != user)
}

/// Сколько миллисекунд игрок отсутствует (0, если он на месте).
pub fn absent_for(session: &GameSession, user: PlayerId, now: u64) -> u64 {
    if !session.meta.disconnected.contains(&user) {
        return 0;
    }
    session
        .meta
        .last_seen
        .get(&user)
        .map(|seen| now.saturating_sub(*seen))
        .unwrap_or(0)
}
