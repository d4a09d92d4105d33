//! Симуляция партий ботами: случайные разрешённые ходы, иногда таймауты.
//! После каждого хода проверяем, что ни одна карта не потерялась и не задвоилась.

use clap::{Parser, ValueEnum};
use tracing::{debug, error, info};

use session_engine::api::MoveCardCommand;
use session_engine::broadcast::RecordingSink;
use session_engine::domain::{GameSession, PlayerId, SlotId, SlotKind};
use session_engine::engine::validate_move;
use session_engine::infra::mapping::map_slot_for_viewer;
use session_engine::infra::telemetry::init_tracing;
use session_engine::infra::{DeterministicRng, IdGenerator, InMemorySessionStore, RngSeed};
use session_engine::time_ctrl::{TimeProfile, TimeRules};
use session_engine::{EngineConfig, SessionRegistry};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Profile {
    Standard,
    Blitz,
}

impl From<Profile> for TimeProfile {
    fn from(p: Profile) -> Self {
        match p {
            Profile::Standard => TimeProfile::Standard,
            Profile::Blitz => TimeProfile::Blitz,
        }
    }
}

/// Прогон партий ботами.
#[derive(Parser, Debug)]
#[command(name = "session_sim")]
#[command(about = "Bot-driven simulation of two-player card sessions", long_about = None)]
struct Args {
    /// Сколько партий сыграть
    #[arg(short, long, default_value_t = 10)]
    games: u32,

    /// Мастер-seed для раздач и ботов
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Профиль тайминга
    #[arg(long, value_enum, default_value_t = Profile::Standard)]
    profile: Profile,

    /// Предел ходов на партию
    #[arg(long, default_value_t = 5_000)]
    max_steps: u32,

    /// Подробный лог
    #[arg(short, long)]
    verbose: bool,

    /// Лог в JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default)]
struct Summary {
    finished: u32,
    unfinished: u32,
    moves: u64,
    denials: u64,
    timeouts: u64,
    events: u64,
    broken: u32,
}

struct Candidate {
    card_id: u64,
    from: SlotId,
    to: SlotId,
}

fn main() {
    let args = Args::parse();
    init_tracing(if args.verbose { "debug" } else { "info" }, args.json);

    let config = EngineConfig {
        time: TimeRules::from_profile(args.profile.into()),
        ..EngineConfig::standard()
    };
    if let Err(err) = config.validate() {
        error!(%err, "конфиг не прошёл проверку");
        std::process::exit(2);
    }

    let master = RngSeed::from_u64(args.seed);
    let ids = IdGenerator::new();
    let mut registry = SessionRegistry::new(config);
    let mut store = InMemorySessionStore::new();
    let mut sink = RecordingSink::new();
    let mut summary = Summary::default();

    for _ in 0..args.games {
        let session_id = ids.next_session_id();
        let players = [ids.next_player_id(), ids.next_player_id()];
        let mut game_rng = master.derive(session_id, players, 0).to_rng();
        let mut bot_rng = master.derive(session_id, players, 1).to_rng();

        let mut now: u64 = 1_000_000;
        let init = registry.start_session(session_id, players, now, &mut game_rng);
        debug!(session_id, starter = init.starter, reason = ?init.reason, "первый ход");

        let mut steps = 0;
        while steps < args.max_steps {
            steps += 1;
            let Some(session) = registry.get(session_id) else {
                break;
            };
            if session.is_ended() {
                break;
            }
            let Some(current) = session.turn.as_ref().map(|t| t.current) else {
                break;
            };

            // Иногда бот "засыпает" и ход уходит по таймауту.
            let sleepy = bot_rng.pick_index(20) == Some(0);
            let candidates = if sleepy {
                Vec::new()
            } else {
                legal_moves(session, current, &config)
            };

            match pick(&candidates, &mut bot_rng) {
                Some(c) => {
                    now += 400;
                    let seat = session.seat_of(current).unwrap_or(1);
                    let cmd = MoveCardCommand {
                        session_id,
                        user: current,
                        card_id: c.card_id,
                        from_slot_id: map_slot_for_viewer(&c.from, seat).to_string(),
                        to_slot_id: map_slot_for_viewer(&c.to, seat).to_string(),
                    };
                    match registry.handle_move(&cmd, now, &mut game_rng, &mut sink, &mut store) {
                        Ok(_) => summary.moves += 1,
                        Err(err) => {
                            summary.denials += 1;
                            debug!(session_id, user = current, ?err, "ход отклонён");
                        }
                    }
                }
                None => {
                    now += config.time.turn_ms + config.time.sweep_interval_ms;
                    let expired =
                        registry.sweep_turn_timeouts(now, &mut game_rng, &mut sink, &mut store);
                    summary.timeouts += expired.len() as u64;
                }
            }

            if let Some(session) = registry.get(session_id) {
                if let Some(problem) = conservation_problem(session) {
                    error!(session_id, steps, %problem, "нарушена сохранность карт");
                    summary.broken += 1;
                    break;
                }
            }
        }

        summary.events += sink.sent.len() as u64;
        sink.clear();

        match registry.get(session_id).and_then(|s| s.meta.result().cloned()) {
            Some(result) => {
                summary.finished += 1;
                info!(
                    session_id,
                    steps,
                    winner = ?result.winner,
                    reason = result.reason.as_str(),
                    "партия закончена"
                );
                for player in players {
                    if let Err(err) = registry.acknowledge_game_end(session_id, player, &mut store) {
                        debug!(session_id, player, ?err, "подтверждение не принято");
                    }
                }
            }
            None => {
                summary.unfinished += 1;
                info!(session_id, steps, "партия не закончилась за отведённые ходы");
                registry.destroy(session_id);
            }
        }
    }

    info!(
        games = args.games,
        finished = summary.finished,
        unfinished = summary.unfinished,
        moves = summary.moves,
        denials = summary.denials,
        timeouts = summary.timeouts,
        events = summary.events,
        broken = summary.broken,
        "симуляция завершена"
    );

    if summary.broken > 0 {
        std::process::exit(1);
    }
}

/// Все ходы текущего игрока, которые пропускают правила.
fn legal_moves(session: &GameSession, actor: PlayerId, config: &EngineConfig) -> Vec<Candidate> {
    let Some(seat) = session.seat_of(actor) else {
        return Vec::new();
    };

    let mut sources: Vec<(SlotId, u64)> = Vec::new();
    for card in session.slots.stack_of(&SlotId::hand(seat)) {
        sources.push((SlotId::hand(seat), *card));
    }
    if let Some(top) = session.slots.top(&SlotId::deck(seat)) {
        sources.push((SlotId::deck(seat), top));
    }
    for i in 1..=config.layout.bench_slots {
        let bench = SlotId::bench(seat, i);
        if let Some(bottom) = session.slots.stack_of(&bench).first() {
            sources.push((bench, *bottom));
        }
    }

    let mut targets = session.slots.table_slots();
    targets.extend((1..=config.layout.bench_slots).map(|i| SlotId::bench(seat, i)));

    let mut out = Vec::new();
    for (from, card_id) in sources {
        let Some(card) = session.card(card_id) else {
            continue;
        };
        for to in &targets {
            if *to == from {
                continue;
            }
            if validate_move(session, actor, card, &from, to).is_ok() {
                out.push(Candidate {
                    card_id,
                    from,
                    to: *to,
                });
            }
        }
    }
    out
}

/// Ходы на стол в приоритете, иначе любой.
fn pick<'a>(candidates: &'a [Candidate], rng: &mut DeterministicRng) -> Option<&'a Candidate> {
    let table: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.to.kind == SlotKind::Table)
        .collect();
    if let Some(i) = rng.pick_index(table.len()) {
        return Some(table[i]);
    }
    rng.pick_index(candidates.len()).map(|i| &candidates[i])
}

fn conservation_problem(session: &GameSession) -> Option<String> {
    let locations = session.card_locations();
    if locations.len() != session.cards.len() {
        return Some(format!(
            "в слотах {} карт, известно {}",
            locations.len(),
            session.cards.len()
        ));
    }
    locations
        .iter()
        .find(|(_, slots)| slots.len() != 1)
        .map(|(card, slots)| format!("карта {card} лежит в {} слотах", slots.len()))
}
