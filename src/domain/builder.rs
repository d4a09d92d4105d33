//! Начальная раздача.
//!
//! Две колоды по 52 карты: колода A (красная рубашка) идёт в руки и в пил,
//! колода B (синяя рубашка) - в личные колоды игроков, её остаток не используется.

use tracing::debug;

use super::card::BackColor;
use super::deck::Deck;
use super::layout::LayoutRules;
use super::session::GameSession;
use super::slot::SlotId;
use super::{PlayerId, SessionId};
use crate::engine::RandomSource;

/// Создать сессию и разложить карты.
pub fn create_session<R: RandomSource>(
    id: SessionId,
    players: [PlayerId; 2],
    layout: &LayoutRules,
    rng: &mut R,
) -> GameSession {
    let mut session = GameSession::new_empty(id, players, layout);

    let mut deck_a = Deck::standard_52(BackColor::Red, 1);
    let mut deck_b = Deck::standard_52(BackColor::Blue, 53);
    rng.shuffle(&mut deck_a.cards);
    rng.shuffle(&mut deck_b.cards);

    for seat in [1u8, 2] {
        for card in deck_a.draw_n(layout.hand_size) {
            session.add_card(card, SlotId::hand(seat));
        }
        for card in deck_b.draw_n(layout.personal_deck_size) {
            session.add_card(card, SlotId::deck(seat));
        }
    }

    // Пил - остаток колоды A. Лишние карты колоды B в игру не идут.
    for card in deck_a.drain_all() {
        session.add_card(card, SlotId::pile());
    }

    debug!(
        session_id = id,
        pile = session.slots.count(&SlotId::pile()),
        total = session.slots.total_cards(),
        "раздача выполнена"
    );

    session
}
