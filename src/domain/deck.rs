use serde::{Deserialize, Serialize};

use crate::domain::card::{BackColor, Card, Rank, Suit};
use crate::domain::CardId;

/// Колода карт. В домене - просто упорядоченный список карт, верх = последний.
/// Перемешивание делает engine (через RNG из infra), НЕ здесь.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deck {
    pub cards: Vec<Card>,
}

impl Deck {
    /// Стандартная 52-карточная колода с заданной рубашкой.
    /// id выдаются подряд начиная с `first_id`.
    pub fn standard_52(back: BackColor, first_id: CardId) -> Self {
        let mut cards = Vec::with_capacity(52);
        let mut next_id = first_id;
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card::new(next_id, rank, suit, back));
                next_id += 1;
            }
        }
        Deck { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Взять n карт сверху.
    pub fn draw_n(&mut self, n: usize) -> Vec<Card> {
        let keep = self.cards.len().saturating_sub(n);
        let mut taken = self.cards.split_off(keep);
        taken.reverse();
        taken
    }

    /// Забрать всё, что осталось (порядок снизу вверх сохраняется).
    pub fn drain_all(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.cards)
    }
}
