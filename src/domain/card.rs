use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::CardId;

/// Масть карты.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Suit {
    Clubs,    // ♣
    Diamonds, // ♦
    Hearts,   // ♥
    Spades,   // ♠
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
}

/// Ранг карты. Порядок объявления = порядок укладки на стол (A, 2..10, J, Q),
/// король - "джокер" стола.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Rank {
    Ace = 1,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Сила карты при выборе первого игрока: A=13, K=12, Q=11, J=10, 10=9 … 2=1.
    pub const fn turn_rank(self) -> u8 {
        match self {
            Rank::Ace => 13,
            Rank::King => 12,
            Rank::Queen => 11,
            Rank::Jack => 10,
            r => r as u8 - 1,
        }
    }

    pub const fn is_ace(self) -> bool {
        matches!(self, Rank::Ace)
    }

    /// Короткий код ранга: "A", "2".."10", "J", "Q", "K".
    pub const fn code(self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }
}

/// Цвет рубашки: у каждой из двух колод свой.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BackColor {
    Red,
    Blue,
}

/// Карта сессии. После раздачи не меняется, двигается только её id между слотами.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Card {
    pub id: CardId,
    pub rank: Rank,
    pub suit: Suit,
    pub back: BackColor,
}

impl Card {
    pub const fn new(id: CardId, rank: Rank, suit: Suit, back: BackColor) -> Self {
        Self {
            id,
            rank,
            suit,
            back,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ch = match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        };
        write!(f, "{ch}")
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for Card {
    /// Формат вида `Ah`, `10d`, `7c` (без id).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" | "1" => Ok(Rank::Ace),
            "K" | "k" => Ok(Rank::King),
            "Q" | "q" => Ok(Rank::Queen),
            "J" | "j" => Ok(Rank::Jack),
            "10" | "T" | "t" => Ok(Rank::Ten),
            other => {
                let n: u8 = other
                    .parse()
                    .map_err(|_| format!("Invalid rank: {other}"))?;
                Rank::ALL
                    .into_iter()
                    .find(|r| (2..=9).contains(&n) && *r as u8 == n)
                    .ok_or_else(|| format!("Invalid rank: {other}"))
            }
        }
    }
}

impl FromStr for Suit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" | "C" => Ok(Suit::Clubs),
            "d" | "D" => Ok(Suit::Diamonds),
            "h" | "H" => Ok(Suit::Hearts),
            "s" | "S" => Ok(Suit::Spades),
            _ => Err(format!("Invalid suit: {s}")),
        }
    }
}
