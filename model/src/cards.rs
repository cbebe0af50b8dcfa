use std::fmt::{Debug, Display};

use getset::CopyGetters;
use itertools::iproduct;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Identifier of one of the 52 cards. Valid ids are `1..=52`.
pub type CardId = u8;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, enumn::N, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Suit {
  Spades,
  Hearts,
  Diamonds,
  Clubs,
}

impl Suit {
  pub const ALL: [Suit; 4] =
    [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

  pub fn glyph(&self) -> char {
    match self {
      Suit::Spades => '♠',
      Suit::Hearts => '♥',
      Suit::Diamonds => '♦',
      Suit::Clubs => '♣',
    }
  }

  pub fn color(&self) -> Color {
    match self {
      Suit::Spades | Suit::Clubs => Color::Black,
      Suit::Hearts | Suit::Diamonds => Color::Red,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Color {
  Black = -1,
  Red = 1,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  enumn::N,
  Serialize,
  Deserialize,
)]
#[repr(u8)]
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
  pub fn value(&self) -> u8 {
    *self as u8
  }

  pub fn glyph(&self) -> &'static str {
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

  pub fn all() -> impl Iterator<Item = Rank> + Clone {
    (1..=13).filter_map(Rank::n)
  }
}

/// A playing card identity.
/// This deliberately does not implement `Copy`; boards hold `CardState`s that
/// refer to cards by id, and the cards themselves stay in the registry.
#[derive(Clone, PartialEq, Eq, Hash, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Card {
  id: CardId,
  suit: Suit,
  rank: Rank,
}

impl Card {
  pub const COUNT: usize = 52;

  pub fn color(&self) -> Color {
    self.suit.color()
  }
}

impl Display for Card {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}{}", self.rank.glyph(), self.suit.glyph())
  }
}

impl Debug for Card {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Card(#{} {})", self.id, self)
  }
}

/// Enumerate every card, suit-major, with ids counting up from 1.
pub fn create_deck() -> Vec<Card> {
  iproduct!(Suit::ALL, Rank::all())
    .zip(1..)
    .map(|((suit, rank), id)| Card { id, suit, rank })
    .collect()
}

lazy_static! {
  static ref DECK: Vec<Card> = create_deck();
}

/// Look a card up in the process-wide registry.
pub fn card(id: CardId) -> Option<&'static Card> {
  let idx = usize::from(id).checked_sub(1)?;
  DECK.get(idx)
}

/// Every card id, in registry order.
pub fn card_ids() -> Vec<CardId> {
  DECK.iter().map(Card::id).collect()
}

/// Placement state of a physical card on the board.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct CardState {
  pub id: CardId,
  pub face_up: bool,
}

impl CardState {
  pub fn face_down(id: CardId) -> Self {
    Self { id, face_up: false }
  }

  pub fn face_up(id: CardId) -> Self {
    Self { id, face_up: true }
  }

  /// The card this state refers to, if the id is known.
  pub fn card(&self) -> Option<&'static Card> {
    card(self.id)
  }

  pub fn flipped(self) -> Self {
    Self {
      face_up: !self.face_up,
      ..self
    }
  }
}
