mod autoplay;
mod cards;
mod clock;
mod config;
mod game;
mod moves;
pub mod random;
pub mod record;
mod rules;

pub use autoplay::*;
pub use cards::*;
pub use clock::*;
pub use config::*;
pub use game::*;
pub use moves::*;
pub use rules::*;

use getset::Getters;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The three kinds of pile on a Klondike board.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Pile {
  /// Waste (stack 0) and talon (stack 1).
  Stock,
  Foundation,
  Tableau,
}

impl Pile {
  pub const ALL: [Pile; 3] = [Pile::Stock, Pile::Foundation, Pile::Tableau];

  pub fn stack_count(&self) -> usize {
    match self {
      Pile::Stock => 2,
      Pile::Foundation => Board::FOUNDATION_COUNT,
      Pile::Tableau => Board::TABLEAU_COUNT,
    }
  }
}

/// Where a card sits: pile kind, stack index, and offset from the bottom.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Position {
  pub pile: Pile,
  pub column: usize,
  pub row: usize,
}

impl Position {
  pub fn new(pile: Pile, column: usize, row: usize) -> Self {
    Self { pile, column, row }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Board {
  /// Waste then talon.
  #[getset(get = "pub")]
  stock: [Stack; 2],
  #[getset(get = "pub")]
  foundation: [Stack; Board::FOUNDATION_COUNT],
  #[getset(get = "pub")]
  tableau: [Stack; Board::TABLEAU_COUNT],
}

impl Board {
  pub const WASTE: usize = 0;
  pub const TALON: usize = 1;
  pub const FOUNDATION_COUNT: usize = 4;
  pub const TABLEAU_COUNT: usize = 7;
  /// 1 + 2 + ... + 7
  pub const TABLEAU_DEAL: usize = 28;

  /// Deal a shuffled id sequence. Everything starts face-down; see
  /// [`Board::reveal_tableau_tops`].
  ///
  /// Panics if `ids` is not exactly one deck.
  pub fn deal(ids: &[CardId]) -> Self {
    assert_eq!(
      ids.len(),
      Card::COUNT,
      "a deal needs {} ids but got {}",
      Card::COUNT,
      ids.len()
    );

    let mut rest = ids;
    let tableau = std::array::from_fn(|col_idx| {
      let (dealt, remaining) = rest.split_at(col_idx + 1);
      rest = remaining;
      Stack::from_ids(dealt)
    });

    Self {
      stock: [Stack::default(), Stack::from_ids(rest)],
      foundation: Default::default(),
      tableau,
    }
  }

  /// Assemble a board from explicit stacks, e.g. a position loaded from
  /// elsewhere. Nothing is checked; see [`Board::is_consistent`].
  pub fn from_stacks(
    stock: [Stack; 2],
    foundation: [Stack; Board::FOUNDATION_COUNT],
    tableau: [Stack; Board::TABLEAU_COUNT],
  ) -> Self {
    Self {
      stock,
      foundation,
      tableau,
    }
  }

  /// Turn the last card of every tableau stack face-up.
  pub fn reveal_tableau_tops(&mut self) {
    for stack in self.tableau.iter_mut() {
      if let Some(top) = stack.last_mut() {
        top.face_up = true;
      }
    }
  }

  pub fn stacks(&self, pile: Pile) -> &[Stack] {
    match pile {
      Pile::Stock => &self.stock,
      Pile::Foundation => &self.foundation,
      Pile::Tableau => &self.tableau,
    }
  }

  pub(crate) fn stacks_mut(&mut self, pile: Pile) -> &mut [Stack] {
    match pile {
      Pile::Stock => &mut self.stock,
      Pile::Foundation => &mut self.foundation,
      Pile::Tableau => &mut self.tableau,
    }
  }

  pub fn get_stack(&self, pile: Pile, column: usize) -> Option<&Stack> {
    self.stacks(pile).get(column)
  }

  /// Panics on a column that doesn't exist for the pile.
  pub fn stack(&self, pile: Pile, column: usize) -> &Stack {
    &self.stacks(pile)[column]
  }

  pub fn waste(&self) -> &Stack {
    &self.stock[Board::WASTE]
  }

  pub fn talon(&self) -> &Stack {
    &self.stock[Board::TALON]
  }

  /// The card at a position, if there is one.
  pub fn card_at(&self, pos: Position) -> Option<&CardState> {
    self.get_stack(pos.pile, pos.column)?.get(pos.row)
  }

  pub fn top(&self, pile: Pile, column: usize) -> Option<&CardState> {
    self.get_stack(pile, column)?.last()
  }

  pub fn all_stacks(&self) -> impl Iterator<Item = (Pile, usize, &Stack)> {
    Pile::ALL.into_iter().flat_map(move |pile| {
      self
        .stacks(pile)
        .iter()
        .enumerate()
        .map(move |(column, stack)| (pile, column, stack))
    })
  }

  pub fn card_count(&self) -> usize {
    self.all_stacks().map(|(_, _, stack)| stack.len()).sum()
  }

  /// True once stock and tableau hold nothing, i.e. every card is home.
  pub fn is_cleared(&self) -> bool {
    self
      .all_stacks()
      .filter(|(pile, _, _)| *pile != Pile::Foundation)
      .all(|(_, _, stack)| stack.is_empty())
  }

  /// Every id from 1 to 52 appears exactly once.
  pub fn is_consistent(&self) -> bool {
    let ids = self
      .all_stacks()
      .flat_map(|(_, _, stack)| stack.iter().map(|cs| cs.id))
      .sorted()
      .collect_vec();
    ids == card_ids()
  }
}

/// One stack of cards, bottom first. The top card is the last one.
#[derive(
  Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Stack {
  cards: Vec<CardState>,
}

impl std::ops::DerefMut for Stack {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.cards
  }
}

impl std::ops::Deref for Stack {
  type Target = Vec<CardState>;

  fn deref(&self) -> &Self::Target {
    &self.cards
  }
}

impl From<Vec<CardState>> for Stack {
  fn from(cards: Vec<CardState>) -> Self {
    Self { cards }
  }
}

impl Stack {
  pub fn from_ids(ids: &[CardId]) -> Self {
    ids.iter().copied().map(CardState::face_down).collect_vec().into()
  }

  pub fn ids(&self) -> Vec<CardId> {
    self.cards.iter().map(|cs| cs.id).collect()
  }

  pub fn into_inner(self) -> Vec<CardState> {
    self.cards
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
  /// Nothing to lift at the source position.
  EmptySelection,
  /// A position names a stack that the pile doesn't have.
  NoSuchStack(Pile, usize),
}
