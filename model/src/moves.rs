use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Board, CardState, MoveError, Pile, Position};

/// A side effect on a run of cards. Flips toggle, so running the same effect
/// twice gets back where you started.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum StackEffect {
  #[default]
  Identity,
  /// Flip the last card over.
  FlipLast,
  /// Flip every card over and reverse the order, as when the waste is turned
  /// back into the talon.
  FlipAllAndReverse,
}

impl StackEffect {
  pub fn apply(self, mut cards: Vec<CardState>) -> Vec<CardState> {
    match self {
      StackEffect::Identity => {}
      StackEffect::FlipLast => {
        if let Some(last) = cards.last_mut() {
          *last = last.flipped();
        }
      }
      StackEffect::FlipAllAndReverse => {
        cards.reverse();
        for card in cards.iter_mut() {
          *card = card.flipped();
        }
      }
    }
    cards
  }
}

/// One end of a move.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Transition {
  pub pos: Position,
  /// Applied to the cards that stay in this stack.
  pub effect: StackEffect,
  /// Applied to the cards being moved.
  pub transform: StackEffect,
}

/// A move of the sub-stack at `from.pos` (and everything above it) onto the
/// stack named by `to.pos`.
///
/// The effects are worked out against the board the move was built from, so a
/// move is only meaningful for that board (or, for its inverse, the board
/// right after it was applied).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Move {
  pub from: Transition,
  pub to: Transition,
}

impl Move {
  pub fn new(board: &Board, from: Position, to: Position) -> Self {
    let below_is_face_up = from
      .row
      .checked_sub(1)
      .and_then(|row| board.card_at(Position { row, ..from }))
      .is_some_and(|cs| cs.face_up);

    let source_effect = match from.pile {
      Pile::Tableau if !below_is_face_up => StackEffect::FlipLast,
      _ => StackEffect::Identity,
    };

    let moving_transform = match (to.pile, to.column) {
      (Pile::Stock, Board::WASTE) => StackEffect::FlipLast,
      (Pile::Stock, Board::TALON) => StackEffect::FlipAllAndReverse,
      _ => StackEffect::Identity,
    };

    let to_row = board
      .get_stack(to.pile, to.column)
      .map_or(0, |stack| stack.len());

    Self {
      from: Transition {
        pos: from,
        effect: source_effect,
        transform: StackEffect::Identity,
      },
      to: Transition {
        pos: Position { row: to_row, ..to },
        effect: StackEffect::Identity,
        transform: moving_transform,
      },
    }
  }

  /// The move that puts everything back.
  pub fn inverse(&self) -> Self {
    Self {
      from: self.to,
      to: self.from,
    }
  }
}

impl Board {
  /// Produce the board after `mv`. `self` is left alone, so a failed move is
  /// never half-applied.
  pub fn apply_move(&self, mv: &Move) -> Result<Board, MoveError> {
    let from = mv.from.pos;
    let to = mv.to.pos;
    let mut next = self.clone();

    let source = next
      .stacks_mut(from.pile)
      .get_mut(from.column)
      .ok_or(MoveError::NoSuchStack(from.pile, from.column))?;
    if to.column >= to.pile.stack_count() {
      return Err(MoveError::NoSuchStack(to.pile, to.column));
    }
    if from.row >= source.len() {
      return Err(MoveError::EmptySelection);
    }

    let lifted = source.split_off(from.row);
    let selection = mv.from.transform.apply(lifted);
    let remaining = std::mem::take(&mut **source);
    **source = mv.from.effect.apply(remaining);

    let dest = &mut next.stacks_mut(to.pile)[to.column];
    let existing = std::mem::take(&mut **dest);
    let mut cards = mv.to.effect.apply(existing);
    cards.extend(mv.to.transform.apply(selection));
    **dest = cards;

    debug!(
      "moved {:?}[{}] row {} -> {:?}[{}]",
      from.pile, from.column, from.row, to.pile, to.column
    );
    Ok(next)
  }
}
