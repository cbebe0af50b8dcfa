use crate::{card, is_move_valid, Board, CardState, Move, Pile, Position};

/// The first stack of kind `destination` that `moving` may land on, lowest
/// index first.
pub fn find_destination(
  board: &Board,
  destination: Pile,
  moving: &CardState,
) -> Option<usize> {
  let moving = card(moving.id);
  board
    .stacks(destination)
    .iter()
    .position(|stack| {
      let top = stack.last().and_then(|cs| cs.card());
      is_move_valid(destination, moving, top)
    })
}

/// Top cards auto-complete looks at, in the order it tries them: the waste
/// top, then each tableau stack left to right.
fn candidates(board: &Board) -> impl Iterator<Item = Position> + '_ {
  let waste = (Pile::Stock, Board::WASTE);
  let tableau = (0..Board::TABLEAU_COUNT).map(|col| (Pile::Tableau, col));
  std::iter::once(waste)
    .chain(tableau)
    .filter_map(move |(pile, column)| {
      let row = board.stack(pile, column).len().checked_sub(1)?;
      Some(Position::new(pile, column, row))
    })
}

/// The next move auto-complete would make on this board, if any.
pub fn next_foundation_move(board: &Board) -> Option<Move> {
  candidates(board).find_map(|from| {
    let moving = board.card_at(from).filter(|cs| cs.face_up)?;
    let column = find_destination(board, Pile::Foundation, moving)?;
    Some(Move::new(board, from, Position::new(Pile::Foundation, column, 0)))
  })
}

/// Whether any top card can go home right now.
pub fn is_autocomplete_possible(board: &Board) -> bool {
  next_foundation_move(board).is_some()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{card_ids, Stack};

  fn revealed_deal() -> Board {
    let mut board = Board::deal(&card_ids());
    board.reveal_tableau_tops();
    board
  }

  #[test]
  fn ace_at_the_top_goes_home() {
    // In id order, tableau 0 is the ace of spades alone.
    let board = revealed_deal();
    let mv = next_foundation_move(&board).unwrap();
    assert_eq!(mv.from.pos, Position::new(Pile::Tableau, 0, 0));
    assert_eq!(mv.to.pos, Position::new(Pile::Foundation, 0, 0));
    assert!(is_autocomplete_possible(&board));
  }

  #[test]
  fn waste_is_tried_before_tableau() {
    let board = Board::from_stacks(
      [Stack::from(vec![CardState::face_up(14)]), Stack::default()],
      Default::default(),
      [
        vec![CardState::face_up(1)].into(),
        Stack::default(),
        Stack::default(),
        Stack::default(),
        Stack::default(),
        Stack::default(),
        Stack::default(),
      ],
    );
    let mv = next_foundation_move(&board).unwrap();
    assert_eq!(mv.from.pos, Position::new(Pile::Stock, Board::WASTE, 0));
  }

  #[test]
  fn face_down_tops_are_skipped() {
    let board = Board::from_stacks(
      Default::default(),
      Default::default(),
      [
        vec![CardState::face_down(1)].into(),
        Stack::default(),
        Stack::default(),
        Stack::default(),
        Stack::default(),
        Stack::default(),
        Stack::default(),
      ],
    );
    assert!(next_foundation_move(&board).is_none());
  }

  #[test]
  fn destinations_lowest_index_first() {
    let board = Board::from_stacks(
      Default::default(),
      [
        vec![CardState::face_up(1)].into(),
        Stack::default(),
        vec![CardState::face_up(14)].into(),
        Stack::default(),
      ],
      Default::default(),
    );
    // Two of hearts only fits on the hearts ace in foundation 2.
    assert_eq!(
      find_destination(&board, Pile::Foundation, &CardState::face_up(15)),
      Some(2)
    );
    // Any ace takes the first empty slot.
    assert_eq!(
      find_destination(&board, Pile::Foundation, &CardState::face_up(27)),
      Some(1)
    );
    // Kings go to the first empty tableau stack.
    assert_eq!(
      find_destination(&board, Pile::Tableau, &CardState::face_up(13)),
      Some(0)
    );
    assert_eq!(
      find_destination(&board, Pile::Tableau, &CardState::face_up(12)),
      None
    );
  }
}
