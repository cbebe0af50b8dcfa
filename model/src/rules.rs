use log::trace;

use crate::{Card, Pile, Rank};

/// Whether `moving` may land on a stack of kind `destination` whose top card is
/// `destination_top` (`None` for an empty stack).
///
/// The stock is never a legal target; it only changes through draws.
pub fn is_move_valid(
  destination: Pile,
  moving: Option<&Card>,
  destination_top: Option<&Card>,
) -> bool {
  let Some(moving) = moving else {
    return false;
  };

  let ok = match destination {
    Pile::Foundation => match destination_top {
      None => moving.rank() == Rank::Ace,
      Some(top) => {
        moving.suit() == top.suit()
          && moving.rank().value() == top.rank().value() + 1
      }
    },
    Pile::Tableau => match destination_top {
      None => moving.rank() == Rank::King,
      Some(top) => {
        moving.color() != top.color()
          && moving.rank().value() + 1 == top.rank().value()
      }
    },
    Pile::Stock => false,
  };

  trace!(
    "{:?} onto {:?} {:?}: {}",
    moving,
    destination,
    destination_top,
    if ok { "legal" } else { "illegal" }
  );
  ok
}
