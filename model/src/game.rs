use std::sync::Arc;
use std::time::Duration;

use fastrand::Rng;
use getset::Getters;
use log::{debug, error, info, warn};

use crate::autoplay::{find_destination, next_foundation_move};
use crate::random::{make_rng, shuffled_ids};
use crate::record::{GameRecorder, InitialDeal, MoveRecord};
use crate::{
  card, is_move_valid, Board, CardState, GameClock, GameConfig, Move,
  MoveError, Pile, Position, Stack,
};

/// Cards lifted off a stack, waiting for somewhere to go.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Selection {
  /// Bottom card first.
  cards: Vec<CardState>,
  source: Position,
}

impl Selection {
  /// The card the rest of the selection sits on.
  pub fn bottom(&self) -> Option<&CardState> {
    self.cards.first()
  }
}

/// A game in progress: board, undo history, pending selection, clock, and
/// the auto-complete driver.
pub struct Game {
  config: GameConfig,
  rng: Rng,
  board: Board,
  initial_deal: InitialDeal,
  history: Vec<Move>,
  selection: Option<Selection>,
  autocomplete: bool,
  clock: GameClock,
  recorded: bool,
  recorder: Option<Arc<dyn GameRecorder>>,
}

impl Game {
  pub fn new(config: GameConfig) -> Self {
    let mut rng = make_rng(config.seed);
    let board = Self::fresh_board(&mut rng);
    Self::with_board(config, rng, board)
  }

  /// Start from a given position instead of a shuffled deal. The position
  /// counts as the initial deal when the game is recorded.
  pub fn from_board(board: Board, config: GameConfig) -> Self {
    let rng = make_rng(config.seed);
    Self::with_board(config, rng, board)
  }

  pub fn with_recorder(mut self, recorder: Arc<dyn GameRecorder>) -> Self {
    self.recorder = Some(recorder);
    self
  }

  fn with_board(config: GameConfig, rng: Rng, board: Board) -> Self {
    Self {
      config,
      rng,
      initial_deal: InitialDeal::from_board(&board),
      board,
      history: Vec::new(),
      selection: None,
      autocomplete: false,
      clock: GameClock::started(),
      recorded: false,
      recorder: None,
    }
  }

  fn fresh_board(rng: &mut Rng) -> Board {
    let mut board = Board::deal(&shuffled_ids(rng));
    board.reveal_tableau_tops();
    board
  }

  /// Throw the current game away and deal a new one.
  pub fn new_deal(&mut self) {
    let board = Self::fresh_board(&mut self.rng);
    self.initial_deal = InitialDeal::from_board(&board);
    self.board = board;
    self.history.clear();
    self.selection = None;
    self.autocomplete = false;
    self.clock.reset();
    self.recorded = false;
    info!("new deal");
  }

  pub fn config(&self) -> &GameConfig {
    &self.config
  }

  pub fn board(&self) -> &Board {
    &self.board
  }

  pub fn cards(&self, pile: Pile) -> &[Stack] {
    self.board.stacks(pile)
  }

  pub fn initial_deal(&self) -> &InitialDeal {
    &self.initial_deal
  }

  pub fn history(&self) -> &[Move] {
    &self.history
  }

  pub fn is_history_empty(&self) -> bool {
    self.history.is_empty()
  }

  pub fn selection(&self) -> Option<&Selection> {
    self.selection.as_ref()
  }

  /// The card to highlight, if something is selected.
  pub fn selected_card(&self) -> Option<&CardState> {
    self.selection.as_ref()?.bottom()
  }

  pub fn is_autocomplete_possible(&self) -> bool {
    crate::is_autocomplete_possible(&self.board)
  }

  pub fn is_autocomplete_enabled(&self) -> bool {
    self.autocomplete
  }

  pub fn elapsed(&self) -> Duration {
    self.clock.elapsed()
  }

  pub fn elapsed_ms(&self) -> u128 {
    self.clock.elapsed_ms()
  }

  pub fn is_complete(&self) -> bool {
    self.board.is_cleared()
  }

  /// Apply a move to the board and remember it. Nothing changes on failure.
  fn commit(&mut self, mv: Move) -> Result<(), MoveError> {
    let next = self.board.apply_move(&mv)?;
    self.board = next;
    self.history.push(mv);
    self.check_completion();
    Ok(())
  }

  fn commit_between(&mut self, from: Position, to: Position) -> bool {
    let mv = Move::new(&self.board, from, to);
    match self.commit(mv) {
      Ok(()) => true,
      Err(e) => {
        warn!("move {:?} -> {:?} not applied: {:?}", from, to, e);
        false
      }
    }
  }

  fn check_completion(&mut self) {
    if !self.board.is_cleared() {
      return;
    }
    self.clock.stop();
    self.autocomplete = false;
    if self.recorded {
      return;
    }
    self.recorded = true;
    info!(
      "game complete in {} moves, {} ms",
      self.history.len(),
      self.clock.elapsed_ms()
    );

    let Some(recorder) = &self.recorder else {
      return;
    };
    let moves = self.history.iter().map(MoveRecord::from).collect::<Vec<_>>();
    if let Err(e) = recorder.record_completed_game(&self.initial_deal, &moves) {
      error!("failed to record completed game: {}", e);
    }
  }

  /// Click on a card (or an empty stack) to pick it up or put the held cards
  /// down. Returns whether a move was made.
  pub fn select(&mut self, pile: Pile, column: usize, row: usize) -> bool {
    let Some(selection) = self.selection.take() else {
      self.lift(pile, column, row);
      return false;
    };

    if pile == Pile::Stock {
      debug!("selection dropped on the stock");
      return false;
    }
    if pile == Pile::Foundation && selection.cards.len() != 1 {
      debug!(
        "{} cards can't go on a foundation at once",
        selection.cards.len()
      );
      return false;
    }
    let Some(stack) = self.board.get_stack(pile, column) else {
      return false;
    };

    let top = stack.last().and_then(CardState::card);
    let bottom = selection.bottom().and_then(CardState::card);
    if !is_move_valid(pile, bottom, top) {
      debug!("{:?} can't go on {:?} {}", bottom, pile, column);
      return false;
    }

    self.commit_between(selection.source, Position::new(pile, column, row))
  }

  /// Only the top card of the waste and of a foundation can be picked up;
  /// the talon is reached through [`Game::draw_card`] alone.
  fn is_reachable(&self, pile: Pile, column: usize, row: usize) -> bool {
    let Some(stack) = self.board.get_stack(pile, column) else {
      return false;
    };
    match pile {
      Pile::Stock if column == Board::TALON => false,
      Pile::Stock | Pile::Foundation => row + 1 == stack.len(),
      Pile::Tableau => true,
    }
  }

  fn lift(&mut self, pile: Pile, column: usize, row: usize) {
    if !self.is_reachable(pile, column, row) {
      return;
    }
    let Some(stack) = self.board.get_stack(pile, column) else {
      return;
    };
    match stack.get(row) {
      Some(cs) if cs.face_up => {
        self.selection = Some(Selection {
          cards: stack[row..].to_vec(),
          source: Position::new(pile, column, row),
        });
      }
      _ => {}
    }
  }

  /// Double-click: send the card (and whatever sits on it) somewhere useful
  /// without picking a destination. Top cards try the foundation first; the
  /// tableau is the fallback, and the only option for buried cards.
  pub fn send_to_foundation(
    &mut self,
    pile: Pile,
    column: usize,
    row: usize,
  ) -> bool {
    self.selection = None;
    if !self.is_reachable(pile, column, row) {
      return false;
    }
    let from = Position::new(pile, column, row);
    let Some(&moving) = self.board.card_at(from) else {
      return false;
    };
    if !moving.face_up || card(moving.id).is_none() {
      return false;
    }

    let is_top = row + 1 == self.board.stack(pile, column).len();
    if is_top && self.send(from, &moving, Pile::Foundation) {
      return true;
    }
    self.send(from, &moving, Pile::Tableau)
  }

  fn send(&mut self, from: Position, moving: &CardState, dest: Pile) -> bool {
    match find_destination(&self.board, dest, moving) {
      Some(column) => self.commit_between(from, Position::new(dest, column, 0)),
      None => false,
    }
  }

  /// Turn over the next talon card, or turn the waste back over when the
  /// talon is used up.
  pub fn draw_card(&mut self) -> bool {
    self.selection = None;
    let waste_len = self.board.waste().len();
    let talon_len = self.board.talon().len();

    if talon_len == 0 {
      if waste_len == 0 {
        return false;
      }
      return self.commit_between(
        Position::new(Pile::Stock, Board::WASTE, 0),
        Position::new(Pile::Stock, Board::TALON, 0),
      );
    }

    self.commit_between(
      Position::new(Pile::Stock, Board::TALON, talon_len - 1),
      Position::new(Pile::Stock, Board::WASTE, waste_len),
    )
  }

  /// Take back the last move. Returns whether anything was undone.
  pub fn undo(&mut self) -> bool {
    let Some(last) = self.history.last() else {
      return false;
    };
    match self.board.apply_move(&last.inverse()) {
      Ok(board) => {
        self.board = board;
        self.history.pop();
        self.selection = None;
        debug!("undo, {} moves left", self.history.len());
        true
      }
      Err(e) => {
        warn!("undo failed: {:?}", e);
        false
      }
    }
  }

  pub fn set_autocomplete(&mut self, enabled: bool) {
    self.autocomplete = enabled && !self.board.is_cleared();
  }

  /// Make at most one auto-complete move against the current board. The
  /// driver switches itself off once it finds nothing to do.
  pub fn step_autocomplete(&mut self) -> bool {
    if !self.autocomplete {
      return false;
    }
    let moved = next_foundation_move(&self.board)
      .is_some_and(|mv| self.commit(mv).is_ok());
    if !moved {
      debug!("auto-complete found nothing more");
      self.autocomplete = false;
    }
    moved
  }

  /// Switch auto-complete on and let it run dry. Returns the number of cards
  /// it sent home.
  pub fn run_autocomplete(&mut self) -> usize {
    self.set_autocomplete(true);
    let mut moved = 0;
    while self.step_autocomplete() {
      moved += 1;
    }
    moved
  }

  /// Advance the clock and give auto-complete a turn.
  pub fn tick(&mut self, elapsed: Duration) {
    self.clock.advance(elapsed);
    self.step_autocomplete();
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  use super::*;
  use crate::record::{MemoryStore, RecordError, Table};
  use crate::{card_ids, Rank, Suit};

  fn id(suit: Suit, rank: Rank) -> u8 {
    suit as u8 * 13 + rank.value()
  }

  fn up(suit: Suit, rank: Rank) -> CardState {
    CardState::face_up(id(suit, rank))
  }

  fn in_order_game() -> Game {
    let mut board = Board::deal(&card_ids());
    board.reveal_tableau_tops();
    Game::from_board(board, GameConfig::seeded(1))
  }

  fn empty_tableau() -> [Stack; 7] {
    Default::default()
  }

  /// Every card but the named ones already home, foundations built up by
  /// suit in foundation order.
  fn nearly_won(missing: &[(Suit, Rank)]) -> [Stack; 4] {
    Suit::ALL.map(|suit| {
      Stack::from(
        Rank::all()
          .take_while(|rank| !missing.contains(&(suit, *rank)))
          .map(|rank| up(suit, rank))
          .collect::<Vec<_>>(),
      )
    })
  }

  #[derive(Default)]
  struct CountingRecorder {
    calls: AtomicUsize,
    last: Mutex<Option<(InitialDeal, Vec<MoveRecord>)>>,
  }

  impl GameRecorder for CountingRecorder {
    fn record_completed_game(
      &self,
      deal: &InitialDeal,
      moves: &[MoveRecord],
    ) -> Result<(), RecordError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      *self.last.lock().unwrap() = Some((deal.clone(), moves.to_vec()));
      Ok(())
    }
  }

  #[test]
  fn new_game_is_dealt_and_revealed() {
    let game = Game::new(GameConfig::seeded(42));
    assert!(game.board().is_consistent());
    assert!(game.is_history_empty());
    assert!(game.selection().is_none());
    for stack in game.cards(Pile::Tableau) {
      assert!(stack.last().unwrap().face_up);
    }
    assert_eq!(game.elapsed_ms(), 0);
  }

  #[test]
  fn seeded_games_deal_the_same() {
    let a = Game::new(GameConfig::seeded(9));
    let b = Game::new(GameConfig::seeded(9));
    assert_eq!(a.board(), b.board());
  }

  #[test]
  fn lifting_needs_a_face_up_card() {
    let mut game = in_order_game();
    assert!(!game.select(Pile::Tableau, 6, 0));
    assert!(game.selection().is_none());
    assert!(!game.select(Pile::Tableau, 6, 9));
    assert!(game.selection().is_none());

    game.select(Pile::Tableau, 6, 6);
    let sel = game.selection().unwrap();
    assert_eq!(sel.cards(), &vec![CardState::face_up(28)]);
    assert_eq!(*sel.source(), Position::new(Pile::Tableau, 6, 6));
    assert_eq!(game.selected_card(), Some(&CardState::face_up(28)));
  }

  #[test]
  fn selecting_then_clicking_a_legal_target_moves() {
    // Tableau 0 holds the ace of spades.
    let mut game = in_order_game();
    game.select(Pile::Tableau, 0, 0);
    assert!(game.select(Pile::Foundation, 2, 0));
    assert!(game.selection().is_none());
    assert_eq!(
      game.cards(Pile::Foundation)[2].as_slice(),
      &[CardState::face_up(1)]
    );
    assert!(game.cards(Pile::Tableau)[0].is_empty());
    assert_eq!(game.history().len(), 1);
  }

  #[test]
  fn illegal_target_cancels() {
    let mut game = in_order_game();
    let before = game.board().clone();
    game.select(Pile::Tableau, 6, 6);
    assert!(!game.select(Pile::Tableau, 5, 5));
    assert!(game.selection().is_none());
    assert_eq!(game.board(), &before);
    assert!(game.is_history_empty());
  }

  #[test]
  fn stock_is_not_a_target() {
    let mut game = in_order_game();
    game.select(Pile::Tableau, 0, 0);
    assert!(!game.select(Pile::Stock, Board::WASTE, 0));
    assert!(game.selection().is_none());
    assert!(game.is_history_empty());
  }

  #[test]
  fn king_stack_moves_to_empty_column_and_flips_source() {
    // K♥ sits face-up on a face-down card; tableau 0 is empty.
    let mut tableau = empty_tableau();
    tableau[3] = vec![
      CardState::face_down(id(Suit::Clubs, Rank::Two)),
      up(Suit::Hearts, Rank::King),
      up(Suit::Spades, Rank::Queen),
    ]
    .into();
    let board = Board::from_stacks(Default::default(), Default::default(), tableau);
    let mut game = Game::from_board(board.clone(), GameConfig::default());

    game.select(Pile::Tableau, 3, 1);
    assert_eq!(game.selection().unwrap().cards().len(), 2);
    assert!(game.select(Pile::Tableau, 0, 0));
    assert_eq!(
      game.cards(Pile::Tableau)[0].as_slice(),
      &[up(Suit::Hearts, Rank::King), up(Suit::Spades, Rank::Queen)]
    );
    assert_eq!(
      game.cards(Pile::Tableau)[3].as_slice(),
      &[up(Suit::Clubs, Rank::Two)]
    );

    assert!(game.undo());
    assert_eq!(game.board(), &board);
  }

  #[test]
  fn send_prefers_foundation_for_top_cards() {
    let mut tableau = empty_tableau();
    tableau[1] = vec![up(Suit::Spades, Rank::Two)].into();
    tableau[4] = vec![up(Suit::Hearts, Rank::Three)].into();
    let mut foundation: [Stack; 4] = Default::default();
    foundation[3] = vec![up(Suit::Spades, Rank::Ace)].into();
    let board = Board::from_stacks(Default::default(), foundation, tableau);
    let mut game = Game::from_board(board, GameConfig::default());

    assert!(game.send_to_foundation(Pile::Tableau, 1, 0));
    assert_eq!(game.cards(Pile::Foundation)[3].len(), 2);
  }

  #[test]
  fn send_falls_back_to_tableau() {
    let mut tableau = empty_tableau();
    tableau[2] = vec![up(Suit::Spades, Rank::Four)].into();
    tableau[5] = vec![up(Suit::Hearts, Rank::Three)].into();
    let board = Board::from_stacks(Default::default(), Default::default(), tableau);
    let mut game = Game::from_board(board, GameConfig::default());

    assert!(game.send_to_foundation(Pile::Tableau, 5, 0));
    assert_eq!(
      game.cards(Pile::Tableau)[2].as_slice(),
      &[up(Suit::Spades, Rank::Four), up(Suit::Hearts, Rank::Three)]
    );
  }

  #[test]
  fn buried_cards_only_go_to_tableau() {
    // A♣ with 10♦ on it: the ace is not on top, so the foundation is skipped
    // even though it would fit there.
    let mut tableau = empty_tableau();
    tableau[0] = vec![
      up(Suit::Clubs, Rank::Ace),
      up(Suit::Diamonds, Rank::Ten),
    ]
    .into();
    let board = Board::from_stacks(Default::default(), Default::default(), tableau);
    let mut game = Game::from_board(board.clone(), GameConfig::default());

    assert!(!game.send_to_foundation(Pile::Tableau, 0, 0));
    assert_eq!(game.board(), &board);
  }

  #[test]
  fn send_ignores_face_down_and_missing_cards() {
    let mut game = in_order_game();
    let before = game.board().clone();
    assert!(!game.send_to_foundation(Pile::Tableau, 6, 0));
    assert!(!game.send_to_foundation(Pile::Tableau, 6, 7));
    assert!(!game.send_to_foundation(Pile::Stock, Board::WASTE, 0));
    assert_eq!(game.board(), &before);
  }

  #[test]
  fn draw_then_recycle_then_undo_everything() {
    let mut game = in_order_game();
    let start = game.board().clone();

    for n in 1..=24 {
      assert!(game.draw_card());
      assert_eq!(game.board().waste().len(), n);
      assert!(game.board().waste().last().unwrap().face_up);
    }
    assert!(game.board().talon().is_empty());
    let waste_ids = game.board().waste().ids();

    assert!(game.draw_card());
    assert!(game.board().waste().is_empty());
    assert_eq!(game.board().talon().len(), 24);
    assert!(game.board().talon().iter().all(|cs| !cs.face_up));
    let mut reversed = waste_ids;
    reversed.reverse();
    assert_eq!(game.board().talon().ids(), reversed);
    // Recycling restores the talon to its dealt order.
    assert_eq!(game.board().talon(), start.talon());

    while game.undo() {}
    assert_eq!(game.board(), &start);
    assert!(game.is_history_empty());
  }

  #[test]
  fn drawing_from_an_empty_stock_does_nothing() {
    let board = Board::from_stacks(
      Default::default(),
      Default::default(),
      empty_tableau(),
    );
    let mut game = Game::from_board(board, GameConfig::default());
    assert!(!game.draw_card());
    assert!(game.is_history_empty());
  }

  #[test]
  fn undo_with_empty_history_is_a_noop() {
    let mut game = in_order_game();
    let before = game.board().clone();
    assert!(!game.undo());
    assert_eq!(game.board(), &before);
  }

  #[test]
  fn draw_clears_selection() {
    let mut game = in_order_game();
    game.select(Pile::Tableau, 0, 0);
    assert!(game.selection().is_some());
    game.draw_card();
    assert!(game.selection().is_none());
  }

  #[test]
  fn autocomplete_takes_the_waste_top_and_halts() {
    let mut tableau = empty_tableau();
    tableau[0] = vec![up(Suit::Hearts, Rank::Nine)].into();
    let board = Board::from_stacks(
      [vec![up(Suit::Clubs, Rank::Ace)].into(), Stack::default()],
      Default::default(),
      tableau,
    );
    let mut game = Game::from_board(board, GameConfig::default());
    assert!(game.is_autocomplete_possible());

    assert_eq!(game.run_autocomplete(), 1);
    assert_eq!(
      game.cards(Pile::Foundation)[0].as_slice(),
      &[up(Suit::Clubs, Rank::Ace)]
    );
    assert!(game.board().waste().is_empty());
    assert!(!game.is_autocomplete_enabled());
    assert!(!game.is_autocomplete_possible());
  }

  #[test]
  fn autocomplete_rescans_after_each_move() {
    // Only the ace is playable at first; each move exposes the next card.
    let mut tableau = empty_tableau();
    tableau[2] = vec![
      up(Suit::Diamonds, Rank::Three),
      up(Suit::Diamonds, Rank::Two),
    ]
    .into();
    tableau[6] = vec![up(Suit::Diamonds, Rank::Ace)].into();
    let board = Board::from_stacks(Default::default(), Default::default(), tableau);
    let mut game = Game::from_board(board, GameConfig::default());

    game.set_autocomplete(true);
    game.tick(Duration::from_millis(100));
    assert_eq!(game.cards(Pile::Foundation)[0].len(), 1);
    game.tick(Duration::from_millis(100));
    game.tick(Duration::from_millis(100));
    assert_eq!(game.cards(Pile::Foundation)[0].len(), 3);
    assert!(game.is_complete());
    assert!(!game.is_autocomplete_enabled());
  }

  #[test]
  fn cancelled_autocomplete_stays_put() {
    let mut game = in_order_game();
    game.set_autocomplete(true);
    game.set_autocomplete(false);
    let before = game.board().clone();
    game.tick(Duration::from_millis(10));
    assert_eq!(game.board(), &before);
  }

  #[test]
  fn completion_is_recorded_once() {
    let mut tableau = empty_tableau();
    tableau[0] = vec![up(Suit::Clubs, Rank::King)].into();
    let board = Board::from_stacks(
      [vec![up(Suit::Hearts, Rank::King)].into(), Stack::default()],
      nearly_won(&[(Suit::Hearts, Rank::King), (Suit::Clubs, Rank::King)]),
      tableau,
    );
    let recorder = Arc::new(CountingRecorder::default());
    let mut game = Game::from_board(board.clone(), GameConfig::default())
      .with_recorder(recorder.clone());
    let deal = game.initial_deal().clone();

    assert!(game.send_to_foundation(Pile::Stock, Board::WASTE, 0));
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    assert!(!game.is_complete());

    game.tick(Duration::from_secs(2));
    assert!(game.send_to_foundation(Pile::Tableau, 0, 0));
    assert!(game.is_complete());
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);

    let (recorded_deal, moves) = recorder.last.lock().unwrap().clone().unwrap();
    assert_eq!(recorded_deal, deal);
    assert_eq!(moves.len(), 2);
    assert_eq!(moves[0].from, Position::new(Pile::Stock, Board::WASTE, 0));
    assert_eq!(moves[1].to, Position::new(Pile::Foundation, 3, 12));

    // The clock stops at completion.
    let at_finish = game.elapsed_ms();
    game.tick(Duration::from_secs(5));
    assert_eq!(game.elapsed_ms(), at_finish);

    // Undoing and winning again doesn't record a second time.
    assert!(game.undo());
    assert!(game.send_to_foundation(Pile::Tableau, 0, 0));
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn persistence_failure_leaves_the_game_alone() {
    let board = Board::from_stacks(
      [vec![up(Suit::Hearts, Rank::King)].into(), Stack::default()],
      nearly_won(&[(Suit::Hearts, Rank::King)]),
      empty_tableau(),
    );
    let store = Arc::new(MemoryStore::failing_on(Table::Moves));
    let mut game =
      Game::from_board(board, GameConfig::default()).with_recorder(store.clone());

    assert!(game.send_to_foundation(Pile::Stock, Board::WASTE, 0));
    assert!(game.is_complete());
    assert!(store.games().is_empty());
    assert_eq!(game.history().len(), 1);

    game.new_deal();
    assert!(!game.is_complete());
    assert!(game.board().is_consistent());
  }

  #[test]
  fn completion_lands_in_the_store() {
    let board = Board::from_stacks(
      [vec![up(Suit::Hearts, Rank::King)].into(), Stack::default()],
      nearly_won(&[(Suit::Hearts, Rank::King)]),
      empty_tableau(),
    );
    let store = Arc::new(MemoryStore::new());
    let mut game =
      Game::from_board(board, GameConfig::default()).with_recorder(store.clone());
    game.run_autocomplete();

    let histories = store.histories();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0].moves_to_complete, 1);
    let moves = store.moves_for(histories[0].id);
    assert_eq!(moves[0].to, Position::new(Pile::Foundation, 1, 12));
  }

  #[test]
  fn new_deal_resets_everything() {
    let mut game = Game::new(GameConfig::seeded(5));
    let first = game.board().clone();
    game.draw_card();
    game.tick(Duration::from_secs(3));
    game.set_autocomplete(true);
    game.select(Pile::Stock, Board::WASTE, 0);

    game.new_deal();
    assert_ne!(game.board(), &first);
    assert!(game.is_history_empty());
    assert!(game.selection().is_none());
    assert_eq!(game.elapsed_ms(), 0);
    assert!(!game.is_autocomplete_enabled());
    assert_eq!(game.initial_deal(), &InitialDeal::from_board(game.board()));
  }

  #[test]
  fn runs_never_land_on_a_foundation() {
    let mut foundation: [Stack; 4] = Default::default();
    foundation[1] = [Rank::Ace, Rank::Two, Rank::Three, Rank::Four]
      .map(|rank| up(Suit::Hearts, rank))
      .to_vec()
      .into();
    let mut tableau = empty_tableau();
    tableau[0] =
      vec![up(Suit::Hearts, Rank::Five), up(Suit::Spades, Rank::Four)].into();
    let board = Board::from_stacks(Default::default(), foundation, tableau);
    let mut game = Game::from_board(board.clone(), GameConfig::default());

    game.select(Pile::Tableau, 0, 0);
    assert_eq!(game.selection().unwrap().cards().len(), 2);
    assert!(!game.select(Pile::Foundation, 1, 0));
    assert!(game.selection().is_none());
    assert_eq!(game.board(), &board);
    assert!(game.is_history_empty());
  }

  #[test]
  fn only_the_waste_top_is_reachable() {
    let mut tableau = empty_tableau();
    tableau[0] = vec![up(Suit::Spades, Rank::King)].into();
    let waste: Stack =
      vec![up(Suit::Hearts, Rank::Queen), up(Suit::Clubs, Rank::Three)].into();
    let board =
      Board::from_stacks([waste, Stack::default()], Default::default(), tableau);
    let mut game = Game::from_board(board.clone(), GameConfig::default());

    game.select(Pile::Stock, Board::WASTE, 0);
    assert!(game.selection().is_none());
    // Q♥ would fit on K♠, but it is buried under 3♣.
    assert!(!game.send_to_foundation(Pile::Stock, Board::WASTE, 0));
    assert_eq!(game.board(), &board);

    game.select(Pile::Stock, Board::WASTE, 1);
    assert_eq!(
      game.selection().unwrap().cards(),
      &vec![up(Suit::Clubs, Rank::Three)]
    );
  }

  #[test]
  fn talon_is_never_lifted() {
    let talon: Stack = vec![up(Suit::Spades, Rank::King)].into();
    let board = Board::from_stacks(
      [Stack::default(), talon],
      Default::default(),
      empty_tableau(),
    );
    let mut game = Game::from_board(board.clone(), GameConfig::default());

    game.select(Pile::Stock, Board::TALON, 0);
    assert!(game.selection().is_none());
    assert!(!game.send_to_foundation(Pile::Stock, Board::TALON, 0));
    assert_eq!(game.board(), &board);
  }

  #[test]
  fn only_foundation_tops_are_reachable() {
    let mut foundation: [Stack; 4] = Default::default();
    foundation[1] =
      vec![up(Suit::Hearts, Rank::Ace), up(Suit::Hearts, Rank::Two)].into();
    let mut tableau = empty_tableau();
    tableau[0] = vec![up(Suit::Spades, Rank::Three)].into();
    let board = Board::from_stacks(Default::default(), foundation, tableau);
    let mut game = Game::from_board(board.clone(), GameConfig::default());

    game.select(Pile::Foundation, 1, 0);
    assert!(game.selection().is_none());
    assert!(!game.send_to_foundation(Pile::Foundation, 1, 0));
    assert_eq!(game.board(), &board);

    // The top card may come back down onto the tableau.
    game.select(Pile::Foundation, 1, 1);
    assert!(game.select(Pile::Tableau, 0, 0));
    assert_eq!(
      game.cards(Pile::Tableau)[0].as_slice(),
      &[up(Suit::Spades, Rank::Three), up(Suit::Hearts, Rank::Two)]
    );
  }

  #[test]
  fn autocomplete_resumes_after_undoing_a_win() {
    let board = Board::from_stacks(
      [vec![up(Suit::Hearts, Rank::King)].into(), Stack::default()],
      nearly_won(&[(Suit::Hearts, Rank::King)]),
      empty_tableau(),
    );
    let recorder = Arc::new(CountingRecorder::default());
    let mut game = Game::from_board(board, GameConfig::default())
      .with_recorder(recorder.clone());

    assert!(game.send_to_foundation(Pile::Stock, Board::WASTE, 0));
    game.set_autocomplete(true);
    assert!(!game.is_autocomplete_enabled());

    assert!(game.undo());
    game.set_autocomplete(true);
    assert!(game.is_autocomplete_enabled());
    assert!(game.step_autocomplete());
    assert!(game.is_complete());
    assert!(!game.is_autocomplete_enabled());
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
  }
}
