//! Saving finished games.
//!
//! When a game is won, the deal it started from and every move made are
//! handed to a [`GameRecorder`] in one piece. Recorders write a game row, a
//! history row pointing at it, and one move row per step pointing at the
//! history, all or nothing.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

use ahash::AHashMap;
use itertools::Itertools;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::{Board, CardId, Move, Pile, Position};

pub type RecordId = u64;

/// The stock and tableau exactly as dealt, before any card moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialDeal {
  pub stock: Vec<Vec<CardId>>,
  pub tableau: Vec<Vec<CardId>>,
}

impl InitialDeal {
  pub fn from_board(board: &Board) -> Self {
    let ids =
      |pile: Pile| board.stacks(pile).iter().map(|s| s.ids()).collect_vec();
    Self {
      stock: ids(Pile::Stock),
      tableau: ids(Pile::Tableau),
    }
  }
}

/// A move with only its positions kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
  pub from: Position,
  pub to: Position,
}

impl From<&Move> for MoveRecord {
  fn from(mv: &Move) -> Self {
    Self {
      from: mv.from.pos,
      to: mv.to.pos,
    }
  }
}

/// The persistence collaborator a [`Game`](crate::Game) reports wins to.
pub trait GameRecorder: Send + Sync {
  fn record_completed_game(
    &self,
    deal: &InitialDeal,
    moves: &[MoveRecord],
  ) -> Result<(), RecordError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
  Games,
  Histories,
  Moves,
}

#[derive(Debug)]
pub enum RecordError {
  Io(std::io::Error),
  Serialize(serde_json::Error),
  /// The store refused a write to this table.
  Rejected(Table),
  /// A previous writer panicked while holding the store.
  Poisoned,
}

impl Display for RecordError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      RecordError::Io(e) => write!(f, "i/o error: {}", e),
      RecordError::Serialize(e) => write!(f, "could not serialize: {}", e),
      RecordError::Rejected(table) => write!(f, "write to {:?} rejected", table),
      RecordError::Poisoned => f.write_str("store lock poisoned"),
    }
  }
}

impl std::error::Error for RecordError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RecordError::Io(e) => Some(e),
      RecordError::Serialize(e) => Some(e),
      _ => None,
    }
  }
}

impl From<std::io::Error> for RecordError {
  fn from(e: std::io::Error) -> Self {
    RecordError::Io(e)
  }
}

impl From<serde_json::Error> for RecordError {
  fn from(e: serde_json::Error) -> Self {
    RecordError::Serialize(e)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRow {
  pub id: RecordId,
  pub deal: InitialDeal,
  pub created_at_ms: u64,
}

/// The completion record of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
  pub id: RecordId,
  pub game_id: RecordId,
  pub moves_to_complete: usize,
  pub completed_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRow {
  pub id: RecordId,
  pub history_id: RecordId,
  pub step: usize,
  pub from: Position,
  pub to: Position,
}

/// Ids handed out to one recorded game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordReceipt {
  pub game_id: RecordId,
  pub history_id: RecordId,
  pub move_count: usize,
}

fn now_ms() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map_or(0, |d| d.as_millis() as u64)
}

#[derive(Debug, Default)]
struct Tables {
  games: AHashMap<RecordId, GameRow>,
  histories: AHashMap<RecordId, HistoryRow>,
  moves: AHashMap<RecordId, MoveRow>,
  next_id: RecordId,
}

/// Rows written by one transaction, not yet visible to readers.
#[derive(Debug, Default)]
struct Staged {
  games: Vec<GameRow>,
  histories: Vec<HistoryRow>,
  moves: Vec<MoveRow>,
  next_id: RecordId,
}

impl Staged {
  fn fresh_id(&mut self) -> RecordId {
    self.next_id += 1;
    self.next_id
  }
}

/// An in-process store with game, history and move tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
  /// Refuse every write to this table, to exercise rollback.
  fail_on: Option<Table>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing_on(table: Table) -> Self {
    Self {
      tables: Default::default(),
      fail_on: Some(table),
    }
  }

  fn check(&self, table: Table) -> Result<(), RecordError> {
    if self.fail_on == Some(table) {
      Err(RecordError::Rejected(table))
    } else {
      Ok(())
    }
  }

  fn insert_game(
    &self,
    tx: &mut Staged,
    deal: &InitialDeal,
  ) -> Result<RecordId, RecordError> {
    self.check(Table::Games)?;
    let id = tx.fresh_id();
    tx.games.push(GameRow {
      id,
      deal: deal.clone(),
      created_at_ms: now_ms(),
    });
    Ok(id)
  }

  fn insert_history(
    &self,
    tx: &mut Staged,
    game_id: RecordId,
    moves_to_complete: usize,
  ) -> Result<RecordId, RecordError> {
    self.check(Table::Histories)?;
    let id = tx.fresh_id();
    tx.histories.push(HistoryRow {
      id,
      game_id,
      moves_to_complete,
      completed_at_ms: now_ms(),
    });
    Ok(id)
  }

  fn insert_move(
    &self,
    tx: &mut Staged,
    history_id: RecordId,
    step: usize,
    mv: &MoveRecord,
  ) -> Result<RecordId, RecordError> {
    self.check(Table::Moves)?;
    let id = tx.fresh_id();
    tx.moves.push(MoveRow {
      id,
      history_id,
      step,
      from: mv.from,
      to: mv.to,
    });
    Ok(id)
  }

  fn write_rows(
    &self,
    tx: &mut Staged,
    deal: &InitialDeal,
    moves: &[MoveRecord],
  ) -> Result<RecordReceipt, RecordError> {
    let game_id = self.insert_game(tx, deal)?;
    let history_id = self.insert_history(tx, game_id, moves.len())?;
    for (step, mv) in moves.iter().enumerate() {
      self.insert_move(tx, history_id, step, mv)?;
    }
    Ok(RecordReceipt {
      game_id,
      history_id,
      move_count: moves.len(),
    })
  }

  /// Write one completed game. Either every row lands or none do.
  pub fn record(
    &self,
    deal: &InitialDeal,
    moves: &[MoveRecord],
  ) -> Result<RecordReceipt, RecordError> {
    let mut tables = self.tables.lock().map_err(|_| RecordError::Poisoned)?;
    let mut tx = Staged {
      next_id: tables.next_id,
      ..Default::default()
    };

    match self.write_rows(&mut tx, deal, moves) {
      Ok(receipt) => {
        tables.next_id = tx.next_id;
        tables.games.extend(tx.games.into_iter().map(|r| (r.id, r)));
        tables.histories.extend(tx.histories.into_iter().map(|r| (r.id, r)));
        tables.moves.extend(tx.moves.into_iter().map(|r| (r.id, r)));
        debug!("committed game {:?}", receipt);
        Ok(receipt)
      }
      Err(e) => {
        debug!("rolled back recording: {}", e);
        Err(e)
      }
    }
  }

  pub fn games(&self) -> Vec<GameRow> {
    self.read(|t| t.games.values().cloned().sorted_by_key(|r| r.id).collect())
  }

  pub fn histories(&self) -> Vec<HistoryRow> {
    self.read(|t| {
      t.histories
        .values()
        .cloned()
        .sorted_by_key(|r| r.id)
        .collect()
    })
  }

  /// The moves of one history, in play order.
  pub fn moves_for(&self, history_id: RecordId) -> Vec<MoveRow> {
    self.read(|t| {
      t.moves
        .values()
        .filter(|r| r.history_id == history_id)
        .cloned()
        .sorted_by_key(|r| r.step)
        .collect()
    })
  }

  pub fn move_count(&self) -> usize {
    self.read(|t| t.moves.len())
  }

  /// Everything in the store as one JSON document.
  pub fn export_json(&self) -> Result<String, RecordError> {
    #[derive(Serialize)]
    struct Export {
      games: Vec<GameRow>,
      histories: Vec<HistoryRow>,
      moves: Vec<MoveRow>,
    }
    let moves = self.read(|t| {
      t.moves.values().cloned().sorted_by_key(|r| r.id).collect()
    });
    let export = Export {
      games: self.games(),
      histories: self.histories(),
      moves,
    };
    Ok(serde_json::to_string_pretty(&export)?)
  }

  fn read<T: Default>(&self, f: impl FnOnce(&Tables) -> T) -> T {
    match self.tables.lock() {
      Ok(tables) => f(&tables),
      Err(_) => {
        error!("record tables poisoned; reading nothing");
        T::default()
      }
    }
  }
}

impl GameRecorder for MemoryStore {
  fn record_completed_game(
    &self,
    deal: &InitialDeal,
    moves: &[MoveRecord],
  ) -> Result<(), RecordError> {
    let receipt = self.record(deal, moves)?;
    info!(
      "recorded game {} with {} moves",
      receipt.game_id, receipt.move_count
    );
    Ok(())
  }
}

/// One completed game as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDocument {
  pub game: GameRow,
  pub history: HistoryRow,
  pub moves: Vec<MoveRow>,
}

impl GameDocument {
  pub fn new(deal: &InitialDeal, moves: &[MoveRecord]) -> Self {
    let now = now_ms();
    let game = GameRow {
      id: 1,
      deal: deal.clone(),
      created_at_ms: now,
    };
    let history = HistoryRow {
      id: 2,
      game_id: game.id,
      moves_to_complete: moves.len(),
      completed_at_ms: now,
    };
    let moves = moves
      .iter()
      .enumerate()
      .map(|(step, mv)| MoveRow {
        id: 3 + step as RecordId,
        history_id: history.id,
        step,
        from: mv.from,
        to: mv.to,
      })
      .collect();
    Self {
      game,
      history,
      moves,
    }
  }
}

/// Writes each completed game to its own JSON file in a directory.
///
/// The document goes to a temporary file first and is renamed into place, so
/// a reader never sees half a game.
#[derive(Debug)]
pub struct JsonFileRecorder {
  dir: PathBuf,
  counter: AtomicU64,
}

impl JsonFileRecorder {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self {
      dir: dir.into(),
      counter: AtomicU64::new(0),
    }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Write the document and return the path it landed at.
  pub fn write(
    &self,
    deal: &InitialDeal,
    moves: &[MoveRecord],
  ) -> Result<PathBuf, RecordError> {
    let doc = GameDocument::new(deal, moves);
    let json = serde_json::to_vec_pretty(&doc)?;

    std::fs::create_dir_all(&self.dir)?;
    let n = self.counter.fetch_add(1, Ordering::Relaxed);
    let name = format!("game-{}-{}.json", doc.game.created_at_ms, n);
    let path = self.dir.join(&name);
    let tmp = self.dir.join(format!(".{}.tmp", name));

    if let Err(e) = std::fs::write(&tmp, &json) {
      let _ = std::fs::remove_file(&tmp);
      return Err(e.into());
    }
    if let Err(e) = std::fs::rename(&tmp, &path) {
      let _ = std::fs::remove_file(&tmp);
      return Err(e.into());
    }
    Ok(path)
  }
}

impl GameRecorder for JsonFileRecorder {
  fn record_completed_game(
    &self,
    deal: &InitialDeal,
    moves: &[MoveRecord],
  ) -> Result<(), RecordError> {
    let path = self.write(deal, moves)?;
    info!("recorded {} moves to {}", moves.len(), path.display());
    Ok(())
  }
}

/// Runs another recorder on a worker thread per game, so the caller never
/// waits on storage. Failures are logged on the worker.
pub struct BackgroundRecorder<R> {
  inner: Arc<R>,
  pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<R: GameRecorder + 'static> BackgroundRecorder<R> {
  pub fn new(inner: R) -> Self {
    Self::from_arc(Arc::new(inner))
  }

  pub fn from_arc(inner: Arc<R>) -> Self {
    Self {
      inner,
      pending: Mutex::new(Vec::new()),
    }
  }

  pub fn inner(&self) -> &Arc<R> {
    &self.inner
  }

  /// Block until every recording started so far has finished.
  pub fn wait(&self) {
    let handles = match self.pending.lock() {
      Ok(mut pending) => std::mem::take(&mut *pending),
      Err(_) => return,
    };
    for handle in handles {
      if handle.join().is_err() {
        error!("recorder thread panicked");
      }
    }
  }
}

impl<R: GameRecorder + 'static> GameRecorder for BackgroundRecorder<R> {
  fn record_completed_game(
    &self,
    deal: &InitialDeal,
    moves: &[MoveRecord],
  ) -> Result<(), RecordError> {
    let inner = Arc::clone(&self.inner);
    let deal = deal.clone();
    let moves = moves.to_vec();
    let handle = std::thread::Builder::new()
      .name("klondike-recorder".to_string())
      .spawn(move || {
        if let Err(e) = inner.record_completed_game(&deal, &moves) {
          error!("failed to record completed game: {}", e);
        }
      })?;

    let mut pending = self.pending.lock().map_err(|_| RecordError::Poisoned)?;
    pending.retain(|h| !h.is_finished());
    pending.push(handle);
    Ok(())
  }
}
