use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use itertools::Itertools;
use klondike_model::record::{BackgroundRecorder, JsonFileRecorder};
use klondike_model::{Board, CardState, Game, GameConfig, Pile};
use log::{Level, LevelFilter, Log, Metadata, Record};

struct StderrLogger;

impl Log for StderrLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= log::max_level()
  }

  fn log(&self, record: &Record) {
    if !self.enabled(record.metadata()) {
      return;
    }
    let prefix = match record.level() {
      Level::Error => "[ERROR]",
      Level::Warn => "[WARN ]",
      Level::Info => "[INFO ]",
      Level::Debug => "[DEBUG]",
      Level::Trace => "[TRACE]",
    };
    eprintln!("{} {}", prefix, record.args());
  }

  fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

struct Args {
  config: GameConfig,
  record_dir: Option<PathBuf>,
  level: LevelFilter,
}

fn parse_args() -> Args {
  let mut args = Args {
    config: GameConfig::from_env(),
    record_dir: None,
    level: LevelFilter::Warn,
  };

  for arg in std::env::args().skip(1) {
    if arg == "--verbose" {
      args.level = LevelFilter::Debug;
    } else if arg == "--quiet" {
      args.level = LevelFilter::Error;
    } else if let Some(rest) = arg.strip_prefix("--seed=") {
      match rest.parse::<u64>() {
        Ok(seed) => args.config.seed = Some(seed),
        Err(_) => eprintln!("could not parse seed from '{}'; ignoring", rest),
      }
    } else if let Some(rest) = arg.strip_prefix("--record-dir=") {
      args.record_dir = Some(PathBuf::from(rest));
    } else {
      eprintln!(
        "unrecognized argument '{}'; supported: --seed=<u64>, \
         --record-dir=<path>, --verbose, --quiet",
        arg
      );
    }
  }
  args
}

fn main() {
  if log::set_logger(&LOGGER).is_ok() {
    log::set_max_level(LevelFilter::Warn);
  }
  let args = parse_args();
  log::set_max_level(args.level);

  let recorder = args
    .record_dir
    .map(|dir| Arc::new(BackgroundRecorder::new(JsonFileRecorder::new(dir))));
  let mut game = Game::new(args.config);
  if let Some(recorder) = &recorder {
    println!("Won games are saved to {}.", recorder.inner().dir().display());
    game = game.with_recorder(recorder.clone());
  }

  let mut rl = match rustyline::DefaultEditor::new() {
    Ok(rl) => rl,
    Err(e) => {
      eprintln!("couldn't open the terminal: {}", e);
      return;
    }
  };

  println!("Welcome to Klondike.");
  print_help();
  println!();

  let mut last_tick = Instant::now();
  loop {
    print_board(&game);
    println!();

    let line = match rl.readline("> ") {
      Ok(it) => it,
      Err(_) => break,
    };
    let _ = rl.add_history_entry(line.as_str());

    let now = Instant::now();
    game.tick(now - last_tick);
    last_tick = now;

    let words = line.split_whitespace().collect_vec();
    let Some((&cmd, rest)) = words.split_first() else {
      continue;
    };

    match cmd {
      "q" | "quit" => break,
      "?" | "h" | "help" => print_help(),
      "d" | "draw" => {
        if !game.draw_card() {
          println!("The stock is empty.");
        }
      }
      "u" | "undo" => {
        if !game.undo() {
          println!("Nothing to undo.");
        }
      }
      "n" | "new" => game.new_deal(),
      "a" | "auto" => {
        if game.is_autocomplete_possible() {
          let moved = game.run_autocomplete();
          println!("Sent {} cards home.", moved);
        } else {
          println!("Nothing can go home right now.");
        }
      }
      "s" | "f" => {
        let Some((pile, column, row)) = read_target(&game, rest) else {
          println!("Where? Try `{} t3` or `{} t3 2`.", cmd, cmd);
          continue;
        };
        let moved = if cmd == "s" {
          game.select(pile, column, row)
        } else {
          game.send_to_foundation(pile, column, row)
        };
        if cmd == "f" && !moved {
          println!("That card has nowhere to go.");
        }
      }
      _ => println!("Unknown command `{}`; `?` for help.", cmd),
    }

    if game.is_complete() {
      println!(
        "You won in {} moves and {}s! `n` deals again.",
        game.history().len(),
        game.elapsed().as_secs()
      );
    }
  }

  if let Some(recorder) = recorder {
    recorder.wait();
  }
}

fn print_help() {
  println!("Commands:");
  println!("- d: draw from the stock (or turn the waste over)");
  println!("- s <stack> [row]: pick up cards, or put the held cards down");
  println!("- f <stack> [row]: send a card somewhere it fits");
  println!("- a: send everything that fits to the foundations");
  println!("- u: undo, n: new deal, q: quit");
  println!("Stacks are `w` (waste), `f0`-`f3`, and `t0`-`t6`.");
  println!("The row defaults to the top card; rows count up from 0.");
}

/// `w`, `f2`, or `t5`, with an optional row. The row defaults to the top card,
/// or 0 for an empty stack.
fn read_target(game: &Game, words: &[&str]) -> Option<(Pile, usize, usize)> {
  let (stack, row) = match words {
    [stack] => (*stack, None),
    [stack, row] => (*stack, Some(row.parse::<usize>().ok()?)),
    _ => return None,
  };

  let (pile, column) = match stack.split_at_checked(1)? {
    ("w", "") => (Pile::Stock, Board::WASTE),
    ("f", idx) => (Pile::Foundation, idx.parse::<usize>().ok()?),
    ("t", idx) => (Pile::Tableau, idx.parse::<usize>().ok()?),
    _ => return None,
  };

  let len = game.board().get_stack(pile, column)?.len();
  let row = row.unwrap_or(len.saturating_sub(1));
  Some((pile, column, row))
}

fn show(cs: &CardState) -> String {
  match cs.card() {
    Some(card) if cs.face_up => format!("{:>3}", card.to_string()),
    _ => " ##".to_string(),
  }
}

fn show_top(cards: &[CardState]) -> String {
  cards.last().map_or(" ..".to_string(), show)
}

fn print_board(game: &Game) {
  let board = game.board();
  let held = game.selected_card().copied();

  let foundations = board.foundation().iter().map(|s| show_top(s)).join(" ");
  let talon = if board.talon().is_empty() { " .." } else { " ##" };

  let columns = board
    .tableau()
    .iter()
    .enumerate()
    .map(|(col_idx, stack)| {
      let row = stack
        .iter()
        .map(|cs| {
          let s = show(cs);
          if Some(*cs) == held {
            format!("[{}]", s.trim_start())
          } else {
            s
          }
        })
        .join(" ");
      format!("t{}. {}", col_idx, row)
    })
    .join("\n");

  let secs = game.elapsed().as_secs();
  println!(
    "stock [{}] waste [{}]   foundations [{}]   {:02}:{:02}, {} moves",
    talon,
    show_top(board.waste()),
    foundations,
    secs / 60,
    secs % 60,
    game.history().len()
  );
  if let Some(cs) = held {
    println!("holding {}", show(&cs).trim_start());
  }
  println!("{}", columns);
}
