//! Line-driven single screen converter.
//!
//! Input lines, rate responses and timer deadlines are multiplexed with
//! `tokio::select!`. Rate fetches run on spawned tasks and report back over a
//! channel, so typing never waits on the network.

use super::convert::conversion_lines;
use super::favorites::pair_label;
use super::history::history_table;
use super::recent::recent_table;
use super::ui;
use crate::core::converter::Converter;
use crate::core::currency::{CurrencyRateProvider, RateTable};
use crate::core::state::{Input, KeypadKey, RateRequest};
use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// History rows shown on the screen.
const HISTORY_PREVIEW: usize = 3;

const HELP: &str = "\
  <number>        edit the amount to convert
  =<number>       edit the converted amount
  del | clear     remove the last digit | reset the amount
  swap            swap currencies
  from <CODE>     set the source currency
  to <CODE>       set the target currency
  fav             add or remove the pair from favorites
  favs            list favorites, `use <N>` loads one
  recent          list recent amounts, `r <N>` loads one
  history         show recent conversions, `h <N>` loads one
  <enter>         record the conversion in the history
  save [TEXT]     save with a description
  clear-history   remove every saved conversion
  help | quit";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Edit(Input),
    Commit,
    Save(Option<String>),
    ToggleFavorite,
    ListFavorites,
    UseFavorite(usize),
    ListRecent,
    UseRecent(usize),
    ListHistory,
    UseHistory(usize),
    ClearHistory,
    Help,
    Quit,
}

fn parse_index(arg: Option<&str>) -> Result<usize> {
    let arg = arg.ok_or_else(|| anyhow!("Missing number"))?;
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => bail!("Not a list number: {}", arg),
    }
}

fn parse_code(arg: Option<&str>) -> Result<String> {
    match arg {
        Some(code) if code.chars().all(|c| c.is_ascii_alphabetic()) => Ok(code.to_uppercase()),
        Some(code) => bail!("Not a currency code: {}", code),
        None => bail!("Missing currency code"),
    }
}

fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Commit);
    }
    if let Some(amount) = line.strip_prefix('=') {
        return Ok(Command::Edit(Input::EditTo(amount.trim().to_string())));
    }
    if line.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Ok(Command::Edit(Input::EditFrom(line.to_string())));
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, Some(rest.trim()).filter(|r| !r.is_empty())),
        None => (line, None),
    };

    let command = match word.to_lowercase().as_str() {
        "enter" => Command::Commit,
        "save" => Command::Save(rest.map(str::to_string)),
        "swap" => Command::Edit(Input::Swap),
        "from" => Command::Edit(Input::SetFromCurrency(parse_code(rest)?)),
        "to" => Command::Edit(Input::SetToCurrency(parse_code(rest)?)),
        "del" => Command::Edit(Input::Keypad(KeypadKey::Backspace)),
        "clear" => Command::Edit(Input::Keypad(KeypadKey::Clear)),
        "fav" => Command::ToggleFavorite,
        "favs" => Command::ListFavorites,
        "use" => Command::UseFavorite(parse_index(rest)?),
        "recent" => Command::ListRecent,
        "r" => Command::UseRecent(parse_index(rest)?),
        "history" => Command::ListHistory,
        "h" => Command::UseHistory(parse_index(rest)?),
        "clear-history" => Command::ClearHistory,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("Unknown command: {} (try `help`)", other),
    };
    Ok(command)
}

type RateResult = (u64, Result<RateTable>);

struct Session<'a> {
    converter: &'a mut Converter,
    provider: Arc<dyn CurrencyRateProvider>,
    rates_tx: mpsc::UnboundedSender<RateResult>,
}

impl Session<'_> {
    fn fetch(&self, request: RateRequest) {
        debug!("Fetching rates for {} (seq {})", request.base, request.seq);
        let provider = Arc::clone(&self.provider);
        let tx = self.rates_tx.clone();
        tokio::spawn(async move {
            let result = provider.latest_rates(&request.base).await;
            // The receiver is gone once the session ends.
            let _ = tx.send((request.seq, result));
        });
    }

    fn apply(&mut self, input: Input) {
        if let Some(request) = self.converter.apply(input, Instant::now()) {
            self.fetch(request);
        }
    }

    fn render(&self) {
        let state = self.converter.state();
        ui::print_separator();
        for line in conversion_lines(state) {
            println!("{}", ui::style_text(&line, ui::StyleType::Value));
        }
        let favorite = if self.converter.is_favorite() {
            "★ favorite"
        } else {
            "☆"
        };
        println!(
            "{}",
            ui::style_text(
                &format!("{} · {}", state.last_edited, favorite),
                ui::StyleType::Subtle
            )
        );
    }

    fn show_recent(&self) {
        let state = self.converter.state();
        let entries = self.converter.visible_recent_amounts();
        if entries.is_empty() {
            println!("No recent amounts for this pair.");
        } else {
            println!(
                "{}",
                recent_table(&entries, &state.from_currency, &state.to_currency)
            );
        }
    }

    fn show_favorites(&self) {
        let pairs = self.converter.favorites().pairs();
        if pairs.is_empty() {
            println!("No favorite pairs yet.");
        }
        for (i, pair) in pairs.iter().enumerate() {
            println!("{:>3}. {}", i + 1, pair_label(pair));
        }
    }

    fn show_history(&self) {
        let entries = self.converter.history().recent(HISTORY_PREVIEW);
        if entries.is_empty() {
            println!("No conversions saved yet.");
        } else {
            println!("{}", history_table(entries, Utc::now()));
        }
    }

    /// Runs one command. Returns false when the session should end.
    async fn execute(&mut self, command: Command) -> Result<bool> {
        let now = Instant::now();
        match command {
            Command::Edit(input) => {
                self.apply(input);
                self.render();
            }
            Command::Commit => {
                if self.converter.commit().await.is_some() {
                    println!("{}", ui::style_text("Recorded", ui::StyleType::Subtle));
                }
            }
            Command::Save(description) => {
                let notification = self.converter.save(description).await;
                println!("{}", ui::notification_text(&notification));
            }
            Command::ToggleFavorite => {
                self.converter.toggle_favorite().await;
                self.render();
            }
            Command::ListFavorites => self.show_favorites(),
            Command::UseFavorite(index) => {
                let id = self
                    .converter
                    .favorites()
                    .pairs()
                    .get(index)
                    .map(|p| p.id.clone())
                    .ok_or_else(|| anyhow!("No favorite #{}", index + 1))?;
                if let Some(request) = self.converter.load_favorite(&id, now) {
                    self.fetch(request);
                }
                self.render();
            }
            Command::ListRecent => self.show_recent(),
            Command::UseRecent(index) => {
                if !self.converter.load_recent(index, now) {
                    bail!("No recent amount #{}", index + 1);
                }
                self.render();
            }
            Command::ListHistory => self.show_history(),
            Command::UseHistory(index) => {
                let id = self
                    .converter
                    .history()
                    .entries()
                    .get(index)
                    .map(|e| e.id.clone())
                    .ok_or_else(|| anyhow!("No history entry #{}", index + 1))?;
                if let Some(request) = self.converter.load_history_entry(&id, now) {
                    self.fetch(request);
                }
                self.render();
            }
            Command::ClearHistory => {
                if let Some(request) = self.converter.clear_history(now).await {
                    self.fetch(request);
                }
                println!("History cleared");
                self.render();
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn rates_arrived(&mut self, seq: u64, result: Result<RateTable>) {
        match result {
            Ok(table) => {
                self.apply(Input::RatesLoaded { seq, table });
                self.render();
            }
            Err(e) => {
                warn!(error = %e, "Failed to load rates");
                println!(
                    "{}",
                    ui::style_text(&format!("Could not load rates: {e}"), ui::StyleType::Error)
                );
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

pub async fn run(converter: &mut Converter, provider: Arc<dyn CurrencyRateProvider>) -> Result<()> {
    let (rates_tx, mut rates_rx) = mpsc::unbounded_channel();
    let mut session = Session {
        converter,
        provider,
        rates_tx,
    };

    println!(
        "{}",
        ui::style_text("xfx currency converter (type `help`)", ui::StyleType::Title)
    );
    let request = session.converter.request_rates();
    session.fetch(request);
    session.render();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let deadline = session.converter.next_deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let keep_going = match parse_command(&line) {
                    Ok(command) => session.execute(command).await,
                    Err(e) => Err(e),
                };
                match keep_going {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
                }
            }
            Some((seq, result)) = rates_rx.recv() => session.rates_arrived(seq, result),
            _ = wait_until(deadline) => {
                if session.converter.tick(Instant::now()) {
                    debug!("Recent amounts changed");
                }
            }
        }
    }

    session.converter.settle();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_edits() {
        assert_eq!(
            parse_command("1250.5").unwrap(),
            Command::Edit(Input::EditFrom("1250.5".to_string()))
        );
        assert_eq!(
            parse_command(".5").unwrap(),
            Command::Edit(Input::EditFrom(".5".to_string()))
        );
        assert_eq!(
            parse_command("= 90").unwrap(),
            Command::Edit(Input::EditTo("90".to_string()))
        );
    }

    #[test]
    fn test_parse_words() {
        assert_eq!(parse_command("").unwrap(), Command::Commit);
        assert_eq!(parse_command("  enter ").unwrap(), Command::Commit);
        assert_eq!(parse_command("swap").unwrap(), Command::Edit(Input::Swap));
        assert_eq!(
            parse_command("from gbp").unwrap(),
            Command::Edit(Input::SetFromCurrency("GBP".to_string()))
        );
        assert_eq!(
            parse_command("to JPY").unwrap(),
            Command::Edit(Input::SetToCurrency("JPY".to_string()))
        );
        assert_eq!(
            parse_command("del").unwrap(),
            Command::Edit(Input::Keypad(KeypadKey::Backspace))
        );
        assert_eq!(parse_command("save").unwrap(), Command::Save(None));
        assert_eq!(
            parse_command("save team lunch").unwrap(),
            Command::Save(Some("team lunch".to_string()))
        );
        assert_eq!(parse_command("use 2").unwrap(), Command::UseFavorite(1));
        assert_eq!(parse_command("r 1").unwrap(), Command::UseRecent(0));
        assert_eq!(parse_command("h 3").unwrap(), Command::UseHistory(2));
        assert_eq!(parse_command("clear-history").unwrap(), Command::ClearHistory);
        assert_eq!(parse_command("QUIT").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("from").is_err());
        assert!(parse_command("from U$D").is_err());
        assert!(parse_command("use 0").is_err());
        assert!(parse_command("r x").is_err());
        assert!(parse_command("dance").is_err());
    }
}
