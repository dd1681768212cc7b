use std::env;
use std::error::Error;
use std::io;
use std::process::ExitCode;

use chrono::NaiveDate;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use chip_ledger::csv::{read_lines, write_lines, write_standings};
use chip_ledger::engine::PhaseKind;
use chip_ledger::{Config, DateRange, FileDraftStore, Ledger, MemoryDraftStore, MemoryStore};

const USAGE: &str = "usage: chip-ledger standings <sessions.csv> [--from YYYY-MM-DD] [--to YYYY-MM-DD]
       chip-ledger settle <draft.json>";

type CliResult = Result<(), Box<dyn Error>>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("standings") => standings(&args[1..]).await,
        Some("settle") => settle(&args[1..]).await,
        _ => Err(USAGE.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Print standings for an exported sessions csv
async fn standings(args: &[String]) -> CliResult {
    let (path, range) = parse_standings_args(args)?;

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let rows = read_lines(path)?;
    let (line_sender, line_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in rows {
            match result {
                Ok(line) => {
                    if line_sender.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    let store = MemoryStore::new();
    store.ingest(ReceiverStream::new(line_receiver)).await;

    let ledger = Ledger::new(store, MemoryDraftStore::new(), Config::from_env()?);
    let standings = ledger.standings(&range).await?;
    write_standings(io::stdout().lock(), &standings)?;
    Ok(())
}

/// Commit a drafted session and print the new rows. The draft is cleared on success.
async fn settle(args: &[String]) -> CliResult {
    let [path] = args else {
        return Err(USAGE.into());
    };

    let ledger = Ledger::new(
        MemoryStore::new(),
        FileDraftStore::new(path),
        Config::from_env()?,
    );
    let mut session = ledger.restore_draft()?;
    if session.phase() == PhaseKind::Collecting {
        session.convert()?;
    }
    let event = ledger.commit(&mut session).await?;
    write_lines(io::stdout().lock(), &event.lines)?;
    Ok(())
}

fn parse_standings_args(args: &[String]) -> Result<(String, DateRange), Box<dyn Error>> {
    let mut path = None;
    let mut range = DateRange::all();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--from" => range.start = Some(parse_date(iter.next())?),
            "--to" => range.end = Some(parse_date(iter.next())?),
            other if path.is_none() => path = Some(other.to_string()),
            other => return Err(format!("unexpected argument '{other}'\n{USAGE}").into()),
        }
    }
    let path = path.ok_or(USAGE)?;
    Ok((path, range))
}

fn parse_date(value: Option<&String>) -> Result<NaiveDate, Box<dyn Error>> {
    let value = value.ok_or(USAGE)?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{value}': {e}").into())
}
