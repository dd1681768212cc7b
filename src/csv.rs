use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::amount::Currency;
use crate::error::ValidationError;
use crate::model::{EventId, LedgerLine, LineId, LineStatus, PlayerName};
use crate::ranking::Standing;

/// Errors that can occur when reading or writing ledger csv files
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: {source}")]
    InvalidRow {
        line: usize,
        source: ValidationError,
    },

    #[error("failed to write csv: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to flush csv: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct LineRow {
    id: LineId,
    event_id: EventId,
    player_name: String,
    amount: i64,
    status: LineStatus,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct StandingRow<'a> {
    rank: usize,
    name: &'a str,
    total: i64,
    games: u32,
}

/// Read exported ledger rows from a csv file
pub fn read_lines(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<LedgerLine, CsvError>>, CsvError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<LineRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            let player = PlayerName::new(&row.player_name)
                .map_err(|source| CsvError::InvalidRow { line, source })?;
            Ok(LedgerLine {
                id: row.id,
                event_id: row.event_id,
                player,
                amount: Currency::new(row.amount),
                status: row.status,
                created_at: row.created_at,
            })
        }))
}

/// Write ledger rows in the format [`read_lines`] accepts
pub fn write_lines<'a>(
    writer: impl io::Write,
    lines: impl IntoIterator<Item = &'a LedgerLine>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);
    for line in lines {
        writer.serialize(LineRow {
            id: line.id,
            event_id: line.event_id,
            player_name: line.player.to_string(),
            amount: line.amount.value(),
            status: line.status,
            created_at: line.created_at,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Write standings with their 1-based rank
pub fn write_standings<'a>(
    writer: impl io::Write,
    standings: impl IntoIterator<Item = &'a Standing>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);
    for (idx, standing) in standings.into_iter().enumerate() {
        writer.serialize(StandingRow {
            rank: idx + 1,
            name: standing.name.as_str(),
            total: standing.total.value(),
            games: standing.games,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EVENT: &str = "6f1c1a52-8d0e-4b7e-9a57-3f0e2d7b9c11";

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn read_all(content: &str) -> Vec<Result<LedgerLine, CsvError>> {
        let file = write_csv(content);
        read_lines(file.path()).unwrap().collect()
    }

    #[test]
    fn read_line() {
        let results = read_all(&format!(
            "id,event_id,player_name,amount,status,created_at\n\
             7,{EVENT},Alice,-1500,unsettled,2024-03-01T21:30:00Z\n"
        ));
        assert_eq!(results.len(), 1);

        let line = results.into_iter().next().unwrap().unwrap();
        assert_eq!(line.id, 7);
        assert_eq!(line.event_id.to_string(), EVENT);
        assert_eq!(line.player.as_str(), "Alice");
        assert_eq!(line.amount, Currency::new(-1500));
        assert_eq!(line.status, LineStatus::Unsettled);
        assert_eq!(
            line.created_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 21, 30, 0).unwrap()
        );
    }

    #[test]
    fn read_with_whitespace() {
        let results = read_all(&format!(
            "id, event_id, player_name, amount, status, created_at\n\
             1, {EVENT}, Bob , 200, settled, 2024-03-01T21:30:00Z\n"
        ));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().player.as_str(), "Bob");
    }

    #[test]
    fn read_returns_error_for_bad_status() {
        let results = read_all(&format!(
            "id,event_id,player_name,amount,status,created_at\n\
             1,{EVENT},Bob,200,paid,2024-03-01T21:30:00Z\n"
        ));
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::Parse { line: 2, .. }
        ));
    }

    #[test]
    fn read_returns_error_for_empty_name() {
        let results = read_all(&format!(
            "id,event_id,player_name,amount,status,created_at\n\
             1,{EVENT},Bob,200,settled,2024-03-01T21:30:00Z\n\
             2,{EVENT},,-200,settled,2024-03-01T21:30:00Z\n"
        ));
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1].as_ref().unwrap_err(),
            CsvError::InvalidRow {
                line: 3,
                source: ValidationError::EmptyPlayerName
            }
        ));
    }

    #[test]
    fn missing_file_is_open_error() {
        assert!(matches!(
            read_lines("/nonexistent/sessions.csv"),
            Err(CsvError::Open { .. })
        ));
    }

    #[test]
    fn written_lines_read_back() {
        let line = LedgerLine {
            id: 3,
            event_id: EventId::generate(),
            player: PlayerName::new("Carol").unwrap(),
            amount: Currency::new(2500),
            status: LineStatus::Settled,
            created_at: Utc.with_ymd_and_hms(2024, 6, 9, 23, 5, 0).unwrap(),
        };
        let mut out = Vec::new();
        write_lines(&mut out, [&line]).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("id,event_id,player_name,amount,status,created_at\n"));
        let read: Vec<_> = read_all(&text).into_iter().map(Result::unwrap).collect();
        assert_eq!(read, vec![line]);
    }

    #[test]
    fn standings_have_rank_column() {
        let standings = vec![
            Standing {
                name: PlayerName::new("A").unwrap(),
                total: Currency::new(2000),
                games: 2,
            },
            Standing {
                name: PlayerName::new("B").unwrap(),
                total: Currency::new(-2000),
                games: 2,
            },
        ];
        let mut out = Vec::new();
        write_standings(&mut out, &standings).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "rank,name,total,games\n1,A,2000,2\n2,B,-2000,2\n"
        );
    }
}
