use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_stream::{Stream, StreamExt};

use super::{LedgerStore, StoreError};
use crate::model::{EventId, LedgerLine, LineId, LineStatus, NewEvent, PlayerName};
use crate::split::SplitPlan;

#[derive(Debug, Default)]
struct Tables {
    players: Vec<PlayerName>,
    lines: Vec<LedgerLine>,
    next_id: LineId,
}

impl Tables {
    fn push_line(&mut self, line: LedgerLine) {
        self.next_id = self.next_id.max(line.id + 1);
        self.lines.push(line);
    }

    fn insert_event(&mut self, event: &NewEvent, created_at: DateTime<Utc>) -> Vec<LedgerLine> {
        let inserted: Vec<LedgerLine> = event
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| LedgerLine {
                id: self.next_id + i as LineId,
                event_id: event.id,
                player: line.player.clone(),
                amount: line.amount,
                status: event.status,
                created_at,
            })
            .collect();
        self.next_id += inserted.len() as LineId;
        self.lines.extend(inserted.iter().cloned());
        inserted
    }
}

/// In-process [`LedgerStore`], also used to load exported rows.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    clock: fn() -> DateTime<Utc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Store whose inserts are stamped by `clock` instead of the system time.
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                next_id: 1,
                ..Tables::default()
            }),
            clock,
        }
    }

    /// Seed the store with existing rows, registering every player they name.
    pub fn from_lines(lines: impl IntoIterator<Item = LedgerLine>) -> Self {
        let mut store = Self::new();
        let tables = store.tables.get_mut();
        for line in lines {
            Self::seed(tables, line);
        }
        store
    }

    /// Seed the store from a stream of rows. Returns how many rows were loaded.
    pub async fn ingest(&self, mut stream: impl Stream<Item = LedgerLine> + Unpin) -> usize {
        let mut count = 0;
        while let Some(line) = stream.next().await {
            Self::seed(&mut *self.tables.lock().await, line);
            count += 1;
        }
        count
    }

    fn seed(tables: &mut Tables, line: LedgerLine) {
        if !tables.players.contains(&line.player) {
            tables.players.push(line.player.clone());
        }
        tables.push_line(line);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for MemoryStore {
    async fn list_players(&self) -> Result<Vec<PlayerName>, StoreError> {
        Ok(self.tables.lock().await.players.clone())
    }

    async fn insert_player(&self, player: &PlayerName) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.players.contains(player) {
            return Err(StoreError::DuplicatePlayer(player.clone()));
        }
        tables.players.push(player.clone());
        Ok(())
    }

    async fn delete_player(&self, player: &PlayerName) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let before = tables.players.len();
        tables.players.retain(|p| p != player);
        if tables.players.len() == before {
            return Err(StoreError::PlayerNotFound(player.clone()));
        }
        Ok(())
    }

    async fn list_lines(&self) -> Result<Vec<LedgerLine>, StoreError> {
        let mut lines = self.tables.lock().await.lines.clone();
        // stable: rows of one event keep their insertion order
        lines.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(lines)
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<Vec<LedgerLine>, StoreError> {
        let created_at = (self.clock)();
        Ok(self.tables.lock().await.insert_event(event, created_at))
    }

    async fn set_event_status(
        &self,
        event: &EventId,
        status: LineStatus,
    ) -> Result<usize, StoreError> {
        let mut tables = self.tables.lock().await;
        let mut touched = 0;
        for line in tables.lines.iter_mut().filter(|l| l.event_id == *event) {
            line.status = status;
            touched += 1;
        }
        if touched == 0 {
            return Err(StoreError::EventNotFound(*event));
        }
        Ok(touched)
    }

    async fn delete_event(&self, event: &EventId) -> Result<usize, StoreError> {
        let mut tables = self.tables.lock().await;
        let before = tables.lines.len();
        tables.lines.retain(|l| l.event_id != *event);
        let removed = before - tables.lines.len();
        if removed == 0 {
            return Err(StoreError::EventNotFound(*event));
        }
        Ok(removed)
    }

    async fn apply_split(&self, plan: &SplitPlan) -> Result<Vec<LedgerLine>, StoreError> {
        let created_at = (self.clock)();
        let mut tables = self.tables.lock().await;

        // Check every target before touching anything.
        let touched = plan
            .updates
            .iter()
            .map(|(id, _)| *id)
            .chain(plan.deletions.iter().copied());
        for id in touched {
            if !tables
                .lines
                .iter()
                .any(|l| l.id == id && l.event_id == plan.source)
            {
                return Err(StoreError::LineNotFound(id));
            }
        }

        for (id, remainder) in &plan.updates {
            if let Some(line) = tables.lines.iter_mut().find(|l| l.id == *id) {
                line.amount = *remainder;
            }
        }
        tables.lines.retain(|l| !plan.deletions.contains(&l.id));
        Ok(tables.insert_event(&plan.carved, created_at))
    }
}
