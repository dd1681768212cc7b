pub mod amount;
pub mod chips;
pub mod config;
pub mod csv;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod loans;
pub mod model;
pub mod ranking;
pub mod split;
pub mod store;

pub use amount::{Currency, Points, Ratio, Unit, UnitConverter};
pub use chips::{ChipCount, ChipTally};
pub use config::Config;
pub use engine::{Session, SessionError, SnapshotError};
pub use ledger::{Ledger, LedgerError};
pub use loans::LoanLedger;
pub use model::{EventId, LedgerLine, LineStatus, Loan, Party, PlayerName, SettlementEvent};
pub use ranking::{DateRange, Standing};
pub use store::{DraftStore, FileDraftStore, LedgerStore, MemoryDraftStore, MemoryStore};
