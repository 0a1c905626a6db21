/// Chain-of-custody ledger for a single acquisition run
///
/// The ledger is append-only: events are stamped when they are recorded and
/// are never edited, reordered or removed afterwards.
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Handling actions recorded by the acquisition workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustodyAction {
    OriginalHashed,
    ImageCreated,
    ImageHashed,
    IntegrityVerified,
    VerificationFailed,
}

impl CustodyAction {
    /// Text written to the ledger for this action
    pub fn description(&self) -> &'static str {
        match self {
            Self::OriginalHashed => "Computed original hash",
            Self::ImageCreated => "Created forensic image",
            Self::ImageHashed => "Computed hash of forensic image",
            Self::IntegrityVerified => "Verified integrity of forensic image",
            Self::VerificationFailed => "Verification failed",
        }
    }
}

impl fmt::Display for CustodyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<CustodyAction> for String {
    fn from(action: CustodyAction) -> Self {
        action.description().to_string()
    }
}

/// Single chain-of-custody record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyEvent {
    /// Wall-clock time (UTC, whole seconds)
    #[serde(with = "timestamp_format")]
    timestamp: DateTime<Utc>,

    /// What was done
    action: String,

    /// File the action was performed on
    #[serde(rename = "file")]
    subject_path: String,

    /// Custodian who performed the action
    #[serde(rename = "person")]
    actor: String,
}

impl CustodyEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn subject_path(&self) -> &str {
        &self.subject_path
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }
}

impl fmt::Display for CustodyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {:<38}  {}  ({})",
            self.timestamp.format(timestamp_format::FORMAT),
            self.action,
            self.subject_path,
            self.actor
        )
    }
}

/// Append-only, in-memory custody log owned by one acquisition run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyLedger {
    run_id: Uuid,
    events: Vec<CustodyEvent>,
}

impl CustodyLedger {
    /// Create an empty ledger with a fresh run ID
    pub fn new() -> Self {
        Self::with_run_id(Uuid::new_v4())
    }

    pub fn with_run_id(run_id: Uuid) -> Self {
        Self {
            run_id,
            events: Vec::new(),
        }
    }

    /// Record an event stamped with the current time
    pub fn append(
        &mut self,
        action: impl Into<String>,
        subject_path: impl Into<String>,
        actor: impl Into<String>,
    ) -> &CustodyEvent {
        let event = CustodyEvent {
            timestamp: Utc::now().trunc_subsecs(0),
            action: action.into(),
            subject_path: subject_path.into(),
            actor: actor.into(),
        };

        tracing::info!(
            run_id = %self.run_id,
            actor = %event.actor,
            "custody: {} [{}]",
            event.action,
            event.subject_path
        );

        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// All events in the order they were appended
    pub fn render(&self) -> &[CustodyEvent] {
        &self.events
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&CustodyEvent> {
        self.events.last()
    }

    /// Pretty-printed JSON array of the events
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}

impl Default for CustodyLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CustodyLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Chain of Custody Log (run {}):", self.run_id)?;
        for event in &self.events {
            writeln!(f, "  {}", event)?;
        }
        Ok(())
    }
}

/// `YYYY-MM-DD HH:MM:SS` in UTC
mod timestamp_format {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
