use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::consultation::{
    ConsultationRecord, ConsultationRequest, ConsultationStatus, ConsultationTriage, Priority,
};
use super::intake::{ApplicationDetails, LoanApplication, LoanStatus};
use crate::types::{LoanType, Money};

pub const MAX_LIST_LIMIT: usize = 100;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record {0} not found")]
    NotFound(u64),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Optional filters for listing applications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LoanStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_type: Option<LoanType>,
}

impl ApplicationFilter {
    fn matches(&self, application: &LoanApplication) -> bool {
        self.status.map_or(true, |s| application.details.status == s)
            && self.loan_type.map_or(true, |t| application.details.loan_type == t)
    }
}

/// Outcome of a status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub application_id: u64,
    pub old_status: LoanStatus,
    pub new_status: LoanStatus,
    pub updated_at: DateTime<Utc>,
}

/// Storage abstraction for loan applications.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, details: ApplicationDetails) -> Result<LoanApplication, RepositoryError>;
    fn fetch(&self, id: u64) -> Result<Option<LoanApplication>, RepositoryError>;
    /// Applications in submission order; `limit` must be within 1..=100.
    fn list(
        &self,
        filter: &ApplicationFilter,
        limit: usize,
    ) -> Result<Vec<LoanApplication>, RepositoryError>;
    fn all(&self) -> Result<Vec<LoanApplication>, RepositoryError>;
    /// Set the status, stamping approval or disbursement dates as appropriate.
    fn update_status(
        &self,
        id: u64,
        new_status: LoanStatus,
        remarks: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<StatusChange, RepositoryError>;
}

/// Storage abstraction for expert consultation requests.
pub trait ConsultationRepository: Send + Sync {
    fn insert(
        &self,
        request: ConsultationRequest,
        triage: ConsultationTriage,
        submitted_at: DateTime<Utc>,
    ) -> Result<ConsultationRecord, RepositoryError>;
    fn all(&self) -> Result<Vec<ConsultationRecord>, RepositoryError>;
    fn summary(&self) -> Result<ConsultationSummary, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationSummary {
    pub total: usize,
    pub pending: usize,
    pub high_priority: usize,
    pub average_loan_amount: Money,
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Table<T> {
    next_id: u64,
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: Vec::new(),
        }
    }
}

impl<T> Table<T> {
    /// Seed with existing rows; new ids continue after the highest one.
    fn seeded(rows: Vec<T>, id_of: impl Fn(&T) -> u64) -> Self {
        let next_id = rows.iter().map(id_of).max().unwrap_or(0);
        Self { next_id, rows }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn read<T>(lock: &RwLock<Table<T>>) -> Result<RwLockReadGuard<'_, Table<T>>, RepositoryError> {
    lock.read()
        .map_err(|_| RepositoryError::Unavailable("lock poisoned".into()))
}

fn write<T>(lock: &RwLock<Table<T>>) -> Result<RwLockWriteGuard<'_, Table<T>>, RepositoryError> {
    lock.write()
        .map_err(|_| RepositoryError::Unavailable("lock poisoned".into()))
}

/// Process-local application store for tests, demos and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryApplicationRepository {
    table: RwLock<Table<LoanApplication>>,
}

impl InMemoryApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore previously stored applications, keeping their ids.
    pub fn from_records(applications: Vec<LoanApplication>) -> Self {
        Self {
            table: RwLock::new(Table::seeded(applications, |a| a.id)),
        }
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, details: ApplicationDetails) -> Result<LoanApplication, RepositoryError> {
        let mut table = write(&self.table)?;
        let application = LoanApplication {
            id: table.allocate_id(),
            details,
        };
        table.rows.push(application.clone());
        tracing::debug!(id = application.id, "stored loan application");
        Ok(application)
    }

    fn fetch(&self, id: u64) -> Result<Option<LoanApplication>, RepositoryError> {
        let table = read(&self.table)?;
        Ok(table.rows.iter().find(|a| a.id == id).cloned())
    }

    fn list(
        &self,
        filter: &ApplicationFilter,
        limit: usize,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        if limit == 0 || limit > MAX_LIST_LIMIT {
            return Err(RepositoryError::InvalidQuery(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}, got {limit}"
            )));
        }
        let table = read(&self.table)?;
        Ok(table
            .rows
            .iter()
            .filter(|a| filter.matches(a))
            .take(limit)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<LoanApplication>, RepositoryError> {
        Ok(read(&self.table)?.rows.clone())
    }

    fn update_status(
        &self,
        id: u64,
        new_status: LoanStatus,
        remarks: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<StatusChange, RepositoryError> {
        let mut table = write(&self.table)?;
        let application = table
            .rows
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound(id))?;

        let details = &mut application.details;
        let old_status = details.status;
        details.status = new_status;
        match new_status {
            LoanStatus::Approved => details.approval_date = Some(at),
            LoanStatus::Disbursed => details.disbursement_date = Some(at),
            _ => {}
        }
        if let Some(remarks) = remarks {
            details.remarks = Some(remarks);
        }

        tracing::info!(id, %old_status, %new_status, "application status changed");

        Ok(StatusChange {
            application_id: id,
            old_status,
            new_status,
            updated_at: at,
        })
    }
}

/// Process-local consultation store.
#[derive(Debug, Default)]
pub struct InMemoryConsultationRepository {
    table: RwLock<Table<ConsultationRecord>>,
}

impl InMemoryConsultationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore previously stored consultations, keeping their ids.
    pub fn from_records(records: Vec<ConsultationRecord>) -> Self {
        Self {
            table: RwLock::new(Table::seeded(records, |r| r.id)),
        }
    }
}

impl ConsultationRepository for InMemoryConsultationRepository {
    fn insert(
        &self,
        request: ConsultationRequest,
        triage: ConsultationTriage,
        submitted_at: DateTime<Utc>,
    ) -> Result<ConsultationRecord, RepositoryError> {
        let mut table = write(&self.table)?;
        let record = ConsultationRecord {
            id: table.allocate_id(),
            request,
            triage,
            status: ConsultationStatus::Pending,
            submitted_at,
            assigned_expert: None,
            scheduled_call_time: None,
        };
        table.rows.push(record.clone());
        Ok(record)
    }

    fn all(&self) -> Result<Vec<ConsultationRecord>, RepositoryError> {
        Ok(read(&self.table)?.rows.clone())
    }

    fn summary(&self) -> Result<ConsultationSummary, RepositoryError> {
        let table = read(&self.table)?;
        let total = table.rows.len();
        let pending = table
            .rows
            .iter()
            .filter(|r| r.status == ConsultationStatus::Pending)
            .count();
        let high_priority = table
            .rows
            .iter()
            .filter(|r| r.triage.priority == Priority::High)
            .count();
        let average_loan_amount = if total == 0 {
            Money::ZERO
        } else {
            let sum: Money = table.rows.iter().map(|r| r.request.loan_amount).sum();
            (sum / Money::from(total)).round_dp(2)
        };
        Ok(ConsultationSummary {
            total,
            pending,
            high_priority,
            average_loan_amount,
        })
    }
}
