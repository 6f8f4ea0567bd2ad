//! Property (backing claim) state machine
//!
//! A property is an appraised real-world asset whose value is vested into
//! the backing of a tradable symbol over its duration. Progress is tracked
//! by two interval counters: the initial phase (first quarter of the
//! schedule, weighted 1/4) and the approval phase (weighted 3/4). The
//! approval phase only advances once the issuer has approved the claim.
//!
//! Lifecycle:
//! ```text
//! Initial ──(25% passed, unapproved)──> AwaitingApproval ──(deadline)──> Expired
//!    │                                        │
//!    │                                  (late approval)
//!    │                                        v
//!    └──────(approved early, deadline)──> Matured <──(deadline)── Restarted
//! ```

use crate::error::{BackingError, Result};
use crate::schedule::ScheduleCalculator;
use chrono::Duration;
use meta_core::constants::{MAX_SHARE_SUPPLY, MIN_PROPERTY_DURATION_MINUTES, VALUATION_MULTIPLIER};
use meta_core::types::is_valid_symbol;
use meta_core::{AccountId, Object, ObjectId, ObjectType, Timestamp};
use serde::{Deserialize, Serialize};

const MAX_TITLE_LEN: usize = 128;
const MAX_DESCRIPTION_LEN: usize = 4096;

/// Issuer-supplied description and valuation inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOptions {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub contact_email: String,
    /// Appraised value in monetary units
    pub appraised_value: u64,
    /// Total vesting duration in minutes
    pub duration_minutes: u32,
    /// Symbol whose backing this claim contributes to
    pub backing_asset: String,
}

impl PropertyOptions {
    pub fn validate(&self) -> Result<()> {
        if self.duration_minutes < MIN_PROPERTY_DURATION_MINUTES {
            return Err(BackingError::DurationTooShort {
                minutes: self.duration_minutes,
                min: MIN_PROPERTY_DURATION_MINUTES,
            });
        }
        if self.appraised_value == 0 || self.appraised_value > MAX_SHARE_SUPPLY {
            return Err(BackingError::InvalidAppraisedValue(self.appraised_value));
        }
        if !is_valid_symbol(&self.backing_asset) {
            return Err(BackingError::InvalidOptions(format!(
                "invalid backing asset symbol {}",
                self.backing_asset
            )));
        }
        validate_descriptive(&self.title, &self.description, &self.contact_email)
    }
}

/// Descriptive fields the issuer may change after creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl PropertyUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.contact_email.is_none()
    }

    /// Options as they would look after applying this update
    pub fn applied_to(&self, options: &PropertyOptions) -> PropertyOptions {
        let mut updated = options.clone();
        if let Some(title) = &self.title {
            updated.title = title.clone();
        }
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        if let Some(email) = &self.contact_email {
            updated.contact_email = email.clone();
        }
        updated
    }
}

fn validate_descriptive(title: &str, description: &str, email: &str) -> Result<()> {
    if title.trim().is_empty() || title.len() > MAX_TITLE_LEN {
        return Err(BackingError::InvalidOptions(format!(
            "title must be 1..={} characters",
            MAX_TITLE_LEN
        )));
    }
    if description.len() > MAX_DESCRIPTION_LEN {
        return Err(BackingError::InvalidOptions(format!(
            "description exceeds {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    if !is_valid_email(email) {
        return Err(BackingError::InvalidOptions(format!(
            "invalid contact email {}",
            email
        )));
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => {
            !host.is_empty()
                && !host.starts_with('.')
                && !host.ends_with('.')
                && tld.len() >= 2
                && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

/// How a schedule ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalState {
    /// Reached the deadline approved; contributes its full value
    MaturedApproved,
    /// Reached the deadline unapproved; contributes nothing
    ExpiredUnapproved,
}

/// Position of a property in its lifecycle at a given head time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Before the 25% point, or approved before it and still running
    Initial,
    /// Past the 25% point and not approved; progress is frozen
    AwaitingApproval,
    /// Approved after the 25% point on a re-derived approval phase
    Restarted,
    Matured,
    Expired,
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Already terminal, or nothing was due
    Idle,
    /// Waiting for approval past the 25% point
    Frozen,
    /// Caught up this many intervals
    Advanced(u32),
    Matured,
    Expired,
}

/// Exact progress fraction `numerator / denominator` in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub numerator: u128,
    pub denominator: u128,
}

impl Progress {
    /// `(ic/icm)/4 + (ac/acm)·3/4`, a phase with a zero max contributes 0
    pub fn from_counters(ic: u32, icm: u32, ac: u32, acm: u32) -> Self {
        let (ic, icm, ac, acm) = (ic as u128, icm as u128, ac as u128, acm as u128);
        match (icm, acm) {
            (0, 0) => Progress {
                numerator: 0,
                denominator: 1,
            },
            (0, _) => Progress {
                numerator: 3 * ac,
                denominator: 4 * acm,
            },
            (_, 0) => Progress {
                numerator: ic,
                denominator: 4 * icm,
            },
            _ => Progress {
                numerator: ic * acm + 3 * ac * icm,
                denominator: 4 * icm * acm,
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.numerator == self.denominator
    }

    /// `floor(amount · self)`
    pub fn apply_to(&self, amount: u128) -> u128 {
        amount.saturating_mul(self.numerator) / self.denominator
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: ObjectId,
    pub claim_id: u32,
    pub issuer: AccountId,
    pub options: PropertyOptions,
    /// Schedule start, on the allocation grid
    pub created: Timestamp,
    /// The 25% point
    pub initial_end_date: Timestamp,
    pub initial_counter: u32,
    pub initial_counter_max: u32,
    /// The 100% point and approval deadline
    pub approval_end_date: Timestamp,
    pub approval_counter: u32,
    pub approval_counter_max: u32,
    pub next_allocation_time: Timestamp,
    pub approval_time: Option<Timestamp>,
    /// Set when the approval phase was re-derived by a late approval
    #[serde(default)]
    pub restarted: bool,
    pub terminal: Option<TerminalState>,
}

impl Object for Property {
    const OBJECT_TYPE: ObjectType = ObjectType::Property;
    type Key = u32;

    fn unique_key(&self) -> u32 {
        self.claim_id
    }
}

impl Property {
    /// Register a claim whose schedule starts at the grid point preceding
    /// `head_time`
    pub fn new(
        id: ObjectId,
        claim_id: u32,
        issuer: AccountId,
        options: PropertyOptions,
        head_time: Timestamp,
        calc: &ScheduleCalculator,
    ) -> Result<Self> {
        options.validate()?;

        let start = calc.clock().preceding_boundary(head_time);
        let params =
            calc.initial_parameters(start, Duration::minutes(options.duration_minutes as i64))?;
        let next_allocation_time = calc.offset(start, calc.clock().interval())?;

        Ok(Self {
            id,
            claim_id,
            issuer,
            options,
            created: start,
            initial_end_date: params.time_to_25_percent,
            initial_counter: 0,
            initial_counter_max: params.initial_counter_max,
            approval_end_date: params.time_to_100_percent,
            approval_counter: 0,
            approval_counter_max: params.approval_counter_max,
            next_allocation_time,
            approval_time: None,
            restarted: false,
            terminal: None,
        })
    }

    pub fn backing_asset(&self) -> &str {
        &self.options.backing_asset
    }

    pub fn is_approved(&self) -> bool {
        self.approval_time.is_some()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    pub fn stage(&self, head_time: Timestamp) -> Stage {
        match self.terminal {
            Some(TerminalState::MaturedApproved) => Stage::Matured,
            Some(TerminalState::ExpiredUnapproved) => Stage::Expired,
            None if self.restarted => Stage::Restarted,
            None if !self.is_approved() && head_time > self.initial_end_date => {
                Stage::AwaitingApproval
            }
            None => Stage::Initial,
        }
    }

    /// Advance the schedule to `head_time`. Ticking twice at the same head
    /// time is a no-op.
    pub fn tick(&mut self, head_time: Timestamp, calc: &ScheduleCalculator) -> TickOutcome {
        if self.is_terminal() {
            return TickOutcome::Idle;
        }

        if head_time >= self.approval_end_date {
            if self.is_approved() {
                self.initial_counter = self.initial_counter_max;
                self.approval_counter = self.approval_counter_max;
                self.terminal = Some(TerminalState::MaturedApproved);
                return TickOutcome::Matured;
            }
            self.initial_counter = 0;
            self.approval_counter = 0;
            self.terminal = Some(TerminalState::ExpiredUnapproved);
            return TickOutcome::Expired;
        }

        if head_time > self.initial_end_date && !self.is_approved() {
            return TickOutcome::Frozen;
        }

        let interval = calc.clock().interval();
        let approved = self.is_approved();
        let mut advanced = 0;
        while self.next_allocation_time <= head_time {
            let Some(next) = self.next_allocation_time.checked_add_signed(interval) else {
                break;
            };
            self.next_allocation_time = next;
            if self.initial_counter < self.initial_counter_max {
                self.initial_counter += 1;
            } else if approved && self.approval_counter < self.approval_counter_max {
                self.approval_counter += 1;
            }
            advanced += 1;
        }

        if advanced == 0 {
            TickOutcome::Idle
        } else {
            TickOutcome::Advanced(advanced)
        }
    }

    /// Check that an approval at `head_time` would be accepted
    pub fn check_approvable(&self, head_time: Timestamp) -> Result<()> {
        if self.is_approved() {
            return Err(BackingError::AlreadyApproved(self.claim_id));
        }
        if self.is_terminal() || head_time >= self.approval_end_date {
            return Err(BackingError::ApprovalDeadlinePassed {
                claim_id: self.claim_id,
                deadline: self.approval_end_date,
            });
        }
        Ok(())
    }

    /// Approve the claim. Past the 25% point the approval phase is
    /// re-derived so the remaining progress completes by the original
    /// deadline.
    pub fn approve(&mut self, head_time: Timestamp, calc: &ScheduleCalculator) -> Result<()> {
        self.check_approvable(head_time)?;

        if head_time < self.initial_end_date {
            self.approval_time = Some(head_time);
            return Ok(());
        }

        let restart = calc.restart_parameters(head_time, self.approval_end_date)?;
        if self.approval_counter != 0 {
            return Err(BackingError::ApprovalCounterNotZero(self.claim_id));
        }
        let next_allocation_time = calc.offset(restart.restart_time, calc.clock().interval())?;

        self.approval_time = Some(restart.restart_time);
        self.approval_counter_max = restart.intervals_to_end;
        self.next_allocation_time = next_allocation_time;
        self.restarted = true;
        log::debug!(
            "Property {} approval phase restarted at {} with {} intervals to {}",
            self.claim_id,
            restart.restart_time,
            restart.intervals_to_end,
            self.approval_end_date
        );
        Ok(())
    }

    pub fn update_options(&mut self, update: &PropertyUpdate) -> Result<()> {
        let updated = update.applied_to(&self.options);
        validate_descriptive(&updated.title, &updated.description, &updated.contact_email)?;
        self.options = updated;
        Ok(())
    }

    /// Allocation progress, derived from the counters on demand
    pub fn progress(&self) -> Progress {
        Progress::from_counters(
            self.initial_counter,
            self.initial_counter_max,
            self.approval_counter,
            self.approval_counter_max,
        )
    }

    /// Value counted as backing once fully vested
    pub fn full_contribution(&self) -> u128 {
        self.options.appraised_value as u128 * VALUATION_MULTIPLIER as u128
    }

    /// Value currently counted as backing
    pub fn contribution(&self) -> u128 {
        self.progress().apply_to(self.full_contribution())
    }
}
