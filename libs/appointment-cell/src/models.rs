// libs/appointment-cell/src/models.rs
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

use shared_config::AppConfig;

pub const SLOT_TIME_FORMAT: &str = "%H:%M";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const START_TIME_FIELD: &str = "startTime";
pub const MINUTES_PER_DAY: u32 = 24 * 60;

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// A wall-clock appointment start time, always rendered as `HH:mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub(crate) fn from_minutes(minutes: u32) -> Option<Self> {
        Self::from_hm(minutes / 60, minutes % 60)
    }

    /// Minutes since midnight.
    pub fn minutes(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SLOT_TIME_FORMAT))
    }
}

impl FromStr for SlotTime {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the canonical zero-padded form is accepted, so that parsing and
        // formatting agree on exact string identity.
        let trimmed = s.trim();
        if trimmed.len() != 5 {
            return Err(AppointmentError::InvalidTime(s.to_string()));
        }
        NaiveTime::parse_from_str(trimmed, SLOT_TIME_FORMAT)
            .map(Self)
            .map_err(|_| AppointmentError::InvalidTime(s.to_string()))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: SlotTime,
    pub end: SlotTime,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: SlotTime(NaiveTime::from_hms_opt(8, 0, 0).unwrap()),
            end: SlotTime(NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
        }
    }
}

/// Scheduling parameters shared by every picker and guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingConfig {
    pub working_hours: WorkingHours,
    pub slot_duration_minutes: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            working_hours: WorkingHours::default(),
            slot_duration_minutes: shared_config::DEFAULT_SLOT_DURATION_MINUTES,
        }
    }
}

impl SchedulingConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, AppointmentError> {
        if config.slot_duration_minutes == 0 {
            return Err(AppointmentError::InvalidSlotDuration(config.slot_duration_minutes));
        }
        Ok(Self {
            working_hours: WorkingHours {
                start: config.working_hours_start.parse()?,
                end: config.working_hours_end.parse()?,
            },
            slot_duration_minutes: config.slot_duration_minutes,
        })
    }
}

/// Start times already booked for one provider on one date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupiedSet {
    times: HashSet<SlotTime>,
}

impl OccupiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from the strings returned by the appointment service.
    /// Entries that are not `HH:mm` cannot match any slot and are dropped.
    pub fn from_strings<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let times = raw
            .into_iter()
            .filter_map(|s| match s.as_ref().parse::<SlotTime>() {
                Ok(time) => Some(time),
                Err(_) => {
                    warn!("Ignoring malformed occupied time '{}'", s.as_ref());
                    None
                }
            })
            .collect();
        Self { times }
    }

    pub fn contains(&self, time: &SlotTime) -> bool {
        self.times.contains(time)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotTime> {
        self.times.iter()
    }
}

impl FromIterator<SlotTime> for OccupiedSet {
    fn from_iter<I: IntoIterator<Item = SlotTime>>(iter: I) -> Self {
        Self { times: iter.into_iter().collect() }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Occupied,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotView {
    pub time: SlotTime,
    pub status: SlotStatus,
    pub selected: bool,
}

impl SlotView {
    pub fn is_selectable(&self) -> bool {
        self.status == SlotStatus::Available
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PickerState {
    Idle,
    Loading,
    Ready,
    ErrorFallbackOpen,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PickerView {
    pub state: PickerState,
    pub provider_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub slots: Vec<SlotView>,
    pub error: Option<String>,
}

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    Consultation,
    #[serde(alias = "follow-up")]
    FollowUp,
    Checkup,
    Emergency,
    Procedure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub provider_id: String,
    pub appointment_date: DateTime<Utc>,
    pub duration: u32,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The booking form as submitted by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    pub provider_id: String,
    pub patient_id: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub duration_minutes: u32,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_id: String,
    pub provider_id: String,
    pub appointment_date: DateTime<Utc>,
    pub duration: u32,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentRequest {
    pub appointment_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckResult {
    pub has_conflict: bool,
}

/// Combines a calendar date and an `HH:mm` slot into a UTC instant.
pub fn slot_instant(date: NaiveDate, time: SlotTime) -> DateTime<Utc> {
    date.and_time(time.as_naive_time()).and_utc()
}

// ==============================================================================
// ERRORS
// ==============================================================================

/// A validation failure attached to one form field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn start_time(message: impl Into<String>) -> Self {
        Self {
            field: START_TIME_FIELD.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppointmentError {
    #[error("Invalid time '{0}', expected HH:mm")]
    InvalidTime(String),

    #[error("Slot duration must be a positive number of minutes, got {0}")]
    InvalidSlotDuration(u32),

    #[error("Time slot {0} is not offered by this schedule")]
    InvalidSlot(SlotTime),

    #[error("Time slot {0} is already booked")]
    SlotOccupied(SlotTime),

    #[error("Time slots are still loading")]
    PickerNotReady,

    #[error("Appointment conflicts with existing booking ({0})")]
    TimeConflict(FieldError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Appointment service error: {0}")]
    ServiceError(String),
}
