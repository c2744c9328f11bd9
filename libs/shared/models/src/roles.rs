use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Doctor,
    Nurse,
    Receptionist,
    Patient,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Doctor => write!(f, "doctor"),
            UserRole::Nurse => write!(f, "nurse"),
            UserRole::Receptionist => write!(f, "receptionist"),
            UserRole::Patient => write!(f, "patient"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "doctor" => Ok(UserRole::Doctor),
            "nurse" => Ok(UserRole::Nurse),
            "receptionist" => Ok(UserRole::Receptionist),
            "patient" => Ok(UserRole::Patient),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct NavItem {
    pub title: &'static str,
    pub href: &'static str,
}

const fn item(title: &'static str, href: &'static str) -> NavItem {
    NavItem { title, href }
}

const DASHBOARD: NavItem = item("Dashboard", "/dashboard");
const PATIENTS: NavItem = item("Patients", "/dashboard/patients");
const APPOINTMENTS: NavItem = item("Appointments", "/dashboard/appointments");
const STAFF: NavItem = item("Staff", "/dashboard/staff");
const REPORTS: NavItem = item("Reports", "/dashboard/reports");
const MEDICAL_RECORDS: NavItem = item("Medical Records", "/dashboard/medical-records");
const SETTINGS: NavItem = item("Settings", "/dashboard/settings");

const ADMIN_NAV: &[NavItem] = &[DASHBOARD, PATIENTS, APPOINTMENTS, STAFF, REPORTS, SETTINGS];
const DOCTOR_NAV: &[NavItem] = &[DASHBOARD, PATIENTS, APPOINTMENTS, MEDICAL_RECORDS];
const NURSE_NAV: &[NavItem] = &[DASHBOARD, PATIENTS, APPOINTMENTS, MEDICAL_RECORDS];
const RECEPTIONIST_NAV: &[NavItem] = &[DASHBOARD, PATIENTS, APPOINTMENTS];
const PATIENT_NAV: &[NavItem] = &[
    DASHBOARD,
    item("My Appointments", "/dashboard/appointments"),
    item("My Records", "/dashboard/medical-records"),
];

/// Sidebar entries visible to a role.
pub fn navigation_for(role: UserRole) -> &'static [NavItem] {
    match role {
        UserRole::Admin => ADMIN_NAV,
        UserRole::Doctor => DOCTOR_NAV,
        UserRole::Nurse => NURSE_NAV,
        UserRole::Receptionist => RECEPTIONIST_NAV,
        UserRole::Patient => PATIENT_NAV,
    }
}

/// Whether a role may book or reschedule on behalf of a patient.
pub fn can_manage_appointments(role: UserRole) -> bool {
    !matches!(role, UserRole::Patient)
}
