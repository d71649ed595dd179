//! Purchase model
//!
//! A purchase links a user to a property and tracks both payment and the
//! development of the property through a fixed list of phases. Progress
//! figures are derived from the stored flags, never stored themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::property::{Property, PropertyStatus, PropertyType};

/// Development phases, in the order they happen on site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    LandAcquisition,
    Documentation,
    Foundation,
    Blockwork,
    Roofing,
    /// Mechanical, electrical and plumbing
    Mep,
    Finishing,
    Handover,
}

impl Phase {
    pub const ALL: [Phase; 8] = [
        Phase::LandAcquisition,
        Phase::Documentation,
        Phase::Foundation,
        Phase::Blockwork,
        Phase::Roofing,
        Phase::Mep,
        Phase::Finishing,
        Phase::Handover,
    ];

    /// Column / JSON key for this phase
    pub fn key(&self) -> &'static str {
        match self {
            Phase::LandAcquisition => "land_acquisition",
            Phase::Documentation => "documentation",
            Phase::Foundation => "foundation",
            Phase::Blockwork => "blockwork",
            Phase::Roofing => "roofing",
            Phase::Mep => "mep",
            Phase::Finishing => "finishing",
            Phase::Handover => "handover",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Phase::LandAcquisition => "Land acquisition",
            Phase::Documentation => "Documentation & approvals",
            Phase::Foundation => "Foundation",
            Phase::Blockwork => "Blockwork",
            Phase::Roofing => "Roofing",
            Phase::Mep => "Electrical & plumbing",
            Phase::Finishing => "Finishing",
            Phase::Handover => "Handover",
        }
    }
}

/// Completion flags for each development phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseFlags {
    #[serde(default)]
    pub land_acquisition: bool,
    #[serde(default)]
    pub documentation: bool,
    #[serde(default)]
    pub foundation: bool,
    #[serde(default)]
    pub blockwork: bool,
    #[serde(default)]
    pub roofing: bool,
    #[serde(default)]
    pub mep: bool,
    #[serde(default)]
    pub finishing: bool,
    #[serde(default)]
    pub handover: bool,
}

impl PhaseFlags {
    /// All phases complete
    pub fn all_done() -> Self {
        let mut flags = Self::default();
        for phase in Phase::ALL {
            flags.set(phase, true);
        }
        flags
    }

    pub fn get(&self, phase: Phase) -> bool {
        match phase {
            Phase::LandAcquisition => self.land_acquisition,
            Phase::Documentation => self.documentation,
            Phase::Foundation => self.foundation,
            Phase::Blockwork => self.blockwork,
            Phase::Roofing => self.roofing,
            Phase::Mep => self.mep,
            Phase::Finishing => self.finishing,
            Phase::Handover => self.handover,
        }
    }

    pub fn set(&mut self, phase: Phase, done: bool) {
        let slot = match phase {
            Phase::LandAcquisition => &mut self.land_acquisition,
            Phase::Documentation => &mut self.documentation,
            Phase::Foundation => &mut self.foundation,
            Phase::Blockwork => &mut self.blockwork,
            Phase::Roofing => &mut self.roofing,
            Phase::Mep => &mut self.mep,
            Phase::Finishing => &mut self.finishing,
            Phase::Handover => &mut self.handover,
        };
        *slot = done;
    }

    /// Number of completed phases
    pub fn completed(&self) -> usize {
        Phase::ALL.iter().filter(|p| self.get(**p)).count()
    }

    /// Rounded percentage of completed phases (0-100)
    pub fn progress(&self) -> u8 {
        let total = Phase::ALL.len();
        // Integer rounding of completed * 100 / total
        ((self.completed() * 100 + total / 2) / total) as u8
    }
}

/// Purchase status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl PurchaseStatus {
    /// Pending and in-progress purchases hold the property
    pub fn is_active(&self) -> bool {
        matches!(self, PurchaseStatus::Pending | PurchaseStatus::InProgress)
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseStatus::Pending => write!(f, "pending"),
            PurchaseStatus::InProgress => write!(f, "in_progress"),
            PurchaseStatus::Completed => write!(f, "completed"),
            PurchaseStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for PurchaseStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PurchaseStatus::Pending),
            "in_progress" => Ok(PurchaseStatus::InProgress),
            "completed" => Ok(PurchaseStatus::Completed),
            "cancelled" => Ok(PurchaseStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid purchase status: {}", s)),
        }
    }
}

/// Purchase entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    pub user_id: i64,
    pub property_id: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub status: PurchaseStatus,
    pub phases: PhaseFlags,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    pub fn progress(&self) -> u8 {
        self.phases.progress()
    }

    /// Floor percentage of the total paid so far, capped at 100
    pub fn payment_progress(&self) -> u8 {
        payment_progress(self.amount_paid, self.total_amount)
    }

    /// Bring the status in line with the phase flags.
    ///
    /// Cancelled purchases are left alone. A fully progressed purchase is
    /// completed; a pending one with any progress is in progress.
    pub fn sync_status(&mut self) {
        if self.status == PurchaseStatus::Cancelled {
            return;
        }
        let progress = self.progress();
        if progress == 100 {
            self.status = PurchaseStatus::Completed;
        } else if progress > 0 && self.status == PurchaseStatus::Pending {
            self.status = PurchaseStatus::InProgress;
        }
    }
}

/// Floor percentage of `paid` over `total`, capped at 100 (0 when total is 0)
pub fn payment_progress(paid: i64, total: i64) -> u8 {
    if total <= 0 || paid <= 0 {
        return 0;
    }
    let pct = (paid as i128 * 100) / total as i128;
    pct.min(100) as u8
}

/// Property fields shown alongside a purchase or wishlist entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertySummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub location: String,
    pub city: String,
    pub price: i64,
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    pub cover_image: Option<String>,
}

impl From<&Property> for PropertySummary {
    fn from(p: &Property) -> Self {
        Self {
            id: p.id,
            slug: p.slug.clone(),
            title: p.title.clone(),
            location: p.location.clone(),
            city: p.city.clone(),
            price: p.price,
            property_type: p.property_type,
            status: p.status,
            cover_image: p.cover_image().map(str::to_string),
        }
    }
}

/// One row of the phase checklist
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PhaseView {
    pub key: &'static str,
    pub label: &'static str,
    pub completed: bool,
}

/// Purchase as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseView {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub property: Option<PropertySummary>,
    pub phase_list: Vec<PhaseView>,
    pub progress: u8,
    pub payment_progress: u8,
}

impl PurchaseView {
    pub fn new(purchase: Purchase, property: Option<PropertySummary>) -> Self {
        let phase_list = Phase::ALL
            .iter()
            .map(|p| PhaseView {
                key: p.key(),
                label: p.label(),
                completed: purchase.phases.get(*p),
            })
            .collect();
        let progress = purchase.progress();
        let payment_progress = purchase.payment_progress();
        Self {
            purchase,
            property,
            phase_list,
            progress,
            payment_progress,
        }
    }
}

/// Input for creating a purchase
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchaseInput {
    pub user_id: i64,
    pub property_id: i64,
    /// Defaults to the property price
    #[serde(default)]
    pub total_amount: Option<i64>,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub phases: PhaseFlags,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for updating a purchase
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePurchaseInput {
    pub total_amount: Option<i64>,
    pub amount_paid: Option<i64>,
    pub status: Option<PurchaseStatus>,
    pub phases: Option<PhaseFlags>,
    pub notes: Option<String>,
}

/// Filters for the admin purchase list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseFilter {
    pub status: Option<PurchaseStatus>,
    pub user_id: Option<i64>,
    pub property_id: Option<i64>,
}
