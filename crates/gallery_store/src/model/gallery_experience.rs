//! Gallery experience record.
//!
//! # Responsibility
//! - Define the canonical named, described, geo-located gallery item.
//! - Provide lifecycle helpers for the two-flag soft-delete state.
//!
//! # Invariants
//! - `id` is stable and never reused, including across soft-deleted rows.
//! - Soft-deleted implies `is_deleted == true` and `is_active == false`.
//! - Modification/deletion audit fields stay `None` until the matching
//!   lifecycle step happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-supplied identifier of a gallery experience.
pub type ExperienceId = String;

const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);
const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// Validation failures for gallery experience write paths.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyId,
    /// An audit actor (`modified_by`, `deleted_by`) was missing or blank.
    MissingActor { field: &'static str },
    NonFiniteCoordinate { field: &'static str },
    CoordinateOutOfRange { field: &'static str, value: f64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "experience id cannot be empty"),
            Self::MissingActor { field } => write!(f, "{field} cannot be empty"),
            Self::NonFiniteCoordinate { field } => {
                write!(f, "{field} must be a finite number")
            }
            Self::CoordinateOutOfRange { field, value } => {
                write!(f, "{field} value {value} is out of range")
            }
        }
    }
}

impl Error for ValidationError {}

/// Persisted gallery experience, e.g. a point of interest with a picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryExperience {
    pub id: ExperienceId,
    pub created_by: String,
    /// `None` until the store assigns it on insert.
    pub created_date: Option<DateTime<Utc>>,
    pub modified_by: Option<String>,
    pub modified_date: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    pub deleted_date: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub is_active: bool,
    pub experience_name: String,
    pub experience_desc: String,
    /// Picture reference (URL or storage path); opaque to the store.
    pub experience_picture: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl GalleryExperience {
    /// Creates a not-yet-persisted record.
    ///
    /// # Invariants
    /// - Audit dates and modification/deletion actors start as `None`.
    /// - `is_deleted` starts `false`, `is_active` starts `true`.
    pub fn new(
        id: impl Into<ExperienceId>,
        created_by: impl Into<String>,
        experience_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            created_by: created_by.into(),
            created_date: None,
            modified_by: None,
            modified_date: None,
            deleted_by: None,
            deleted_date: None,
            is_deleted: false,
            is_active: true,
            experience_name: experience_name.into(),
            experience_desc: String::new(),
            experience_picture: String::new(),
            longitude: 0.0,
            latitude: 0.0,
        }
    }

    /// Sets both geo-coordinates.
    pub fn at(mut self, longitude: f64, latitude: f64) -> Self {
        self.longitude = longitude;
        self.latitude = latitude;
        self
    }

    /// Checks the invariants every write path depends on.
    ///
    /// # Errors
    /// - `EmptyId` when `id` is empty or whitespace.
    /// - `NonFiniteCoordinate` for NaN/infinite coordinates.
    /// - `CoordinateOutOfRange` outside WGS84 bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        check_coordinate("longitude", self.longitude, LONGITUDE_RANGE)?;
        check_coordinate("latitude", self.latitude, LATITUDE_RANGE)?;
        Ok(())
    }

    /// Returns whether listing/counting operations should see this record.
    pub fn is_visible(&self) -> bool {
        !self.is_deleted && self.is_active
    }

    /// Returns whether this record has been soft-deleted.
    pub fn is_soft_deleted(&self) -> bool {
        self.is_deleted && !self.is_active
    }
}

/// Requires a non-blank audit actor for `field`.
pub fn require_actor(field: &'static str, actor: Option<&str>) -> Result<(), ValidationError> {
    match actor {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::MissingActor { field }),
    }
}

fn check_coordinate(
    field: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteCoordinate { field });
    }
    if value < min || value > max {
        return Err(ValidationError::CoordinateOutOfRange { field, value });
    }
    Ok(())
}
