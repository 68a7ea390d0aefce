//! Closed reference catalogs
//!
//! Organization statuses and member types are fixed sets known at compile
//! time. They are stored by their upper-case catalog name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OrgError;

/// Lifecycle status of an organization.
///
/// # Examples
///
/// ```
/// use tenancy_org::OrganizationStatus;
///
/// assert_eq!(OrganizationStatus::parse("active"), Some(OrganizationStatus::Active));
/// assert_eq!(OrganizationStatus::Active.as_str(), "ACTIVE");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationStatus {
    /// Operating normally
    Active,

    /// Suspended by an administrator
    Inactive,
}

impl OrganizationStatus {
    /// Every status in the catalog.
    pub fn all() -> &'static [Self] {
        &[Self::Active, Self::Inactive]
    }

    /// Parse status from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => Some(Self::Active),
            "INACTIVE" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Catalog name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    /// Get a human-readable display name for the status.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

impl Default for OrganizationStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl fmt::Display for OrganizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrganizationStatus {
    type Err = OrgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| OrgError::Validation(format!("unknown organization status: {s}")))
    }
}

/// Role classification of a member within an organization.
///
/// - **Contractor**: the party that hires the organization's services
/// - **Worker**: staff who joined by accepting an invitation
///
/// # Examples
///
/// ```
/// use tenancy_org::MemberType;
///
/// assert_eq!(MemberType::parse("Worker"), Some(MemberType::Worker));
/// assert_eq!(MemberType::parse("intern"), None);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberType {
    /// Contracting party
    Contractor,

    /// Invited staff member
    Worker,
}

impl MemberType {
    /// Every member type in the catalog.
    pub fn all() -> &'static [Self] {
        &[Self::Contractor, Self::Worker]
    }

    /// Parse member type from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CONTRACTOR" => Some(Self::Contractor),
            "WORKER" => Some(Self::Worker),
            _ => None,
        }
    }

    /// Catalog name of the member type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contractor => "CONTRACTOR",
            Self::Worker => "WORKER",
        }
    }

    /// Get a human-readable display name for the member type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Contractor => "Contractor",
            Self::Worker => "Worker",
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberType {
    type Err = OrgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| OrgError::Validation(format!("unknown member type: {s}")))
    }
}
