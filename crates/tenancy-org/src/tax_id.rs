//! Tax identifier value object

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{OrgError, OrgResult};

/// Number of digits in a tax identifier.
pub const TAX_ID_LENGTH: usize = 11;

/// Prefixes a tax identifier may start with.
pub const TAX_ID_PREFIXES: [&str; 2] = ["10", "20"];

/// Jurisdiction-specific tax identifier of an organization.
///
/// A valid value is exactly eleven ASCII digits and begins with `10` or
/// `20`. The value can only be obtained through [`TaxId::parse`], so holding
/// a `TaxId` means it passed validation. Deserialization validates as well.
///
/// # Examples
///
/// ```
/// use tenancy_org::TaxId;
///
/// assert!(TaxId::parse("20123456789").is_ok());
/// assert!(TaxId::parse("30123456789").is_err());
/// assert!(TaxId::parse("2012345678").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxId(String);

impl TaxId {
    /// Validate and wrap a tax identifier.
    ///
    /// # Errors
    ///
    /// [`OrgError::Validation`] if the value is not eleven digits or does not
    /// start with an accepted prefix.
    pub fn parse(value: &str) -> OrgResult<Self> {
        if value.len() != TAX_ID_LENGTH || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrgError::Validation(format!(
                "tax id must have exactly {TAX_ID_LENGTH} digits"
            )));
        }

        if !TAX_ID_PREFIXES.iter().any(|prefix| value.starts_with(prefix)) {
            return Err(OrgError::Validation(
                "tax id must begin with '10' or '20'".to_string(),
            ));
        }

        Ok(Self(value.to_string()))
    }

    /// The raw digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TaxId {
    type Err = OrgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TaxId {
    type Error = OrgError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaxId> for String {
    fn from(value: TaxId) -> Self {
        value.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
