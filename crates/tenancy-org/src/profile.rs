//! Person profile as seen by the organization context

use serde::{Deserialize, Serialize};

/// Contact details of a person, resolved through the identity context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDetails {
    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Contact e-mail
    pub email: String,
}

impl ProfileDetails {
    /// Creates a profile.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    /// First and last name separated by a space.
    ///
    /// ```
    /// use tenancy_org::ProfileDetails;
    ///
    /// let profile = ProfileDetails::new("Ada", "Lovelace", "ada@example.com");
    /// assert_eq!(profile.full_name(), "Ada Lovelace");
    /// ```
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
