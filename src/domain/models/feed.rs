//! Feed vocabulary: integration formats, record types and operations.
//!
//! Each integration format accepts a closed set of record types and
//! operations. Raw strings from configuration are parsed here and checked
//! against the format's allow-list before a feed is submitted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::{FatalRunError, FeedValidationError};

/// Lower-case a config value and fold `-` separators into `_`.
fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase().replace('-', "_")
}

/// Wire format shared by every feed of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationFormat {
    /// Delimited text with a header row
    FlatFile,
    /// XML enterprise documents
    Xml,
}

impl IntegrationFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlatFile => "flat_file",
            Self::Xml => "xml",
        }
    }

    /// Record types this format accepts.
    pub fn record_types(&self) -> &'static [RecordType] {
        match self {
            Self::FlatFile => &[
                RecordType::Person,
                RecordType::Course,
                RecordType::Organization,
                RecordType::Term,
                RecordType::CourseMembership,
                RecordType::OrganizationMembership,
                RecordType::CourseCategory,
                RecordType::OrganizationCategory,
                RecordType::Observer,
            ],
            Self::Xml => &[RecordType::Person, RecordType::Group, RecordType::Membership],
        }
    }

    /// Operations this format accepts.
    pub fn operations(&self) -> &'static [Operation] {
        match self {
            Self::FlatFile => &[
                Operation::Store,
                Operation::Refresh,
                Operation::RefreshLegacy,
                Operation::Delete,
            ],
            Self::Xml => &[Operation::Store, Operation::Refresh, Operation::Delete],
        }
    }

    /// Parse and check a feed's record type and operation against this format.
    pub fn validate(
        &self,
        record_type: &str,
        operation: &str,
    ) -> Result<(RecordType, Operation), FeedValidationError> {
        let parsed_type = record_type
            .parse::<RecordType>()
            .map_err(|()| FeedValidationError::UnknownRecordType(record_type.to_string()))?;
        if !self.record_types().contains(&parsed_type) {
            return Err(FeedValidationError::UnsupportedRecordType {
                format: self.to_string(),
                record_type: parsed_type.to_string(),
            });
        }

        let parsed_op = operation
            .parse::<Operation>()
            .map_err(|()| FeedValidationError::UnknownOperation(operation.to_string()))?;
        if !self.operations().contains(&parsed_op) {
            return Err(FeedValidationError::UnsupportedOperation {
                format: self.to_string(),
                operation: parsed_op.to_string(),
            });
        }

        Ok((parsed_type, parsed_op))
    }
}

impl fmt::Display for IntegrationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationFormat {
    type Err = FatalRunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "flat_file" | "flatfile" | "snapshot_flat_file" => Ok(Self::FlatFile),
            "xml" | "ims_xml" => Ok(Self::Xml),
            _ => Err(FatalRunError::InvalidIntegrationFormat(s.to_string())),
        }
    }
}

/// Kind of entity carried by a feed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Person,
    Course,
    Organization,
    Term,
    CourseMembership,
    OrganizationMembership,
    CourseCategory,
    OrganizationCategory,
    Observer,
    Group,
    Membership,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Course => "course",
            Self::Organization => "organization",
            Self::Term => "term",
            Self::CourseMembership => "course_membership",
            Self::OrganizationMembership => "organization_membership",
            Self::CourseCategory => "course_category",
            Self::OrganizationCategory => "organization_category",
            Self::Observer => "observer",
            Self::Group => "group",
            Self::Membership => "membership",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "person" => Ok(Self::Person),
            "course" => Ok(Self::Course),
            "organization" => Ok(Self::Organization),
            "term" => Ok(Self::Term),
            "course_membership" | "coursemembership" => Ok(Self::CourseMembership),
            "organization_membership" | "organizationmembership" => {
                Ok(Self::OrganizationMembership)
            }
            "course_category" | "coursecategory" => Ok(Self::CourseCategory),
            "organization_category" | "organizationcategory" => Ok(Self::OrganizationCategory),
            "observer" | "associate_observer" => Ok(Self::Observer),
            "group" => Ok(Self::Group),
            "membership" => Ok(Self::Membership),
            _ => Err(()),
        }
    }
}

/// What the remote system should do with the feed's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Store,
    Refresh,
    RefreshLegacy,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Refresh => "refresh",
            Self::RefreshLegacy => "refresh_legacy",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "store" => Ok(Self::Store),
            "refresh" => Ok(Self::Refresh),
            "refresh_legacy" | "refreshlegacy" => Ok(Self::RefreshLegacy),
            "delete" => Ok(Self::Delete),
            _ => Err(()),
        }
    }
}
