// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use serde::Serialize;

/// Visibility of a document or a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Visible to everyone
    Public,

    /// Visible to the owner and their collaborators
    Private,

    /// Visible to members of the owning organization
    Organization,

    /// Hidden from everyone, including the owner
    Invisible,
}

impl Access {
    /// All the access tiers, in the order they are reported
    pub const ALL: [Self; 4] = [
        Self::Public,
        Self::Organization,
        Self::Private,
        Self::Invisible,
    ];

    /// The value used to store this access tier in the database
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Public => 0,
            Self::Private => 2,
            Self::Organization => 3,
            Self::Invisible => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Organization => "organization",
            Self::Invisible => "invisible",
        }
    }
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing state of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Readable,
    Pending,
    Error,
    Nofile,
    Deleted,
}

impl Status {
    pub const ALL: [Self; 6] = [
        Self::Success,
        Self::Readable,
        Self::Pending,
        Self::Error,
        Self::Nofile,
        Self::Deleted,
    ];

    /// The value used to store this status in the database
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Readable => 1,
            Self::Pending => 2,
            Self::Error => 3,
            Self::Nofile => 4,
            Self::Deleted => 5,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Readable => "readable",
            Self::Pending => "pending",
            Self::Error => "error",
            Self::Nofile => "nofile",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: i64,
    pub access: Access,
    pub status: Status,
    pub page_count: u32,
    pub user_id: i64,
    pub organization_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: i64,
    pub document_id: i64,
    pub access: Access,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_values_match_platform_schema() {
        let access: Vec<i32> = Access::ALL.iter().map(|a| a.as_i32()).collect();
        // 1 was used by a tier which does not exist anymore
        assert_eq!(access, [0, 3, 2, 4]);

        let status: Vec<i32> = Status::ALL.iter().map(|s| s.as_i32()).collect();
        assert_eq!(status, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Access::Organization).unwrap(),
            "\"organization\""
        );
        assert_eq!(serde_json::to_string(&Status::Nofile).unwrap(), "\"nofile\"");
        assert_eq!(Access::Invisible.to_string(), "invisible");
    }
}
