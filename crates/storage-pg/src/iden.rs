// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Table and column identifiers used by [`sea_query`]

#[derive(sea_query::Iden)]
#[iden = "documents_document"]
pub enum Documents {
    Table,
    Id,
    Access,
    Status,
    PageCount,
    UserId,
    OrganizationId,
}

#[derive(sea_query::Iden)]
#[iden = "documents_note"]
pub enum Notes {
    Table,
    Id,
    Access,
}

#[derive(sea_query::Iden)]
#[iden = "projects_project"]
pub enum Projects {
    Table,
    Id,
}

#[derive(sea_query::Iden, Clone, Copy)]
#[iden = "statistics_statistics"]
pub enum DailyStatistics {
    Table,
    Id,
    Date,

    TotalDocuments,
    TotalDocumentsPublic,
    TotalDocumentsOrganization,
    TotalDocumentsPrivate,
    TotalDocumentsInvisible,

    TotalDocumentsSuccess,
    TotalDocumentsReadable,
    TotalDocumentsPending,
    TotalDocumentsError,
    TotalDocumentsNofile,
    TotalDocumentsDeleted,

    TotalPages,
    TotalPagesPublic,
    TotalPagesOrganization,
    TotalPagesPrivate,
    TotalPagesInvisible,

    TotalNotes,
    TotalNotesPublic,
    TotalNotesOrganization,
    TotalNotesPrivate,
    TotalNotesInvisible,

    TotalUsersUploaded,
    TotalUsersPublicUploaded,
    TotalUsersPrivateUploaded,
    TotalUsersOrganizationUploaded,

    TotalOrganizationsUploaded,
    TotalOrganizationsPublicUploaded,
    TotalOrganizationsPrivateUploaded,
    TotalOrganizationsOrganizationUploaded,

    TotalProjects,
}
