// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

#![allow(clippy::module_name_repetitions)]

pub(crate) mod documents;
pub(crate) mod maintenance;
pub(crate) mod statistics;

pub use self::{
    documents::{Access, Document, Note, Project, Status},
    maintenance::{Revision, Session},
    statistics::{Statistics, StatisticsSnapshot},
};
