// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Useful JSON Schema definitions

use schemars::{
    JsonSchema,
    r#gen::{SchemaGenerator, SchemaSettings},
    schema::{InstanceType, Metadata, RootSchema, Schema, SchemaObject},
};

use crate::RootConfig;

/// Generate the JSON schema of the whole configuration file
#[must_use]
pub fn root_schema() -> RootSchema {
    SchemaSettings::draft07()
        .with(|settings| settings.option_add_null_type = false)
        .into_generator()
        .into_root_schema_for::<RootConfig>()
}

/// A network hostname
pub struct Hostname;

impl JsonSchema for Hostname {
    fn schema_name() -> String {
        "Hostname".to_string()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        Schema::Object(SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            format: Some("hostname".to_owned()),
            ..SchemaObject::default()
        })
    }
}

/// A cron expression, with a seconds field, evaluated in UTC
pub struct CronExpression;

impl JsonSchema for CronExpression {
    fn schema_name() -> String {
        "CronExpression".to_string()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        Schema::Object(SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            metadata: Some(Box::new(Metadata {
                description: Some(
                    "Six or seven fields: sec min hour day-of-month month day-of-week [year]"
                        .to_owned(),
                ),
                examples: vec!["0 30 5 * * *".into()],
                ..Metadata::default()
            })),
            ..SchemaObject::default()
        })
    }
}
