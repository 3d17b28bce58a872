// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! The `Engine` and `EngineRequest` data types.

use carzone_core::model::{ModelError, ModelResult};
use derive_getters::Getters;
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An engine that one or more cars can be built with.
///
/// Deserialization fills in defaults for missing fields so that the validation of an embedded
/// engine in a car request can report which field is missing.
#[derive(Clone, Constructor, Debug, Default, Deserialize, Getters, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct Engine {
    /// Server-assigned identifier of the engine.
    engine_id: Uuid,

    /// Engine displacement, in cubic centimeters.
    displacement: i64,

    /// Number of cylinders.
    #[serde(rename = "noOfCylinders")]
    no_of_cylinders: i64,

    /// Range of the car on a full tank or charge.
    #[serde(rename = "carRange")]
    car_range: i64,
}

impl Engine {
    /// Creates an engine that only carries its identifier, leaving its attributes unset.
    pub(crate) fn reference(engine_id: Uuid) -> Self {
        Self { engine_id, ..Default::default() }
    }

    /// Validates the attributes of the engine, ignoring its identifier.
    pub(crate) fn validate_attributes(&self) -> ModelResult<()> {
        validate_attributes(self.displacement, self.no_of_cylinders, self.car_range)
    }
}

/// Checks the attributes shared by engines and engine requests in a fixed order, reporting the
/// first failure.
fn validate_attributes(displacement: i64, no_of_cylinders: i64, car_range: i64) -> ModelResult<()> {
    if displacement <= 0 {
        return Err(ModelError("Displacement must be greater than 0".to_owned()));
    }
    if no_of_cylinders <= 0 {
        return Err(ModelError("NoOfCylinders must be greater than 0".to_owned()));
    }
    if car_range <= 0 {
        return Err(ModelError("CarRange must be greater than 0".to_owned()));
    }
    Ok(())
}

/// Contents of a request to create or update an engine.
#[derive(Clone, Constructor, Debug, Default, Deserialize, Getters, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct EngineRequest {
    /// Engine displacement, in cubic centimeters.
    displacement: i64,

    /// Number of cylinders.
    #[serde(rename = "noOfCylinders")]
    no_of_cylinders: i64,

    /// Range of the car on a full tank or charge.
    #[serde(rename = "carRange")]
    car_range: i64,
}

impl EngineRequest {
    /// Ensures that all attributes are positive.
    pub(crate) fn validate(&self) -> ModelResult<()> {
        validate_attributes(self.displacement, self.no_of_cylinders, self.car_range)
    }

    /// Builds the engine described by this request with the given identifier.
    pub(crate) fn into_engine(self, engine_id: Uuid) -> Engine {
        Engine::new(engine_id, self.displacement, self.no_of_cylinders, self.car_range)
    }
}
