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

//! The `Car` data type and the requests to manipulate it.

use crate::model::Engine;
use carzone_core::model::{ModelError, ModelResult};
use derive_getters::Getters;
use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Year in which the first car was built.  No car can claim to be older than this.
const FIRST_CAR_YEAR: i32 = 1886;

/// Types of fuel that a car can run on.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub(crate) enum FuelType {
    /// Gasoline.
    Petrol,

    /// Diesel.
    Diesel,

    /// Battery-powered.
    Electric,

    /// Combination of a combustion engine and a battery.
    Hybrid,
}

impl FuelType {
    /// Parses a fuel type from its textual representation, which is case-sensitive.
    pub(crate) fn parse(s: &str) -> ModelResult<Self> {
        match s {
            "Petrol" => Ok(FuelType::Petrol),
            "Diesel" => Ok(FuelType::Diesel),
            "Electric" => Ok(FuelType::Electric),
            "Hybrid" => Ok(FuelType::Hybrid),
            _ => Err(ModelError(
                "FuelType must be one of Petrol, Diesel, Electric, or Hybrid".to_owned(),
            )),
        }
    }

    /// Returns the textual representation of the fuel type for storage.
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            FuelType::Petrol => "Petrol",
            FuelType::Diesel => "Diesel",
            FuelType::Electric => "Electric",
            FuelType::Hybrid => "Hybrid",
        }
    }
}

/// Contents of a request to create or update a car, as received from the user.
///
/// Missing fields take their default values so that validation can report them individually.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct CarRequest {
    /// Name of the car model.
    pub(crate) name: String,

    /// Year in which the car was built, as a string that must hold an integer.
    pub(crate) year: String,

    /// Manufacturer of the car.
    pub(crate) brand: String,

    /// Unparsed fuel type.
    pub(crate) fuel_type: String,

    /// Engine the car is built with.  Must reference an existing engine.
    pub(crate) engine: Engine,

    /// Price of the car.
    pub(crate) price: f64,
}

impl CarRequest {
    /// Validates the request against the business rules, reporting the first failed check.
    ///
    /// `current_year` is the latest year a car can have been built in.
    pub(crate) fn validate(self, current_year: i32) -> ModelResult<CarSpec> {
        if self.name.is_empty() {
            return Err(ModelError("Name is required".to_owned()));
        }

        if self.year.is_empty() {
            return Err(ModelError("Year is required".to_owned()));
        }
        let year = self
            .year
            .parse::<i32>()
            .map_err(|_| ModelError("Year must be a valid number".to_owned()))?;
        if !(FIRST_CAR_YEAR..=current_year).contains(&year) {
            return Err(ModelError(format!(
                "Year must be between {} and the current year",
                FIRST_CAR_YEAR
            )));
        }

        if self.brand.is_empty() {
            return Err(ModelError("Brand is required".to_owned()));
        }

        let fuel_type = FuelType::parse(&self.fuel_type)?;

        if self.engine.engine_id().is_nil() {
            return Err(ModelError("Engine ID is required".to_owned()));
        }
        self.engine.validate_attributes()?;

        if self.price <= 0.0 || self.price.is_nan() {
            return Err(ModelError("Price must be greater than 0".to_owned()));
        }

        Ok(CarSpec {
            name: self.name,
            year: self.year,
            brand: self.brand,
            fuel_type,
            engine: self.engine,
            price: self.price,
        })
    }
}

/// A car request that passed validation.
#[derive(Clone, Debug, Getters, PartialEq)]
pub(crate) struct CarSpec {
    /// Name of the car model.
    name: String,

    /// Year in which the car was built.
    year: String,

    /// Manufacturer of the car.
    brand: String,

    /// Fuel type of the car.
    fuel_type: FuelType,

    /// Engine the car is built with.
    engine: Engine,

    /// Price of the car.
    price: f64,
}

/// A car as stored in the database.
#[derive(Clone, Constructor, Debug, Getters, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct Car {
    /// Server-assigned identifier of the car.
    id: Uuid,

    /// Name of the car model.
    name: String,

    /// Year in which the car was built.
    year: String,

    /// Manufacturer of the car.
    brand: String,

    /// Fuel type of the car.
    fuel_type: FuelType,

    /// Engine the car is built with.  Depending on how the car was queried, this may only carry
    /// the engine identifier.
    engine: Engine,

    /// Price of the car.
    price: f64,

    /// Time when the car was first stored.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,

    /// Time when the car was last modified.
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl Car {
    /// Creates a new car from a validated `spec`, using `now` as its creation and modification
    /// times.
    pub(crate) fn from_spec(id: Uuid, spec: CarSpec, now: OffsetDateTime) -> Self {
        Self {
            id,
            name: spec.name,
            year: spec.year,
            brand: spec.brand,
            fuel_type: spec.fuel_type,
            engine: spec.engine,
            price: spec.price,
            created_at: now,
            updated_at: now,
        }
    }
}
