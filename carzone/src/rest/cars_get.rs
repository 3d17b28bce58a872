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

//! API to list the cars of a brand.

use crate::driver::Driver;
use axum::extract::State;
use axum::response::IntoResponse;
use carzone_core::rest::{EmptyBody, QueryArgs, RestError, SuccessResponse};
use serde::Deserialize;

/// Query arguments accepted by this API.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct CarsQuery {
    /// Brand to match exactly.  An empty brand only matches cars with an empty brand, which
    /// never exist.
    #[serde(default)]
    brand: String,

    /// Whether to return the full details of the engine of each car.  Only the literal `true`
    /// enables this; any other value, including malformed ones, is treated as `false`.
    #[serde(rename = "isEngine", default)]
    is_engine: Option<String>,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    QueryArgs(query): QueryArgs<CarsQuery>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let include_engine = query.is_engine.as_deref() == Some("true");
    let cars = driver.get_cars_by_brand(&query.brand, include_engine).await?;
    Ok(SuccessResponse::ok("Cars retrieved successfully", cars))
}
