// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - tracking logic.

pub mod arrival;
pub mod directions;
pub mod geodesy;
pub mod ingest;
pub mod photo_match;
pub mod polyline_codec;
pub mod progress;
pub mod proximity;
pub mod route_import;
pub mod trace;

pub use arrival::CourseLocks;
pub use directions::{DirectionsClient, RoutePath, RouteProvider};
pub use trace::{TraceOptions, TraceSummary};
