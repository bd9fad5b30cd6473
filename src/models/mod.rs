// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod location;
pub mod photo;
pub mod project;
pub mod stop;

pub use location::{LocationLog, Ping};
pub use photo::{NewPhoto, PhotoMetadata};
pub use project::{CourseKey, CourseSummary, Device, Project};
pub use stop::{Coordinates, Stop, StopRecord, VisitState};
