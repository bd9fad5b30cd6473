// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Driving routes between two points.
//!
//! [`RouteProvider`] is the seam the trace generator depends on;
//! [`DirectionsClient`] implements it against the Google Directions API.

use crate::error::AppError;
use crate::models::Coordinates;
use crate::services::polyline_codec;
use futures_util::future::BoxFuture;
use serde::Deserialize;

/// A driving path with its total length and expected travel time.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    pub points: Vec<Coordinates>,
    pub distance_meters: u64,
    pub duration_secs: u64,
}

/// Source of driving routes.
pub trait RouteProvider: Send + Sync {
    fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> BoxFuture<'_, Result<RoutePath, AppError>>;
}

/// Google Directions API client.
#[derive(Clone)]
pub struct DirectionsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DirectionsClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(
            api_key,
            "https://maps.googleapis.com/maps/api/directions/json".to_string(),
        )
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Fetch the driving route from `origin` to `destination`.
    pub async fn get_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RoutePath, AppError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("origin", format_latlng(origin)),
                ("destination", format_latlng(destination)),
                ("mode", "driving".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Routing(format!("Directions request failed: {}", e)))?;

        let body: DirectionsResponse = check_response_json(response).await?;
        body.into_route_path()
    }
}

impl RouteProvider for DirectionsClient {
    fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> BoxFuture<'_, Result<RoutePath, AppError>> {
        Box::pin(self.get_route(origin, destination))
    }
}

fn format_latlng(c: Coordinates) -> String {
    format!("{:.6},{:.6}", c.latitude, c.longitude)
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Routing(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Routing(format!("Failed to parse directions response: {}", e)))
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: EncodedPolyline,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct EncodedPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: ValueField,
    duration: ValueField,
}

#[derive(Debug, Deserialize)]
struct ValueField {
    value: u64,
}

impl DirectionsResponse {
    fn into_route_path(self) -> Result<RoutePath, AppError> {
        if self.status != "OK" {
            return Err(AppError::Routing(format!(
                "Directions API returned status: {}",
                self.status
            )));
        }

        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Routing("No routes found".to_string()))?;
        let leg = route
            .legs
            .first()
            .ok_or_else(|| AppError::Routing("No legs found in route".to_string()))?;

        let points = polyline_codec::decode(&route.overview_polyline.points)
            .map_err(|e| AppError::Routing(e.to_string()))?;

        Ok(RoutePath {
            points,
            distance_meters: leg.distance.value,
            duration_secs: leg.duration.value,
        })
    }
}
