//! Client for the occupancy backend's HTTP endpoints.
//!
//! The backend owns detection and video; this side only knows the paths and
//! the JSON shapes in [`crate::model`].

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;

use crate::fetch::{FetchFailure, HttpClient, fetch_json};
use crate::model::{AggregateState, DetailState};

/// URL builder for the backend's endpoints, rooted at a base URL.
///
/// Endpoint paths go under the base URL's path, so a backend served below a
/// prefix (`https://host/parking/`) works as well as one at the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self, FetchFailure> {
        let mut base = Url::parse(base_url)
            .map_err(|e| FetchFailure::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(FetchFailure::InvalidUrl(base_url.to_string()));
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    /// `GET /api/parking-data`
    pub fn parking_data(&self) -> Url {
        self.path("api/parking-data")
    }

    /// `GET /api/parking-details?lot={id}`
    pub fn parking_details(&self, lot_id: &str) -> Url {
        self.with_lot("api/parking-details", lot_id)
    }

    /// `GET /api/video-stream?lot={id}`, an MJPEG stream for a passive image surface.
    pub fn video_stream(&self, lot_id: &str) -> Url {
        self.with_lot("api/video-stream", lot_id)
    }

    /// `GET /health`
    pub fn health(&self) -> Url {
        self.path("health")
    }

    fn path(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        // `new` rejects bases without segments, so this always applies.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path.split('/'));
        }
        url
    }

    fn with_lot(&self, path: &str, lot_id: &str) -> Url {
        let mut url = self.path(path);
        url.query_pairs_mut().append_pair("lot", lot_id);
        url
    }
}

/// Where the views pull their data from.
#[async_trait]
pub trait OccupancySource: Send + Sync + 'static {
    /// Summary of every lot.
    async fn parking_data(&self) -> Result<AggregateState, FetchFailure>;

    /// Counts and history for one lot.
    async fn parking_details(&self, lot_id: &str) -> Result<DetailState, FetchFailure>;
}

#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// [`OccupancySource`] backed by the real HTTP endpoints.
pub struct ParkingApi<C> {
    client: Arc<C>,
    endpoints: Endpoints,
}

impl<C> Clone for ParkingApi<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            endpoints: self.endpoints.clone(),
        }
    }
}

impl<C: HttpClient> ParkingApi<C> {
    pub fn new(client: C, endpoints: Endpoints) -> Self {
        Self {
            client: Arc::new(client),
            endpoints,
        }
    }

    #[tracing::instrument(skip(self), fields(url = %self.endpoints.health()))]
    pub async fn health(&self) -> Result<HealthStatus, FetchFailure> {
        fetch_json(self.client.as_ref(), self.endpoints.health()).await
    }
}

#[async_trait]
impl<C: HttpClient + 'static> OccupancySource for ParkingApi<C> {
    #[tracing::instrument(skip(self))]
    async fn parking_data(&self) -> Result<AggregateState, FetchFailure> {
        fetch_json(self.client.as_ref(), self.endpoints.parking_data()).await
    }

    #[tracing::instrument(skip(self))]
    async fn parking_details(&self, lot_id: &str) -> Result<DetailState, FetchFailure> {
        fetch_json(self.client.as_ref(), self.endpoints.parking_details(lot_id)).await
    }
}
