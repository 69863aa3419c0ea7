// src/integrations/backend/predictions.rs
//
// Finishing-position predictions. The model lives behind the backend; this
// is only its HTTP contract.

use serde::Deserialize;

use super::client::{ApiClient, ApiRequest};
use crate::domain::{PredictionHistoryItem, PredictionHistoryPage, RacePrediction, SinglePrediction};
use crate::error::AppResult;

#[derive(Debug, Default, Deserialize)]
struct HistoryData {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    predictions: Vec<PredictionHistoryItem>,
}

impl ApiClient {
    /// Predicted order for the whole grid.
    pub async fn predict_race(&self, season: u32, round: u32) -> AppResult<RacePrediction> {
        let request = ApiRequest::get("/predictions/race")
            .query("season", season)
            .query("round", round);
        self.fetch_required(&request).await
    }

    pub async fn predict_single(
        &self,
        season: u32,
        round: u32,
        driver_id: &str,
    ) -> AppResult<SinglePrediction> {
        let request = ApiRequest::get("/predictions/single")
            .query("season", season)
            .query("round", round)
            .query("driverId", driver_id);
        self.fetch_required(&request).await
    }

    /// One page of past predictions, newest first.
    pub async fn prediction_history(
        &self,
        page: u32,
        limit: u32,
        season: Option<u32>,
    ) -> AppResult<PredictionHistoryPage> {
        let mut request = ApiRequest::get("/predictions/history")
            .query("page", page)
            .query("limit", limit);
        if let Some(season) = season {
            request = request.query("season", season);
        }

        let envelope = self.fetch_envelope::<HistoryData>(&request).await?;
        let pagination = envelope.pagination.clone().unwrap_or_default();
        Ok(PredictionHistoryPage {
            predictions: envelope.into_data().predictions,
            pagination,
        })
    }
}
