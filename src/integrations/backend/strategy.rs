// src/integrations/backend/strategy.rs

use super::client::{ApiClient, ApiRequest};
use crate::domain::{StrategyParams, StrategyResult};
use crate::error::AppResult;

impl ApiClient {
    /// Ask the strategy model for a pit-stop plan.
    pub async fn recommend_strategy(&self, params: &StrategyParams) -> AppResult<StrategyResult> {
        let request = ApiRequest::post("/strategy/recommend").json(params)?;
        self.fetch_required(&request).await
    }
}
