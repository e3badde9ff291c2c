use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;

use crate::{
    backend::{Access, BackendClient},
    errors::AppResult,
    models::domain::analytics::{DemographicsSummary, GiftDistribution, QuizStatistics},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn gift_distribution(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        access: &Access,
    ) -> AppResult<Vec<GiftDistribution>>;
    async fn quiz_statistics(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        access: &Access,
    ) -> AppResult<QuizStatistics>;
    async fn demographics_summary(&self, access: &Access) -> AppResult<DemographicsSummary>;
}

pub struct RpcAnalyticsRepository {
    client: BackendClient,
}

impl RpcAnalyticsRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnalyticsRepository for RpcAnalyticsRepository {
    async fn gift_distribution(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        access: &Access,
    ) -> AppResult<Vec<GiftDistribution>> {
        self.client
            .rpc(
                "get_gift_distribution",
                &json!({ "p_start_date": start, "p_end_date": end }),
                access,
            )
            .await
    }

    async fn quiz_statistics(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        access: &Access,
    ) -> AppResult<QuizStatistics> {
        let stats: Option<QuizStatistics> = self
            .client
            .rpc(
                "get_quiz_statistics",
                &json!({ "p_start_date": start, "p_end_date": end }),
                access,
            )
            .await?;
        Ok(stats.unwrap_or_default())
    }

    async fn demographics_summary(&self, access: &Access) -> AppResult<DemographicsSummary> {
        let summary: Option<DemographicsSummary> = self
            .client
            .rpc("get_demographics_summary", &json!({}), access)
            .await?;
        Ok(summary.unwrap_or_default())
    }
}
