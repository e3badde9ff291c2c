use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GiftDistribution {
    pub gift_key: String,
    #[serde(default)]
    pub gift_name: Option<String>,
    /// Number of completed results where this gift ranked in the top set.
    pub count: i64,
    #[serde(default)]
    pub average_score: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizStatistics {
    pub total_sessions: i64,
    pub completed_sessions: i64,
    #[serde(default)]
    pub unique_users: i64,
    #[serde(default)]
    pub average_duration_seconds: Option<f64>,
}

impl QuizStatistics {
    pub fn completion_rate(&self) -> f64 {
        if self.total_sessions <= 0 {
            0.0
        } else {
            self.completed_sessions as f64 / self.total_sessions as f64
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountBucket {
    pub label: String,
    pub count: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicsSummary {
    #[serde(default)]
    pub by_country: Vec<CountBucket>,
    #[serde(default)]
    pub by_age_group: Vec<CountBucket>,
    #[serde(default)]
    pub by_gender: Vec<CountBucket>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub gift_distribution: Vec<GiftDistribution>,
    pub statistics: QuizStatistics,
    pub completion_rate: f64,
    pub demographics: DemographicsSummary,
}
