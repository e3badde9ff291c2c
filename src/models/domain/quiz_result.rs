use std::collections::BTreeMap;

use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::analysis::GiftAnalysis;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct QuizSession {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct RankedGift {
    pub key: String,
    pub name: String,
    pub score: i32,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct QuizResult {
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[graphql(skip)]
    pub scores: BTreeMap<String, i32>,
    #[serde(default)]
    pub ranked: Vec<RankedGift>,
    pub top_gifts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<GiftAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}
