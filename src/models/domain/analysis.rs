use async_graphql::SimpleObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured AI interpretation of a quiz result. The JSON schema of this
/// type is sent to the model as the required response format.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GiftAnalysis {
    pub summary: String,
    pub strengths: Vec<String>,
    pub growth_areas: Vec<String>,
    pub ministry_suggestions: Vec<String>,
}
