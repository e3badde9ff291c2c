use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};

/// A gift category as returned by `get_gifts`. `name` is localized.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct Gift {
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Gift {
    pub fn new(key: &str, name: &str) -> Self {
        Gift {
            key: key.to_string(),
            name: name.to_string(),
            description: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct QuizQuestion {
    pub id: String,
    pub gift_key: String,
    pub text: String,
    #[serde(default)]
    pub order: i32,
}

/// One answered question. `value` is the Likert response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct Answer {
    pub question_id: String,
    pub gift_key: String,
    pub value: i32,
}

impl Answer {
    pub fn new(question_id: &str, gift_key: &str, value: i32) -> Self {
        Answer {
            question_id: question_id.to_string(),
            gift_key: gift_key.to_string(),
            value,
        }
    }
}
