use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::json;

use crate::{
    backend::{Access, BackendClient},
    errors::AppResult,
    models::{
        domain::{Answer, Gift, GiftAnalysis, QuizQuestion, QuizResult, QuizSession, RankedGift},
        dto::request::AnswerInput,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn get_gifts(&self, locale: &str, access: &Access) -> AppResult<Vec<Gift>>;
    async fn get_questions(&self, locale: &str, access: &Access) -> AppResult<Vec<QuizQuestion>>;
    async fn start_session(&self, user_id: &str, locale: &str, access: &Access) -> AppResult<QuizSession>;
    async fn get_session(&self, session_id: &str, access: &Access) -> AppResult<Option<QuizSession>>;
    async fn save_answers(&self, session_id: &str, answers: &[AnswerInput], access: &Access) -> AppResult<()>;
    async fn get_answers(&self, session_id: &str, access: &Access) -> AppResult<Vec<Answer>>;
    async fn complete_session(
        &self,
        session_id: &str,
        scores: &BTreeMap<String, i32>,
        ranked: &[RankedGift],
        top_gifts: &[String],
        access: &Access,
    ) -> AppResult<()>;
    async fn get_result(&self, session_id: &str, access: &Access) -> AppResult<Option<QuizResult>>;
    async fn list_results(&self, user_id: &str, access: &Access) -> AppResult<Vec<QuizResult>>;
    async fn save_analysis(&self, session_id: &str, analysis: &GiftAnalysis, access: &Access) -> AppResult<()>;
}

pub struct RpcQuizRepository {
    client: BackendClient,
}

impl RpcQuizRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuizRepository for RpcQuizRepository {
    async fn get_gifts(&self, locale: &str, access: &Access) -> AppResult<Vec<Gift>> {
        self.client
            .rpc("get_gifts", &json!({ "p_locale": locale }), access)
            .await
    }

    async fn get_questions(&self, locale: &str, access: &Access) -> AppResult<Vec<QuizQuestion>> {
        self.client
            .rpc("get_quiz_questions", &json!({ "p_locale": locale }), access)
            .await
    }

    async fn start_session(&self, user_id: &str, locale: &str, access: &Access) -> AppResult<QuizSession> {
        self.client
            .rpc(
                "start_quiz_session",
                &json!({ "p_user_id": user_id, "p_locale": locale }),
                access,
            )
            .await
    }

    async fn get_session(&self, session_id: &str, access: &Access) -> AppResult<Option<QuizSession>> {
        self.client
            .rpc("get_quiz_session", &json!({ "p_session_id": session_id }), access)
            .await
    }

    async fn save_answers(&self, session_id: &str, answers: &[AnswerInput], access: &Access) -> AppResult<()> {
        self.client
            .rpc(
                "save_quiz_answers",
                &json!({ "p_session_id": session_id, "p_answers": answers }),
                access,
            )
            .await
    }

    async fn get_answers(&self, session_id: &str, access: &Access) -> AppResult<Vec<Answer>> {
        self.client
            .rpc("get_session_answers", &json!({ "p_session_id": session_id }), access)
            .await
    }

    async fn complete_session(
        &self,
        session_id: &str,
        scores: &BTreeMap<String, i32>,
        ranked: &[RankedGift],
        top_gifts: &[String],
        access: &Access,
    ) -> AppResult<()> {
        self.client
            .rpc(
                "complete_quiz_session",
                &json!({
                    "p_session_id": session_id,
                    "p_scores": scores,
                    "p_ranked": ranked,
                    "p_top_gifts": top_gifts,
                }),
                access,
            )
            .await
    }

    async fn get_result(&self, session_id: &str, access: &Access) -> AppResult<Option<QuizResult>> {
        self.client
            .rpc("get_quiz_result", &json!({ "p_session_id": session_id }), access)
            .await
    }

    async fn list_results(&self, user_id: &str, access: &Access) -> AppResult<Vec<QuizResult>> {
        self.client
            .rpc("get_user_results", &json!({ "p_user_id": user_id }), access)
            .await
    }

    async fn save_analysis(&self, session_id: &str, analysis: &GiftAnalysis, access: &Access) -> AppResult<()> {
        self.client
            .rpc(
                "save_ai_analysis",
                &json!({ "p_session_id": session_id, "p_analysis": analysis }),
                access,
            )
            .await
    }
}
