use actix_web::{get, post, web, HttpResponse};
use async_graphql::http::GraphiQLSource;
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};

use crate::{auth::AuthenticatedUser, graphql::Schema};

#[post("/graphql")]
pub async fn graphql(
    schema: web::Data<Schema>,
    user: AuthenticatedUser,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let AuthenticatedUser { claims, access } = user;
    schema
        .execute(req.into_inner().data(claims).data(access))
        .await
        .into()
}

#[get("/graphiql")]
pub async fn graphiql() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(GraphiQLSource::build().endpoint("/graphql").finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::session::ACCESS_TOKEN_COOKIE,
        graphql::create_schema,
        repositories::{
            audit_repository::MockAuditRepository, profile_repository::MockProfileRepository,
            quiz_repository::MockQuizRepository,
        },
        test_utils::fixtures,
    };
    use actix_web::{cookie::Cookie, http::StatusCode, test, App};
    use async_graphql::Request;
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[actix_web::test]
    async fn settings_query_over_http() {
        let state = fixtures::state(fixtures::repositories());
        let schema = create_schema(state.clone());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.jwt_service.clone()))
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(schema))
                .service(graphql),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/graphql")
            .cookie(Cookie::new(
                ACCESS_TOKEN_COOKIE,
                fixtures::session_token("user-1", None),
            ))
            .set_json(json!({ "query": "{ settings { quiz { topGiftsCount allowRetake } } }" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"]["settings"]["quiz"]["topGiftsCount"], 3);
        assert_eq!(body["data"]["settings"]["quiz"]["allowRetake"], true);
    }

    #[actix_web::test]
    async fn graphql_requires_session() {
        let state = fixtures::state(fixtures::repositories());
        let schema = create_schema(state.clone());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.jwt_service.clone()))
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(schema))
                .service(graphql),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/graphql")
            .set_json(json!({ "query": "{ settings { ai { enabled } } }" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn my_results_lists_callers_results() {
        let mut quiz = MockQuizRepository::new();
        quiz.expect_list_results()
            .withf(|user_id, _| user_id == "user-1")
            .returning(|user_id, _| Ok(vec![fixtures::result("s-1", user_id)]));

        let mut repositories = fixtures::repositories();
        repositories.quiz = Arc::new(quiz);
        let schema = create_schema(fixtures::state(repositories));

        let user = fixtures::authenticated_user("user-1", None);
        let response = schema
            .execute(
                Request::new("{ myResults { sessionId topGifts } }")
                    .data(user.claims)
                    .data(user.access),
            )
            .await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["myResults"][0]["sessionId"], "s-1");
        assert_eq!(data["myResults"][0]["topGifts"], json!(["Teaching", "Mercy"]));
    }

    #[actix_web::test]
    async fn audit_logs_need_permission() {
        let mut profiles = MockProfileRepository::new();
        profiles.expect_get_role().returning(|_, _| Ok(None));
        let mut audit = MockAuditRepository::new();
        audit.expect_list().never();

        let mut repositories = fixtures::repositories();
        repositories.profiles = Arc::new(profiles);
        repositories.audit = Arc::new(audit);
        let schema = create_schema(fixtures::state(repositories));

        let user = fixtures::authenticated_user("user-1", None);
        let response = schema
            .execute(
                Request::new("{ auditLogs(limit: 5) { id action } }")
                    .data(user.claims)
                    .data(user.access),
            )
            .await;

        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].message.starts_with("Forbidden"));
    }

    #[actix_web::test]
    async fn admin_clears_settings_cache() {
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_get_role()
            .returning(|_, _| Ok(Some("admin".to_string())));
        let mut audit = MockAuditRepository::new();
        audit
            .expect_log_action()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut repositories = fixtures::repositories();
        repositories.profiles = Arc::new(profiles);
        repositories.audit = Arc::new(audit);
        let schema = create_schema(fixtures::state(repositories));

        let user = fixtures::authenticated_user("admin-1", None);
        let response = schema
            .execute(
                Request::new("mutation { clearSettingsCache }")
                    .data(user.claims)
                    .data(user.access),
            )
            .await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "clearSettingsCache": true })
        );
    }
}
