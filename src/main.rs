use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};

use gifts_server::{
    app_state::AppState,
    auth::AuthMiddleware,
    config::Config,
    graphql::create_schema,
    handlers::{self, auth_handler, graphql_handler, page_handler, settings_handler},
    middleware::{GateMiddleware, RequestIdMiddleware},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        config.validate_for_production();
    }

    let bind = (config.web_server_host.clone(), config.web_server_port);
    let site_url = config.site_url.clone();

    let state = AppState::new(config).map_err(std::io::Error::other)?;
    let schema = create_schema(state.clone());

    log::info!("Starting HTTP server on {}:{}", bind.0, bind.1);
    log::info!("GraphiQL playground: http://{}:{}/graphiql", bind.0, bind.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&site_url)
            .allowed_methods(vec!["GET", "POST", "PUT"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.jwt_service.clone()))
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(schema.clone()))
            .wrap(GateMiddleware)
            .wrap(cors)
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(r#"%a "%r" %s %b %T %{x-request-id}o"#))
            .service(handlers::health_check)
            .service(handlers::health_check_live)
            .service(handlers::health_check_ready)
            .service(auth_handler::auth_callback)
            .service(auth_handler::sign_out)
            .service(settings_handler::public_config)
            .service(graphql_handler::graphql)
            .service(graphql_handler::graphiql)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(handlers::configure_api),
            )
            .service(page_handler::locale_root)
            .service(page_handler::page)
    })
    .bind(bind)?
    .run()
    .await
}
