use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines

use draw_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::SupabaseAuthService,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::{AuthService, DrawService},
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().context("Failed to load configuration")?;

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database connection pool")?;

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);
    let supabase = SupabaseAuthService::new(config.auth_provider.clone())
        .context("Failed to build auth provider client")?;

    // 创建服务
    let draw_service = DrawService::new(pool.clone());
    let auth_service = AuthService::new(
        supabase,
        jwt_service.clone(),
        config.demo_business.clone(),
    );
    let demo_business = config.demo_business.clone();

    log::info!(
        "Starting HTTP server at {}:{} (demo business {})",
        config.server.host,
        config.server.port,
        demo_business.id
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone(), demo_business.id))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(draw_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(demo_business.clone()))
            .configure(swagger_config)
            .configure(handlers::configure_api)
    })
    .bind((config.server.host.as_str(), config.server.port))
    .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
