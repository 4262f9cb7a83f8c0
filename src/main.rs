use actix_cors::Cors;
use actix_web::http::Method;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use human_panic::setup_panic;
use std::str::FromStr;
use tracing::{debug, error, warn};

// 从 lib.rs 导入模块
use rust_attendify::config::{AppConfig, CorsConfig};
use rust_attendify::models::AppStartTime;
use rust_attendify::routes;
use rust_attendify::runtime::lifetime;
use rust_attendify::utils::{json_error_handler, query_error_handler};

/// 未配置来源时允许任意来源（开发环境）
fn build_cors(config: &CorsConfig) -> Cors {
    let cors = if config.allowed_origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        config
            .allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .supports_credentials()
    };
    // 忽略无法识别的方法名
    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| Method::from_str(&m.to_uppercase()).ok())
        .collect();
    cors.allowed_methods(methods.iter().map(Method::as_str))
        .allowed_headers(config.allowed_headers.iter().map(String::as_str))
        .max_age(config.max_age)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    // 记录程序启动时间
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    // 启动前预处理 //

    // 初始化配置
    setup_panic!();
    if let Err(e) = AppConfig::init() {
        eprintln!("Failed to initialize configuration: {e}");
        std::process::exit(1);
    }
    let config = AppConfig::get();

    // 初始化日志
    let stdout_log = std::io::stdout();
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(stdout_log);
    let filter = tracing_subscriber::EnvFilter::new(&config.app.log_level);
    let tracing_format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_ansi(true);

    let tracing_builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking_writer)
        .event_format(tracing_format);

    if config.is_development() {
        tracing_builder
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        tracing_builder.json().init();
    }

    // 打印信息
    warn!(
        "Starting pre-startup processing...
        Project: {}
        Version: {}
        Authors: {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS")
    );

    let startup = match lifetime::startup::prepare_server_startup().await {
        Ok(startup) => startup,
        Err(e) => {
            error!("Startup failed: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    let storage = startup.storage.clone();
    let cache = startup.cache.clone();

    // 输出预处理时间
    debug!(
        "Pre-startup processing completed in {} ms",
        chrono::Utc::now()
            .signed_duration_since(app_start_time.start_datetime)
            .num_milliseconds()
    );

    // 预处理完成 //

    warn!("Using {} CPU cores for the server", config.server.workers);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config.cors))
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add((
                        "Keep-Alive",
                        format!("timeout={}, max=1000", config.server.timeouts.keep_alive),
                    ))
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .app_data(web::QueryConfig::default().error_handler(query_error_handler)) // 设置查询参数错误处理器
            .app_data(web::JsonConfig::default().error_handler(json_error_handler)) // 设置JSON错误处理器
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(
                config.server.limits.max_payload_size,
            )) // 设置最大请求体大小
            .configure(routes::configure_auth_routes) // 认证
            .configure(routes::configure_admin_routes) // 仪表盘与导出
            .configure(routes::configure_teachers_routes) // 教师管理
            .configure(routes::configure_students_routes) // 学生管理
            .configure(routes::configure_classes_routes) // 班级与课表
            .configure(routes::configure_exams_routes) // 考试与座位
            .configure(routes::configure_attendances_routes) // 点名记录
            .configure(routes::configure_feedbacks_routes) // 反馈
            .configure(routes::configure_teacher_routes) // 教师端
            .wrap(Compress::default())
    })
    .keep_alive(std::time::Duration::from_secs(
        config.server.timeouts.keep_alive,
    )) // 启用长连接
    .client_request_timeout(std::time::Duration::from_millis(
        config.server.timeouts.client_request,
    )) // 客户端超时
    .client_disconnect_timeout(std::time::Duration::from_millis(
        config.server.timeouts.client_disconnect,
    )) // 断连超时
    .workers(config.server.workers);

    let server = {
        #[cfg(unix)]
        {
            if let Some(socket_path) = config.unix_socket_path() {
                warn!("Starting server on Unix socket: {}", socket_path);
                if std::path::Path::new(socket_path).exists() {
                    std::fs::remove_file(socket_path)?;
                }
                server.bind_uds(socket_path)?
            } else {
                let bind_address = config.server_bind_address();
                warn!("Starting server at http://{}", bind_address);
                server.bind(bind_address)?
            }
        }

        #[cfg(not(unix))]
        {
            let bind_address = config.server_bind_address();
            warn!("Starting server at http://{}", bind_address);
            server.bind(bind_address)?
        }
    }
    .run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}
