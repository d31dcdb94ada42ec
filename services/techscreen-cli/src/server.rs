use crate::cli::ServeArgs;
use crate::infra::{open_controller, AppState};
use crate::routes::with_interview_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use techscreen::config::AppConfig;
use techscreen::error::AppError;
use techscreen::telemetry::{self, LogSink};
use techscreen::workflows::interview::{spawn_ticker, InterviewApp};
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, &LogSink::Stderr)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (controller, report) = open_controller(&config);
    info!(source = ?report.source, resumed = report.resumption.is_some(), "interview state loaded");
    let generation = controller.generation();
    let controller = Arc::new(Mutex::new(controller));
    let tick_period = config.interview.tick_period;
    let _ticker = spawn_ticker(controller.clone(), generation, tick_period);

    let app = with_interview_routes(InterviewApp {
        controller,
        tick_period,
    })
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, data_dir = %config.storage.data_dir.display(), "interview service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
