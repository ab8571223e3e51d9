//! attendance-gate entry point.
//!
//! Loads configuration, sets up tracing, wires the adapters, starts the
//! reconciliation loop and serves the HTTP façade until Ctrl-C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

use attendance_gate::adapters::{
    attendance_router, AttendanceAppState, BoundedDedupLedger, HttpFeeStatusClient,
    LedgerLimits, LogReceiptSink, QueueDeviceGateway, ReceiptLayout, SchoolApiClientConfig,
    TextReceiptSink, TextSinkConfig,
};
use attendance_gate::application::{
    Dispatcher, DispatcherConfig, ReconcileConfig, ReconciliationLoop,
};
use attendance_gate::config::{AppConfig, DeviceKind, PrinterConfig, PrinterKind, ServerConfig};
use attendance_gate::ports::ReceiptSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    init_tracing(&config.server);

    // Fee service
    let school_api = SchoolApiClientConfig::new(config.school_api.url()?)
        .with_api_key(config.school_api.api_key())
        .with_timeout(config.school_api.timeout());
    let fee_client =
        Arc::new(HttpFeeStatusClient::new(school_api).context("building school API client")?);

    // Printer; a missing printer degrades dispatch instead of aborting startup.
    let sink = build_sink(&config.printer).await;
    let dispatcher = Arc::new(Dispatcher::with_config(
        fee_client,
        sink,
        DispatcherConfig::default()
            .with_fee_timeout(config.school_api.timeout())
            .with_print_timeout(config.printer.timeout()),
    ));

    // Device
    let device_queue = match config.device.kind {
        DeviceKind::Queue => Arc::new(QueueDeviceGateway::new(config.device.address())),
    };

    // Reconciliation loop
    let ledger = BoundedDedupLedger::new(
        LedgerLimits::default()
            .with_capacity(config.reconcile.ledger_capacity)
            .with_retention(config.reconcile.ledger_retention()),
    );
    let reconciler = ReconciliationLoop::with_config(
        device_queue.clone(),
        dispatcher.clone(),
        Box::new(ledger),
        ReconcileConfig::default()
            .with_poll_interval(config.reconcile.poll_interval())
            .with_reconnect_backoff(config.reconcile.reconnect_backoff())
            .with_device_timeout(config.device.timeout()),
    );
    let loop_status = reconciler.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reconciler_task = tokio::spawn(reconciler.run(shutdown_rx));

    // HTTP façade
    let state = AttendanceAppState {
        dispatcher,
        device_queue,
        loop_status,
    };
    let app = attendance_router()
        .with_state(state)
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let addr = config.server.socket_addr()?;
    info!(
        %addr,
        environment = ?config.server.environment,
        device = %config.device.address(),
        "attendance-gate listening on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    info!("Shutting down reconciliation loop");
    let _ = shutdown_tx.send(true);
    reconciler_task
        .await
        .context("reconciliation loop panicked")?;

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| server.log_level.as_str().into());

    if server.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_sink(printer: &PrinterConfig) -> Option<Arc<dyn ReceiptSink>> {
    let layout = ReceiptLayout::new(printer.header.clone());
    match (printer.kind, &printer.path) {
        (PrinterKind::Log, _) => Some(Arc::new(LogReceiptSink::new()) as Arc<dyn ReceiptSink>),
        (PrinterKind::File, Some(path)) => {
            let config = TextSinkConfig::new(path)
                .with_timeout(printer.timeout())
                .with_layout(layout);
            match TextReceiptSink::open(config).await {
                Ok(sink) => {
                    info!(path = %sink.path().display(), "Receipt printer ready");
                    Some(Arc::new(sink) as Arc<dyn ReceiptSink>)
                }
                Err(e) => {
                    warn!(error = %e, "Running without a receipt printer");
                    None
                }
            }
        }
        (PrinterKind::File, None) => {
            warn!("Printer path not configured, running without a receipt printer");
            None
        }
    }
}
