pub mod config;
pub mod handlers;
pub mod models;
pub mod services;

use axum::middleware::from_fn;
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use atelier_core::middleware::{metrics_middleware, request_id_middleware};

use config::Config;
use services::{AtelierDb, ImageHostClient};

#[derive(Clone)]
pub struct AppState {
    pub db: AtelierDb,
    pub config: Config,
    pub storage: ImageHostClient,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let db = AtelierDb::connect(
            config.database.url.expose_secret(),
            &config.database.db_name,
        )
        .await?;
        db.initialize_indexes().await?;

        let storage = ImageHostClient::new(config.storage.clone());
        if storage.is_configured() {
            tracing::info!("Image host client initialized");
        } else {
            tracing::warn!("Image host not configured - uploads will be rejected");
        }

        let state = AppState {
            db,
            config: config.clone(),
            storage,
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics))
            // Bills
            .route("/bills", post(handlers::bills::create_bill))
            .route("/bills", get(handlers::bills::list_bills))
            .route("/bills/export", get(handlers::bills::export_bills))
            .route("/bills/:id", get(handlers::bills::get_bill))
            .route("/bills/:id", delete(handlers::bills::delete_bill))
            .route("/bills/:id/payments", post(handlers::bills::record_payment))
            // Customers
            .route("/customers", post(handlers::customers::create_customer))
            .route("/customers", get(handlers::customers::list_customers))
            .route("/customers/:id", get(handlers::customers::get_customer))
            .route("/customers/:id", put(handlers::customers::update_customer))
            .route(
                "/customers/:id",
                delete(handlers::customers::delete_customer),
            )
            // Staff and attendance
            .route("/staff", post(handlers::staff::create_staff))
            .route("/staff", get(handlers::staff::list_staff))
            .route("/staff/attendance", get(handlers::staff::list_attendance))
            .route("/staff/:id", get(handlers::staff::get_staff))
            .route("/staff/:id", put(handlers::staff::update_staff))
            .route("/staff/:id", delete(handlers::staff::delete_staff))
            .route(
                "/staff/:id/attendance",
                post(handlers::staff::record_attendance),
            )
            // Inventory
            .route("/inventory", post(handlers::inventory::create_inventory))
            .route("/inventory", get(handlers::inventory::list_inventory))
            .route("/inventory/:id", get(handlers::inventory::get_inventory))
            .route("/inventory/:id", put(handlers::inventory::update_inventory))
            .route(
                "/inventory/:id",
                delete(handlers::inventory::delete_inventory),
            )
            .route(
                "/inventory/:id/stock",
                patch(handlers::inventory::adjust_stock),
            )
            // Work descriptions (service catalog)
            .route(
                "/work-descriptions",
                post(handlers::work_descriptions::create_work_description),
            )
            .route(
                "/work-descriptions",
                get(handlers::work_descriptions::list_work_descriptions),
            )
            .route(
                "/work-descriptions/:id",
                delete(handlers::work_descriptions::delete_work_description),
            )
            // Orders
            .route("/orders", post(handlers::orders::create_order))
            .route("/orders", get(handlers::orders::list_orders))
            .route("/orders/:id", get(handlers::orders::get_order))
            .route("/orders/:id", delete(handlers::orders::delete_order))
            .route(
                "/orders/:id/status",
                patch(handlers::orders::update_order_status),
            )
            .route(
                "/orders/:id/items/:item_id/status",
                patch(handlers::orders::update_order_item_status),
            )
            // Manual income and expenses
            .route("/income", post(handlers::finance::create_income))
            .route("/income", get(handlers::finance::list_income))
            .route("/income/:id", delete(handlers::finance::delete_income))
            .route("/expenses", post(handlers::finance::create_expense))
            .route("/expenses", get(handlers::finance::list_expenses))
            .route("/expenses/:id", delete(handlers::finance::delete_expense))
            // Settings
            .route("/settings", get(handlers::settings::get_settings))
            .route("/settings", put(handlers::settings::update_settings))
            // Analytics (read-only)
            .route("/analytics/roi", get(handlers::analytics::period_roi))
            .route(
                "/analytics/roi/:kind/:entity_id",
                get(handlers::analytics::entity_roi),
            )
            .route(
                "/analytics/monthly",
                get(handlers::analytics::monthly_summary),
            )
            // Deep links
            .route("/links/whatsapp", post(handlers::links::whatsapp))
            .route("/links/upi", post(handlers::links::upi))
            // Uploads
            .route("/uploads/images", post(handlers::uploads::upload_image))
            // Bill maintenance wizard
            .route(
                "/maintenance/bills/diagnosis",
                get(handlers::maintenance::diagnose),
            )
            .route(
                "/maintenance/bills/migration-plan",
                get(handlers::maintenance::migration_plan),
            )
            .route(
                "/maintenance/bills/migrate",
                post(handlers::maintenance::execute_migration),
            )
            .route(
                "/maintenance/bills/fix-duplicates",
                post(handlers::maintenance::fix_duplicates),
            )
            .route(
                "/maintenance/bills/date-formats",
                get(handlers::maintenance::check_date_formats),
            )
            .route(
                "/maintenance/bills/fix-date-formats",
                post(handlers::maintenance::fix_date_formats),
            )
            .layer(from_fn(metrics_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .with_state(state);

        // Port 0 binds a random port, which the tests rely on.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}
