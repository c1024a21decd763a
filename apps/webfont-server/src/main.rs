//! Webfont Kit Server
//!
//! Turns an uploaded TrueType or OpenType font into a ready-to-serve web font
//! kit. Provides REST API endpoints for:
//!
//! - Font conversion (multipart upload in, ZIP kit out)
//! - Listing the supported output formats
//! - Health checks
//!
//! ## Configuration
//!
//! Every flag can also be set through the environment (a `.env` file is
//! loaded if present): `HOST`, `PORT`, `MAX_UPLOAD_MB`, `RATE_LIMIT`.
//! Log filtering follows `RUST_LOG`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::header,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use webfont_core::{EncoderRegistry, FontPackager};

mod api;
mod error;
mod multipart;

use api::{handle_convert_font, handle_health, handle_list_formats, FORMATS_HEADER};

/// Multipart framing and format fields on top of the font itself
const BODY_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Command-line arguments for the webfont server
#[derive(Parser, Debug)]
#[command(name = "webfont-server")]
#[command(about = "Web font kit generator: TTF/OTF in, zipped @font-face kit out")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Maximum accepted font size in MiB
    #[arg(long, env = "MAX_UPLOAD_MB", default_value = "5")]
    max_upload_mb: usize,

    /// Rate limit: requests per second per IP
    #[arg(long, env = "RATE_LIMIT", default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub packager: Arc<FontPackager>,
}

impl AppState {
    pub fn new(packager: FontPackager) -> Self {
        Self {
            packager: Arc::new(packager),
        }
    }
}

/// Routes plus every layer except rate limiting, which needs peer addresses
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.packager.max_upload_bytes() + BODY_OVERHEAD_BYTES;

    // Browsers only expose non-safelisted headers that are listed here
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::CONTENT_DISPOSITION, FORMATS_HEADER]);

    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/fonts/formats", get(handle_list_formats))
        .route("/api/fonts/convert", post(handle_convert_font))
        // Apply middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting webfont server on {}:{}", args.host, args.port);

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit: {}", args.rate_limit))?,
    );

    let max_upload_bytes = args.max_upload_mb * 1024 * 1024;
    let state = AppState::new(FontPackager::new(
        EncoderRegistry::native(),
        max_upload_bytes,
    ));

    let app = build_router(state).layer(GovernorLayer {
        config: governor_conf,
    });

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Upload limit: {} bytes", max_upload_bytes);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
