use nearby_api::{AppState, Config, build_router};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!(
        "Location search: default radius {} miles, expansion schedule {:?}, threshold {} posts",
        config.expansion.default_radius_miles(),
        config.expansion.schedule(),
        config.expansion.min_posts()
    );

    if config.redirect_https {
        info!("Plain HTTP requests will be redirected to HTTPS");
    }

    let app = build_router(AppState::new(config));

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server running on http://{}", addr);
    info!("API Endpoints:");
    info!("  GET    /heartbeat                                  - Heartbeat");
    info!("  GET    /health                                     - Health check");
    info!("  POST   /api/v1/signup                              - Create account");
    info!("  POST   /api/v1/login                               - Login");
    info!("  GET    /api/v1/users/{{id}}                          - Get user (auth)");
    info!("  GET    /api/v1/posts_by_location                   - Posts near lat/long (auth)");
    info!("  POST   /api/v1/posts                               - Create post (auth)");
    info!("  GET    /api/v1/post/{{id}}                           - Get post (auth)");
    info!("  DELETE /api/v1/post/{{id}}                           - Delete post (auth, owner only)");
    info!("  GET    /api/v1/posts/{{id}}/comments                 - List comments (auth)");
    info!("  POST   /api/v1/posts/{{id}}/comments                 - Comment on post (auth)");
    info!("  DELETE /api/v1/posts/{{id}}/comments/{{comment_id}}    - Delete comment (auth, owner only)");

    axum::serve(listener, app).await?;

    Ok(())
}
