/* demos/axum.rs */

use axum::{
    Router,
    extract::ConnectInfo,
    response::{Html, Json},
    routing::get,
};
use realip::{HeaderSet, RealIp, RealIpLayer, Resolver};
use serde_json::json;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = create_app();
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();

    println!("Server starting on http://localhost:3000");
    println!("Test endpoints:");
    println!("  • GET /       - Hello World with the resolved client address");
    println!("  • GET /debug  - JSON with the address, its source and the raw inputs");
    println!();
    println!("Test with headers:");
    println!("  curl http://localhost:3000/debug");
    println!("  curl -H 'X-Forwarded-For: 10.0.0.1, 203.0.113.9' http://localhost:3000/debug");
    println!("  curl -H 'X-Forwarded-For: 10.0.0.1' -H 'X-Real-Ip: 198.51.100.7' http://localhost:3000/debug");
    println!();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(hello_handler))
        .route("/debug", get(debug_handler))
        .layer(RealIpLayer::new())
}

/// Basic hello world handler that shows the resolved address
async fn hello_handler(RealIp(ip): RealIp) -> Html<String> {
    let shown = if ip.is_empty() { "unknown" } else { ip.as_str() };
    Html(format!(
        "<!DOCTYPE html><html><body><h1>Hello, World!</h1><p>Your address is: <b>{}</b></p></body></html>",
        shown
    ))
}

/// Debug handler showing how the address was chosen
async fn debug_handler(
    RealIp(ip): RealIp,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: axum::http::HeaderMap,
) -> Json<serde_json::Value> {
    let header_set = HeaderSet::from_http(&headers);
    let resolution = Resolver::new().resolve(&addr.to_string(), &header_set);

    Json(json!({
        "real_ip": ip,
        "source": format!("{:?}", resolution.source),
        "connection_info": {
            "remote_addr": addr.to_string(),
            "remote_ip": addr.ip().to_string(),
            "remote_port": addr.port(),
        },
        "x_real_ip": header_set.real_ip.as_deref(),
        "x_forwarded_for": header_set.forwarded_for.as_deref(),
    }))
}
