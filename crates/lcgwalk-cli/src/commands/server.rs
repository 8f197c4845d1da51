const BATTERY_EXAMPLE: &str =
    r#"{"generator":{"seed":7,"k":2,"c":3,"exponent":16,"count":500},"tests":{"means":true}}"#;

pub fn run(host: &str, port: u16) {
    let base = format!("http://{host}:{port}");

    println!("lcgwalk server v{}", lcgwalk_core::VERSION);
    println!("   {base}");
    println!();
    println!("   Endpoints:");
    println!("     GET  /                  API index (try: curl {base})");
    println!("     GET  /health            Health check");
    println!("     GET  /api/v1/generate   LCG sample (seed, k, c, exponent, count)");
    println!("     POST /api/v1/battery    Run the statistical test battery");
    println!();
    println!("   Examples:");
    println!("     curl '{base}/api/v1/generate?seed=1&k=1&c=1&exponent=4&count=5'");
    println!("     curl -X POST {base}/api/v1/battery -H 'content-type: application/json' \\");
    println!("          -d '{BATTERY_EXAMPLE}'");
    println!();
    println!("   Requests may generate at most {} values.", lcgwalk_server::MAX_COUNT);
    println!();

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| super::fail(e));
    if let Err(e) = rt.block_on(lcgwalk_server::run_server(host, port)) {
        super::fail(format!("server stopped: {e}"));
    }
}
