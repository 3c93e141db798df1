//! Simple example of using rotating-proxy-pool.

use rotating_proxy_pool::{ProxyPool, ProxyPoolConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Initializing proxy pool...");

    let config = ProxyPoolConfig::builder()
        .proxies(vec!["127.0.0.1:1080", "127.0.0.1:1081"])
        // free socks5 proxy urls, format like `Free-Proxy`
        .sources(vec![
            "https://cdn.jsdelivr.net/gh/dpangestuw/Free-Proxy@main/socks5_proxies.txt",
        ])
        // never hand out more than two proxies at once
        .max_busy(2)
        .build();

    let pool = ProxyPool::load(config).await?;
    println!("Pool stats: {:?}", pool.get_stats());

    let Some(proxy) = pool.acquire() else {
        println!("No proxy available right now");
        return Ok(());
    };
    println!("Acquired {}", proxy);

    let client = reqwest::Client::builder()
        .proxy(reqwest::Proxy::all(proxy.as_str())?)
        .timeout(Duration::from_secs(10))
        .build()?;

    match client.get("https://httpbin.org/ip").send().await {
        Ok(response) => {
            println!("Status: {}", response.status());
            // give the upstream a breather before reusing this proxy
            pool.defer_release(&proxy, Duration::from_secs(5));
        }
        Err(e) => {
            println!("Request failed: {}", e);
            pool.ban(&proxy, e.to_string());
        }
    }

    println!("Pool stats: {:?}", pool.get_stats());
    Ok(())
}
