//! Fires a burst of subscribe requests at a locally running instance to watch the rate limiter kick in.
//! Start the server first with `cargo run`.

use serde_json::json;
use tokio::task::JoinSet;

const SUBSCRIBE_URL: &str = "http://localhost:8080/api/subscribe";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    _singlethread(&client).await?;
    _multithread(&client).await?;

    Ok(())
}

async fn _singlethread(client: &reqwest::Client) -> anyhow::Result<()> {
    for i in 0..10 {
        let resp = client
            .post(SUBSCRIBE_URL)
            .header("x-real-ip", "192.0.2.1")
            .json(&json!({ "email": format!("reader{i}@example.com") }))
            .send()
            .await?;
        println!(
            "sequential #{i}: {} (remaining: {:?})",
            resp.status(),
            resp.headers().get("x-ratelimit-remaining")
        );
    }

    Ok(())
}

async fn _multithread(client: &reqwest::Client) -> anyhow::Result<()> {
    let mut join_set = JoinSet::new();
    for i in 0..100 {
        let client = client.clone();
        join_set.spawn(
            client
                .post(SUBSCRIBE_URL)
                .header("x-real-ip", "192.0.2.2")
                .json(&json!({ "email": format!("burst{i}@example.com") }))
                .send(),
        );
    }

    let mut accepted = 0;
    let mut throttled = 0;
    while let Some(resp) = join_set.join_next().await {
        match resp??.status().as_u16() {
            429 => throttled += 1,
            _ => accepted += 1,
        }
    }
    println!("burst: {accepted} got past the limiter, {throttled} throttled");

    Ok(())
}
