//! Connection pool example.
//!
//! Runs a few concurrent tasks that each check out a client, count the
//! documents in a collection and hand the client back.
//!
//! Set `MONGO_URI` to point at a server, e.g. `mongodb://localhost:27017/test`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use mongo_client::{Config, doc};
use mongo_driver_pool::{Pool, PoolConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let uri = std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017/test".into());
    let pool = Pool::builder()
        .client_config(Config::from_connection_string(&uri)?)
        .pool_config(
            PoolConfig::new()
                .min_connections(1)
                .max_connections(4)
                .acquire_timeout(Duration::from_secs(10)),
        )
        .build()
        .await?;

    let mut tasks = Vec::new();
    for worker in 0..8 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            let mut client = pool.get().await?;
            let mut db = client.database("test");
            let count = db.collection("people").count_documents(doc! {}).await?;
            println!("worker {worker}: {count} people");
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(())
        }));
    }
    for task in tasks {
        task.await??;
    }

    println!("pool status: {:?}", pool.status());
    pool.close().await;
    Ok(())
}
