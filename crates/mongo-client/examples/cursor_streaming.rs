//! Cursor streaming example.
//!
//! Reads a collection larger than one reply, first by pulling documents
//! from the cursor and then by adapting it into a `Stream`.
//!
//! # Running
//!
//! ```bash
//! export MONGO_URI=mongodb://localhost:27017/example
//! cargo run --example cursor_streaming
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use futures_util::{StreamExt, TryStreamExt};
use mongo_client::{Client, Config, Document, Error, FindOptions, doc};

const DOCUMENTS: i32 = 1_000;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let uri = std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost/example".into());
    let mut client = Client::connect(Config::from_connection_string(&uri)?).await?;
    let db_name = client.config().database.clone().unwrap_or_else(|| "example".into());

    let mut events = client.database(&db_name).into_collection("events");
    events.drop().await?;
    let batch: Vec<Document> = (0..DOCUMENTS)
        .map(|i| doc! { "seq" => i, "kind" => if i % 2 == 0 { "even" } else { "odd" } })
        .collect();
    events.insert_many(batch).await?;

    // Pull-based: the cursor fetches another batch when the current one runs out
    let mut cursor = events
        .find_with(doc! {}, FindOptions::new().batch_size(100))
        .await?;
    let mut count = 0;
    while cursor.next().await?.is_some() {
        count += 1;
    }
    println!("Read {count} documents in batches of 100");
    drop(cursor);

    // Stream-based, with an early stop that kills the server cursor
    let cursor = events
        .find_with(
            doc! { "kind" => "odd" },
            FindOptions::new().batch_size(50).sort(doc! { "seq" => -1 }),
        )
        .await?;
    let newest: Vec<Document> = cursor.into_stream().take(5).try_collect().await?;
    for event in &newest {
        println!("odd event {}", event.get_i32("seq").unwrap_or_default());
    }

    events.drop().await?;
    client.close().await;
    Ok(())
}
