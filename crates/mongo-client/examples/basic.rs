//! Basic connection and CRUD example.
//!
//! This example connects to a server, lists its databases and runs an
//! insert, a filtered find and a delete against a scratch collection.
//!
//! # Running
//!
//! ```bash
//! # Any server that accepts legacy OP_QUERY commands
//! docker run -d -p 27017:27017 mongo:3.6
//!
//! export MONGO_URI=mongodb://localhost:27017/example
//! cargo run --example basic
//! ```

// Allow common patterns in example code
#![allow(clippy::unwrap_used, clippy::expect_used)]

use mongo_client::{Client, Config, Error, doc};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let uri = std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost/example".into());
    let config = Config::from_connection_string(&uri)?;

    println!("Connecting to {}:{}...", config.host, config.port);
    let mut client = Client::connect(config).await?;
    println!(
        "Connected (max wire version {})",
        client.server_info().max_wire_version
    );

    println!("Databases:");
    for name in client.list_database_names().await? {
        println!("  {}", name?);
    }

    let mut db = client
        .default_database()
        .expect("connection string names a database");
    let mut people = db.collection("people");

    let id = people
        .insert_one(doc! { "name" => "Ada", "age" => 36i64 })
        .await?;
    println!("Inserted document with _id {id}");

    let mut cursor = people.find(doc! { "name" => "Ada" }).await?;
    while let Some(person) = cursor.next().await? {
        println!("Found: {person}");
    }
    drop(cursor);

    let deleted = people.delete_many(doc! { "name" => "Ada" }).await?;
    println!("Deleted {deleted} document(s)");

    client.close().await;
    println!("Connection closed.");

    Ok(())
}
