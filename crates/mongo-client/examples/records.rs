//! Typed records example.
//!
//! Maps documents onto Rust structs with the `FromDocument` and
//! `ToDocument` derives, keeping unknown fields in an expando document.
//!
//! # Running
//!
//! ```bash
//! export MONGO_URI="mongodb://localhost:27017/example?expandoProperties=true"
//! cargo run --example records
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use mongo_client::{Client, Config, Document, Error, doc};
use mongo_derive::{FromDocument, ToDocument};

#[derive(Debug, FromDocument, ToDocument)]
#[mongo(rename_all = "camelCase")]
struct Person {
    #[mongo(rename = "_id")]
    id: i32,
    full_name: String,
    age: i64,
    #[mongo(default)]
    nickname: Option<String>,
    #[mongo(expando)]
    extra: Document,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let uri = std::env::var("MONGO_URI")
        .unwrap_or_else(|_| "mongodb://localhost/example?expandoProperties=true".into());
    let mut client = Client::connect(Config::from_connection_string(&uri)?).await?;
    let db_name = client.config().database.clone().unwrap_or_else(|| "example".into());
    let mut people = client.database(&db_name).into_collection("people");
    people.drop().await?;

    let ada = Person {
        id: 1,
        full_name: "Ada Lovelace".into(),
        age: 36,
        nickname: None,
        extra: doc! { "born" => 1815 },
    };
    people.insert_record(&ada).await?;

    // A document written by someone else, with a field Person does not declare
    people
        .insert_one(doc! { "_id" => 2, "fullName" => "Alan Turing", "age" => 41i64, "field" => "logic" })
        .await?;

    let mut cursor = people.find(doc! {}).await?;
    while let Some(person) = cursor.next_record::<Person>().await? {
        println!("{person:?}");
    }
    drop(cursor);

    let alan: Option<Person> = people.find_one_record(doc! { "_id" => 2 }).await?;
    if let Some(alan) = alan {
        println!("extra fields on Alan: {}", alan.extra);
    }

    people.drop().await?;
    client.close().await;
    Ok(())
}
