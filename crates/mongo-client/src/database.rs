//! Database handles.

use mongo_protocol::validate_database_name;
use mongo_types::{Document, doc};

use crate::client::Client;
use crate::collection::Collection;
use crate::cursor::Cursor;
use crate::error::Result;

/// A named database on a client's server.
///
/// Creating a handle is free; the name is validated on first use.
#[derive(Debug)]
pub struct Database<'a> {
    client: &'a mut Client,
    name: String,
}

impl<'a> Database<'a> {
    pub(crate) fn new(client: &'a mut Client, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
        }
    }

    /// Database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A handle to collection `name` in this database.
    pub fn collection(&mut self, name: &str) -> Collection<'_> {
        Collection::new(self.client, &self.name, name)
    }

    /// Consume the database handle, keeping the client borrow for the
    /// collection.
    pub fn into_collection(self, name: &str) -> Collection<'a> {
        Collection::new(self.client, &self.name, name)
    }

    /// Run a command against this database.
    pub async fn run_command(&mut self, command: Document) -> Result<Document> {
        validate_database_name(&self.name)?;
        self.client.run_command_on(&self.name, command).await
    }

    /// Names of the collections in this database.
    pub async fn list_collection_names(&mut self) -> Result<Vec<String>> {
        validate_database_name(&self.name)?;
        let batch_size = self.client.config().batch_size;
        let reply = self
            .client
            .run_command_on(
                &self.name,
                doc! { "listCollections" => 1, "nameOnly" => true, "cursor" => doc! {} },
            )
            .await?;

        let mut cursor = Cursor::from_command_reply(self.client.connection(), &reply, batch_size)?;
        let mut names = Vec::new();
        while let Some(mut entry) = cursor.next().await? {
            names.push(entry.take_as::<String>("name")?);
        }
        Ok(names)
    }

    /// Drop this database and everything in it.
    pub async fn drop(&mut self) -> Result<()> {
        tracing::info!(database = %self.name, "dropping database");
        self.run_command(doc! { "dropDatabase" => 1 }).await?;
        Ok(())
    }
}
