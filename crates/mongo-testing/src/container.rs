//! MongoDB container support via testcontainers.

use testcontainers::Image;
use testcontainers::core::{ContainerPort, WaitFor};

/// Port the server listens on inside the container.
pub const MONGO_PORT: u16 = 27017;

/// MongoDB container image.
///
/// Defaults to a 3.6 server, the newest release that still answers
/// legacy `OP_QUERY` requests for every command.
#[derive(Debug, Clone)]
pub struct MongoContainer {
    /// Container tag (version).
    pub tag: String,
    /// Root user created at startup, with its password.
    pub root_user: Option<(String, String)>,
}

impl Default for MongoContainer {
    fn default() -> Self {
        Self {
            tag: "3.6".to_string(),
            root_user: None,
        }
    }
}

impl MongoContainer {
    /// Create a new MongoDB container configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the container tag (MongoDB version).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Create a root user in the `admin` database and enable authentication.
    #[must_use]
    pub fn with_root_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.root_user = Some((username.into(), password.into()));
        self
    }
}

impl Image for MongoContainer {
    fn name(&self) -> &str {
        "mongo"
    }

    fn tag(&self) -> &str {
        &self.tag
    }

    fn ready_conditions(&self) -> Vec<WaitFor> {
        vec![WaitFor::message_on_stdout("waiting for connections on port")]
    }

    fn env_vars(
        &self,
    ) -> impl IntoIterator<
        Item = (
            impl Into<std::borrow::Cow<'_, str>>,
            impl Into<std::borrow::Cow<'_, str>>,
        ),
    > {
        self.root_user
            .iter()
            .flat_map(|(user, password)| {
                [
                    ("MONGO_INITDB_ROOT_USERNAME", user.as_str()),
                    ("MONGO_INITDB_ROOT_PASSWORD", password.as_str()),
                ]
            })
            .collect::<Vec<_>>()
    }

    fn expose_ports(&self) -> &[ContainerPort] {
        &[ContainerPort::Tcp(MONGO_PORT)]
    }
}
