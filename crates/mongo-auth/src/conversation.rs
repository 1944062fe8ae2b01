//! Authentication conversations.
//!
//! A conversation produces the command documents the client sends to the
//! credentials' source database. The client checks `ok` on every reply
//! before handing it to [`AuthConversation::step`]; the conversation only
//! interprets successful replies.

use bytes::Bytes;
use mongo_types::{Binary, Document, doc};

use crate::credentials::{AuthMechanism, Credentials};
use crate::error::AuthError;

/// A multi-step authentication exchange.
pub trait AuthConversation: Send {
    /// Mechanism this conversation implements.
    fn mechanism(&self) -> AuthMechanism;

    /// First command to send.
    fn start(&mut self) -> Result<Document, AuthError>;

    /// Consume a successful reply and produce the next command, or `None`
    /// when authentication is complete.
    fn step(&mut self, reply: &Document) -> Result<Option<Document>, AuthError>;
}

/// Build the conversation for `credentials`' mechanism.
pub fn conversation_for(credentials: &Credentials) -> Result<Box<dyn AuthConversation>, AuthError> {
    credentials.validate()?;
    Ok(match credentials.mechanism {
        AuthMechanism::MongoCr => Box::new(MongoCrConversation::new(credentials.clone())),
        AuthMechanism::Plain => Box::new(PlainConversation::new(credentials.clone())),
    })
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Digest the server stores for a user: `md5("<user>:mongo:<password>")`.
#[must_use]
pub fn password_digest(username: &str, password: &str) -> String {
    md5_hex(&format!("{username}:mongo:{password}"))
}

/// Proof sent in `authenticate`: `md5(nonce + user + password_digest)`.
#[must_use]
pub fn mongo_cr_key(nonce: &str, username: &str, password: &str) -> String {
    md5_hex(&format!(
        "{nonce}{username}{}",
        password_digest(username, password)
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrState {
    Initial,
    NonceRequested,
    Authenticating,
    Done,
}

/// `MONGODB-CR`: fetch a nonce, then prove knowledge of the password digest.
#[derive(Debug)]
pub struct MongoCrConversation {
    credentials: Credentials,
    state: CrState,
}

impl MongoCrConversation {
    /// Create a conversation for `credentials`.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            state: CrState::Initial,
        }
    }
}

impl AuthConversation for MongoCrConversation {
    fn mechanism(&self) -> AuthMechanism {
        AuthMechanism::MongoCr
    }

    fn start(&mut self) -> Result<Document, AuthError> {
        self.state = CrState::NonceRequested;
        Ok(doc! { "getnonce" => 1 })
    }

    fn step(&mut self, reply: &Document) -> Result<Option<Document>, AuthError> {
        match self.state {
            CrState::NonceRequested => {
                let nonce = reply
                    .get_str("nonce")
                    .ok_or_else(|| AuthError::UnexpectedReply("getnonce reply has no nonce".into()))?;
                let key = mongo_cr_key(nonce, &self.credentials.username, &self.credentials.password);
                tracing::debug!(user = %self.credentials.username, "answering MONGODB-CR challenge");
                self.state = CrState::Authenticating;
                Ok(Some(doc! {
                    "authenticate" => 1,
                    "user" => &*self.credentials.username,
                    "nonce" => nonce,
                    "key" => key,
                }))
            }
            CrState::Authenticating => {
                self.state = CrState::Done;
                Ok(None)
            }
            CrState::Initial | CrState::Done => Err(AuthError::UnexpectedReply(
                "MONGODB-CR conversation is not expecting a reply".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlainState {
    Initial,
    Started,
    Continued,
    Done,
}

/// SASL `PLAIN`: send `\0user\0password` in one `saslStart`.
#[derive(Debug)]
pub struct PlainConversation {
    credentials: Credentials,
    state: PlainState,
}

impl PlainConversation {
    /// Create a conversation for `credentials`.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            state: PlainState::Initial,
        }
    }

    fn payload(&self) -> Bytes {
        let mut payload = Vec::with_capacity(
            2 + self.credentials.username.len() + self.credentials.password.len(),
        );
        payload.push(0);
        payload.extend_from_slice(self.credentials.username.as_bytes());
        payload.push(0);
        payload.extend_from_slice(self.credentials.password.as_bytes());
        Bytes::from(payload)
    }
}

impl AuthConversation for PlainConversation {
    fn mechanism(&self) -> AuthMechanism {
        AuthMechanism::Plain
    }

    fn start(&mut self) -> Result<Document, AuthError> {
        self.state = PlainState::Started;
        Ok(doc! {
            "saslStart" => 1,
            "mechanism" => AuthMechanism::Plain.as_str(),
            "payload" => Binary::new(self.payload()),
            "autoAuthorize" => 1,
        })
    }

    fn step(&mut self, reply: &Document) -> Result<Option<Document>, AuthError> {
        let done = reply.get_bool("done") == Some(true);
        match (self.state, done) {
            (PlainState::Started | PlainState::Continued, true) => {
                self.state = PlainState::Done;
                Ok(None)
            }
            // Some servers want an empty round before they report completion
            (PlainState::Started, false) => {
                let conversation_id = reply.get_i32("conversationId").ok_or_else(|| {
                    AuthError::UnexpectedReply("saslStart reply has no conversationId".into())
                })?;
                self.state = PlainState::Continued;
                Ok(Some(doc! {
                    "saslContinue" => 1,
                    "conversationId" => conversation_id,
                    "payload" => Binary::new(Bytes::new()),
                }))
            }
            (PlainState::Continued, false) => Err(AuthError::AuthenticationFailed(
                "server did not complete the PLAIN exchange".into(),
            )),
            (PlainState::Initial | PlainState::Done, _) => Err(AuthError::UnexpectedReply(
                "PLAIN conversation is not expecting a reply".into(),
            )),
        }
    }
}
