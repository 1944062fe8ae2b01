//! # mongo-auth
//!
//! Authentication for connections, isolated from connection logic for
//! better modularity and testing.
//!
//! Authentication is a sequence of ordinary commands sent to the
//! credentials' source database. This crate only builds and interprets
//! those command documents; the client drives the exchange.
//!
//! ## Supported Authentication Methods
//!
//! | Method | Description |
//! |--------|-------------|
//! | `MONGODB-CR` | Nonce challenge/response over an MD5 password digest |
//! | `PLAIN` | SASL PLAIN, username and password in one message |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod conversation;
pub mod credentials;
pub mod error;

pub use conversation::{AuthConversation, MongoCrConversation, PlainConversation, conversation_for};
pub use credentials::{AuthMechanism, Credentials};
pub use error::AuthError;
