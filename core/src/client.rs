//! Entry point: log in, then reach the user's resource graph.
//!
//! # Design
//! `Client` holds the shared session and lazily fetches the authenticated
//! user once. Everything else hangs off that `User`: its collections, its
//! pending shares and the resources inside them all reuse the same session.

use std::rc::Rc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::Transport;
use crate::session::Session;
use crate::transport::UreqTransport;
use crate::user::User;

#[derive(Debug)]
pub struct Client {
    session: Rc<Session>,
    user: Option<User>,
}

impl Client {
    /// Authenticate over `transport`. Wrong credentials yield
    /// `ApiError::Unauthorized` and no client.
    pub fn login(
        transport: Rc<dyn Transport>,
        config: &ClientConfig,
        email: &str,
        password: &str,
    ) -> Result<Self> {
        let session = Session::login(transport, config, email, password)?;
        Ok(Self::from_session(Rc::new(session)))
    }

    /// Authenticate against the host named by `ANYDO_BASE_URL` (or the
    /// production host) with the default blocking transport.
    pub fn connect(email: &str, password: &str) -> Result<Self> {
        Self::login(
            Rc::new(UreqTransport::new()),
            &ClientConfig::from_env(),
            email,
            password,
        )
    }

    pub fn from_session(session: Rc<Session>) -> Self {
        Self {
            session,
            user: None,
        }
    }

    pub fn session(&self) -> &Rc<Session> {
        &self.session
    }

    /// The authenticated user. Fetched on first call and cached; pass
    /// `refresh` to replace the cached user (discarding its collections).
    pub fn me(&mut self, refresh: bool) -> Result<&mut User> {
        let user = match self.user.take() {
            Some(user) if !refresh => user,
            previous => match User::fetch(Rc::clone(&self.session)) {
                Ok(user) => user,
                Err(err) => {
                    self.user = previous;
                    return Err(err);
                }
            },
        };
        Ok(self.user.insert(user))
    }

    /// Give up the client, keeping the cached user if one was fetched.
    pub fn into_user(self) -> Option<User> {
        self.user
    }
}
