//! Typed queries over well-known game roots
//!
//! [`Mirror`] owns the current [`Session`] and attaches lazily. Each query
//! resolves a static root, follows a short field path, decodes the subtree
//! and projects it into a record from [`model`].
//!
//! Outcomes:
//! - the target is on another screen, or a subtree failed to decode: an empty
//!   result (`None`, empty list, `false`)
//! - a type or field name is missing from the metadata: the error is returned
//! - the target is not running or has exited: `AttachFailed`, and the
//!   session is dropped so the next call attaches again

mod account;
mod arena;
mod collection;
mod game;
pub mod model;
mod packs;
pub(crate) mod project;

pub use model::{
    AccountId, ArenaInfo, Card, Deck, ManaFilter, MatchInfo, MatchPlayer, MirrorSnapshot,
    RewardData, ServerInfo, SetFilter,
};

use crate::config::Config;
use crate::core::types::{MirrorError, MirrorResult};
use crate::session::Session;
use crate::walker::Walker;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

type Connector = Box<dyn Fn(&Config) -> MirrorResult<Session> + Send + Sync>;

/// Query facade over a lazily attached session
pub struct Mirror {
    config: Config,
    session: RwLock<Option<Arc<Session>>>,
    connector: Connector,
}

impl Mirror {
    pub fn new(config: Config) -> Self {
        Mirror::with_connector(config, |config: &Config| {
            Session::attach(&config.target, &config.locator)
        })
    }

    /// Starts with an existing session instead of attaching by name
    pub fn with_session(config: Config, session: Session) -> Self {
        let mirror = Mirror::new(config);
        *mirror.session.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(session));
        mirror
    }

    /// Attaches through `connector` whenever no session is held
    pub fn with_connector(
        config: Config,
        connector: impl Fn(&Config) -> MirrorResult<Session> + Send + Sync + 'static,
    ) -> Self {
        Mirror {
            config,
            session: RwLock::new(None),
            connector: Box::new(connector),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_attached(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn current(&self) -> Option<Arc<Session>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }

    /// Returns the current session, attaching first if there is none
    ///
    /// The lock is not held while attaching. Errors from the locator
    /// (`NotReady`, `UnsupportedRuntime`, `InvalidPe`) are returned as is.
    pub fn connect(&self) -> MirrorResult<Arc<Session>> {
        if let Some(session) = self.current() {
            return Ok(session);
        }

        let session = Arc::new((self.connector)(&self.config)?);
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            // another caller attached first
            Some(existing) => Ok(Arc::clone(existing)),
            None => {
                *slot = Some(Arc::clone(&session));
                Ok(session)
            }
        }
    }

    /// Forgets the current session
    pub fn disconnect(&self) {
        self.session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn drop_session(&self, session: &Arc<Session>) {
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, session)) {
            slot.take();
        }
    }

    /// Runs one query with a fresh walker and applies the outcome policy
    fn query<T: Default>(
        &self,
        name: &str,
        run: impl FnOnce(&mut Walker<'_>) -> MirrorResult<T>,
    ) -> MirrorResult<T> {
        let session = self.connect()?;
        let result = {
            let mut walker = session.walker(&self.config.walker);
            let result = run(&mut walker);
            let stats = walker.cache_stats();
            debug!(query = name, hits = stats.hits, misses = stats.misses, "Query finished");
            result
        };

        if !session.is_alive() {
            warn!(query = name, pid = session.process().pid(), "Target process exited");
            self.drop_session(&session);
            return Err(MirrorError::attach_failed("target process exited"));
        }

        match result {
            Ok(value) => Ok(value),
            Err(e) if e.is_missing_data() => {
                debug!(query = name, error = %e, "Query result unavailable");
                Ok(T::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Runs the main queries in one go
    pub fn snapshot(&self) -> MirrorResult<MirrorSnapshot> {
        Ok(MirrorSnapshot {
            game_type: self.get_game_type()?,
            format_type: self.get_format()?,
            spectating: self.is_spectating()?,
            decks: self.get_decks()?,
            selected_deck: self.get_selected_deck_in_menu()?,
            arena: self.get_arena_deck()?,
            match_info: self.get_match_info()?,
            account_id: self.get_account_id()?,
        })
    }
}
