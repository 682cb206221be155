//! # State Module
//!
//! Shared application state handed to every handler.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  AppState (cheap to clone, one per server)                              │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   Database   │  │ SessionStore │  │  PaymentGateway  │              │
//! │  │  (SQLite     │  │  Arc<DashMap │  │  Arc<dyn ...>    │              │
//! │  │   pool)      │  │   <Session>> │  │  PayPal / fake   │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • SessionStore: sharded locks, held only inside sync closures         │
//! │  • PaymentGateway: Send + Sync, stateless per call                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod session;

use std::sync::Arc;

use shopfront_db::Database;

use crate::config::ServerConfig;
use crate::services::payment::PaymentGateway;

pub use session::{
    session_layer, PendingCheckout, Session, SessionId, SessionStore, SESSION_HEADER,
    SESSION_IDLE_HOURS,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: Arc<SessionStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, gateway: Arc<dyn PaymentGateway>, config: ServerConfig) -> Self {
        AppState {
            db,
            sessions: Arc::new(SessionStore::new()),
            gateway,
            config: Arc::new(config),
        }
    }
}
