//! dubot-core: DU bot core library (query record store, adapter contract,
//! dispatcher).
//!
//! The gateway and the adapter crate share these types: [`QueryStore`]
//! holds the supported query set, [`LogicAdapter`] is the capability
//! contract, and [`Bot`] resolves a query id to its owning adapter and runs
//! it.

mod adapter;
mod bootstrap;
mod bot;
mod config;
mod error;
mod store;

pub use adapter::{LogicAdapter, ParamMap, QUERY_ID_KEY};
pub use bootstrap::{default_queries, seed_default_queries};
pub use bot::{AdapterRegistry, Bot};
pub use config::BotConfig;
pub use error::{AnswerError, AnswerResult};
pub use store::{QueryRecord, QueryStore, StoreError};
