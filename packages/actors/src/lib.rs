//! Actor system for the job watcher.
//!
//! A single Ractor actor owns every watched job and its subscribers. One
//! shared tick timer drives status checks while at least one job is pending,
//! and stops as soon as the last job reaches a terminal state or is
//! unregistered.
//!
//! # Usage
//!
//! ```ignore
//! use actors::{Handlers, JobWatcher};
//! use watch_core::{WatchKey, WatcherConfig, status_poller};
//!
//! let (watcher, _handle) = JobWatcher::start(WatcherConfig::default()).await?;
//!
//! let key = WatchKey::scoped("summary", 42)?;
//! let poller = status_poller!(client, { client.fetch_summary().await });
//! watcher.register_with(
//!     key,
//!     poller,
//!     watcher.default_options(),
//!     Handlers::new().on_completed(|key, result| println!("{key} done: {result}")),
//! );
//! ```

mod messages;
pub mod registry;
mod subscription;
mod watcher;
mod watcher_actor;

pub use messages::{WatcherMessage, WatcherStats};
pub use registry::{WatcherRegistry, global_registry, global_watcher, install_global};
pub use subscription::{Handlers, JobHandlers, SubscriberId, Subscription};
pub use watcher::JobWatcher;
pub use watcher_actor::{WatcherActor, WatcherActorState};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
