//! Broadside - a terminal battleship client for Linera microchains.
//!
//! Each player runs their own microchain holding their half of the game.
//! The client talks to a node's GraphQL service for reads and mutations
//! and subscribes to block notifications to know when to look again.
//! Boards converge on authoritative snapshots; the client never predicts
//! what a shot will do.

// Wire types and the task-to-UI event vocabulary
pub mod types;

// GraphQL transport: endpoint shaping, escaping, error taxonomy
pub mod gateway;
pub mod ops;
pub mod snapshot;

// Change feeds: graphql-transport-ws subscription with poll fallback
pub mod notify;

// Snapshot-to-board convergence and the pending-attack lock
pub mod reconcile;
pub mod surface;

// Screens and the event loop
pub mod app;
pub mod screen;
pub mod ui;

// Fleet placement rules and editor
pub mod placement;

// Bounded-wait probe loop (used by the matchmaking checker)
pub mod waiter;

// Ambient pieces
pub mod clipboard;
pub mod config;
pub mod session;
pub mod theme;

// Re-export commonly used types
pub use app::App;
pub use config::{Config, Source};
pub use gateway::{GatewayError, NodeClient};
pub use types::{GameSnapshot, UiEvent};
