//! Producer ingest
//!
//! One acceptor per channel owns the loopback listening endpoint the
//! encoder connects to. It accepts exactly one producer connection at a
//! time, pumps chunks into the channel hub, and drives encoder recovery
//! when the producer is lost.

pub mod acceptor;

pub use acceptor::{IngestAcceptor, IngestConfig};
