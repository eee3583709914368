//! Request layer for a ledger node
//!
//! JSON requests and responses over plain TCP. Writes go through the ledger
//! actor's queue; reads are answered from the latest chain snapshot.

pub mod server;

pub use server::{send_request, Request, Response, Server};
