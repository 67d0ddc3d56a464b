//! Core data model shared by every pipeline stage
//!
//! Releases, tickets and commits are fetched once per run and held in memory.
//! Tickets carry the version fields populated by later stages.

pub mod commit;
pub mod filter;
pub mod release;
pub mod ticket;

pub use commit::CommitInfo;
pub use filter::{ResolutionType, TicketFilter, TicketStatus, TicketType};
pub use release::Release;
pub use ticket::{FixSource, InjectedSource, Ticket};
