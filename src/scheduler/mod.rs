//! Playback scheduling: what plays now, what is fetched next, and how
//! failures are absorbed.
//!
//! # Architecture
//!
//! ```text
//!  commands ──┐
//!  device ────┼──► driver::Scheduler ──► machine::Session::apply(event) ──► effects
//!  fetches ───┘          ▲                                                   │
//!                        └──────── fetch results / retries / load errors ────┘
//! ```
//!
//! - [`ledger`]: mood and bounded play history
//! - [`slots`]: the `now` / `next` slot pair
//! - [`machine`]: pure transition function
//! - [`driver`]: tokio event loop executing effects
//! - [`view`]: display snapshot published on a watch channel

pub mod driver;
pub mod ledger;
pub mod machine;
pub mod slots;
pub mod view;

pub use driver::{Notice, Scheduler, SchedulerHandle};
pub use ledger::Ledger;
pub use machine::{Command, Effect, Event, FetchPurpose, FetchRequest, Phase, Session};
pub use slots::{NextOp, NextSlot, NowSlot, Ticket};
pub use view::{NextView, SessionView};
