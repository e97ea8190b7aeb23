//! Domain types shared by the fetcher, the pipeline and the CLI.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Candidate`] | A mover or earnings-calendar row under consideration |
//! | [`Symbol`] | Validated ticker |
//! | [`TimeWindow`] | Inclusive news lookup window |

mod candidate;
mod symbol;
mod window;

pub use candidate::Candidate;
pub use symbol::Symbol;
pub use window::TimeWindow;
