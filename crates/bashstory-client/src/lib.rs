//! Client side of the bashstory terminal.
//!
//! [`Terminal`] is the facade: it owns the screen and the input line, runs
//! the input-mode state machine, opens the composition editor, drives the
//! interactive poller, and talks to the resolver through a [`Transport`].

pub mod completion;
pub mod editor;
pub mod history;
pub mod line;
pub mod machine;
pub mod poller;
pub mod terminal;
pub mod transport;

pub use terminal::{Line, LineKind, Terminal};
pub use transport::{HttpTransport, Transport};
