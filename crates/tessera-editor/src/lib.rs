//! Tessera Editor - The table module as the editor drives it
//!
//! Wires the table engine into an editing session:
//! - `TableModule`: current cell selection, command dispatch and paste
//! - Mutation observation with a debounced repair pass
//! - `run_repair_loop`: the same repair scheduling driven by a tokio channel
//! - Keyboard guards that keep backspace and delete from eating table structure

pub mod debounce;
pub mod driver;
pub mod error;
pub mod keyboard;
pub mod module;

pub use debounce::*;
pub use driver::*;
pub use error::*;
pub use keyboard::*;
pub use module::*;
