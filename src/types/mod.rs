//! Data types for the table model.

mod cell;
mod direction;
mod input;
mod page;
mod row;
mod table;

pub use cell::*;
pub use direction::*;
pub use input::*;
pub use page::*;
pub use row::*;
pub use table::*;
