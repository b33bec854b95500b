pub mod activity;
pub mod cell;
pub mod config;
pub mod doc_tree;
pub mod project;
pub mod table;
pub mod user;

pub use activity::*;
pub use cell::{Cell, CellKind, CellValue, DropdownOption, PRODUCT_FORMULA};
pub use config::*;
pub use doc_tree::*;
pub use project::*;
pub use table::*;
pub use user::*;
