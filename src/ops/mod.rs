pub mod checklist_ops;
pub mod measurement_ops;
pub mod table_ops;
pub mod tree_ops;
pub mod validate;
