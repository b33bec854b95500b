pub mod numeric;
pub mod unicode;
