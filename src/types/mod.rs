pub(crate) mod address;
pub(crate) mod cell;
pub(crate) mod color;
pub(crate) mod idx_or_name;
pub(crate) mod range;
