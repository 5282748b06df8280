pub mod changeset;
pub mod errors;
pub mod job;
pub mod outcome;
pub mod payload;
pub mod ports;
pub mod records;
pub mod value_objects;
