pub mod cell;
pub mod station;
pub mod table;
pub mod unified;
