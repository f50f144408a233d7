pub mod filters;
pub mod format;
pub mod numeric;
pub mod outcome;
pub mod request_guard;
pub mod table;
pub mod time;
