pub mod event;
pub mod record;
pub mod summary;
