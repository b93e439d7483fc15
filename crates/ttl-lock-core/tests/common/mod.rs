pub mod recording_store;
pub mod delayed_delete_store;
