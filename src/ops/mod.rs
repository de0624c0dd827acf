pub mod clock;
pub mod reducer;
pub mod store;
pub mod view;
