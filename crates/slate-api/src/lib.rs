pub mod error;
pub mod media;
pub mod meta;
pub mod placements;
pub mod platforms;
pub mod state;
pub mod users;
