pub mod admin;
pub mod bot;
pub mod missions;
pub mod profiles;
