pub mod contact_me;
pub mod home;
pub mod system;
