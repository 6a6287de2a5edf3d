pub mod contact_me;
