pub mod email_template;
pub mod entities;
pub mod use_cases;
