pub mod mailgun_sender;
pub mod smtp_sender;
