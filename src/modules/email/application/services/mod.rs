pub mod verification_email;

pub use verification_email::VerificationEmail;
