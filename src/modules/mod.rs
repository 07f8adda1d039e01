pub mod email;
pub mod verification;
