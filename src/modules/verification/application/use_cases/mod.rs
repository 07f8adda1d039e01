pub mod dispatch_verification_email;
