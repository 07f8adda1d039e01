use uuid::Uuid;

pub const VERIFICATION_SUBJECT: &str = "Verify your email address";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEmail {
    pub subject: &'static str,
    pub link: String,
    pub body: String,
}

impl VerificationEmail {
    pub fn compose(verify_email_link: &str, token: &Uuid) -> Self {
        let link = format!("{}/{}", verify_email_link.trim_end_matches('/'), token);
        let body = format!("Click here to verify your email:\n{}\n", link);

        Self {
            subject: VERIFICATION_SUBJECT,
            link,
            body,
        }
    }
}
