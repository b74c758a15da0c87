// src/models/email.rs
// DOCUMENTATION: Email queue payloads
// PURPOSE: JSON message published to and consumed from the email topic

use serde::{Deserialize, Serialize};

/// A single email waiting to be delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// POST /api/email/send-email
/// Fields are optional so missing ones produce a 400 instead of a parse error
#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub text: Option<String>,
    pub html: Option<String>,
}

/// POST /api/email/send-users-email
#[derive(Debug, Clone, Deserialize)]
pub struct SendUsersEmailRequest {
    pub emails: Option<Vec<String>>,
    pub subject: Option<String>,
    pub text: Option<String>,
    pub html: Option<String>,
}

impl SendEmailRequest {
    pub fn into_message(self) -> Option<EmailMessage> {
        match (self.to, self.subject, self.text) {
            (Some(to), Some(subject), Some(text))
                if !to.trim().is_empty() && !subject.is_empty() && !text.is_empty() =>
            {
                Some(EmailMessage {
                    to,
                    subject,
                    text,
                    html: self.html,
                })
            }
            _ => None,
        }
    }
}

impl SendUsersEmailRequest {
    /// One message per recipient, or None when a required field is missing
    pub fn into_messages(self) -> Option<Vec<EmailMessage>> {
        let emails = self.emails?;
        let subject = self.subject.filter(|s| !s.is_empty())?;
        let text = self.text.filter(|t| !t.is_empty())?;

        Some(
            emails
                .into_iter()
                .filter(|e| !e.trim().is_empty())
                .map(|to| EmailMessage {
                    to,
                    subject: subject.clone(),
                    text: text.clone(),
                    html: self.html.clone(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_rejected() {
        let req = SendEmailRequest {
            to: Some("a@b.co".to_string()),
            subject: None,
            text: Some("hi".to_string()),
            html: None,
        };
        assert!(req.into_message().is_none());
    }

    #[test]
    fn test_fan_out() {
        let req = SendUsersEmailRequest {
            emails: Some(vec!["a@b.co".to_string(), "c@d.co".to_string()]),
            subject: Some("Hello".to_string()),
            text: Some("Body".to_string()),
            html: None,
        };
        let messages = req.into_messages().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].to, "c@d.co");
        assert_eq!(messages[1].subject, "Hello");
    }

    #[test]
    fn test_wire_format_omits_empty_html() {
        let msg = EmailMessage {
            to: "a@b.co".to_string(),
            subject: "s".to_string(),
            text: "t".to_string(),
            html: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"to":"a@b.co","subject":"s","text":"t"}"#);
    }
}
