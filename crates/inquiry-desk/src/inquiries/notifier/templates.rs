use std::fmt::Write as _;

use crate::inquiries::domain::Inquiry;

pub const CONFIRMATION_SUBJECT: &str = "We received your inquiry";

/// Subject and HTML body of the acknowledgement sent to the submitter.
pub fn confirmation_email(inquiry: &Inquiry) -> (String, String) {
    let mut html = String::new();
    html.push_str(r#"<div style="font-family: system-ui, Arial, sans-serif; line-height: 1.6;">"#);
    let _ = write!(html, "<p>Hi {},</p>", escape_html(&inquiry.first_name));
    html.push_str(
        "<p>Thanks for reaching out. We received your message and will get back to you shortly.</p>",
    );
    html.push_str("<p><strong>Your inquiry details:</strong></p>");
    let _ = write!(
        html,
        "<p><strong>Service:</strong> {}</p>",
        escape_html(inquiry.service.as_deref().unwrap_or("General inquiry"))
    );
    let _ = write!(
        html,
        "<p><strong>Message:</strong></p><p>{}</p>",
        multiline(&inquiry.message)
    );
    html.push_str("<hr /><p><em>This is an automated confirmation email.</em></p></div>");

    (CONFIRMATION_SUBJECT.to_string(), html)
}

/// Subject and HTML body of the summary sent to the site administrator.
pub fn admin_email(inquiry: &Inquiry) -> (String, String) {
    let mut subject = format!("New inquiry #{} from {}", inquiry.id, inquiry.full_name());
    if let Some(service) = &inquiry.service {
        let _ = write!(subject, ": {service}");
    }

    let mut html = String::new();
    html.push_str(r#"<div style="font-family: system-ui, Arial, sans-serif; line-height: 1.6;">"#);
    html.push_str(r#"<h2 style="margin:0 0 12px;">New Contact Form Submission</h2>"#);
    let rows = [
        ("Inquiry ID", format!("#{}", inquiry.id)),
        ("Name", inquiry.full_name()),
        ("Email", inquiry.email.clone()),
        (
            "Phone",
            inquiry
                .phone
                .clone()
                .unwrap_or_else(|| "Not provided".to_string()),
        ),
        (
            "Service",
            inquiry
                .service
                .clone()
                .unwrap_or_else(|| "Not specified".to_string()),
        ),
        ("Submitted", inquiry.created_at.to_rfc2822()),
        ("IP Address", inquiry.ip_address.clone()),
    ];
    for (label, value) in rows {
        let _ = write!(
            html,
            "<p><strong>{label}:</strong> {}</p>",
            escape_html(&value)
        );
    }
    let _ = write!(
        html,
        "<p><strong>Message:</strong></p><p>{}</p>",
        multiline(&inquiry.message)
    );
    html.push_str("</div>");

    (subject, html)
}

fn multiline(text: &str) -> String {
    escape_html(text).replace("\r\n", "<br>").replace('\n', "<br>")
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inquiries::domain::{InquiryId, InquiryStatus};
    use chrono::{TimeZone, Utc};

    fn inquiry() -> Inquiry {
        Inquiry {
            id: InquiryId(42),
            first_name: "Jane".to_string(),
            last_name: "<Doe>".to_string(),
            email: "jane@x.com".to_string(),
            phone: None,
            service: Some("Renovation".to_string()),
            message: "Line one\nLine <two>".to_string(),
            status: InquiryStatus::New,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
            ip_address: "203.0.113.9".to_string(),
        }
    }

    #[test]
    fn admin_email_escapes_user_content() {
        let (subject, html) = admin_email(&inquiry());
        assert_eq!(subject, "New inquiry #42 from Jane <Doe>: Renovation");
        assert!(html.contains("Jane &lt;Doe&gt;"));
        assert!(html.contains("Line one<br>Line &lt;two&gt;"));
        assert!(html.contains("Not provided"));
        assert!(html.contains("203.0.113.9"));
        assert!(!html.contains("<Doe>"));
    }

    #[test]
    fn confirmation_email_defaults_service_label() {
        let mut inquiry = inquiry();
        inquiry.service = None;
        let (subject, html) = confirmation_email(&inquiry);
        assert_eq!(subject, CONFIRMATION_SUBJECT);
        assert!(html.contains("Hi Jane,"));
        assert!(html.contains("General inquiry"));
    }

    #[test]
    fn escape_html_handles_quotes() {
        assert_eq!(escape_html(r#"a "b" & 'c'"#), "a &quot;b&quot; &amp; &#39;c&#39;");
    }
}
