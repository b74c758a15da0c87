// src/services/email/templates.rs
// DOCUMENTATION: Notification emails sent by the gallery and auth services

use crate::models::{EmailMessage, Gallery, ImageStatus};
use chrono::{Datelike, Utc};

/// Escape text interpolated into HTML
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn gallery_link(frontend_url: &str, gallery: &Gallery) -> String {
    format!("{}/gallery/{}", frontend_url.trim_end_matches('/'), gallery.id)
}

/// Email sent to every address newly granted access to a gallery
pub fn gallery_access_email(
    to: &str,
    gallery: &Gallery,
    shared_by: Option<&str>,
    frontend_url: &str,
) -> EmailMessage {
    let link = gallery_link(frontend_url, gallery);
    let name = escape_html(&gallery.name);
    let description = gallery
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(escape_html)
        .unwrap_or_else(|| "No description provided".to_string());
    let shared_by_html = shared_by
        .map(|owner| format!("<p><strong>Shared By:</strong> {}</p>", escape_html(owner)))
        .unwrap_or_default();

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Gallery Access</title>
  </head>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="border: 1px solid #e0e0e0; border-radius: 8px; overflow: hidden;">
      <div style="background-color: #4a6fa5; color: white; padding: 20px; text-align: center;">
        <h1 style="margin: 0; font-size: 24px;">Gallery Access Granted</h1>
      </div>
      <div style="padding: 20px; background-color: white;">
        <p>You've been given access to view the following gallery:</p>
        <div style="background-color: #f9f9f9; border-radius: 6px; padding: 15px; margin-bottom: 20px;">
          <p><strong>Gallery Name:</strong> {name}</p>
          <p><strong>Description:</strong> {description}</p>
          {shared_by_html}
        </div>
        <div style="text-align: center; margin: 25px 0;">
          <a href="{link}" style="display: inline-block; background-color: #4a6fa5; color: white; text-decoration: none; padding: 12px 24px; border-radius: 4px; font-weight: bold;">View Gallery</a>
        </div>
        <p>Gallery Link: <strong>{link}</strong></p>
      </div>
      <div style="background-color: #f5f5f5; padding: 15px; text-align: center; font-size: 12px; color: #666;">
        <p>This is an automated email. Please do not reply to this message.</p>
        <p>&copy; {year} Gallery App. All rights reserved.</p>
      </div>
    </div>
  </body>
</html>"#,
        name = name,
        description = description,
        shared_by_html = shared_by_html,
        link = link,
        year = Utc::now().year(),
    );

    let text = format!(
        "You've been given access to the gallery \"{}\".\n\nView it at: {}\n",
        gallery.name, link
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("You now have access to \"{}\"", gallery.name),
        text,
        html: Some(html),
    }
}

/// Password reset link email
pub fn password_reset_email(to: &str, token: &str, frontend_url: &str, ttl_minutes: i64) -> EmailMessage {
    let link = format!(
        "{}/reset-password?token={}",
        frontend_url.trim_end_matches('/'),
        token
    );

    EmailMessage {
        to: to.to_string(),
        subject: "Reset your Gallery App password".to_string(),
        text: format!(
            "We received a request to reset your password.\n\n\
             Open the following link to choose a new one:\n{}\n\n\
             This link expires in {} minutes. If you did not request this, ignore this email.",
            link, ttl_minutes
        ),
        html: None,
    }
}

/// Review outcome sent to the uploader
pub fn review_result_email(
    to: &str,
    filename: &str,
    gallery: &Gallery,
    status: ImageStatus,
    note: Option<&str>,
    frontend_url: &str,
) -> EmailMessage {
    let verdict = match status {
        ImageStatus::Approved => "approved",
        ImageStatus::Rejected => "rejected",
        ImageStatus::Pending => "put back in review",
    };

    let mut text = format!(
        "Your image \"{}\" in gallery \"{}\" was {}.\n",
        filename, gallery.name, verdict
    );
    if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
        text.push_str(&format!("\nReviewer note: {}\n", note));
    }
    text.push_str(&format!("\nGallery: {}\n", gallery_link(frontend_url, gallery)));

    EmailMessage {
        to: to.to_string(),
        subject: format!("Your image was {}", verdict),
        text,
        html: None,
    }
}
