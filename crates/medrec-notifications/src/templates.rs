use std::collections::HashMap;

use crate::error::NotificationError;

pub const VERIFICATION: &str = "verification";
pub const WELCOME: &str = "welcome";
pub const RESET_REQUEST: &str = "reset-request";
pub const RESET_SUCCESS: &str = "reset-success";

/// Simple template renderer using {{variable}} syntax.
///
/// Substituted values are HTML-escaped.
pub struct TemplateRenderer {
    templates: HashMap<String, Template>,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub id: String,
    pub subject: String,
    pub html_body: String,
}

/// A rendered message, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    pub subject: String,
    pub html_body: String,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// The four account emails, branded with `product`.
    pub fn with_defaults(product: &str) -> Self {
        let mut renderer = Self::new();
        let brand = |s: &str| s.replace("{{product}}", &escape_html(product));

        renderer.register(Template {
            id: VERIFICATION.to_string(),
            subject: "Verify your email".to_string(),
            html_body: brand(&page(
                "Verify your email",
                "<p>Thanks for signing up for <strong>{{product}}</strong>. Your verification code is:</p>\
                 <p style=\"font-size:28px;font-weight:800;letter-spacing:6px\">{{code}}</p>\
                 <p>Enter this code to complete your registration. The code expires in {{expires}}.</p>\
                 <p>If you didn't create this account, you can safely ignore this message.</p>",
            )),
        });
        renderer.register(Template {
            id: WELCOME.to_string(),
            subject: brand("Welcome to {{product}}"),
            html_body: brand(&page(
                "Welcome to {{product}}!",
                "<p>Hi {{name}},</p>\
                 <p>Your email is verified and your account is ready. You can now manage your patients and their diagnoses.</p>",
            )),
        });
        renderer.register(Template {
            id: RESET_REQUEST.to_string(),
            subject: "Reset your password".to_string(),
            html_body: brand(&page(
                "Reset your password",
                "<p>We received a request to reset your password. If you didn't request this, you can ignore this email.</p>\
                 <p><a href=\"{{reset_url}}\">Reset password</a></p>\
                 <p>For your security, this link will expire in {{expires}}.</p>",
            )),
        });
        renderer.register(Template {
            id: RESET_SUCCESS.to_string(),
            subject: "Password Reset Successful".to_string(),
            html_body: brand(&page(
                "Password updated",
                "<p>Your password was updated successfully.</p>\
                 <p>If you did not make this change, reset your password again right away.</p>",
            )),
        });
        renderer
    }

    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, template_id: &str) -> Option<&Template> {
        self.templates.get(template_id)
    }

    pub fn render(
        &self,
        template_id: &str,
        data: &HashMap<&str, String>,
    ) -> Result<RenderedContent, NotificationError> {
        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| NotificationError::TemplateNotFound(template_id.to_string()))?;

        Ok(RenderedContent {
            subject: render_string(&template.subject, data, false),
            html_body: render_string(&template.html_body, data, true),
        })
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn page(title: &str, inner: &str) -> String {
    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"UTF-8\"/><title>{{{{product}}}}</title></head>\
         <body style=\"font-family:Helvetica,Arial,sans-serif\">\
         <h2>{{{{product}}}}</h2><h3>{title}</h3>{inner}\
         <p style=\"color:#9aa4b2;font-size:12px\">This is an automated message. Please don't reply to this email.</p>\
         </body></html>"
    )
}

fn render_string(template: &str, data: &HashMap<&str, String>, html: bool) -> String {
    let mut result = template.to_string();

    for (key, value) in data {
        let placeholder = format!("{{{{{key}}}}}");
        let replacement = if html { escape_html(value) } else { value.clone() };
        result = result.replace(&placeholder, &replacement);
    }

    result
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
