use crate::core::{ApiError, AppState};
use axum::{
    extract::{rejection::FormRejection, Form, State},
    Json,
};
use ingest::model::RawEmailMessage;
use ingest::IntakeOutcome;
use mail_parser::MessageParser;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Fields of the mail provider's inbound form post. Anything else is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct MailgunForm {
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "body-plain", default)]
    pub body_plain: String,
    #[serde(rename = "body-html", default)]
    pub body_html: String,
    #[serde(rename = "Message-Id", default)]
    pub message_id: String,
    #[serde(rename = "reply-to", default)]
    pub reply_to: String,
}

impl From<MailgunForm> for RawEmailMessage {
    fn from(form: MailgunForm) -> Self {
        RawEmailMessage {
            subject: form.subject,
            body_html: decode_html_body(form.body_html),
            body_plain: form.body_plain.replace("\\n", "\n"),
            message_id: form.message_id,
            reply_to_hint: form.reply_to,
        }
    }
}

fn looks_quoted_printable(body: &str) -> bool {
    body.contains("=3D") || body.contains("=\r\n") || body.contains("=\n")
}

/// Some providers forward the HTML part still quoted-printable encoded.
fn decode_html_body(body: String) -> String {
    if !looks_quoted_printable(&body) {
        return body;
    }

    let wrapped = format!(
        "Content-Type: text/html; charset=utf-8\r\nContent-Transfer-Encoding: quoted-printable\r\n\r\n{body}"
    );
    let decoded = MessageParser::default()
        .parse(wrapped.as_bytes())
        .and_then(|message| message.body_html(0).map(|html| html.into_owned()));

    match decoded {
        Some(html) if !html.trim().is_empty() => html,
        _ => {
            warn!("Could not decode quoted-printable HTML body, using it as received");
            body
        }
    }
}

pub async fn mailgun_webhook_handler(
    State(state): State<AppState>,
    form: Result<Form<MailgunForm>, FormRejection>,
) -> Result<Json<Value>, ApiError> {
    let Form(form) = form.map_err(|e| ApiError::MalformedInput(e.body_text()))?;
    info!(message_id = %form.message_id, "Received inbound email");

    let outcome = state.intake.ingest(form.into()).await?;
    let body = match outcome {
        IntakeOutcome::Queued {
            parser_log_id,
            order_number,
        } => json!({
            "status": "queued",
            "parser_log_id": parser_log_id,
            "order_number": order_number,
        }),
        IntakeOutcome::Ignored { reason } => json!({
            "status": "ignored",
            "reason": reason,
        }),
    };
    Ok(Json(body))
}
