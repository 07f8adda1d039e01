use crate::verification::adapter::incoming::pubsub_envelope::PubsubDelivery;
use crate::verification::application::use_cases::dispatch_verification_email::DispatchError;
use crate::AppState;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::{info, warn};

pub const MESSAGE_PUBLISHED_EVENT_TYPE: &str = "google.cloud.pubsub.topic.v1.messagePublished";

// Each attribute is optional on its own; Pub/Sub push without Eventarc sends none.
#[derive(Debug)]
struct CloudEventHeaders {
    id: Option<String>,
    source: Option<String>,
    event_type: Option<String>,
    subject: Option<String>,
}

#[derive(Serialize)]
struct EventResponse {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
}

impl EventResponse {
    // Pub/Sub push acks on 2xx and redelivers on anything else.
    fn ack(status: &'static str, message: impl Into<String>) -> HttpResponse {
        HttpResponse::Ok().json(EventResponse {
            status,
            message: message.into(),
            message_id: None,
        })
    }

    fn nack(message: impl Into<String>) -> HttpResponse {
        HttpResponse::InternalServerError().json(EventResponse {
            status: "error",
            message: message.into(),
            message_id: None,
        })
    }
}

fn extract_cloud_event_headers(req: &HttpRequest) -> CloudEventHeaders {
    let get_header = |name: &str| -> Option<String> {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    CloudEventHeaders {
        id: get_header("ce-id"),
        source: get_header("ce-source"),
        event_type: get_header("ce-type"),
        subject: get_header("ce-subject"),
    }
}

/// **Pub/Sub push endpoint: send verification email**
#[actix_web::post("/")]
pub async fn receive_verification_event_handler(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> HttpResponse {
    let headers = extract_cloud_event_headers(&req);

    info!(
        event_id = ?headers.id,
        event_type = ?headers.event_type,
        source = ?headers.source,
        subject = ?headers.subject,
        "Received CloudEvent"
    );

    if let Some(event_type) = &headers.event_type {
        if event_type != MESSAGE_PUBLISHED_EVENT_TYPE {
            return EventResponse::ack("ignored", format!("Event type {} not handled", event_type));
        }
    }

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let delivery = match PubsubDelivery::from_body(&body, content_type) {
        Ok(delivery) => delivery,
        Err(e) => {
            warn!(error = %e, "Discarding undecodable event");
            return EventResponse::ack("discarded", e.to_string());
        }
    };

    let delivery_id = headers
        .id
        .or_else(|| delivery.event_id.clone())
        .or_else(|| delivery.message_id().map(String::from));

    let request = match delivery.verification_request() {
        Ok(request) => request,
        Err(e) => {
            warn!(delivery_id = ?delivery_id, error = %e, "Discarding malformed verification event");
            return EventResponse::ack("discarded", e.to_string());
        }
    };

    let dedup = &data.delivery_deduplicator;
    if let Some(id) = &delivery_id {
        if !dedup.first_delivery(id).await {
            info!(delivery_id = %id, email = %request.email, "Skipping duplicate delivery");
            return EventResponse::ack("duplicate", format!("Delivery {} already handled", id));
        }
    }

    match data
        .dispatch_verification_email_use_case
        .execute(request)
        .await
    {
        Ok(receipt) => HttpResponse::Ok().json(EventResponse {
            status: "sent",
            message: format!(
                "Verification email sent, link expires at {}",
                receipt.expires_at.to_rfc3339()
            ),
            message_id: Some(receipt.message_id.to_string()),
        }),
        Err(e @ DispatchError::MalformedEvent(_)) => EventResponse::ack("discarded", e.to_string()),
        Err(e @ DispatchError::MailSend(_)) => {
            if let Some(id) = &delivery_id {
                dedup.forget(id).await;
            }
            EventResponse::nack(e.to_string())
        }
        Err(e) => {
            debug_assert!(e.email_was_sent());
            EventResponse::ack("incomplete", e.to_string())
        }
    }
}
