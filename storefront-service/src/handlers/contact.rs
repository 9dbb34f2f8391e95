use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;

use crate::{
    dtos::contact::{ContactRequest, ContactResponse},
    models::Message,
    services::OutgoingEmail,
    AppState,
};

/// Store a contact-form message and notify the shop admin
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message stored", body = ContactResponse),
        (status = 400, description = "Missing fields", body = crate::dtos::ErrorResponse)
    ),
    tag = "Contact"
)]
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    if !req.is_complete() {
        return Err(AppError::bad_request("All fields are required."));
    }

    let message = Message::new(
        req.name.trim().to_string(),
        req.email.trim().to_string(),
        req.message.trim().to_string(),
    );
    state.store.messages.insert(&message).await?;

    tracing::info!(message_id = %message.id, "Contact message stored");

    if let Some(admin) = &state.config.email.admin_address {
        let email = OutgoingEmail {
            to: admin.clone(),
            reply_to: Some(message.email.clone()),
            subject: format!("New contact message from {}", message.name),
            body: format!(
                "Name: {}\nEmail: {}\n\n{}",
                message.name, message.email, message.message
            ),
        };
        if let Err(e) = state.email.send(email).await {
            tracing::error!(message_id = %message.id, error = %e, "Contact notification not sent");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            message: "Message sent successfully".to_string(),
        }),
    ))
}
