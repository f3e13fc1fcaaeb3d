mod common;

use chrono::Utc;
use common::fixtures::{WEBHOOK_SECRET, create_raffle, setup};
use raffle_service::error::ServiceError;
use raffle_service::model::CreatePaymentIntentRequest;
use raffle_service::processor::webhook::signature_header;
use serde_json::json;
use test_log::test;

fn event(event_type: &str, intent_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "evt_test",
        "type": event_type,
        "data": { "object": { "id": intent_id, "object": "payment_intent", "amount": 1000 } }
    }))
    .unwrap()
}

async fn open_payment(app: &common::fixtures::TestApp) -> anyhow::Result<(String, String)> {
    let raffle = create_raffle(&app.service, 10).await?;
    let result = app
        .service
        .create_payment_intent(
            &raffle.id,
            CreatePaymentIntentRequest {
                amount: 10,
                customer_name: "Ana".into(),
                customer_email: None,
                number_count: 1,
                payment_method: None,
            },
        )
        .await?;
    Ok((result.payment_id, result.payment_intent_id))
}

#[test(tokio::test)]
async fn signed_success_event_marks_payment_succeeded() -> anyhow::Result<()> {
    let app = setup().await?;
    let (payment_id, intent_id) = open_payment(&app).await?;

    let body = event("payment_intent.succeeded", &intent_id);
    let header = signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), &body)?;
    app.service.handle_stripe_webhook(&body, Some(&header)).await?;

    assert_eq!(app.service.get_payment(&payment_id).await?.status, "succeeded");
    Ok(())
}

#[test(tokio::test)]
async fn each_intent_event_maps_to_its_status() -> anyhow::Result<()> {
    let app = setup().await?;
    let (payment_id, intent_id) = open_payment(&app).await?;

    for (event_type, status) in [
        ("payment_intent.processing", "processing"),
        ("payment_intent.requires_action", "requires_action"),
        ("payment_intent.payment_failed", "failed"),
    ] {
        let body = event(event_type, &intent_id);
        let header = signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), &body)?;
        app.service.handle_stripe_webhook(&body, Some(&header)).await?;
        assert_eq!(app.service.get_payment(&payment_id).await?.status, status);
    }
    Ok(())
}

#[test(tokio::test)]
async fn bad_signature_is_rejected_and_changes_nothing() -> anyhow::Result<()> {
    let app = setup().await?;
    let (payment_id, intent_id) = open_payment(&app).await?;

    let body = event("payment_intent.succeeded", &intent_id);
    let header = signature_header("whsec_someone_else", Utc::now().timestamp(), &body)?;
    let err = app
        .service
        .handle_stripe_webhook(&body, Some(&header))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidParams(_)), "{err:?}");

    let err = app.service.handle_stripe_webhook(&body, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidParams(_)), "{err:?}");

    assert_eq!(
        app.service.get_payment(&payment_id).await?.status,
        "requires_payment_method"
    );
    Ok(())
}

#[test(tokio::test)]
async fn unknown_intent_and_unhandled_events_are_acknowledged() -> anyhow::Result<()> {
    let app = setup().await?;
    let (payment_id, intent_id) = open_payment(&app).await?;

    let body = event("payment_intent.succeeded", "pi_never_created");
    let header = signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), &body)?;
    app.service.handle_stripe_webhook(&body, Some(&header)).await?;

    let body = event("charge.refunded", &intent_id);
    let header = signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), &body)?;
    app.service.handle_stripe_webhook(&body, Some(&header)).await?;

    assert_eq!(
        app.service.get_payment(&payment_id).await?.status,
        "requires_payment_method"
    );
    Ok(())
}
