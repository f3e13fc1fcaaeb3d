mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use common::fixtures::{ADMIN_PASSWORD, WEBHOOK_SECRET, buy, create_raffle, setup};
use http_body_util::BodyExt;
use raffle_service::{http::router, processor::webhook::signature_header};
use serde_json::{Value, json};
use test_log::test;
use tower::ServiceExt;

struct Reply {
    status: StatusCode,
    set_cookie: Option<String>,
    body: Value,
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> anyhow::Result<Reply> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => req.body(Body::empty())?,
    };
    read(app.clone().oneshot(req).await?).await
}

async fn read(resp: axum::response::Response) -> anyhow::Result<Reply> {
    let status = resp.status();
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = resp.into_body().collect().await?.to_bytes();
    let body = serde_json::from_slice(&bytes)?;
    Ok(Reply {
        status,
        set_cookie,
        body,
    })
}

/// Log in and return the `name=value` pair to send back as a cookie.
async fn login(app: &Router, raffle_id: &str) -> anyhow::Result<String> {
    let reply = send(
        app,
        Method::POST,
        &format!("/raffles/{raffle_id}/admin/login"),
        Some(json!({ "password": ADMIN_PASSWORD })),
        None,
    )
    .await?;
    assert_eq!(reply.body["is_valid"], true);
    let set_cookie = reply.set_cookie.expect("login sets a cookie");
    Ok(set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .to_owned())
}

#[test(tokio::test)]
async fn health_and_raffle_creation() -> anyhow::Result<()> {
    let t = setup().await?;
    let app = router(t.service.clone());

    let reply = send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["success"], true);

    let reply = send(
        &app,
        Method::POST,
        "/raffles",
        Some(json!({ "title": "Rifa", "total_numbers": 50, "admin_password": "secret1" })),
        None,
    )
    .await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["success"], true);
    assert_eq!(reply.body["raffle"]["total_numbers"], 50);
    let friendly = reply.body["raffle"]["friendly_id"]
        .as_str()
        .expect("friendly id")
        .to_owned();

    let reply = send(&app, Method::GET, &format!("/raffles/{friendly}"), None, None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["raffle"]["title"], "Rifa");

    let reply = send(
        &app,
        Method::POST,
        "/raffles",
        Some(json!({ "total_numbers": 50, "admin_password": "short" })),
        None,
    )
    .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);
    Ok(())
}

#[test(tokio::test)]
async fn admin_routes_need_the_cookie() -> anyhow::Result<()> {
    let t = setup().await?;
    let raffle = create_raffle(&t.service, 20).await?;
    let app = router(t.service.clone());

    for (method, uri) in [
        (Method::GET, format!("/raffles/{}/purchases", raffle.id)),
        (Method::GET, format!("/raffles/{}/export", raffle.id)),
        (Method::POST, format!("/raffles/{}/winners", raffle.id)),
        (Method::GET, format!("/raffles/{}/payments", raffle.id)),
        (Method::GET, format!("/raffles/{}/payments/stats", raffle.id)),
        (Method::DELETE, format!("/raffles/{}/purchases/whatever", raffle.id)),
    ] {
        let reply = send(&app, method, &uri, None, None).await?;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(reply.body["success"], false);
        assert!(reply.body["error"].is_string());
    }

    let reply = send(
        &app,
        Method::GET,
        &format!("/raffles/{}/admin/session", raffle.id),
        None,
        None,
    )
    .await?;
    assert_eq!(reply.body["is_admin"], false);
    Ok(())
}

#[test(tokio::test)]
async fn login_sets_a_scoped_http_only_cookie() -> anyhow::Result<()> {
    let t = setup().await?;
    let raffle_a = create_raffle(&t.service, 20).await?;
    let raffle_b = create_raffle(&t.service, 20).await?;
    buy(&t.service, &raffle_a.id, "Ana", vec![3]).await?;
    let app = router(t.service.clone());

    let reply = send(
        &app,
        Method::POST,
        &format!("/raffles/{}/admin/login", raffle_a.id),
        Some(json!({ "password": "wrong-password" })),
        None,
    )
    .await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["success"], true);
    assert_eq!(reply.body["is_valid"], false);
    assert!(reply.set_cookie.is_none());

    let reply = send(
        &app,
        Method::POST,
        &format!("/raffles/{}/admin/login", raffle_a.id),
        Some(json!({ "password": ADMIN_PASSWORD })),
        None,
    )
    .await?;
    let set_cookie = reply.set_cookie.expect("cookie");
    assert!(set_cookie.starts_with(&format!("admin_auth_{}=", raffle_a.id)));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Path=/"));

    let cookie = login(&app, &raffle_a.id).await?;
    let reply = send(
        &app,
        Method::GET,
        &format!("/raffles/{}/purchases", raffle_a.id),
        None,
        Some(&cookie),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["purchases"][0]["numbers"], json!([3]));

    // Replaying raffle A's token under raffle B's cookie name.
    let token = cookie.split_once('=').map(|(_, v)| v).unwrap_or_default();
    let forged = format!("admin_auth_{}={token}", raffle_b.id);
    let reply = send(
        &app,
        Method::GET,
        &format!("/raffles/{}/purchases", raffle_b.id),
        None,
        Some(&forged),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[test(tokio::test)]
async fn conflicting_purchase_is_409_with_the_numbers() -> anyhow::Result<()> {
    let t = setup().await?;
    let raffle = create_raffle(&t.service, 20).await?;
    buy(&t.service, &raffle.id, "Ana", vec![7, 8]).await?;
    let app = router(t.service.clone());

    let reply = send(
        &app,
        Method::POST,
        &format!("/raffles/{}/purchases", raffle.id),
        Some(json!({ "name": "Bruno", "cpf": "98765432100", "numbers": [8, 9] })),
        None,
    )
    .await?;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["error"], "Numbers 8 are already purchased");

    let reply = send(
        &app,
        Method::GET,
        &format!("/raffles/{}/numbers", raffle.id),
        None,
        None,
    )
    .await?;
    assert_eq!(reply.body["sold"], json!([7, 8]));
    Ok(())
}

#[test(tokio::test)]
async fn sixth_failed_login_is_rate_limited() -> anyhow::Result<()> {
    let t = setup().await?;
    let raffle = create_raffle(&t.service, 20).await?;
    let app = router(t.service.clone());
    let uri = format!("/raffles/{}/admin/login", raffle.id);

    for _ in 0..5 {
        let reply = send(&app, Method::POST, &uri, Some(json!({ "password": "nope-nope" })), None)
            .await?;
        assert_eq!(reply.body["is_valid"], false);
    }
    let reply = send(
        &app,
        Method::POST,
        &uri,
        Some(json!({ "password": ADMIN_PASSWORD })),
        None,
    )
    .await?;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["is_rate_limited"], true);
    assert_eq!(
        reply.body["error"],
        "Too many failed attempts. Please try again later."
    );
    Ok(())
}

#[test(tokio::test)]
async fn admin_can_draw_and_everyone_can_list_winners() -> anyhow::Result<()> {
    let t = setup().await?;
    let raffle = create_raffle(&t.service, 20).await?;
    buy(&t.service, &raffle.id, "Ana", vec![5]).await?;
    let app = router(t.service.clone());
    let cookie = login(&app, &raffle.id).await?;

    let reply = send(
        &app,
        Method::POST,
        &format!("/raffles/{}/winners", raffle.id),
        None,
        Some(&cookie),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["winner"]["number"], 5);

    let reply = send(
        &app,
        Method::POST,
        &format!("/raffles/{}/winners", raffle.id),
        Some(json!({ "notes": "second prize" })),
        Some(&cookie),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let reply = send(
        &app,
        Method::GET,
        &format!("/raffles/{}/winners", raffle.id),
        None,
        None,
    )
    .await?;
    assert_eq!(reply.body["winners"].as_array().map(Vec::len), Some(1));
    assert_eq!(reply.body["winners"][0]["cpf"], "123*****901");
    Ok(())
}

#[test(tokio::test)]
async fn webhook_signature_is_enforced() -> anyhow::Result<()> {
    let t = setup().await?;
    let app = router(t.service.clone());
    let body = serde_json::to_vec(&json!({
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_unknown" } }
    }))?;

    let bad = signature_header("whsec_wrong", Utc::now().timestamp(), &body)?;
    let req = Request::post("/webhooks/stripe")
        .header("stripe-signature", bad)
        .body(Body::from(body.clone()))?;
    let reply = read(app.clone().oneshot(req).await?).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);

    let good = signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), &body)?;
    let req = Request::post("/webhooks/stripe")
        .header("stripe-signature", good)
        .body(Body::from(body))?;
    let reply = read(app.oneshot(req).await?).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["received"], true);
    Ok(())
}

#[test(tokio::test)]
async fn malformed_json_uses_the_error_envelope() -> anyhow::Result<()> {
    let t = setup().await?;
    let app = router(t.service.clone());
    let req = Request::post("/raffles")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))?;
    let reply = read(app.oneshot(req).await?).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);
    assert!(reply.body["error"].is_string());
    Ok(())
}
