use crate::{
    auth::{AdminSession, admin_cookie_name, client_ip},
    error::ServiceError,
    model::{
        AdminLoginRequest, CreatePaymentIntentRequest, CreateRaffleRequest, DrawWinnerRequest,
        LinkPaymentRequest, PurchaseRequest,
    },
    processor::webhook::SIGNATURE_HEADER,
    service::{AdminLoginOutcome, RaffleService},
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequest, Path, State, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use http::StatusCode;
use serde_json::{Value, json};

pub fn router(service: RaffleService) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/raffles", post(create_raffle))
        .route("/raffles/{raffle}", get(get_raffle))
        .route("/raffles/{raffle}/numbers", get(get_sold_numbers))
        .route(
            "/raffles/{raffle}/purchases",
            post(purchase_numbers).get(list_purchases),
        )
        .route(
            "/raffles/{raffle}/purchases/{purchase}",
            delete(delete_purchase),
        )
        .route("/raffles/{raffle}/export", get(export_raffle))
        .route("/raffles/{raffle}/admin/login", post(admin_login))
        .route("/raffles/{raffle}/admin/logout", post(admin_logout))
        .route("/raffles/{raffle}/admin/session", get(admin_session))
        .route(
            "/raffles/{raffle}/winners",
            post(draw_winner).get(list_winners),
        )
        .route(
            "/raffles/{raffle}/payments",
            post(create_payment_intent).get(list_payments),
        )
        .route("/raffles/{raffle}/payments/stats", get(payment_stats))
        .route("/payments/{payment}", get(get_payment))
        .route("/payments/{payment}/link", post(link_payment))
        .route("/payments/intents/{intent}", get(get_payment_by_intent))
        .route(
            "/payments/intents/{intent}/refresh",
            post(refresh_payment_status),
        )
        .route("/webhooks/stripe", post(stripe_webhook))
        .with_state(service)
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
    rate_limited: bool,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            rate_limited: false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "success": false, "error": self.message });
        if self.rate_limited {
            body["is_rate_limited"] = Value::Bool(true);
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidParams(msg) => ApiError::new(StatusCode::BAD_REQUEST, msg),
            ServiceError::NotFound(msg) => ApiError::new(StatusCode::NOT_FOUND, msg),
            ServiceError::Conflict(msg) => ApiError::new(StatusCode::CONFLICT, msg),
            ServiceError::Unauthorized(msg) => ApiError::new(StatusCode::UNAUTHORIZED, msg),
            ServiceError::RateLimited => ApiError {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "Too many failed attempts. Please try again later.".into(),
                rate_limited: true,
            },
            err @ (ServiceError::NoPurchases | ServiceError::AllNumbersDrawn) => {
                ApiError::new(StatusCode::CONFLICT, err.to_string())
            }
            ServiceError::PaymentProcessor(e) => {
                log::error!("payment processor error: {e}");
                ApiError::new(StatusCode::BAD_GATEWAY, "payment processor unavailable")
            }
            ServiceError::Db(e) => {
                log::error!("database error: {e}");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
            ServiceError::Other(e) => {
                log::error!("internal error: {e:#}");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

/// `Json` whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

/// Successful envelope: the payload object with `"success": true` merged in.
struct ApiOk(Value);

impl IntoResponse for ApiOk {
    fn into_response(self) -> Response {
        let body = match self.0 {
            Value::Object(mut fields) => {
                fields.insert("success".into(), Value::Bool(true));
                Value::Object(fields)
            }
            other => json!({ "success": true, "data": other }),
        };
        Json(body).into_response()
    }
}

type ApiResult = Result<ApiOk, ApiError>;

/// Resolve the raffle and check the caller's admin cookie for it.
async fn require_admin(
    service: &RaffleService,
    jar: &CookieJar,
    raffle_key: &str,
) -> Result<AdminSession, ApiError> {
    let raffle = service.get_raffle(raffle_key).await?;
    let token = jar
        .get(&admin_cookie_name(&raffle.id))
        .map(|cookie| cookie.value().to_owned());
    Ok(service.authorize_admin(&raffle.id, token.as_deref())?)
}

async fn get_health() -> ApiOk {
    ApiOk(json!({ "status": "ok" }))
}

async fn create_raffle(
    State(service): State<RaffleService>,
    ApiJson(req): ApiJson<CreateRaffleRequest>,
) -> ApiResult {
    let raffle = service.create_raffle(req).await?;
    Ok(ApiOk(json!({ "raffle": raffle })))
}

async fn get_raffle(
    State(service): State<RaffleService>,
    Path(raffle_key): Path<String>,
) -> ApiResult {
    let raffle = service.get_raffle(&raffle_key).await?;
    Ok(ApiOk(json!({ "raffle": raffle })))
}

async fn get_sold_numbers(
    State(service): State<RaffleService>,
    Path(raffle_key): Path<String>,
) -> ApiResult {
    let sold = service.sold_numbers(&raffle_key).await?;
    Ok(ApiOk(json!(sold)))
}

async fn purchase_numbers(
    State(service): State<RaffleService>,
    Path(raffle_key): Path<String>,
    ApiJson(req): ApiJson<PurchaseRequest>,
) -> ApiResult {
    let purchase = service.purchase_numbers(&raffle_key, req).await?;
    Ok(ApiOk(json!({ "purchase": purchase })))
}

async fn list_purchases(
    State(service): State<RaffleService>,
    jar: CookieJar,
    Path(raffle_key): Path<String>,
) -> ApiResult {
    let session = require_admin(&service, &jar, &raffle_key).await?;
    let purchases = service.list_purchases(&session).await?;
    Ok(ApiOk(json!({ "purchases": purchases })))
}

async fn delete_purchase(
    State(service): State<RaffleService>,
    jar: CookieJar,
    Path((raffle_key, purchase_id)): Path<(String, String)>,
) -> ApiResult {
    let session = require_admin(&service, &jar, &raffle_key).await?;
    service.delete_purchase(&session, &purchase_id).await?;
    Ok(ApiOk(json!({ "deleted": purchase_id })))
}

async fn export_raffle(
    State(service): State<RaffleService>,
    jar: CookieJar,
    Path(raffle_key): Path<String>,
) -> ApiResult {
    let session = require_admin(&service, &jar, &raffle_key).await?;
    let export = service.export_raffle(&session).await?;
    Ok(ApiOk(json!({ "export": export })))
}

async fn admin_login(
    State(service): State<RaffleService>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(raffle_key): Path<String>,
    ApiJson(req): ApiJson<AdminLoginRequest>,
) -> Result<(CookieJar, ApiOk), ApiError> {
    let ip = client_ip(&headers);
    let outcome = service.admin_login(&raffle_key, &req.password, &ip).await?;
    let is_valid = outcome.is_valid();

    let jar = match outcome {
        AdminLoginOutcome::Granted { session, token } => {
            let auth = &service.config().auth;
            let cookie = Cookie::build((admin_cookie_name(&session.raffle_id), token))
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(auth.cookie_secure)
                .max_age(time::Duration::seconds(service.session_signer().ttl_secs()))
                .path("/");
            jar.add(cookie)
        }
        AdminLoginOutcome::Denied => jar,
    };

    Ok((jar, ApiOk(json!({ "is_valid": is_valid }))))
}

async fn admin_logout(
    State(service): State<RaffleService>,
    jar: CookieJar,
    Path(raffle_key): Path<String>,
) -> Result<(CookieJar, ApiOk), ApiError> {
    let raffle = service.get_raffle(&raffle_key).await?;
    let jar = jar.remove(Cookie::build(admin_cookie_name(&raffle.id)).path("/"));
    Ok((jar, ApiOk(json!({}))))
}

async fn admin_session(
    State(service): State<RaffleService>,
    jar: CookieJar,
    Path(raffle_key): Path<String>,
) -> ApiResult {
    let is_admin = match require_admin(&service, &jar, &raffle_key).await {
        Ok(_) => true,
        Err(err) if err.status == StatusCode::UNAUTHORIZED => false,
        Err(err) => return Err(err),
    };
    Ok(ApiOk(json!({ "is_admin": is_admin })))
}

async fn draw_winner(
    State(service): State<RaffleService>,
    jar: CookieJar,
    Path(raffle_key): Path<String>,
    body: Bytes,
) -> ApiResult {
    let session = require_admin(&service, &jar, &raffle_key).await?;
    let req: DrawWinnerRequest = if body.is_empty() {
        DrawWinnerRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            ApiError::new(StatusCode::BAD_REQUEST, format!("invalid request body: {e}"))
        })?
    };
    let winner = service.draw_winner(&session, req.notes).await?;
    Ok(ApiOk(json!({ "winner": winner })))
}

async fn list_winners(
    State(service): State<RaffleService>,
    Path(raffle_key): Path<String>,
) -> ApiResult {
    let winners = service.list_winners(&raffle_key).await?;
    Ok(ApiOk(json!({ "winners": winners })))
}

async fn create_payment_intent(
    State(service): State<RaffleService>,
    Path(raffle_key): Path<String>,
    ApiJson(req): ApiJson<CreatePaymentIntentRequest>,
) -> ApiResult {
    let result = service.create_payment_intent(&raffle_key, req).await?;
    Ok(ApiOk(json!(result)))
}

async fn list_payments(
    State(service): State<RaffleService>,
    jar: CookieJar,
    Path(raffle_key): Path<String>,
) -> ApiResult {
    let session = require_admin(&service, &jar, &raffle_key).await?;
    let payments = service.list_payments(&session).await?;
    Ok(ApiOk(json!({ "payments": payments })))
}

async fn payment_stats(
    State(service): State<RaffleService>,
    jar: CookieJar,
    Path(raffle_key): Path<String>,
) -> ApiResult {
    let session = require_admin(&service, &jar, &raffle_key).await?;
    let stats = service.payment_stats(&session).await?;
    Ok(ApiOk(json!({ "stats": stats })))
}

async fn get_payment(
    State(service): State<RaffleService>,
    Path(payment_id): Path<String>,
) -> ApiResult {
    let payment = service.get_payment(&payment_id).await?;
    Ok(ApiOk(json!({ "payment": payment })))
}

async fn get_payment_by_intent(
    State(service): State<RaffleService>,
    Path(intent_id): Path<String>,
) -> ApiResult {
    let payment = service.get_payment_by_intent(&intent_id).await?;
    Ok(ApiOk(json!({ "payment": payment })))
}

async fn refresh_payment_status(
    State(service): State<RaffleService>,
    Path(intent_id): Path<String>,
) -> ApiResult {
    let status = service.refresh_payment_status(&intent_id).await?;
    Ok(ApiOk(json!(status)))
}

async fn link_payment(
    State(service): State<RaffleService>,
    Path(payment_id): Path<String>,
    ApiJson(req): ApiJson<LinkPaymentRequest>,
) -> ApiResult {
    let payment = service
        .link_payment_to_purchase(&payment_id, &req.purchase_id)
        .await?;
    Ok(ApiOk(json!({ "payment": payment })))
}

async fn stripe_webhook(
    State(service): State<RaffleService>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    service.handle_stripe_webhook(&body, signature).await?;
    Ok(ApiOk(json!({ "received": true })))
}
