//! Sample REST endpoint served under `/api/rest`.
//!
//! This is the downstream handler behind the access-control pipeline. The
//! content stage captures everything it writes, so a route that writes
//! nothing ends up as a 404 from response finalization.
//!
//! Successful JSON responses use a fixed envelope:
//!
//! ```json
//! { "success": true, "message": "Request successful", "data": ... }
//! ```

use bulwark_core::{AccessPolicy, FaultResult, PipelineFault};
use bulwark_middleware::{
    types::APPLICATION_JSON, BoxFuture, Endpoint, RequestContext, ResponseWriter,
};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::router::{RouteMatch, Router};

/// Base path of the sample API.
pub const API_BASE: &str = "/api/rest";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const SUCCESS_MESSAGE: &str = "Request successful";
const TOKEN_HEADER: &str = "token";
/// Non-standard status returned by `GET status`.
const SAMPLE_STATUS: u16 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestRoute {
    Data1,
    Data2,
    Data3,
    Data4,
    Data5,
    Data6,
    Status,
    AuthorizedProducts,
    UnauthorizedProducts,
    BrowserService,
    CreateProfile,
    CreateProduct,
    Customer,
}

/// A product as exchanged by the sample API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier.
    pub product_id: i64,
    /// Display name.
    #[serde(default)]
    pub product_name: String,
}

#[derive(Debug, Serialize)]
struct Success<T: Serialize> {
    success: bool,
    message: &'static str,
    data: T,
}

impl<T: Serialize> Success<T> {
    fn new(data: T) -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
struct Failure {
    success: bool,
    message: &'static str,
}

impl Failure {
    fn new(message: &'static str) -> Self {
        Self {
            success: false,
            message,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PairQuery {
    #[serde(default)]
    str1: String,
    #[serde(default)]
    str2: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileForm {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

/// The sample REST endpoint.
///
/// Holds the access policy so `GET service` can report how the browser rules
/// judge the caller.
#[derive(Debug, Clone)]
pub struct RestApi {
    router: Router<RestRoute>,
    policy: AccessPolicy,
}

impl RestApi {
    /// Creates the endpoint with every route registered under [`API_BASE`].
    #[must_use]
    pub fn new(policy: AccessPolicy) -> Self {
        let route = |suffix: &str| format!("{API_BASE}/{suffix}");
        let router = Router::new()
            .route(Method::GET, API_BASE, RestRoute::Data1)
            .route(Method::GET, route("data2"), RestRoute::Data2)
            .route(Method::GET, route("data3/1"), RestRoute::Data3)
            .route(Method::GET, route("data4/{id}"), RestRoute::Data4)
            .route(Method::GET, route("data5"), RestRoute::Data5)
            .route(Method::GET, route("data6/{str1}/{str2}"), RestRoute::Data6)
            .route(Method::GET, route("status"), RestRoute::Status)
            .route(
                Method::GET,
                route("products/authorized"),
                RestRoute::AuthorizedProducts,
            )
            .route(
                Method::GET,
                route("products/unauthorized"),
                RestRoute::UnauthorizedProducts,
            )
            .route(Method::GET, route("service"), RestRoute::BrowserService)
            .route(
                Method::GET,
                route("service/constructor"),
                RestRoute::BrowserService,
            )
            .route(Method::POST, route("profile"), RestRoute::CreateProfile)
            .route(Method::POST, route("product"), RestRoute::CreateProduct)
            .route(Method::POST, route("customer"), RestRoute::Customer);

        Self { router, policy }
    }

    fn dispatch(&self, ctx: &mut RequestContext, matched: &RouteMatch<RestRoute>) -> FaultResult<()> {
        match matched.target() {
            RestRoute::Data1 => ok(ctx, "Sample Basic Content from getData1"),
            RestRoute::Data2 => ok(ctx, "Sample Basic Content from getData2"),
            RestRoute::Data3 => ok(ctx, "Sample Basic Content from getData3"),
            RestRoute::Data4 => match matched.param("id").and_then(|id| id.parse::<i32>().ok()) {
                Some(id) => ok(ctx, json!({ "id": id })),
                None => fail(ctx, StatusCode::BAD_REQUEST, "Invalid id"),
            },
            RestRoute::Data5 => {
                let query = ctx.query().unwrap_or_default();
                match serde_urlencoded::from_str::<PairQuery>(query) {
                    Ok(pair) => ok(ctx, combined(&pair.str1, &pair.str2)),
                    Err(error) => {
                        tracing::debug!(error = %error, "Rejected query string");
                        fail(ctx, StatusCode::BAD_REQUEST, "Invalid query string")
                    }
                }
            }
            RestRoute::Data6 => {
                let left = matched.param("str1").unwrap_or_default();
                let right = matched.param("str2").unwrap_or_default();
                ok(ctx, combined(left, right))
            }
            RestRoute::Status => {
                let status = StatusCode::from_u16(SAMPLE_STATUS)
                    .map_err(|e| PipelineFault::from_error("invalid sample status", e))?;
                write(ctx.response_mut(), status, TEXT_PLAIN, "Sample Title");
                Ok(())
            }
            RestRoute::AuthorizedProducts => {
                let body = to_json(&sample_products())?;
                write(ctx.response_mut(), StatusCode::OK, APPLICATION_JSON, &body);
                Ok(())
            }
            RestRoute::UnauthorizedProducts => {
                write(
                    ctx.response_mut(),
                    StatusCode::UNAUTHORIZED,
                    TEXT_PLAIN,
                    "User unauthorized to get products list",
                );
                Ok(())
            }
            RestRoute::BrowserService => {
                let valid = !self.policy.browser_rules().evaluate(ctx.client_identifier());
                let verdict = if valid { "True" } else { "False" };
                ok(ctx, json!({ "result": format!("Valid Browser: {verdict}") }))
            }
            RestRoute::CreateProfile => {
                match serde_urlencoded::from_bytes::<ProfileForm>(ctx.body()) {
                    Ok(form) => ok(
                        ctx,
                        json!({ "combined": format!("Name: {} {}", form.first_name, form.last_name) }),
                    ),
                    Err(error) => {
                        tracing::debug!(error = %error, "Rejected form body");
                        fail(ctx, StatusCode::BAD_REQUEST, "Invalid form data")
                    }
                }
            }
            RestRoute::CreateProduct => match serde_json::from_slice::<Option<Product>>(ctx.body()) {
                Ok(Some(product)) => ok(
                    ctx,
                    json!({ "product": format!("{}, {}", product.product_id, product.product_name) }),
                ),
                Ok(None) | Err(_) => fail(ctx, StatusCode::BAD_REQUEST, "Invalid product data"),
            },
            RestRoute::Customer => {
                let token = ctx
                    .headers()
                    .get(TOKEN_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .filter(|token| !token.is_empty())
                    .map(str::to_owned);
                match token {
                    Some(token) => ok(ctx, json!({ "token": token })),
                    None => fail(ctx, StatusCode::BAD_REQUEST, "Token is required"),
                }
            }
        }
    }
}

impl Endpoint for RestApi {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, FaultResult<()>> {
        Box::pin(async move {
            let Some(matched) = self.router.match_route(ctx.method(), ctx.path()) else {
                tracing::debug!(method = %ctx.method(), path = %ctx.path(), "No API route matched");
                return Ok(());
            };
            tracing::debug!(route = ?matched.target(), "API route matched");
            self.dispatch(ctx, &matched)
        })
    }
}

fn sample_products() -> Vec<Product> {
    (1..=3)
        .map(|id| Product {
            product_id: id,
            product_name: format!("p{id}"),
        })
        .collect()
}

fn combined(left: &str, right: &str) -> serde_json::Value {
    json!({ "combined": format!("{left} + {right}") })
}

fn to_json<T: Serialize>(value: &T) -> FaultResult<String> {
    serde_json::to_string(value)
        .map_err(|e| PipelineFault::from_error("failed to serialize API response", e))
}

fn write(response: &mut ResponseWriter, status: StatusCode, content_type: &'static str, body: &str) {
    response.set_status(status);
    response.set_content_type(content_type);
    response.write(body);
}

fn ok<T: Serialize>(ctx: &mut RequestContext, data: T) -> FaultResult<()> {
    let body = to_json(&Success::new(data))?;
    write(ctx.response_mut(), StatusCode::OK, APPLICATION_JSON, &body);
    Ok(())
}

fn fail(ctx: &mut RequestContext, status: StatusCode, message: &'static str) -> FaultResult<()> {
    let body = to_json(&Failure::new(message))?;
    write(ctx.response_mut(), status, APPLICATION_JSON, &body);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_core::{AllowList, BrowserRuleSet};
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use serde_json::Value;

    fn api() -> RestApi {
        let rules = BrowserRuleSet::from_config([("Firefox", vec!["<=3.6"])]);
        RestApi::new(AccessPolicy::new(AllowList::default(), rules))
    }

    fn request(method: Method, uri: &str) -> http::request::Builder {
        http::Request::builder().method(method).uri(uri)
    }

    async fn call(builder: http::request::Builder, body: &'static str) -> (StatusCode, String) {
        let request = builder.body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap();
        let mut ctx = RequestContext::from_request(request).await;
        api().call(&mut ctx).await.unwrap();
        let response = ctx.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let (status, body) = call(request(Method::GET, uri), "").await;
        (status, serde_json::from_str(&body).unwrap())
    }

    #[tokio::test]
    async fn test_basic_content_routes() {
        for (uri, expected) in [
            ("/api/rest", "Sample Basic Content from getData1"),
            ("/api/rest/data2", "Sample Basic Content from getData2"),
            ("/api/rest/data3/1", "Sample Basic Content from getData3"),
        ] {
            let (status, body) = get_json(uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["success"], true);
            assert_eq!(body["message"], "Request successful");
            assert_eq!(body["data"], expected);
        }
    }

    #[tokio::test]
    async fn test_route_parameter_is_parsed() {
        let (status, body) = get_json("/api/rest/data4/17").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], 17);

        let (status, body) = get_json("/api/rest/data4/seventeen").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_query_and_path_pairs() {
        let (_, body) = get_json("/api/rest/data5?str1=hello&str2=world%21").await;
        assert_eq!(body["data"]["combined"], "hello + world!");

        let (_, body) = get_json("/api/rest/data6/left/right").await;
        assert_eq!(body["data"]["combined"], "left + right");
    }

    #[tokio::test]
    async fn test_custom_status() {
        let (status, body) = call(request(Method::GET, "/api/rest/status"), "").await;
        assert_eq!(status.as_u16(), 250);
        assert_eq!(body, "Sample Title");
    }

    #[tokio::test]
    async fn test_products() {
        let (status, body) = call(request(Method::GET, "/api/rest/products/authorized"), "").await;
        assert_eq!(status, StatusCode::OK);
        let products: Vec<Product> = serde_json::from_str(&body).unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[2].product_name, "p3");

        let (status, body) =
            call(request(Method::GET, "/api/rest/products/unauthorized"), "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "User unauthorized to get products list");
    }

    #[tokio::test]
    async fn test_browser_service_uses_policy() {
        let builder = request(Method::GET, "/api/rest/service")
            .header("user-agent", "Firefox 3.5");
        let (_, body) = call(builder, "").await;
        assert!(body.contains("Valid Browser: False"));

        let builder = request(Method::GET, "/api/rest/service/constructor")
            .header("user-agent", "Chrome 120.0");
        let (_, body) = call(builder, "").await;
        assert!(body.contains("Valid Browser: True"));
    }

    #[tokio::test]
    async fn test_profile_form() {
        let builder = request(Method::POST, "/api/rest/profile")
            .header("content-type", "application/x-www-form-urlencoded");
        let (status, body) = call(builder, "firstName=Ada&lastName=Lovelace").await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["data"]["combined"], "Name: Ada Lovelace");
    }

    #[tokio::test]
    async fn test_product_body() {
        let builder = request(Method::POST, "/api/rest/product");
        let (status, body) = call(builder, r#"{"productId":5,"productName":"lamp"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["data"]["product"], "5, lamp");

        for invalid in ["null", "not json", ""] {
            let (status, body) = call(request(Method::POST, "/api/rest/product"), invalid).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{invalid:?}");
            assert!(body.contains("Invalid product data"));
        }
    }

    #[tokio::test]
    async fn test_customer_token() {
        let builder = request(Method::POST, "/api/rest/customer").header("token", "abc123");
        let (status, body) = call(builder, "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"token\":\"abc123\""));

        let (status, body) = call(request(Method::POST, "/api/rest/customer"), "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Token is required"));
    }

    #[tokio::test]
    async fn test_unmatched_route_writes_nothing() {
        let (status, body) = call(request(Method::GET, "/api/rest/missing"), "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        let (_, body) = call(request(Method::DELETE, "/api/rest/data2"), "").await;
        assert!(body.is_empty());
    }
}
