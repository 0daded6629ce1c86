//! Page routes.
//!
//! | Method | Path              | Page / action                          |
//! |--------|-------------------|----------------------------------------|
//! | GET    | `/`               | `home.tmpl`                            |
//! | GET    | `/snippet/create` | `create.tmpl` with a blank form        |
//! | POST   | `/snippet/create` | validate, then flash and redirect      |
//! | POST   | `/user/logout`    | clear the identity, flash and redirect |

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    extract::PageRequest,
    form::{max_chars, not_blank, permitted_value, FormFields, PostForm, Validator},
    responses::{client_error, server_error},
    session::{create_memory_session_layer, flash, Identity},
    state::AppState,
};

/// Expiry choices offered by the create form, in days.
const EXPIRY_DAYS: [i64; 3] = [365, 7, 1];
const DEFAULT_EXPIRY_DAYS: i64 = 365;

/// Handlers without the session layer, for composing into a larger router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/snippet/create", get(snippet_create).post(snippet_create_post))
        .route("/user/logout", post(user_logout_post))
        .fallback(not_found)
}

/// The application router with sessions installed.
pub fn router(state: AppState) -> Router {
    let session_layer = create_memory_session_layer(&state.config().session);
    routes().layer(session_layer).with_state(state)
}

async fn home(State(state): State<AppState>, request: PageRequest) -> Response {
    let ctx = state.context(&request).await;
    state.render(&request, StatusCode::OK, "home.tmpl", &ctx)
}

#[derive(Debug, Deserialize)]
struct SnippetCreateInput {
    title: String,
    content: String,
    expires: i64,
}

/// What the create page shows: the submitted values and any errors.
#[derive(Debug, Serialize)]
struct SnippetCreateForm {
    title: String,
    content: String,
    expires: i64,
    validator: Validator,
}

impl SnippetCreateForm {
    fn blank() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: DEFAULT_EXPIRY_DAYS,
            validator: Validator::default(),
        }
    }

    // Built from the raw fields so values survive a failed decode.
    fn redisplay(fields: &FormFields, validator: Validator) -> Self {
        Self {
            title: fields.get("title").unwrap_or_default().to_string(),
            content: fields.get("content").unwrap_or_default().to_string(),
            expires: fields
                .get("expires")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_EXPIRY_DAYS),
            validator,
        }
    }
}

async fn snippet_create(State(state): State<AppState>, request: PageRequest) -> Response {
    let ctx = state
        .context(&request)
        .await
        .with("form", SnippetCreateForm::blank());
    state.render(&request, StatusCode::OK, "create.tmpl", &ctx)
}

fn validate(input: &SnippetCreateInput, v: &mut Validator) {
    v.check_field(not_blank(&input.title), "title", "This field cannot be blank");
    v.check_field(
        max_chars(&input.title, 100),
        "title",
        "This field cannot be more than 100 characters long",
    );
    v.check_field(not_blank(&input.content), "content", "This field cannot be blank");
    v.check_field(
        permitted_value(&input.expires, &EXPIRY_DAYS),
        "expires",
        "This field must equal 1, 7 or 365",
    );
}

async fn snippet_create_post(
    State(state): State<AppState>,
    request: PageRequest,
    form: PostForm,
) -> Response {
    let mut validator = Validator::default();
    match form.decode::<SnippetCreateInput>() {
        Ok(input) => validate(&input, &mut validator),
        Err(errors) => validator.add_decode_errors(errors),
    }

    if !validator.valid() {
        let ctx = state
            .context(&request)
            .await
            .with("form", SnippetCreateForm::redisplay(form.fields(), validator));
        return state.render(
            &request,
            StatusCode::UNPROCESSABLE_ENTITY,
            "create.tmpl",
            &ctx,
        );
    }

    if let Err(err) = flash::put(request.session(), "Snippet successfully created!").await {
        return server_error(request.meta(), &err);
    }

    Redirect::to("/").into_response()
}

async fn user_logout_post(request: PageRequest) -> Response {
    if let Err(err) = Identity::logout(request.session()).await {
        return server_error(request.meta(), &err);
    }

    if let Err(err) = flash::put(request.session(), "You've been logged out successfully!").await
    {
        return server_error(request.meta(), &err);
    }

    Redirect::to("/").into_response()
}

async fn not_found() -> Response {
    client_error(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request},
    };
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    use crate::templates::{EmbeddedPages, FixedClock, TemplateRegistry};

    const FORM: &str = "application/x-www-form-urlencoded";

    fn state_with(registry: TemplateRegistry) -> AppState {
        AppState::builder()
            .registry(registry)
            .clock(Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2031, 6, 1, 12, 0, 0).unwrap(),
            )))
            .build()
            .unwrap()
    }

    async fn login_as_first_user(request: PageRequest) -> Response {
        match Identity::login(request.session(), 1).await {
            Ok(()) => StatusCode::NO_CONTENT.into_response(),
            Err(err) => server_error(request.meta(), &err),
        }
    }

    fn app() -> Router {
        let state = state_with(TemplateRegistry::from_embedded::<EmbeddedPages>().unwrap());
        let session_layer = create_memory_session_layer(&state.config().session);
        routes()
            .route("/test/login", post(login_as_first_user))
            .layer(session_layer)
            .with_state(state)
    }

    /// Drives one app instance, carrying the session cookie between requests.
    struct Browser {
        app: Router,
        cookie: Option<String>,
    }

    impl Browser {
        fn new(app: Router) -> Self {
            Self { app, cookie: None }
        }

        async fn send(&mut self, method: &str, uri: &str, form: Option<&str>) -> (StatusCode, Response) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(cookie) = &self.cookie {
                builder = builder.header(header::COOKIE, cookie);
            }
            let body = match form {
                Some(form) => {
                    builder = builder.header(header::CONTENT_TYPE, FORM);
                    Body::from(form.to_string())
                }
                None => Body::empty(),
            };

            let response = self
                .app
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();

            if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
                let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
                self.cookie = Some(pair.to_string());
            }

            (response.status(), response)
        }

        async fn get(&mut self, uri: &str) -> (StatusCode, String) {
            let (status, response) = self.send("GET", uri, None).await;
            (status, body_string(response).await)
        }

        async fn post(&mut self, uri: &str, form: &str) -> (StatusCode, Response) {
            self.send("POST", uri, Some(form)).await
        }
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_home_anonymous() {
        let (status, body) = Browser::new(app()).get("/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Home - Snippetbox</title>"));
        assert!(body.contains("There's nothing to see here... yet!"));
        assert!(body.contains("in 2031"));
        assert!(body.contains("Login"));
        assert!(!body.contains("Logout"));
        assert!(!body.contains("class=\"flash\""));
    }

    #[tokio::test]
    async fn test_create_form_has_csrf_token_and_default_expiry() {
        let (status, body) = Browser::new(app()).get("/snippet/create").await;

        assert_eq!(status, StatusCode::OK);
        let marker = "name=\"csrf_token\" value=\"";
        let start = body.find(marker).unwrap() + marker.len();
        let token: String = body[start..].chars().take_while(|c| *c != '"').collect();
        assert_eq!(token.len(), 32);
        assert!(body.contains("value=\"365\" checked"));
    }

    #[tokio::test]
    async fn test_create_success_flashes_once() {
        let mut browser = Browser::new(app());

        let (status, response) = browser
            .post("/snippet/create", "title=O+snail&content=Climb+Mount+Fuji&expires=7")
            .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let (_, body) = browser.get("/").await;
        assert!(body.contains("Snippet successfully created!"));

        let (_, body) = browser.get("/").await;
        assert!(!body.contains("Snippet successfully created!"));
    }

    #[tokio::test]
    async fn test_create_validation_errors_redisplay_form() {
        let mut browser = Browser::new(app());

        let (status, response) = browser
            .post("/snippet/create", "title=&content=kept+%3Cb%3Etext%3C%2Fb%3E&expires=30")
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_string(response).await;
        assert!(body.contains("This field cannot be blank"));
        assert!(body.contains("This field must equal 1, 7 or 365"));
        assert!(body.contains("kept &lt;b&gt;text"));
        assert!(!body.contains("<b>text"));
    }

    #[tokio::test]
    async fn test_create_unconvertible_value_is_field_error() {
        let mut browser = Browser::new(app());

        let (status, response) = browser
            .post("/snippet/create", "title=t&content=c&expires=soon")
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_string(response)
            .await
            .contains("This field must be a whole number"));
    }

    #[tokio::test]
    async fn test_create_rejects_non_form_body() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/snippet/create")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let mut browser = Browser::new(app());

        let (status, _) = browser.send("POST", "/test/login", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = browser.get("/").await;
        assert!(body.contains("Logout"));
        assert!(body.contains("Create snippet"));

        let (status, _) = browser.post("/user/logout", "csrf_token=x").await;
        assert_eq!(status, StatusCode::SEE_OTHER);

        let (_, body) = browser.get("/").await;
        assert!(body.contains("You&#x27;ve been logged out successfully!"));
        assert!(body.contains("Login"));
        assert!(!body.contains("Logout"));
    }

    #[tokio::test]
    async fn test_missing_page_is_generic_500() {
        let registry = TemplateRegistry::builder()
            .root("{% block main %}{% endblock %}")
            .page("home.tmpl", "{% extends \"base\" %}")
            .build()
            .unwrap();
        let state = state_with(registry);

        let (status, body) = Browser::new(router(state)).get("/snippet/create").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = Browser::new(app()).get("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
    }
}
