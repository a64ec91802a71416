//! HTTP layer for the Ripoti clinic report board.
//!
//! Exposes an axum [`Router`] backed by any [`BoardStore`]: the public pages,
//! cookie-session login, report submission with image upload, and the JSON
//! endpoints the browser scripts call.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod images;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use ripoti_core::store::BoardStore;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use handlers::{comments, mentions, pages, reactions, reports, users};
use images::{ImageBackend, ImageHost, UPLOADS_PREFIX};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RIPOTI_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  /// Static pages and scripts; must contain `index.html`, `dashboard.html`
  /// and `profile.html`.
  pub public_dir:            PathBuf,
  pub session_cookie:        String,
  pub session_ttl_hours:     i64,
  /// Mark the session cookie `Secure`; enable when served over HTTPS.
  pub secure_cookies:        bool,
  pub max_upload_mb:         usize,
  pub image_backend:         ImageBackend,
  /// Used by the `local` image backend.
  pub upload_dir:            PathBuf,
  pub cloudinary_cloud_name: String,
  pub cloudinary_api_key:    String,
  pub cloudinary_api_secret: String,
  pub cloudinary_folder:     String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "0.0.0.0".to_string(),
      port:                  3000,
      store_path:            PathBuf::from("ripoti.db"),
      public_dir:            PathBuf::from("public"),
      session_cookie:        "ripoti_sid".to_string(),
      session_ttl_hours:     24,
      secure_cookies:        false,
      max_upload_mb:         10,
      image_backend:         ImageBackend::Local,
      upload_dir:            PathBuf::from("reports/uploads"),
      cloudinary_cloud_name: String::new(),
      cloudinary_api_key:    String::new(),
      cloudinary_api_secret: String::new(),
      cloudinary_folder:     "clinic-reports".to_string(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: BoardStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub images: Arc<ImageHost>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the whole site.
///
/// Anything not matched by a route is served from `public_dir`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: BoardStore + Clone + 'static,
{
  let body_limit = state.config.max_upload_mb.saturating_mul(1024 * 1024);
  let public = ServeDir::new(&state.config.public_dir);

  let mut app = Router::new()
    // Pages and auth
    .route("/",               get(pages::index::<S>))
    .route("/index.html",     get(pages::index::<S>))
    .route("/login",          get(pages::index::<S>).post(pages::login::<S>))
    .route("/register",       get(pages::index::<S>).post(pages::register::<S>))
    .route("/logout",         get(pages::logout::<S>))
    .route("/dashboard.html", get(pages::dashboard::<S>))
    // Users
    .route("/api/user",         get(users::me::<S>))
    .route("/api/users",        get(users::list::<S>))
    .route("/user/{username}",  get(users::profile::<S>))
    // Reports
    .route("/submit",       post(reports::submit::<S>))
    .route("/api/reports",  get(reports::list::<S>))
    .route("/reports/{id}", get(reports::get_one::<S>))
    // Comments, reactions, mentions
    .route("/api/comments/{id}",       post(comments::create::<S>))
    .route("/api/reactions/{id}",      post(reactions::react::<S>))
    .route("/api/mentions",            get(mentions::unread::<S>))
    .route("/api/mentions/{id}/read",  post(mentions::mark_read::<S>));

  if let ImageHost::Local(local) = state.images.as_ref() {
    app = app.nest_service(UPLOADS_PREFIX, ServeDir::new(local.dir()));
  }

  app
    .fallback_service(public)
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use chrono::{Duration, Utc};
  use ripoti_core::user::{NewSession, NewUser, User};
  use ripoti_store_sqlite::SqliteStore;

  use crate::images::LocalDir;
  use serde_json::Value;
  use sha2::{Digest, Sha256};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  const BOUNDARY: &str = "ripoti-test-boundary";

  struct Harness {
    state:  AppState<SqliteStore>,
    public: PathBuf,
  }

  impl Drop for Harness {
    fn drop(&mut self) { let _ = std::fs::remove_dir_all(&self.public); }
  }

  async fn harness() -> Harness { harness_with_images(|_| ImageHost::Disabled).await }

  /// A harness whose image host is built from the temporary public directory.
  async fn harness_with_images(images: impl FnOnce(&std::path::Path) -> ImageHost) -> Harness {
    let public = std::env::temp_dir().join(format!("ripoti-public-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&public).unwrap();
    std::fs::write(public.join("index.html"), "<h1>Karibu</h1>").unwrap();
    std::fs::write(public.join("dashboard.html"), "<h1>Dashibodi</h1>").unwrap();
    std::fs::write(public.join("profile.html"), "<h1>Wasifu</h1>").unwrap();

    let store = SqliteStore::open_in_memory().await.unwrap();
    let config = ServerConfig {
      public_dir: public.clone(),
      image_backend: ImageBackend::None,
      ..Default::default()
    };
    let images = images(&public);

    Harness {
      state: AppState {
        store:  Arc::new(store),
        config: Arc::new(config),
        images: Arc::new(images),
      },
      public,
    }
  }

  impl Harness {
    /// Register a user directly in the store with a placeholder hash.
    async fn user(&self, jina: &str, ukoo: &str, kituo: &str) -> User {
      self
        .state
        .store
        .create_user(NewUser {
          jina:          jina.into(),
          ukoo:          ukoo.into(),
          namba:         "0700000000".into(),
          kituo:         kituo.into(),
          password_hash: "unused".into(),
        })
        .await
        .unwrap()
    }

    /// A `Cookie` header value for a fresh session of `user`.
    async fn cookie(&self, user: &User) -> String {
      let sid = Uuid::new_v4().to_string();
      self
        .state
        .store
        .create_session(NewSession {
          session_id: sid.clone(),
          user_id:    user.user_id,
          expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();
      format!("{}={sid}", self.state.config.session_cookie)
    }

    async fn send(&self, req: Request<Body>) -> Response {
      router(self.state.clone()).oneshot(req).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
      let mut builder = Request::builder().uri(uri);
      if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
      }
      self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_json(&self, uri: &str, cookie: &str, body: Value) -> Response {
      let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
      self.send(req).await
    }

    async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response {
      let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
      if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
      }
      self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn submit(&self, cookie: &str, fields: &[(&str, &str)]) -> Response {
      self.submit_with_image(cookie, fields, "", "").await
    }

    /// Multipart submit with an `image` part; an empty `file_name` sends the
    /// empty part a browser sends for an untouched file input.
    async fn submit_with_image(
      &self,
      cookie: &str,
      fields: &[(&str, &str)],
      file_name: &str,
      data: &str,
    ) -> Response {
      let content_type =
        if file_name.is_empty() { "application/octet-stream" } else { "image/png" };
      let mut body = String::new();
      for (name, value) in fields {
        body.push_str(&format!(
          "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
      }
      body.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\n\
         Content-Type: {content_type}\r\n\r\n{data}\r\n--{BOUNDARY}--\r\n"
      ));

      let req = Request::builder()
        .method("POST")
        .uri("/submit")
        .header(header::COOKIE, cookie)
        .header(
          header::CONTENT_TYPE,
          format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
      self.send(req).await
    }
  }

  async fn json(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  fn location(resp: &Response) -> &str {
    resp.headers()[header::LOCATION].to_str().unwrap()
  }

  // ── Pages and sessions ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn landing_page_for_visitors() {
    let h = harness().await;
    let resp = h.get("/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(text(resp).await.contains("Karibu"));
  }

  #[tokio::test]
  async fn logged_in_users_are_sent_to_their_profile() {
    let h = harness().await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    let cookie = h.cookie(&amina).await;

    for uri in ["/", "/index.html", "/login", "/register"] {
      let resp = h.get(uri, Some(&cookie)).await;
      assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{uri}");
      assert_eq!(location(&resp), "/user/aminajuma");
    }
  }

  #[tokio::test]
  async fn protected_routes_redirect_visitors_home() {
    let h = harness().await;
    for uri in ["/dashboard.html", "/api/reports", "/api/user", "/user/x", "/api/mentions"] {
      let resp = h.get(uri, None).await;
      assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{uri}");
      assert_eq!(location(&resp), "/");
    }

    let stale = format!("{}=not-a-session", h.state.config.session_cookie);
    let resp = h.get("/api/reports", Some(&stale)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  }

  #[tokio::test]
  async fn register_login_logout() {
    let h = harness().await;

    let resp = h
      .post_form(
        "/register",
        None,
        "jina=Amina&ukoo=Juma&namba=0712&kituo=Mwanza&password=siri&confirmPassword=siri",
      )
      .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/index.html");

    let resp = h.post_form("/login", None, "username=AminaJuma&password=siri").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/user/aminajuma");
    let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap().to_owned();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    let cookie = set_cookie.split(';').next().unwrap().to_owned();

    let me = json(h.get("/api/user", Some(&cookie)).await).await;
    assert_eq!(me["username"], "aminajuma");
    assert_eq!(me["kituo"], "Mwanza");
    assert!(me["greeting"].as_str().unwrap().starts_with("Habari"));

    let resp = h.get("/logout", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/index.html");

    let resp = h.get("/api/user", Some(&cookie)).await;
    assert_eq!(location(&resp), "/");
  }

  #[tokio::test]
  async fn register_validation() {
    let h = harness().await;

    let resp = h.post_form("/register", None, "jina=Amina&ukoo=Juma").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(resp).await["error"], "Jaza sehemu zote muhimu.");

    let resp = h
      .post_form(
        "/register",
        None,
        "jina=Amina&ukoo=Juma&namba=1&kituo=X&password=a&confirmPassword=b",
      )
      .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(resp).await["error"], "Password hazifanani.");
  }

  #[tokio::test]
  async fn login_failures_are_400() {
    let h = harness().await;

    let resp = h.post_form("/login", None, "username=&password=x").await;
    assert_eq!(json(resp).await["error"], "Jaza username na password.");

    let resp = h.post_form("/login", None, "username=mgeni&password=x").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(resp).await["error"], "User hajapatikana.");

    // The stored hash is not a PHC string, so no password matches.
    h.user("Amina", "Juma", "Mwanza").await;
    let resp = h.post_form("/login", None, "username=aminajuma&password=x").await;
    assert_eq!(json(resp).await["error"], "Password si sahihi.");
  }

  // ── Reports ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_and_list_reports() {
    let h = harness().await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    let cookie = h.cookie(&amina).await;

    let resp = h
      .submit(&cookie, &[("title", "Dawa zimeisha"), ("description", "Hakuna panadol")])
      .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let report = json(resp).await;
    assert_eq!(report["title"], "Dawa zimeisha");
    assert_eq!(report["username"], "aminajuma");
    assert_eq!(report["clinic"], "Mwanza");
    assert_eq!(report["thumbs_up"], 0);
    assert!(report["image"].is_null());
    let id = report["id"].as_i64().unwrap();

    let page = json(h.get("/api/reports?clinic=mwanza&search=dawa", Some(&cookie)).await).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["reports"][0]["id"], id);

    let empty = json(h.get("/api/reports?username=mgeni", Some(&cookie)).await).await;
    assert_eq!(empty["total"], 0);

    let one = json(h.get(&format!("/reports/{id}"), Some(&cookie)).await).await;
    assert_eq!(one["description"], "Hakuna panadol");
  }

  #[tokio::test]
  async fn submit_requires_title_and_description() {
    let h = harness().await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    let cookie = h.cookie(&amina).await;

    let resp = h.submit(&cookie, &[("title", "Bila maelezo")]).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(resp).await["error"], "Jaza title na description.");
  }

  #[tokio::test]
  async fn bad_date_filter_is_400() {
    let h = harness().await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    let cookie = h.cookie(&amina).await;
    let resp = h.get("/api/reports?startDate=jana", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn missing_report_is_404() {
    let h = harness().await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    let cookie = h.cookie(&amina).await;
    let resp = h.get("/reports/999", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(resp).await["error"], "Ripoti haipo.");
  }

  #[tokio::test]
  async fn local_images_are_stored_and_served() {
    let h = harness_with_images(|public| {
      ImageHost::Local(LocalDir::new(public.join("uploads")))
    })
    .await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    let cookie = h.cookie(&amina).await;

    let resp = h
      .submit_with_image(
        &cookie,
        &[("title", "Choo"), ("description", "Kimevunjika")],
        "p.png",
        "PNGDATA",
      )
      .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let report = json(resp).await;
    let expected = format!("/uploads/{}.png", hex::encode(Sha256::digest(b"PNGDATA")));
    assert_eq!(report["image"], expected.as_str());

    let resp = h.get(&expected, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(resp).await, "PNGDATA");
  }

  #[tokio::test]
  async fn failed_image_upload_still_saves_the_report() {
    // A directory cannot be created underneath a regular file.
    let h = harness_with_images(|public| {
      let blocker = public.join("blocker");
      std::fs::write(&blocker, "").unwrap();
      ImageHost::Local(LocalDir::new(blocker.join("uploads")))
    })
    .await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    let cookie = h.cookie(&amina).await;

    let resp = h
      .submit_with_image(
        &cookie,
        &[("title", "Choo"), ("description", "Kimevunjika")],
        "p.png",
        "PNGDATA",
      )
      .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let report = json(resp).await;
    assert!(report["image"].is_null());

    let page = json(h.get("/api/reports", Some(&cookie)).await).await;
    assert_eq!(page["total"], 1);
  }

  // ── Reactions ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn reaction_rules() {
    let h = harness().await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    let baraka = h.user("Baraka", "Mushi", "Moshi").await;
    let amina_c = h.cookie(&amina).await;
    let baraka_c = h.cookie(&baraka).await;

    let report = json(h.submit(&amina_c, &[("title", "Umeme"), ("description", "Hakuna")]).await).await;
    let uri = format!("/api/reactions/{}", report["id"]);

    let resp = h.post_json(&uri, &amina_c, serde_json::json!({ "type": "up" })).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = h.post_json(&uri, &baraka_c, serde_json::json!({ "type": "sideways" })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = h.post_json(&uri, &baraka_c, serde_json::json!({ "type": "up" })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let counts = json(resp).await;
    assert_eq!(counts["thumbs_up"], 1);
    assert_eq!(counts["thumbs_down"], 0);

    let resp = h.post_form(&uri, Some(&baraka_c), "type=down").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(resp).await["error"], "Umesha toa thumbs kwenye ripoti hii.");

    let resp = h
      .post_json("/api/reactions/999", &baraka_c, serde_json::json!({ "type": "up" }))
      .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let seen = json(h.get(&format!("/reports/{}", report["id"]), Some(&baraka_c)).await).await;
    assert_eq!(seen["user_thumb"], "up");
  }

  #[tokio::test]
  async fn malformed_ids_and_bodies_get_the_localized_error() {
    let h = harness().await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    let baraka = h.user("Baraka", "Mushi", "Moshi").await;
    let amina_c = h.cookie(&amina).await;
    let baraka_c = h.cookie(&baraka).await;
    let report = json(h.submit(&amina_c, &[("title", "Maji"), ("description", "Bomba")]).await).await;

    let resp = h
      .post_json("/api/reactions/abc", &baraka_c, serde_json::json!({ "type": "up" }))
      .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(resp).await["error"], error::MALFORMED_REQUEST);

    let resp = h.get("/reports/abc", Some(&baraka_c)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(resp).await["error"], error::MALFORMED_REQUEST);

    let req = Request::builder()
      .method("POST")
      .uri(format!("/api/comments/{}", report["id"]))
      .header(header::COOKIE, &baraka_c)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{\"comment\":"))
      .unwrap();
    let resp = h.send(req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(resp).await["error"], error::MALFORMED_REQUEST);

    let req = Request::builder()
      .method("POST")
      .uri("/submit")
      .header(header::COOKIE, &amina_c)
      .header(header::CONTENT_TYPE, "text/plain")
      .body(Body::from("not multipart"))
      .unwrap();
    let resp = h.send(req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(resp).await["error"], error::MALFORMED_REQUEST);
  }

  // ── Comments and mentions ───────────────────────────────────────────────────

  #[tokio::test]
  async fn comments_mentions_and_profiles() {
    let h = harness().await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    let baraka = h.user("Baraka", "Mushi", "Moshi").await;
    let amina_c = h.cookie(&amina).await;
    let baraka_c = h.cookie(&baraka).await;

    let report = json(h.submit(&amina_c, &[("title", "Maji"), ("description", "Bomba")]).await).await;
    let uri = format!("/api/comments/{}", report["id"]);

    let resp = h.post_json(&uri, &baraka_c, serde_json::json!({ "comment": "  " })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(resp).await["error"], "Andika maoni.");

    let resp = h
      .post_json(&uri, &baraka_c, serde_json::json!({ "comment": "Pole @aminajuma <3" }))
      .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let comment = json(resp).await;
    assert_eq!(comment["username"], "barakamushi");
    assert_eq!(comment["clinic"], "Moshi");
    assert!(comment["html"].as_str().unwrap().contains("&lt;3"));

    let resp = h
      .post_json("/api/comments/999", &baraka_c, serde_json::json!({ "comment": "hi" }))
      .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Amina sees the mention on her own profile and in the mentions feed.
    let own = json(h.get("/user/aminajuma", Some(&amina_c)).await).await;
    assert_eq!(own["isOwn"], true);
    assert_eq!(own["total"], 1);
    assert_eq!(own["mentions"].as_array().unwrap().len(), 1);
    assert!(own["user"].get("namba").is_none());

    let other = json(h.get("/user/aminajuma", Some(&baraka_c)).await).await;
    assert_eq!(other["isOwn"], false);
    assert!(other.get("mentions").is_none());

    let feed = json(h.get("/api/mentions", Some(&amina_c)).await).await;
    let mention_id = feed[0]["id"].as_i64().unwrap();
    assert_eq!(feed[0]["comment_user"], "barakamushi");

    let read_uri = format!("/api/mentions/{mention_id}/read");
    let resp = h.post_json(&read_uri, &baraka_c, Value::Null).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = h.post_json(&read_uri, &amina_c, Value::Null).await;
    assert_eq!(json(resp).await["success"], true);
    let feed = json(h.get("/api/mentions", Some(&amina_c)).await).await;
    assert!(feed.as_array().unwrap().is_empty());

    let resp = h.get("/user/mgeni", Some(&amina_c)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn browsers_get_the_profile_page() {
    let h = harness().await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    let cookie = h.cookie(&amina).await;

    let req = Request::builder()
      .uri("/user/aminajuma")
      .header(header::COOKIE, &cookie)
      .header(header::ACCEPT, "text/html,application/xhtml+xml")
      .body(Body::empty())
      .unwrap();
    let resp = h.send(req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::VARY], "accept");
    assert!(text(resp).await.contains("Wasifu"));

    let resp = h.get("/user/aminajuma", Some(&cookie)).await;
    assert_eq!(resp.headers()[header::VARY], "accept");
    assert_eq!(json(resp).await["user"]["username"], "aminajuma");
  }

  #[tokio::test]
  async fn username_suggestions() {
    let h = harness().await;
    let amina = h.user("Amina", "Juma", "Mwanza").await;
    h.user("Amani", "Said", "Tanga").await;
    h.user("Baraka", "Mushi", "Moshi").await;
    let cookie = h.cookie(&amina).await;

    let all = json(h.get("/api/users", Some(&cookie)).await).await;
    assert_eq!(all, serde_json::json!(["amanisaid", "aminajuma", "barakamushi"]));

    let some = json(h.get("/api/users?search=am", Some(&cookie)).await).await;
    assert_eq!(some, serde_json::json!(["amanisaid", "aminajuma"]));
  }
}
