use async_trait::async_trait;
use log::{error, info};
use serde_json::json;
use swagger_protect::{
    SwaggerModule, SwaggerProtect, app,
    handler::{Request, RequestExt, Response},
    logging::LoggingMiddleware,
    protect::{
        error::GuardResult,
        guard::guard_fn,
        login::{BACK_URL_PARAM, LoginCredentials, SwaggerLogin},
    },
};

const LOGIN_PATH: &str = "/login-me";

/// Demo login accepting a single account whose password is the token.
struct DemoLogin {
    token: String,
}

#[async_trait]
impl SwaggerLogin for DemoLogin {
    async fn log_in(&self, credentials: LoginCredentials) -> GuardResult<Option<String>> {
        let accepted = credentials.login == "admin" && credentials.password == self.token;
        Ok(accepted.then(|| self.token.clone()))
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let token = std::env::var("SWAGGER_TOKEN").unwrap_or_else(|_| "change-me".to_string());

    let protect = match SwaggerProtect::builder()
        .cookie_key("swagger_key")
        .login_path(LOGIN_PATH)
        .guard(guard_fn({
            let token = token.clone();
            move |candidate: &str| candidate == token
        }))
        .log_in(DemoLogin { token })
        .build()
    {
        Ok(protect) => protect,
        Err(e) => {
            error!("invalid swagger protection settings: {}", e);
            std::process::exit(1);
        }
    };

    let mut app = app();
    app.use_with(LoggingMiddleware);

    app.get("/cats", |_req: &Request, res: &mut Response| {
        if let Err(e) = res.json(json!([{ "name": "Tom", "age": 3 }])).map(|_| ()) {
            error!("failed to serialize cats: {}", e);
        }
    });

    app.get(LOGIN_PATH, |req: &Request, res: &mut Response| {
        let back_url = req.query_param(BACK_URL_PARAM).unwrap_or_default();
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(BACK_URL_PARAM, &back_url)
            .finish();
        let action = format!("{LOGIN_PATH}?{query}");

        res.html(format!(
            r#"<form method="post" action="{action}">
  <input name="login" placeholder="login">
  <input name="password" type="password" placeholder="password">
  <button type="submit">Log in</button>
</form>"#
        ));
    });

    if let Some(login) = protect.login_handler() {
        app.post(LOGIN_PATH, login);
    }
    app.get("/logout", protect.logout_handler());

    let document = json!({
        "openapi": "3.0.0",
        "info": { "title": "Cats example", "version": "1.0" },
        "paths": {
            "/cats": {
                "get": { "responses": { "200": { "description": "All cats" } } }
            }
        }
    });

    if let Err(e) = SwaggerModule::setup(&mut app, &protect, &document) {
        error!("failed to mount documentation: {}", e);
        std::process::exit(1);
    }

    let host = local_ip_address::local_ip()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|_| "localhost".to_string());

    let result = app
        .listen(port, || {
            info!("Server listening on port {}", port);
            info!("Docs available at http://{}:{}/api", host, port);
        })
        .await;

    if let Err(e) = result {
        error!("server error: {}", e);
    }
}
