//! Mounting of the documentation routes.
//!
//! The OpenAPI document is produced elsewhere and handed over as any
//! `Serialize` value; it is serialized once at setup. The UI is a static page
//! loading Swagger UI from a CDN and pointing it at the JSON route.

use crate::{
    application::App,
    handler::{Middleware, Request, Response},
    protect::{
        SwaggerProtect,
        pattern::{JSON_SUFFIX, UI_INDEX_SUFFIX},
    },
};
use bytes::Bytes;
use hyper::header::{CACHE_CONTROL, HeaderValue};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

const SWAGGER_UI_VERSION: &str = "5.17.14";

/// Failure to mount the documentation routes.
#[derive(Debug, Error)]
pub enum DocsError {
    #[error("cannot serialize the OpenAPI document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("cannot register documentation route: {0}")]
    Route(#[from] matchit::InsertError),
}

pub struct SwaggerModule;

impl SwaggerModule {
    /// Registers the documentation routes under the configured docs path,
    /// each wrapped with the protection middleware:
    ///
    /// - `GET <docs>/json`: the document
    /// - `GET <docs>/static/index.html`: the UI, only when `use_ui` is set
    /// - `GET <docs>`: redirect to the UI index, only when `use_ui` is set
    pub fn setup<T: Serialize>(
        app: &mut App,
        protect: &SwaggerProtect,
        document: &T,
    ) -> Result<(), DocsError> {
        let options = protect.options();
        let docs_path = options.docs_path().to_string();
        let guard: Arc<dyn Middleware> = Arc::new(protect.middleware());

        let json = Bytes::from(serde_json::to_vec(document)?);
        let json_path = format!("{docs_path}{JSON_SUFFIX}");

        app.try_route(&json_path)?
            .get(move |_req: &Request, res: &mut Response| {
                res.r#type(HeaderValue::from_static("application/json; charset=utf-8"))
                    .set(CACHE_CONTROL, HeaderValue::from_static("no-store"))
                    .send(&json);
            })
            .with_shared(guard.clone());

        if !options.use_ui() {
            info!("swagger documentation mounted at {json_path} (UI disabled)");
            return Ok(());
        }

        let html = Bytes::from(render_ui(&document_title(document), &json_path));
        app.try_route(format!("{docs_path}{UI_INDEX_SUFFIX}"))?
            .get(move |_req: &Request, res: &mut Response| {
                res.set(CACHE_CONTROL, HeaderValue::from_static("no-store"))
                    .html(&html);
            })
            .with_shared(guard.clone());

        // Reached when the protected paths leave the bare mount point out.
        let canonical = options.canonical_url().to_string();
        app.try_route(&docs_path)?
            .get(move |_req: &Request, res: &mut Response| {
                if let Err(e) = res.redirect(&canonical).map(|_| ()) {
                    warn!("cannot redirect to {}: {}", canonical, e);
                    res.not_found();
                }
            })
            .with_shared(guard);

        info!("swagger documentation mounted at {docs_path}");
        Ok(())
    }
}

fn document_title<T: Serialize>(document: &T) -> String {
    serde_json::to_value(document)
        .ok()
        .and_then(|doc| doc.pointer("/info/title")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| "Swagger UI".to_string())
}

fn render_ui(title: &str, json_url: &str) -> String {
    let title = escape_html(title);
    // serde_json gives a correctly quoted JS string literal
    let json_url = serde_json::Value::from(json_url).to_string();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}/swagger-ui.css">
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}/swagger-ui-bundle.js"></script>
    <script>
      window.onload = function () {{
        const config = {{
          url: {json_url},
          dom_id: "#swagger-ui",
          deepLinking: true,
          withCredentials: true,
        }};
        const ui = SwaggerUIBundle(config);
        window.ui = ui;
      }};
    </script>
  </body>
</html>
"##
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
