// src/handlers/pages.rs

use axum::{http::StatusCode, response::Html};

const ACCESS_DENIED_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Access Denied</title>
</head>
<body>
  <main>
    <h1>Access Denied</h1>
    <p>Your IP address is not authorized to access this area.</p>
    <p><a href="/">Return to Home</a></p>
  </main>
</body>
</html>
"#;

/// User-facing page shown when the access gate rejects an admin visit.
pub async fn unauthorized() -> (StatusCode, Html<&'static str>) {
    (StatusCode::FORBIDDEN, Html(ACCESS_DENIED_PAGE))
}
