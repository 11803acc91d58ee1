//! Root page for the relay.

use axum::{extract::State, response::Html};

use super::AppState;

/// Static greeting served at the root path.
const ROOT_INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{{bot_name}}</title>
  <style>
    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: system-ui, -apple-system, sans-serif;
      background: #0f0f0f; color: #e0e0e0;
      display: flex; align-items: center; justify-content: center;
      height: 100vh;
    }
    .card {
      text-align: center; padding: 2rem 3rem;
      border: 1px solid #333; border-radius: 12px;
      background: #1a1a1a;
    }
    h2 { font-size: 1.5rem; margin-bottom: 0.5rem; }
    p  { font-size: 0.9rem; color: #888; }
  </style>
</head>
<body>
  <div class="card">
    <h2>Hello, Chat API</h2>
    <p>{{bot_name}} is running. POST a question to /ask.</p>
  </div>
</body>
</html>
"#;

/// GET / — root greeting page.
pub(super) async fn root(State(state): State<AppState>) -> Html<String> {
    Html(ROOT_INDEX_HTML.replace("{{bot_name}}", &state.bot_name))
}
