//! Web chat server.
//!
//! Serves a single-page chat widget and a JSON endpoint the widget talks to.
//! Conversation history lives in the browser and is sent with every message.

use crate::agent::Message;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Settings, UiSettings};
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::{Context, Tera};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Reply sent to the browser when a turn fails. Details stay in the logs.
const UNAVAILABLE_MESSAGE: &str =
    "Sorry, I can't answer right now. Please try again in a moment.";

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    page: String,
}

/// Run the web chat server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Converse, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'luch doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let spinner = Output::spinner("Loading knowledge sources...");
    let orchestrator = Orchestrator::new(settings)?;
    spinner.finish_and_clear();

    let app = router(orchestrator)?;

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Luch Chat Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Chat widget", "GET  /");
    Output::kv("Chat API", "POST /api/chat");
    Output::kv("Health", "GET  /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router around an orchestrator.
fn router(orchestrator: Orchestrator) -> Result<Router> {
    let page = render_page(&orchestrator.settings().ui, &orchestrator.settings().agent.name)?;
    let state = Arc::new(AppState { orchestrator, page });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .layer(cors)
        .with_state(state))
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<Message>,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.clone())
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "products": state.orchestrator.knowledge().get_all_products().len(),
    }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let message = req.message.trim();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "message must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    let history: Vec<Message> = req
        .history
        .into_iter()
        .filter(Message::is_conversational)
        .collect();

    match state.orchestrator.respond(message, &history).await {
        Ok(response) => {
            info!(
                "Answered in {} round(s) with {} tool call(s)",
                response.rounds,
                response.tool_calls.len()
            );
            Json(ChatResponse {
                reply: response.content,
            })
            .into_response()
        }
        Err(e) => {
            if e.is_model_failure() {
                warn!("Chat turn failed: {}", e);
            } else {
                error!("Chat turn failed: {}", e);
            }
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: UNAVAILABLE_MESSAGE.to_string(),
                }),
            )
                .into_response()
        }
    }
}

// === Widget ===

/// Name the widget template is registered under. The `.html` suffix turns on autoescaping.
const WIDGET_TEMPLATE_NAME: &str = "index.html";

/// Render the widget page with the UI labels.
fn render_page(ui: &UiSettings, agent_name: &str) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(WIDGET_TEMPLATE_NAME, WIDGET_TEMPLATE)?;

    let mut context = Context::new();
    context.insert("title", &ui.title);
    context.insert("description", &ui.description);
    context.insert("agent_name", agent_name);
    context.insert("theme", &ui.theme.to_string());
    context.insert("save_history", &ui.save_history);

    Ok(tera.render(WIDGET_TEMPLATE_NAME, &context)?)
}

const WIDGET_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }}</title>
<style>
  :root { --bg: #f6f7fb; --panel: #ffffff; --text: #1f2330; --muted: #6b7280; --user: #e0e7ff; --bot: #f1f5f9; --accent: #6366f1; }
  body.theme-classic { --bg: #ffffff; --panel: #ffffff; --text: #111111; --muted: #555555; --user: #dbeafe; --bot: #f3f4f6; --accent: #2563eb; }
  body.theme-dark { --bg: #0f172a; --panel: #1e293b; --text: #e2e8f0; --muted: #94a3b8; --user: #334155; --bot: #0b1220; --accent: #818cf8; }
  * { box-sizing: border-box; }
  body { margin: 0; font-family: system-ui, sans-serif; background: var(--bg); color: var(--text); }
  main { max-width: 760px; margin: 0 auto; padding: 24px 16px; display: flex; flex-direction: column; height: 100vh; }
  h1 { margin: 0 0 4px; font-size: 1.5rem; }
  p.description { margin: 0 0 16px; color: var(--muted); }
  #log { flex: 1; overflow-y: auto; background: var(--panel); border-radius: 12px; padding: 16px; }
  .msg { margin: 8px 0; padding: 10px 14px; border-radius: 10px; white-space: pre-wrap; max-width: 85%; }
  .msg.user { background: var(--user); margin-left: auto; }
  .msg.assistant { background: var(--bot); }
  .msg.error { color: #dc2626; }
  form { display: flex; gap: 8px; margin-top: 12px; }
  input { flex: 1; padding: 12px; border-radius: 10px; border: 1px solid var(--muted); background: var(--panel); color: var(--text); }
  button { padding: 12px 18px; border: 0; border-radius: 10px; background: var(--accent); color: #fff; cursor: pointer; }
  button:disabled { opacity: 0.6; cursor: default; }
</style>
</head>
<body class="theme-{{ theme }}">
<main>
  <h1>{{ title }}</h1>
  <p class="description">{{ description }}</p>
  <div id="log" aria-live="polite"></div>
  <form id="form">
    <input id="input" autocomplete="off" placeholder="Message {{ agent_name }}...">
    <button id="send" type="submit">Send</button>
  </form>
</main>
<script>
  const SAVE_HISTORY = {{ save_history }};
  const STORAGE_KEY = "luch-history";
  const log = document.getElementById("log");
  const form = document.getElementById("form");
  const input = document.getElementById("input");
  const send = document.getElementById("send");
  let history = [];

  function show(role, text) {
    const el = document.createElement("div");
    el.className = "msg " + role;
    el.textContent = text;
    log.appendChild(el);
    log.scrollTop = log.scrollHeight;
  }

  if (SAVE_HISTORY) {
    try {
      history = JSON.parse(localStorage.getItem(STORAGE_KEY) || "[]");
    } catch (e) {
      history = [];
    }
    history.forEach(m => show(m.role, m.content));
  }

  form.addEventListener("submit", async (event) => {
    event.preventDefault();
    const message = input.value.trim();
    if (!message) return;
    input.value = "";
    send.disabled = true;
    show("user", message);

    try {
      const res = await fetch("/api/chat", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ message: message, history: history }),
      });
      const body = await res.json();
      if (!res.ok) {
        show("assistant error", body.error || "Something went wrong.");
        return;
      }
      show("assistant", body.reply);
      history.push({ role: "user", content: message });
      history.push({ role: "assistant", content: body.reply });
      if (SAVE_HISTORY) {
        localStorage.setItem(STORAGE_KEY, JSON.stringify(history));
      }
    } catch (e) {
      show("assistant error", "Could not reach the server.");
    } finally {
      send.disabled = false;
      input.focus();
    }
  });
</script>
</body>
</html>
"#;
