use anyhow::{Result, anyhow};
use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use gallery_sweep::report::{Notifier, RunEvent};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

fn event_name(event: &RunEvent) -> &'static str {
    match event {
        RunEvent::Started { .. } => "started",
        RunEvent::MonthStarted { .. } => "month_started",
        RunEvent::MonthFinished { .. } => "month_finished",
        RunEvent::Finished { .. } => "finished",
    }
}

fn to_sse_event(event: &RunEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event_name(event)).data(data)
}

/// Publishes run events to every connected dashboard.
pub struct WebNotifier {
    event_tx: broadcast::Sender<RunEvent>,
}

impl Notifier for WebNotifier {
    fn notify(&self, event: &RunEvent) {
        // no subscribers is fine
        let _ = self.event_tx.send(event.clone());
    }
}

#[derive(Clone)]
struct AppState {
    event_tx: broadcast::Sender<RunEvent>,
}

/// Serve the progress dashboard on the first free port in 3000-3009.
pub async fn start_server() -> Result<WebNotifier> {
    let (event_tx, _) = broadcast::channel::<RunEvent>(64);
    let state = Arc::new(AppState {
        event_tx: event_tx.clone(),
    });

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/events", get(sse_handler))
        .route(
            "/favicon.ico",
            get(|| async { axum::http::StatusCode::NO_CONTENT }),
        )
        .with_state(state);

    let mut bound = None;
    for port in 3000..3010 {
        if let Ok(listener) = tokio::net::TcpListener::bind(("127.0.0.1", port)).await {
            bound = Some((listener, port));
            break;
        }
    }
    let (listener, port) =
        bound.ok_or_else(|| anyhow!("could not bind any port in 3000-3009 for the dashboard"))?;

    info!("progress dashboard at http://localhost:{}", port);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "dashboard server stopped");
        }
    });

    Ok(WebNotifier { event_tx })
}

/// Keep the dashboard serving after the run until the operator presses
/// Ctrl-C, then give open streams `grace` to flush the last events.
pub async fn hold_open(cancel: &CancellationToken, grace: Duration) {
    if !cancel.is_cancelled() {
        info!("run complete; dashboard stays up until Ctrl-C");
        cancel.cancelled().await;
    }
    tokio::time::sleep(grace).await;
}

async fn index_handler() -> Html<&'static str> {
    debug!("GET /");
    Html(INDEX_HTML)
}

async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => Some(Ok::<_, Infallible>(to_sse_event(&event))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Gallery Sweep</title>
<style>
  body { background: #0a0a0f; color: #e0e0e0; font-family: system-ui, sans-serif; margin: 0; }
  header { padding: 20px 32px; border-bottom: 1px solid #1a1a2e; }
  header h1 { font-size: 20px; margin: 0; color: #fff; }
  #total { color: #86efac; font-size: 14px; }
  #log { max-width: 800px; margin: 0 auto; padding: 24px 32px; display: flex; flex-direction: column; gap: 8px; }
  .entry { padding: 10px 14px; border-radius: 8px; font-size: 14px; white-space: pre-wrap; }
  .month { background: #111118; border-left: 3px solid #3b82f6; }
  .ok { background: #0a1a0a; border-left: 3px solid #22c55e; }
  .skip { background: #1a0a0a; border-left: 3px solid #ef4444; color: #fca5a5; }
  .info { background: #1a1a2e; border-left: 3px solid #6366f1; }
</style>
</head>
<body>
  <header><h1>Gallery Sweep</h1><div id="total">Waiting for run...</div></header>
  <div id="log"></div>
<script>
  const log = document.getElementById('log');
  const total = document.getElementById('total');
  let count = 0;

  function add(cls, text) {
    const div = document.createElement('div');
    div.className = 'entry ' + cls;
    div.textContent = text;
    log.appendChild(div);
    window.scrollTo(0, document.body.scrollHeight);
  }

  function ym(m) { return m.month + '/' + m.year; }

  const es = new EventSource('/events');
  es.addEventListener('started', e => {
    const d = JSON.parse(e.data);
    add('info', 'Run started: ' + ym(d.range.start) + ' to ' + ym(d.range.end) + ' (' + d.base_label + ')');
  });
  es.addEventListener('month_started', e => {
    const d = JSON.parse(e.data);
    add('month', 'Processing ' + ym(d.month) + ' (' + d.label + ')');
  });
  es.addEventListener('month_finished', e => {
    const r = JSON.parse(e.data).report;
    const o = r.outcome;
    if (o.kind === 'downloaded') {
      count += o.dispatched;
      add('ok', ym(r.month) + ': found ' + o.found + ', initiated ' + o.dispatched + ' downloads');
    } else if (o.kind === 'empty') {
      add('info', ym(r.month) + ': no photos found');
    } else if (o.kind === 'skipped') {
      add('skip', ym(r.month) + ': skipped (' + o.reason + ')');
    } else {
      count += o.dispatched;
      add('skip', ym(r.month) + ': interrupted after initiating ' + o.dispatched + ' downloads');
    }
    total.textContent = 'Downloads initiated: ' + count;
  });
  es.addEventListener('finished', e => {
    const s = JSON.parse(e.data).summary;
    add(s.cancelled ? 'skip' : 'ok', (s.cancelled ? 'Run cancelled. ' : 'Run finished. ') + 'Total downloads initiated: ' + s.total_dispatched);
  });
</script>
</body>
</html>
"##;
