use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use gallery_sweep::page::{Page, ScrollMetrics, UiTarget};
use headless_chrome::Tab;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Quote a value as a JS string literal.
fn js_str(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// First match counts as visible unless its computed style hides it.
fn visible_text_js(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({sel});
  if (!el) return JSON.stringify(null);
  const s = getComputedStyle(el);
  if (s.display === 'none' || s.visibility === 'hidden' || s.opacity === '0') return JSON.stringify(null);
  return JSON.stringify((el.textContent || '').trim());
}})()"#,
        sel = js_str(selector)
    )
}

fn texts_js(selector: &str) -> String {
    format!(
        "JSON.stringify(Array.from(document.querySelectorAll({sel})).map(el => (el.textContent || '').trim()))",
        sel = js_str(selector)
    )
}

fn click_js(selector: &str, index: usize) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelectorAll({sel})[{index}];
  if (!el) return JSON.stringify(false);
  el.click();
  return JSON.stringify(true);
}})()"#,
        sel = js_str(selector)
    )
}

fn count_js(selector: &str) -> String {
    format!(
        "JSON.stringify(document.querySelectorAll({sel}).length)",
        sel = js_str(selector)
    )
}

/// Scroll the container to its end, or the window when the container is absent.
fn scroll_to_end_js(container: &str) -> String {
    format!(
        r#"(() => {{
  const c = document.querySelector({sel});
  if (c) {{ c.scrollTop = c.scrollHeight; }} else {{ window.scrollTo(0, document.body.scrollHeight); }}
  return JSON.stringify(true);
}})()"#,
        sel = js_str(container)
    )
}

fn scroll_metrics_js(container: &str) -> String {
    format!(
        r#"(() => {{
  const c = document.querySelector({sel});
  if (c) return JSON.stringify({{
    scroll_height: c.scrollHeight,
    at_bottom: c.scrollTop + c.clientHeight >= c.scrollHeight - 10
  }});
  return JSON.stringify({{
    scroll_height: document.body.scrollHeight,
    at_bottom: window.innerHeight + window.scrollY >= document.body.offsetHeight - 10
  }});
}})()"#,
        sel = js_str(container)
    )
}

fn targets_js(selector: &str) -> String {
    format!(
        r#"JSON.stringify(Array.from(document.querySelectorAll({sel})).map((el, i) => ({{
  ordinal: i,
  tag: el.tagName.toLowerCase(),
  href: el.getAttribute('href')
}})))"#,
        sel = js_str(selector)
    )
}

/// Locate the link by href, name the download and click it.
fn download_js(selector: &str, href: &str, filename: &str) -> String {
    format!(
        r#"(() => {{
  const el = Array.from(document.querySelectorAll({sel})).find(e => e.getAttribute('href') === {href});
  if (!el) return JSON.stringify('missing');
  if (el.tagName !== 'A') return JSON.stringify('not_link');
  el.setAttribute('download', {name});
  el.click();
  return JSON.stringify('ok');
}})()"#,
        sel = js_str(selector),
        href = js_str(href),
        name = js_str(filename)
    )
}

/// Evaluate a script that returns a JSON string and decode it.
fn eval_json<T: DeserializeOwned>(tab: &Tab, script: &str) -> Result<T> {
    let result = tab.evaluate(script, false)?;
    let raw = result
        .value
        .and_then(|v| v.as_str().map(String::from))
        .ok_or_else(|| anyhow!("script returned no value"))?;
    serde_json::from_str(&raw).with_context(|| format!("unexpected script result: {raw}"))
}

/// [`Page`] over a live Chrome tab. Each call runs on the blocking pool.
pub struct DomPage {
    tab: Arc<Tab>,
}

impl DomPage {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    async fn run<T>(&self, script: String) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || eval_json(&tab, &script))
            .await
            .map_err(|e| anyhow!("DOM evaluation panicked: {}", e))?
    }
}

#[async_trait]
impl Page for DomPage {
    async fn visible_text(&self, selector: &str) -> Result<Option<String>> {
        self.run(visible_text_js(selector)).await
    }

    async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        self.run(texts_js(selector)).await
    }

    async fn click(&self, selector: &str, index: usize) -> Result<()> {
        let clicked: bool = self.run(click_js(selector, index)).await?;
        if !clicked {
            anyhow::bail!("no element #{index} for selector {selector}");
        }
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        self.run(count_js(selector)).await
    }

    async fn scroll_to_end(&self, container: &str) -> Result<()> {
        let _: bool = self.run(scroll_to_end_js(container)).await?;
        Ok(())
    }

    async fn scroll_metrics(&self, container: &str) -> Result<ScrollMetrics> {
        self.run(scroll_metrics_js(container)).await
    }

    async fn targets(&self, selector: &str) -> Result<Vec<UiTarget>> {
        self.run(targets_js(selector)).await
    }

    async fn download(&self, selector: &str, href: &str, filename: &str) -> Result<()> {
        let status: String = self.run(download_js(selector, href, filename)).await?;
        match status.as_str() {
            "ok" => Ok(()),
            "missing" => Err(anyhow!("link {href} is no longer on the page")),
            "not_link" => Err(anyhow!("element for {href} is not a link")),
            other => Err(anyhow!("unexpected download status {other}")),
        }
    }
}
