//! Embedded HTML/CSS/JS for the apiview dashboard.
//!
//! One tab button and one content pane per endpoint, laid out server-side in
//! registry order. The page polls `/api/renders` and swaps each pane's
//! content when a newer cycle arrives; the parameter form posts a
//! `fetchData` command to `/api/command`.

/// Build the page for the given endpoint names.
pub fn render_page(names: &[String]) -> String {
    let mut tabs = String::new();
    let mut panes = String::new();

    for (idx, name) in names.iter().enumerate() {
        let label = escape_text(name);
        tabs.push_str(&format!(
            r#"<button class="tablink" data-tab="{idx}">{label}</button>"#
        ));
        panes.push_str(&format!(
            r#"<div id="tab-{idx}" class="tabcontent"><p class="pending">Waiting for first poll of {label}&hellip;</p></div>"#
        ));
    }

    let names_json = serde_json::to_string(names)
        .unwrap_or_else(|_| "[]".to_string())
        .replace('<', "\\u003c");

    fill_template(
        PAGE_TEMPLATE,
        &[
            ("{{TABS}}", tabs.as_str()),
            ("{{PANES}}", panes.as_str()),
            ("{{NAMES_JSON}}", names_json.as_str()),
        ],
    )
}

/// Substitute every slot in one left-to-right pass. Inserted text is never
/// rescanned, so an endpoint name that looks like a slot stays literal.
fn fill_template(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let tail = &rest[start..];
        match slots.iter().find(|(slot, _)| tail.starts_with(slot)) {
            Some((slot, value)) => {
                out.push_str(&rest[..start]);
                out.push_str(value);
                rest = &tail[slot.len()..];
            }
            None => {
                out.push_str(&rest[..start + 2]);
                rest = &rest[start + 2..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Escape text for the tab labels. Rendered tab content is inserted as-is.
fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>API Data</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
  padding: 24px;
}

.input-container {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 12px;
  margin-bottom: 16px;
}
.input-container h2 { font-size: 14px; margin-bottom: 8px; }
.input-container input[type="text"] {
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 4px;
  padding: 4px 8px;
  margin-right: 6px;
  font-size: 12px;
}
.input-container button {
  background: var(--green);
  color: #fff;
  border: none;
  border-radius: 4px;
  padding: 6px 12px;
  cursor: pointer;
  font-size: 12px;
}

.tabs { display: flex; gap: 4px; border-bottom: 1px solid var(--border); }
.tablink {
  background: transparent;
  color: var(--text-muted);
  border: 1px solid transparent;
  border-bottom: none;
  border-radius: var(--radius) var(--radius) 0 0;
  padding: 8px 14px;
  cursor: pointer;
}
.tablink.active { background: var(--surface); color: var(--text); border-color: var(--border); }

.tabcontent { display: none; padding: 16px; background: var(--surface); }
.tabcontent.active { display: block; }
.tabcontent table { width: 100%; border-collapse: collapse; }
.tabcontent th, .tabcontent td { border: 1px solid var(--border); padding: 4px 8px; text-align: left; }
.tabcontent th { color: var(--accent); }
.pending { color: var(--text-muted); }

.status { color: var(--text-muted); font-size: 12px; margin-top: 8px; }
.status.error { color: var(--red); }
</style>
</head>
<body>
<div class="input-container">
  <h2>Enter API Parameters:</h2>
  <form id="params">
    <input type="text" id="projectId" placeholder="Project ID">
    <input type="text" id="appName" placeholder="App Name">
    <input type="text" id="pipelineName" placeholder="Pipeline Name">
    <button type="submit">Fetch Data</button>
  </form>
  <div id="status" class="status"></div>
</div>

<div class="tabs" id="tabs">{{TABS}}</div>
{{PANES}}

<script>
const NAMES = {{NAMES_JSON}};
const shownCycle = {};

function openTab(idx) {
  document.querySelectorAll('.tablink').forEach(b => b.classList.remove('active'));
  document.querySelectorAll('.tabcontent').forEach(p => p.classList.remove('active'));
  document.querySelector('.tablink[data-tab="' + idx + '"]').classList.add('active');
  document.getElementById('tab-' + idx).classList.add('active');
}

document.getElementById('tabs').addEventListener('click', e => {
  if (e.target.tagName !== 'BUTTON') return;
  openTab(e.target.dataset.tab);
});

function status(msg, isError) {
  const el = document.getElementById('status');
  el.textContent = msg;
  el.className = 'status' + (isError ? ' error' : '');
}

async function refresh() {
  try {
    const res = await fetch('/api/renders');
    const body = await res.json();
    for (const r of body.renders) {
      const idx = NAMES.indexOf(r.api);
      if (idx < 0) continue;
      if (shownCycle[r.api] !== undefined && shownCycle[r.api] > r.cycle) continue;
      if (shownCycle[r.api] === r.cycle && r.updated_at === shownCycle[r.api + ':at']) continue;
      document.getElementById('tab-' + idx).innerHTML = r.data;
      shownCycle[r.api] = r.cycle;
      shownCycle[r.api + ':at'] = r.updated_at;
    }
  } catch (e) {
    status('Dashboard unreachable: ' + e.message, true);
  }
}

document.getElementById('params').addEventListener('submit', async e => {
  e.preventDefault();
  const message = {
    command: 'fetchData',
    data: {
      projectId: document.getElementById('projectId').value,
      appName: document.getElementById('appName').value,
      pipelineName: document.getElementById('pipelineName').value,
    },
  };
  try {
    const res = await fetch('/api/command', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(message),
    });
    if (!res.ok) {
      const body = await res.json();
      status(body.error || ('HTTP ' + res.status), true);
      return;
    }
    status('Fetching with new parameters…', false);
    setTimeout(refresh, 500);
  } catch (err) {
    status('Failed to send: ' + err.message, true);
  }
});

if (NAMES.length > 0) openTab(0);
refresh();
setInterval(refresh, 2000);
</script>
</body>
</html>
"##;
