//! The chat page served at `/`
//!
//! One self-contained HTML document; the only dynamic piece is the default
//! engine resource name pre-filled into the input field.

const DEFAULT_ENGINE_SLOT: &str = "__DEFAULT_ENGINE__";

/// Render the index page with the default engine interpolated (escaped for
/// attribute context).
pub fn render_index(default_engine: &str) -> String {
    let escaped = html_escape::encode_double_quoted_attribute(default_engine);
    INDEX_TEMPLATE.replace(DEFAULT_ENGINE_SLOT, &escaped)
}

const INDEX_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1"/>
    <title>ADK Cloud Chat</title>
    <style>
      :root {
        color-scheme: light;
        --bg: #f6f3ef;
        --panel: #ffffff;
        --ink: #1f2430;
        --muted: #5a6172;
        --accent: #2e6bf6;
        --border: #e3dfd8;
      }
      * {
        box-sizing: border-box;
      }
      body {
        margin: 0;
        font-family: "IBM Plex Sans", "Segoe UI", system-ui, sans-serif;
        background: radial-gradient(circle at top, #ffffff 0%, var(--bg) 50%, #efe9e2 100%);
        color: var(--ink);
      }
      header {
        padding: 32px 24px 12px;
        text-align: center;
      }
      h1 {
        margin: 0 0 8px;
        font-size: 28px;
      }
      p {
        margin: 0;
        color: var(--muted);
      }
      main {
        max-width: 900px;
        margin: 0 auto;
        padding: 12px 24px 48px;
      }
      .panel {
        background: var(--panel);
        border: 1px solid var(--border);
        border-radius: 16px;
        padding: 20px;
        box-shadow: 0 10px 24px rgba(16, 24, 40, 0.08);
      }
      label {
        display: block;
        font-size: 13px;
        color: var(--muted);
        margin-bottom: 6px;
      }
      input, textarea {
        width: 100%;
        padding: 10px 12px;
        border-radius: 10px;
        border: 1px solid var(--border);
        font-size: 14px;
      }
      textarea {
        min-height: 110px;
        resize: vertical;
      }
      button {
        margin-top: 12px;
        background: var(--accent);
        color: #fff;
        border: none;
        padding: 10px 16px;
        border-radius: 10px;
        font-weight: 600;
        cursor: pointer;
      }
      button:disabled {
        opacity: 0.6;
        cursor: not-allowed;
      }
      .chat {
        margin-top: 20px;
        display: grid;
        gap: 12px;
      }
      .bubble {
        padding: 12px 14px;
        border-radius: 12px;
        border: 1px solid var(--border);
        background: #f9f8f6;
      }
      .bubble.user {
        background: #e8efff;
        border-color: #d1ddff;
      }
      .meta {
        font-size: 12px;
        color: var(--muted);
        margin-bottom: 6px;
      }
      .error {
        color: #b42318;
        font-size: 13px;
        margin-top: 8px;
      }
    </style>
  </head>
  <body>
    <header>
      <h1>ADK Cloud Chat</h1>
      <p>Chat with a deployed Vertex AI Reasoning Engine.</p>
    </header>
    <main>
      <div class="panel">
        <label for="engine">Reasoning Engine resource name</label>
        <input id="engine" placeholder="projects/PROJECT/locations/REGION/reasoningEngines/ENGINE_ID" value="__DEFAULT_ENGINE__"/>
        <label for="message" style="margin-top: 12px;">Message</label>
        <textarea id="message" placeholder="Ask a question"></textarea>
        <button id="send">Send</button>
        <div id="error" class="error" style="display:none;"></div>
        <div class="chat" id="chat"></div>
      </div>
    </main>
    <script>
      const chatEl = document.getElementById("chat");
      const sendBtn = document.getElementById("send");
      const msgEl = document.getElementById("message");
      const engineEl = document.getElementById("engine");
      const errorEl = document.getElementById("error");
      const userKey = "adk_user_id";
      const userId = localStorage.getItem(userKey) || Math.random().toString(36).slice(2, 10);
      localStorage.setItem(userKey, userId);

      function addBubble(role, text) {
        const wrapper = document.createElement("div");
        wrapper.className = "bubble " + role;
        const meta = document.createElement("div");
        meta.className = "meta";
        meta.textContent = role === "user" ? "You" : "Assistant";
        const body = document.createElement("div");
        body.textContent = text;
        wrapper.appendChild(meta);
        wrapper.appendChild(body);
        chatEl.appendChild(wrapper);
        wrapper.scrollIntoView({behavior: "smooth", block: "end"});
      }

      function setError(message) {
        if (!message) {
          errorEl.style.display = "none";
          errorEl.textContent = "";
          return;
        }
        errorEl.style.display = "block";
        errorEl.textContent = message;
      }

      sendBtn.addEventListener("click", async () => {
        setError("");
        const message = msgEl.value.trim();
        const engine = engineEl.value.trim();
        if (!message) {
          setError("Please enter a message.");
          return;
        }
        if (!engine) {
          setError("Please enter the Reasoning Engine resource name.");
          return;
        }
        addBubble("user", message);
        msgEl.value = "";
        sendBtn.disabled = true;
        try {
          const resp = await fetch("/chat", {
            method: "POST",
            headers: {"Content-Type": "application/json"},
            body: JSON.stringify({ message, engine, user_id: userId })
          });
          const data = await resp.json();
          if (!resp.ok) {
            throw new Error(data.error || "Request failed.");
          }
          addBubble("assistant", data.response || "No response.");
        } catch (err) {
          setError(err.message);
        } finally {
          sendBtn.disabled = false;
        }
      });
    </script>
  </body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_interpolated() {
        let page = render_index("projects/p/locations/l/reasoningEngines/e");
        assert!(page.contains("value=\"projects/p/locations/l/reasoningEngines/e\""));
        assert!(!page.contains(DEFAULT_ENGINE_SLOT));
    }

    #[test]
    fn test_engine_attribute_escaped() {
        let page = render_index("\"><script>alert(1)</script>");
        assert!(!page.contains("\"><script>alert(1)</script>"));
    }
}
