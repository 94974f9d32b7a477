//! Script bridge between page JavaScript and bound native functions.
//!
//! Messages flow in both directions:
//! - **JS -> native**: a bound global `name(...args)` returns a Promise and
//!   posts `{"id": "<seq>", "method": "<name>", "params": [...args]}`
//!   through `window.ipc.postMessage`.
//! - **native -> JS**: the reply is delivered by evaluating
//!   `window.__webview__.onReply(seq, status, result)`.
//!
//! Scripts registered with `init` and the current bindings form a view's
//! [`PageScripts`]. Every new document fetches them synchronously through
//! [`page_scripts_loader`], right after the bootstrap and before any page
//! script.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use webview_dll_common::Handle;

use crate::callbacks::BindCallback;
use crate::engine::MessageHandler;

/// Installed in every view before any page script runs.
pub const BRIDGE_INIT_SCRIPT: &str = r#"
(function() {
    if (window.__webview__) {
        return;
    }
    var pending = {};
    var nextId = 0;
    function post(message) {
        window.ipc.postMessage(JSON.stringify(message));
    }
    window.__webview__ = {
        post: post,
        call: function(method, params) {
            var id = String(++nextId);
            return new Promise(function(resolve, reject) {
                pending[id] = { resolve: resolve, reject: reject };
                post({ id: id, method: method, params: params });
            });
        },
        onBind: function(name) {
            if (window.hasOwnProperty(name) && !window[name].__bound) {
                console.warn('webview: refusing to overwrite window.' + name);
                return;
            }
            var fn = function() {
                return window.__webview__.call(name, Array.prototype.slice.call(arguments));
            };
            fn.__bound = true;
            window[name] = fn;
        },
        onUnbind: function(name) {
            if (window[name] && window[name].__bound) {
                delete window[name];
            }
        },
        onReply: function(id, status, result) {
            var p = pending[id];
            if (!p) {
                return;
            }
            delete pending[id];
            if (status === 0) {
                p.resolve(result);
            } else {
                p.reject(result);
            }
        }
    };
})();
"#;

/// Script run after the bootstrap in every document: fetches the page
/// scripts from `url` with a synchronous request and evaluates them in
/// order. Each script runs in global scope; one failing does not stop the
/// rest.
pub fn page_scripts_loader(url: &str) -> String {
    format!(
        r#"
(function() {{
    var scripts;
    try {{
        var xhr = new XMLHttpRequest();
        xhr.open('GET', {url}, false);
        xhr.send(null);
        if (xhr.status !== 200) {{
            return;
        }}
        scripts = JSON.parse(xhr.responseText);
    }} catch (e) {{
        console.warn('webview: page scripts unavailable: ' + e);
        return;
    }}
    for (var i = 0; i < scripts.length; i++) {{
        try {{
            (0, eval)(scripts[i]);
        }} catch (e) {{
            console.error(e);
        }}
    }}
}})();
"#,
        url = js_string(url)
    )
}

/// A call request posted by page script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl RpcRequest {
    /// Parse a request from a raw JSON string (from JS postMessage).
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Arguments as a JSON array string, whatever shape the page sent.
    pub fn params_json(&self) -> String {
        match &self.params {
            serde_json::Value::Array(_) => self.params.to_string(),
            serde_json::Value::Null => "[]".to_string(),
            other => serde_json::Value::Array(vec![other.clone()]).to_string(),
        }
    }
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Script that exposes `name` as a bound global in the current page.
pub fn bind_script(name: &str) -> String {
    format!("window.__webview__.onBind({});", js_string(name))
}

/// Script that removes the bound global `name`.
pub fn unbind_script(name: &str) -> String {
    format!("window.__webview__.onUnbind({});", js_string(name))
}

/// Script that settles the pending call `seq`. Status 0 resolves, any other
/// status rejects. A `result` that is not valid JSON is sent as a string.
pub fn reply_script(seq: &str, status: i32, result: &str) -> String {
    let payload = if serde_json::from_str::<serde_json::Value>(result).is_ok() {
        result.to_string()
    } else {
        js_string(result)
    };
    format!(
        "window.__webview__.onReply({}, {status}, {payload});",
        js_string(seq)
    )
}

/// Bound functions of one view.
#[derive(Clone, Default)]
pub struct BindingTable {
    bindings: Arc<Mutex<HashMap<String, Arc<dyn BindCallback>>>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if an earlier binding with the same name was replaced.
    pub fn insert(&self, name: &str, callback: Arc<dyn BindCallback>) -> bool {
        self.lock().insert(name.to_string(), callback).is_some()
    }

    pub fn remove(&self, name: &str) -> bool {
        self.lock().remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn BindCallback>> {
        self.lock().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Route one raw page message. Returns a script to evaluate in reply,
    /// if any. The callback runs without the table lock held.
    pub fn handle_message(&self, handle: Handle, raw: &str) -> Option<String> {
        let Some(request) = RpcRequest::from_json(raw) else {
            warn!(%handle, body_len = raw.len(), "page message rejected: not a call request");
            return None;
        };

        match self.get(&request.method) {
            Some(callback) => {
                debug!(%handle, method = %request.method, seq = %request.id, "bound call");
                callback.invoke(&request.id, &request.params_json());
                None
            }
            None => {
                warn!(%handle, method = %request.method, "call to unbound function");
                let error = serde_json::json!({
                    "error": format!("{} is not bound", request.method)
                });
                Some(reply_script(&request.id, 1, &error.to_string()))
            }
        }
    }

    /// Message handler for an engine view of `handle`.
    pub fn message_handler(&self, handle: Handle) -> MessageHandler {
        let table = self.clone();
        Box::new(move |raw: &str| table.handle_message(handle, raw))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn BindCallback>>> {
        self.bindings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Scripts every new document of one view runs before its own scripts:
/// those registered with `init`, in order, then one `onBind` per bound name.
#[derive(Clone, Default)]
pub struct PageScripts {
    user: Arc<Mutex<Vec<String>>>,
    bindings: BindingTable,
}

impl PageScripts {
    pub fn new(bindings: BindingTable) -> Self {
        Self {
            user: Arc::default(),
            bindings,
        }
    }

    pub fn add(&self, js: &str) {
        self.user
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(js.to_string());
    }

    pub fn scripts(&self) -> Vec<String> {
        let mut scripts = self
            .user
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        scripts.extend(self.bindings.names().iter().map(|name| bind_script(name)));
        scripts
    }

    /// The scripts as a JSON array, as served to [`page_scripts_loader`].
    pub fn to_json(&self) -> String {
        serde_json::Value::from(self.scripts()).to_string()
    }
}

impl fmt::Debug for PageScripts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageScripts")
            .field("scripts", &self.scripts())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Calls = Arc<Mutex<Vec<(String, String)>>>;

    fn recorder(calls: &Calls) -> Arc<dyn BindCallback> {
        let calls = Arc::clone(calls);
        Arc::new(move |seq: &str, req: &str| {
            calls.lock().unwrap().push((seq.to_string(), req.to_string()));
        })
    }

    #[test]
    fn parse_call_request() {
        let req = RpcRequest::from_json(r#"{"id":"3","method":"add","params":[1,2]}"#).unwrap();
        assert_eq!(req.id, "3");
        assert_eq!(req.method, "add");
        assert_eq!(req.params_json(), "[1,2]");
    }

    #[test]
    fn params_are_always_an_array() {
        let req = RpcRequest::from_json(r#"{"id":"1","method":"m"}"#).unwrap();
        assert_eq!(req.params_json(), "[]");
        let req = RpcRequest::from_json(r#"{"id":"1","method":"m","params":"x"}"#).unwrap();
        assert_eq!(req.params_json(), r#"["x"]"#);
    }

    #[test]
    fn invalid_json_is_not_a_request() {
        assert!(RpcRequest::from_json("not json").is_none());
        assert!(RpcRequest::from_json(r#"{"method":"m"}"#).is_none());
    }

    #[test]
    fn reply_script_embeds_json_result() {
        let js = reply_script("7", 0, r#"{"sum":3}"#);
        assert_eq!(js, r#"window.__webview__.onReply("7", 0, {"sum":3});"#);
    }

    #[test]
    fn reply_script_quotes_plain_text() {
        let js = reply_script("7", 1, "boom");
        assert_eq!(js, r#"window.__webview__.onReply("7", 1, "boom");"#);
    }

    #[test]
    fn bind_scripts_escape_names() {
        assert_eq!(bind_script("greet"), r#"window.__webview__.onBind("greet");"#);
        assert_eq!(
            unbind_script("a\"b"),
            r#"window.__webview__.onUnbind("a\"b");"#
        );
    }

    #[test]
    fn message_reaches_bound_callback() {
        let calls: Calls = Arc::default();
        let table = BindingTable::new();
        table.insert("add", recorder(&calls));

        let reply = table.handle_message(
            Handle::from_raw(1),
            r#"{"id":"5","method":"add","params":[2,3]}"#,
        );
        assert!(reply.is_none());
        assert_eq!(
            *calls.lock().unwrap(),
            vec![("5".to_string(), "[2,3]".to_string())]
        );
    }

    #[test]
    fn unbound_method_gets_rejection() {
        let table = BindingTable::new();
        let reply = table
            .handle_message(Handle::from_raw(1), r#"{"id":"9","method":"nope","params":[]}"#)
            .unwrap();
        assert!(reply.starts_with(r#"window.__webview__.onReply("9", 1, "#));
        assert!(reply.contains("nope is not bound"));
    }

    #[test]
    fn garbage_message_is_dropped() {
        let table = BindingTable::new();
        assert!(table.handle_message(Handle::from_raw(1), "{oops").is_none());
    }

    #[test]
    fn remove_and_replace() {
        let calls: Calls = Arc::default();
        let table = BindingTable::new();
        assert!(!table.insert("f", recorder(&calls)));
        assert!(table.insert("f", recorder(&calls)));
        assert_eq!(table.names(), vec!["f".to_string()]);
        assert!(table.remove("f"));
        assert!(!table.remove("f"));
        assert!(table.get("f").is_none());
    }

    #[test]
    fn callback_may_touch_the_table() {
        let table = BindingTable::new();
        let inner = table.clone();
        table.insert(
            "once",
            Arc::new(move |_seq: &str, _req: &str| {
                inner.remove("once");
            }),
        );
        table.handle_message(Handle::from_raw(1), r#"{"id":"1","method":"once"}"#);
        assert!(table.get("once").is_none());
    }

    #[test]
    fn page_scripts_follow_init_order_then_bindings() {
        let calls: Calls = Arc::default();
        let table = BindingTable::new();
        let scripts = PageScripts::new(table.clone());
        scripts.add("window.a = 1;");
        table.insert("zeta", recorder(&calls));
        table.insert("alpha", recorder(&calls));
        scripts.add("window.b = 2;");

        assert_eq!(
            scripts.scripts(),
            vec![
                "window.a = 1;".to_string(),
                "window.b = 2;".to_string(),
                bind_script("alpha"),
                bind_script("zeta"),
            ]
        );
    }

    #[test]
    fn removed_binding_leaves_page_scripts() {
        let calls: Calls = Arc::default();
        let table = BindingTable::new();
        let scripts = PageScripts::new(table.clone());
        table.insert("ping", recorder(&calls));
        table.remove("ping");
        assert!(scripts.scripts().is_empty());
        assert_eq!(scripts.to_json(), "[]");
    }

    #[test]
    fn page_scripts_json_is_an_array_of_sources() {
        let scripts = PageScripts::default();
        scripts.add("say(\"hi\")");
        let parsed: Vec<String> = serde_json::from_str(&scripts.to_json()).unwrap();
        assert_eq!(parsed, vec!["say(\"hi\")".to_string()]);
    }

    #[test]
    fn loader_requests_quoted_url_synchronously() {
        let js = page_scripts_loader("wvhost://webview.init/scripts.json");
        assert!(js.contains(r#"xhr.open('GET', "wvhost://webview.init/scripts.json", false);"#));
        assert!(js.contains("(0, eval)(scripts[i]);"));
    }

    #[test]
    fn handler_closure_routes_to_table() {
        let calls: Calls = Arc::default();
        let table = BindingTable::new();
        table.insert("ping", recorder(&calls));
        let handler = table.message_handler(Handle::from_raw(2));
        assert!(handler(r#"{"id":"1","method":"ping","params":[]}"#).is_none());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }
}
