//! Request handlers.
//!
//! Handlers read an [`Incoming`] request and produce a [`Reply`]; turning
//! those into `tiny_http` types happens in the server loop.

use super::{
    html,
    route::{INDEX, Route},
};
use crate::{
    log,
    utils::slug,
    wiki::{Record, Wiki, WikiError},
};
use serde_json::{Value, json};
use std::path::{Component, Path, PathBuf};
use tiny_http::Method;

/// Recent pages listed next to a page or the editor.
const SIDEBAR_RECENT: usize = 9;

/// What the server loop extracted from a request.
#[derive(Debug)]
pub struct Incoming {
    pub method: Method,
    /// Decoded path, without the query string.
    pub path: String,
    /// Raw query string, without the `?`.
    pub query: String,
    /// `Content-Type` is `application/json`.
    pub is_json: bool,
    pub body: Vec<u8>,
}

impl Incoming {
    /// Value of `key` in the query string, percent-decoded.
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k == key).then(|| {
                urlencoding::decode(&v.replace('+', " "))
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| v.to_owned())
            })
        })
    }

    /// Body parsed as a JSON object.
    fn json_object(&self) -> Result<Record, Reply> {
        if !self.is_json {
            return Err(Reply::text(400, "Expected json"));
        }
        match serde_json::from_slice::<Value>(&self.body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Reply::text(400, "Expected a json object")),
            Err(err) => Err(Reply::text(400, format!("Invalid json: {err}"))),
        }
    }
}

/// Response to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// `Location` header for redirects.
    pub location: Option<String>,
}

impl Reply {
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into().into_bytes(),
            location: None,
        }
    }

    pub fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: value.to_string().into_bytes(),
            location: None,
        }
    }

    pub fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.into_bytes(),
            location: None,
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: 302,
            content_type: "text/plain; charset=utf-8",
            body: Vec::new(),
            location: Some(location.into()),
        }
    }

    fn method_not_allowed() -> Self {
        Self::text(405, "Method not allowed")
    }

    /// Map a wiki error to its status code.
    pub fn error(err: &WikiError) -> Self {
        let status = match err {
            WikiError::PageNotFound(_) | WikiError::TodoNotFound(_) => 404,
            WikiError::BadInput(_) | WikiError::ZeroLimit => 400,
            WikiError::IdSpaceExhausted(_) => 507,
            WikiError::Io(..)
            | WikiError::Json(..)
            | WikiError::CorruptTodos(..)
            | WikiError::Vcs(_) => {
                log!("error"; "{err}");
                500
            }
        };
        Self::text(status, err.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// Route and handle one request.
pub fn dispatch(wiki: &Wiki, request: &Incoming) -> Reply {
    let result = match (Route::parse(&request.path), &request.method) {
        (Route::Todo, Method::Get) => Ok(Reply::json(200, &Value::Array(into_values(wiki.todos())))),
        (Route::Todo, Method::Post) => upsert_todo(wiki, request, "Created"),
        (Route::Todo, Method::Put) => upsert_todo(wiki, request, "Updated"),
        (Route::Todo, Method::Delete) => delete_todo(wiki, request),
        (Route::Recent, Method::Get) => recent(wiki, request),
        (Route::Save(page), Method::Put) => save(wiki, request, &page),
        (Route::Upload(page), Method::Post) => upload(wiki, request, &page),
        (Route::Edit(page), Method::Get) => edit(wiki, &page),
        (Route::Page(path), Method::Get) => view(wiki, &path),
        (Route::Page(path), Method::Delete) => delete_page(wiki, &path),
        _ => Ok(Reply::method_not_allowed()),
    };
    result.unwrap_or_else(|err| Reply::error(&err))
}

type HandlerResult = Result<Reply, WikiError>;

fn into_values(records: Vec<Record>) -> Vec<Value> {
    records.into_iter().map(Value::Object).collect()
}

// ============================================================================
// Todo API
// ============================================================================

fn upsert_todo(wiki: &Wiki, request: &Incoming, done_message: &str) -> HandlerResult {
    let record = match request.json_object() {
        Ok(record) => record,
        Err(reply) => return Ok(reply),
    };
    wiki.upsert_todo(record)?;
    Ok(Reply::text(201, done_message))
}

fn delete_todo(wiki: &Wiki, request: &Incoming) -> HandlerResult {
    let body = match request.json_object() {
        Ok(body) => body,
        Err(reply) => return Ok(reply),
    };
    let Some(id) = body.get("id").and_then(Value::as_u64) else {
        return Ok(Reply::text(400, "Expected a numeric `id`"));
    };

    match wiki.delete_todo(id) {
        Ok(_) => Ok(Reply::text(200, "OK")),
        Err(WikiError::TodoNotFound(_)) => Ok(Reply::text(404, "Could not find specified element")),
        Err(err) => Err(err),
    }
}

// ============================================================================
// Recent Files
// ============================================================================

fn recent(wiki: &Wiki, request: &Incoming) -> HandlerResult {
    let limit = match request.query_param("limit") {
        None => None,
        Some(raw) => match raw.parse::<usize>() {
            Ok(limit) => Some(limit),
            Err(_) => return Ok(Reply::text(400, format!("Invalid limit `{raw}`"))),
        },
    };

    let entries: Vec<Value> = wiki
        .recent(limit)?
        .iter()
        .map(|file| {
            let relative = file.path.strip_prefix(wiki.root()).unwrap_or(&file.path);
            json!({
                "path": slug::url_path(relative),
                "mtime": file.mtime,
            })
        })
        .collect();
    Ok(Reply::json(200, &Value::Array(entries)))
}

// ============================================================================
// Editing
// ============================================================================

fn save(wiki: &Wiki, request: &Incoming, page: &str) -> HandlerResult {
    let body = match request.json_object() {
        Ok(body) => body,
        Err(reply) => return Ok(reply),
    };
    let Some(markdown) = body.get("markdown").and_then(Value::as_str) else {
        return Ok(Reply::text(400, "Expected a string `markdown`"));
    };

    wiki.save_page(page, markdown)?;
    Ok(Reply::text(201, "OK"))
}

fn upload(wiki: &Wiki, request: &Incoming, page: &str) -> HandlerResult {
    let Some(name) = request.query_param("name") else {
        return Ok(Reply::text(400, "Error: no file name in request"));
    };
    if name.is_empty() {
        return Ok(Reply::text(400, "Error: Empty file name"));
    }

    // Files go next to the page: `notes/rust` uploads land in `notes/`
    let dir = if page == INDEX {
        PathBuf::new()
    } else {
        Path::new(page).parent().map(Path::to_path_buf).unwrap_or_default()
    };

    let url = wiki.store_upload(&dir, &name, &request.body)?;
    Ok(Reply::json(201, &json!({"message": "OK", "path": url})))
}

fn edit(wiki: &Wiki, page: &str) -> HandlerResult {
    let page = wiki.page(page)?;
    let recent = wiki.recent_pages(SIDEBAR_RECENT)?;
    Ok(Reply::html(html::edit_view(wiki.renderer(), &page, &recent)))
}

fn delete_page(wiki: &Wiki, path: &str) -> HandlerResult {
    let page = page_name(path);
    match wiki.delete_page(page) {
        Ok(()) => Ok(Reply::text(201, "OK")),
        Err(err) => Ok(Reply::text(404, format!("Could not delete page: {err}"))),
    }
}

// ============================================================================
// Viewing
// ============================================================================

fn view(wiki: &Wiki, path: &str) -> HandlerResult {
    if !path.ends_with('/')
        && let Some(file) = raw_file(wiki.root(), path)
    {
        return Ok(match std::fs::read(&file) {
            Ok(bytes) => Reply {
                status: 200,
                content_type: super::guess_content_type(&file),
                body: bytes,
                location: None,
            },
            Err(err) => Reply::error(&WikiError::io(&file)(err)),
        });
    }

    if let Some(trimmed) = path.strip_suffix('/') {
        return Ok(Reply::redirect(format!("/{trimmed}")));
    }

    let mut page = wiki.page(page_name(path))?;
    if !page.exists() {
        let edit_url = if path.is_empty() {
            "/edit".to_owned()
        } else {
            format!("/{path}/edit")
        };
        return Ok(Reply::redirect(edit_url));
    }

    let content = page.render(wiki.renderer());
    let recent = wiki.recent_pages(SIDEBAR_RECENT)?;
    Ok(Reply::html(html::page_view(wiki.renderer(), &page, &content, &recent)))
}

/// Empty request path → `index`.
fn page_name(path: &str) -> &str {
    let path = path.trim_end_matches('/');
    if path.is_empty() { INDEX } else { path }
}

/// `path` as an existing regular file under `root`, refusing `..` and
/// the content of `.git`.
fn raw_file(root: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path);
    let safe = relative.components().all(|c| match c {
        Component::Normal(part) => part != ".git",
        _ => false,
    });
    if path.is_empty() || !safe {
        return None;
    }
    let file = root.join(relative);
    file.is_file().then_some(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, utils::git::NoVersionControl};
    use std::fs;
    use tempfile::TempDir;

    fn wiki(dir: &TempDir) -> Wiki {
        let config = Config {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };
        Wiki::new(&config, Box::new(NoVersionControl)).unwrap()
    }

    fn req(method: Method, target: &str, body: Option<Value>) -> Incoming {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Incoming {
            method,
            path: path.to_owned(),
            query: query.to_owned(),
            is_json: body.is_some(),
            body: body.map(|b| b.to_string().into_bytes()).unwrap_or_default(),
        }
    }

    fn body_json(reply: &Reply) -> Value {
        serde_json::from_slice(&reply.body).unwrap()
    }

    #[test]
    fn test_todo_api() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);

        let reply = dispatch(&wiki, &req(Method::Get, "/todo", None));
        assert_eq!(reply.status, 200);
        assert_eq!(body_json(&reply), json!([]));

        let reply = dispatch(&wiki, &req(Method::Post, "/todo", Some(json!({"text": "first"}))));
        assert_eq!((reply.status, reply.body.as_slice()), (201, b"Created".as_slice()));

        let reply = dispatch(&wiki, &req(Method::Put, "/todo", Some(json!({"id": 0, "text": "updated"}))));
        assert_eq!((reply.status, reply.body.as_slice()), (201, b"Updated".as_slice()));

        let todos = body_json(&dispatch(&wiki, &req(Method::Get, "/todo", None)));
        assert_eq!(todos, json!([{"id": 0, "text": "updated"}]));

        let reply = dispatch(&wiki, &req(Method::Delete, "/todo", Some(json!({"id": 0}))));
        assert_eq!(reply.status, 200);
        let reply = dispatch(&wiki, &req(Method::Delete, "/todo", Some(json!({"id": 0}))));
        assert_eq!(reply.status, 404);
    }

    #[test]
    fn test_todo_api_rejects_bad_input() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);

        let mut not_json = req(Method::Post, "/todo", None);
        not_json.body = b"text".to_vec();
        assert_eq!(dispatch(&wiki, &not_json).status, 400);

        let reply = dispatch(&wiki, &req(Method::Post, "/todo", Some(json!({"id": -2, "text": "x"}))));
        assert_eq!(reply.status, 400);

        let reply = dispatch(&wiki, &req(Method::Post, "/todo", Some(json!(["not", "an", "object"]))));
        assert_eq!(reply.status, 400);
    }

    #[test]
    fn test_id_exhaustion_is_insufficient_storage() {
        let dir = TempDir::new().unwrap();
        let mut config = Config {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };
        config.todo.id_ceiling = 1;
        let wiki = Wiki::new(&config, Box::new(NoVersionControl)).unwrap();

        dispatch(&wiki, &req(Method::Post, "/todo", Some(json!({"text": "a"}))));
        let reply = dispatch(&wiki, &req(Method::Post, "/todo", Some(json!({"text": "b"}))));
        assert_eq!(reply.status, 507);
    }

    #[test]
    fn test_save_view_and_delete_page() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);

        let reply = dispatch(&wiki, &req(Method::Get, "/notes", None));
        assert_eq!(reply.location.as_deref(), Some("/notes/edit"));

        let reply = dispatch(
            &wiki,
            &req(Method::Put, "/notes/edit/save", Some(json!({"markdown": "# Notes\n\n[[Other Page]]"}))),
        );
        assert_eq!(reply.status, 201);

        let reply = dispatch(&wiki, &req(Method::Get, "/notes", None));
        assert_eq!(reply.status, 200);
        let html = String::from_utf8(reply.body).unwrap();
        assert!(html.contains("<title>Notes</title>"));
        assert!(html.contains("href=\"/Other_Page/\""));

        let reply = dispatch(&wiki, &req(Method::Get, "/notes/", None));
        assert_eq!(reply.location.as_deref(), Some("/notes"));

        let reply = dispatch(&wiki, &req(Method::Delete, "/notes", None));
        assert_eq!(reply.status, 201);
        let reply = dispatch(&wiki, &req(Method::Delete, "/notes", None));
        assert_eq!(reply.status, 404);
        assert!(String::from_utf8(reply.body).unwrap().starts_with("Could not delete page"));
    }

    #[test]
    fn test_index_routes() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);

        let reply = dispatch(&wiki, &req(Method::Get, "/", None));
        assert_eq!(reply.location.as_deref(), Some("/edit"));

        let reply = dispatch(&wiki, &req(Method::Get, "/edit", None));
        assert_eq!(reply.status, 200);

        dispatch(&wiki, &req(Method::Put, "/edit/save", Some(json!({"markdown": "# Home"}))));
        assert!(dir.path().join("index.md").is_file());
        assert_eq!(dispatch(&wiki, &req(Method::Get, "/", None)).status, 200);
    }

    #[test]
    fn test_raw_files_are_served() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);
        fs::write(dir.path().join("notes.md"), "# raw").unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "secret").unwrap();

        let reply = dispatch(&wiki, &req(Method::Get, "/notes.md", None));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, b"# raw");
        assert!(reply.content_type.starts_with("text/markdown"));

        let reply = dispatch(&wiki, &req(Method::Get, "/.git/config", None));
        assert_ne!(reply.body, b"secret");
    }

    #[test]
    fn test_upload() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);

        let mut request = req(Method::Post, "/notes/rust/edit/upload?name=crab%20photo.png", None);
        request.body = b"png".to_vec();
        let reply = dispatch(&wiki, &request);
        assert_eq!(reply.status, 201);
        assert_eq!(body_json(&reply), json!({"message": "OK", "path": "/notes/crab_photo.png"}));
        assert!(dir.path().join("notes/crab_photo.png").is_file());

        let reply = dispatch(&wiki, &req(Method::Post, "/edit/upload", None));
        assert_eq!(reply.status, 400);
    }

    #[test]
    fn test_recent_endpoint() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);
        wiki.save_page("a", "# A").unwrap();
        wiki.save_page("b", "# B").unwrap();

        let reply = dispatch(&wiki, &req(Method::Get, "/recent?limit=1", None));
        let entries = body_json(&reply);
        assert_eq!(entries.as_array().unwrap().len(), 1);
        assert_eq!(entries[0]["path"], "/b.md");

        assert_eq!(dispatch(&wiki, &req(Method::Get, "/recent?limit=0", None)).status, 400);
        assert_eq!(dispatch(&wiki, &req(Method::Get, "/recent?limit=x", None)).status, 400);
    }

    #[test]
    fn test_method_not_allowed() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);
        assert_eq!(dispatch(&wiki, &req(Method::Post, "/recent", None)).status, 405);
        assert_eq!(dispatch(&wiki, &req(Method::Get, "/edit/save", None)).status, 405);
    }

    #[test]
    fn test_query_param() {
        let request = req(Method::Get, "/x?a=1&name=my+file%21.txt", None);
        assert_eq!(request.query_param("name").as_deref(), Some("my file!.txt"));
        assert_eq!(request.query_param("missing"), None);
    }
}
