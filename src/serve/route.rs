//! URL → route table.
//!
//! | Path                      | Route           |
//! |---------------------------|-----------------|
//! | `/todo`                   | `Todo`          |
//! | `/recent`                 | `Recent`        |
//! | `/<page>/edit/save`       | `Save(page)`    |
//! | `/<page>/edit/upload`     | `Upload(page)`  |
//! | `/<page>/edit`            | `Edit(page)`    |
//! | anything else             | `Page(path)`    |
//!
//! Without a `<page>` prefix the edit routes apply to `index`.

/// Page used when a route names none.
pub const INDEX: &str = "index";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Todo,
    Recent,
    Save(String),
    Upload(String),
    Edit(String),
    /// Raw request path without the leading `/`, trailing `/` kept.
    Page(String),
}

impl Route {
    /// Route a decoded request path (query string already removed).
    pub fn parse(path: &str) -> Self {
        let path = path.strip_prefix('/').unwrap_or(path);

        match path {
            "todo" => return Self::Todo,
            "recent" => return Self::Recent,
            _ => {}
        }

        if let Some(page) = edit_target(path, "edit/save") {
            Self::Save(page)
        } else if let Some(page) = edit_target(path, "edit/upload") {
            Self::Upload(page)
        } else if let Some(page) = edit_target(path, "edit") {
            Self::Edit(page)
        } else {
            Self::Page(path.to_owned())
        }
    }
}

/// `suffix` alone → index, `<page>/suffix` → page.
fn edit_target(path: &str, suffix: &str) -> Option<String> {
    if path == suffix {
        return Some(INDEX.to_owned());
    }
    let page = path.strip_suffix(suffix)?.strip_suffix('/')?;
    (!page.is_empty()).then(|| page.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_routes() {
        assert_eq!(Route::parse("/todo"), Route::Todo);
        assert_eq!(Route::parse("/recent"), Route::Recent);
        assert_eq!(Route::parse("/todo/list"), Route::Page("todo/list".into()));
    }

    #[test]
    fn test_edit_routes() {
        assert_eq!(Route::parse("/edit"), Route::Edit("index".into()));
        assert_eq!(Route::parse("/edit/save"), Route::Save("index".into()));
        assert_eq!(Route::parse("/notes/rust/edit"), Route::Edit("notes/rust".into()));
        assert_eq!(Route::parse("/notes/edit/save"), Route::Save("notes".into()));
        assert_eq!(Route::parse("/notes/edit/upload"), Route::Upload("notes".into()));
    }

    #[test]
    fn test_page_routes() {
        assert_eq!(Route::parse("/"), Route::Page(String::new()));
        assert_eq!(Route::parse("/notes/"), Route::Page("notes/".into()));
        assert_eq!(Route::parse("/credit"), Route::Page("credit".into()));
        assert_eq!(Route::parse("/edits"), Route::Page("edits".into()));
    }
}
