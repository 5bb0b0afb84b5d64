//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// Content Root
// ============================================================================

/// Content root used when neither `--root` nor `SELF_WIKI_CONTENT_ROOT` is set.
pub fn content_root() -> String {
    "~/.self.wiki/".into()
}

// ============================================================================
// [wiki] Section Defaults
// ============================================================================

pub mod wiki {
    use crate::wiki::markdown::Extension;

    pub fn extensions() -> Vec<Extension> {
        Extension::ALL.to_vec()
    }
}

// ============================================================================
// [recent] Section Defaults
// ============================================================================

pub mod recent {
    pub fn limit() -> usize {
        20
    }

    pub fn extensions() -> Vec<String> {
        vec!["md".into()]
    }
}

// ============================================================================
// [todo] Section Defaults
// ============================================================================

pub mod todo {
    pub fn file() -> String {
        "todos.json".into()
    }

    pub fn id_ceiling() -> u64 {
        1024
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "localhost".into()
    }

    pub fn port() -> u16 {
        4000
    }
}
