//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn static_dir() -> PathBuf {
        "static".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn pages() -> PathBuf {
        "pages".into()
    }

    pub mod blog {
        use std::path::PathBuf;

        pub fn dir() -> PathBuf {
            "blog".into()
        }

        pub fn extension() -> String {
            "md".into()
        }

        pub fn template() -> String {
            "post".into()
        }

        pub fn output() -> PathBuf {
            "blog".into()
        }
    }

    pub mod projects {
        use std::path::PathBuf;

        pub fn dir() -> PathBuf {
            "projects".into()
        }

        pub fn categories() -> Vec<String> {
            vec!["featured".into(), "mini".into(), "retired".into()]
        }
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5277
    }

    pub fn debounce_ms() -> u64 {
        300
    }
}
