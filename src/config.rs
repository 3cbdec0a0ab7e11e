use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Notamed";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/Notamed/ on all platforms (user-visible, next to the notes it serves)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Get the path of the SQLite store
pub fn database_path() -> PathBuf {
    app_data_dir().join("notamed.db")
}

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> &'static str {
    "notamed=info,warn"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Notamed"));
    }

    #[test]
    fn database_path_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("notamed.db"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }
}
