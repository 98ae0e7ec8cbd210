use crate::ctl::Ctl;
use crate::supervisor::SPAWN_FAILURE;
use glob::Pattern;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Log file selection
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("invalid log exclusion regex: {0}")]
    Regex(#[from] regex::Error),
    #[error("invalid log path exclusion glob: {0}")]
    Glob(#[from] glob::PatternError),
}

/// Which files under the log directory are worth following.
pub struct LogFilter {
    exclude: Regex,
    path_excludes: Vec<Pattern>,
}

impl LogFilter {
    /// `exclude` is a regex matched anywhere in the path; `path_excludes`
    /// are `find -path` style globs matched against the whole path.
    pub fn new(exclude: &str, path_excludes: &[String]) -> Result<Self, FilterError> {
        let path_excludes = path_excludes
            .iter()
            .map(|glob| Pattern::new(glob))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            exclude: Regex::new(exclude)?,
            path_excludes,
        })
    }

    pub fn accepts(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        !self.exclude.is_match(&path) && !self.path_excludes.iter().any(|p| p.matches(&path))
    }
}

/// Regular files under `root`, recursively, sorted. Symlinks are skipped.
/// The filter sees each path relative to `root`, with a leading `/`.
pub fn collect_log_files(root: &Path, filter: &LogFilter) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|f| match f.strip_prefix(root) {
            Ok(relative) => filter.accepts(&Path::new("/").join(relative)),
            Err(_) => filter.accepts(f),
        })
        .collect();
    files.sort();
    files
}

// ---------------------------------------------------------------------------
// tail command
// ---------------------------------------------------------------------------

/// `tail [service]`: follow every log of all services, or of one.
pub fn tail(ctl: &mut Ctl, _command: &str, service: Option<&str>) -> i32 {
    let filter = match LogFilter::new(&ctl.settings.log_exclude, &ctl.settings.log_path_exclude) {
        Ok(f) => f,
        Err(e) => {
            ctl.log(e);
            return 1;
        }
    };

    let root = match service {
        Some(service) => ctl.paths().log_path().join(service),
        None => ctl.paths().log_path().to_path_buf(),
    };
    let files = collect_log_files(&root, &filter);
    if files.is_empty() {
        ctl.log(format!("no log files found under {}", root.display()));
        return 0;
    }

    let mut args = vec!["--follow=name".to_string(), "--retry".to_string()];
    args.extend(files.iter().map(|f| f.to_string_lossy().into_owned()));
    match ctl.launcher.run_program(Path::new("tail"), &args) {
        Ok(status) => status,
        Err(e) => {
            ctl.log(format!("could not run tail: {e}"));
            SPAWN_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctl::{DEFAULT_LOG_EXCLUDE, DEFAULT_LOG_PATH_EXCLUDE};
    use crate::testing::{Event, Fixture};
    use std::fs;

    fn default_filter() -> LogFilter {
        LogFilter::new(
            DEFAULT_LOG_EXCLUDE,
            &[DEFAULT_LOG_PATH_EXCLUDE.to_string()],
        )
        .unwrap()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_path_exclude_glob() {
        let filter = LogFilter::new("^$", &["*/sasl/*".to_string()]).unwrap();
        assert!(!filter.accepts(Path::new("/var/log/demo/rabbitmq/sasl/sasl.log")));
        assert!(!filter.accepts(Path::new("/sasl/sasl.log")));
        assert!(filter.accepts(Path::new("/var/log/demo/rabbitmq/current")));
    }

    #[test]
    fn test_default_filter() {
        let filter = default_filter();
        assert!(filter.accepts(Path::new("/var/log/demo/nginx/current")));
        assert!(filter.accepts(Path::new("/var/log/demo/nginx/access.log")));
        assert!(!filter.accepts(Path::new("/var/log/demo/nginx/config")));
        assert!(!filter.accepts(Path::new("/var/log/demo/nginx/lock")));
        assert!(!filter.accepts(Path::new("/var/log/demo/nginx/@4000000062a1.s")));
        assert!(!filter.accepts(Path::new("/var/log/demo/nginx/old.log.gz")));
        assert!(!filter.accepts(Path::new("/var/log/demo/rabbitmq/sasl/x.log")));
    }

    #[test]
    fn test_invalid_pattern_errors() {
        assert!(matches!(
            LogFilter::new("(unclosed", &[]),
            Err(FilterError::Regex(_))
        ));
        assert!(matches!(
            LogFilter::new("gz", &["[unclosed".to_string()]),
            Err(FilterError::Glob(_))
        ));
    }

    #[test]
    fn test_collect_log_files_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("nginx/current"));
        touch(&dir.path().join("erchef/current"));
        touch(&dir.path().join("erchef/requests.log.1.gz"));
        touch(&dir.path().join("rabbitmq/sasl/sasl.log"));

        let files = collect_log_files(dir.path(), &default_filter());
        assert_eq!(
            files,
            vec![
                dir.path().join("erchef/current"),
                dir.path().join("nginx/current"),
            ]
        );
    }

    #[test]
    fn test_tail_follows_service_logs() {
        let fx = Fixture::new();
        touch(&fx.paths.log_path().join("nginx/current"));
        touch(&fx.paths.log_path().join("erchef/current"));
        let (mut ctl, _) = fx.ctl();

        assert_eq!(tail(&mut ctl, "tail", Some("nginx")), 0);
        let current = fx.paths.log_path().join("nginx/current");
        assert_eq!(
            fx.recorder.events(),
            vec![Event::Program(
                "tail".to_string(),
                vec![
                    "--follow=name".to_string(),
                    "--retry".to_string(),
                    current.to_string_lossy().into_owned(),
                ]
            )]
        );
    }

    #[test]
    fn test_tail_without_logs() {
        let fx = Fixture::new();
        let (mut ctl, out) = fx.ctl();
        assert_eq!(tail(&mut ctl, "tail", None), 0);
        assert!(fx.recorder.events().is_empty());
        assert!(out.contents().contains("no log files found"));
    }
}
