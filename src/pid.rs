use crate::paths::Paths;
use std::fs;
use std::io;

/// What a supervisor pid file told us about a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PidFile {
    Missing,
    Malformed(String),
    Running(i32),
}

/// Accepts only a well-formed positive integer, surrounding whitespace allowed.
pub fn parse_pid(content: &str) -> Option<i32> {
    content.trim().parse::<i32>().ok().filter(|pid| *pid > 0)
}

pub fn read_service_pid(paths: &Paths, service: &str) -> PidFile {
    match fs::read_to_string(paths.pid_file(service)) {
        Ok(content) => match parse_pid(&content) {
            Some(pid) => PidFile::Running(pid),
            None => PidFile::Malformed(content.trim().to_string()),
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => PidFile::Missing,
        Err(e) => PidFile::Malformed(e.to_string()),
    }
}
