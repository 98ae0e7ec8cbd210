use std::path::{Path, PathBuf};

pub const DEFAULT_RUNNING_CONFIG: &str = "chef-server-running.json";

/// Filesystem layout of one installed product.
///
/// Every default location is absolute; `with_root` rebases all of them
/// under another directory so a whole install can live inside a chroot
/// or a test's temp dir.
#[derive(Debug, Clone)]
pub struct Paths {
    name: String,
    root: PathBuf,
    base_path: PathBuf,
    log_path: PathBuf,
    data_path: PathBuf,
    etc_path: PathBuf,
    backup_root: PathBuf,
    running_config: String,
}

impl Paths {
    pub fn new(name: &str) -> Self {
        Self::with_root(PathBuf::from("/"), name)
    }

    pub fn with_root(root: PathBuf, name: &str) -> Self {
        let rebase = |p: &str| rebase(&root, Path::new(p));
        Self {
            name: name.to_string(),
            base_path: rebase(&format!("/opt/{name}")),
            log_path: rebase(&format!("/var/log/{name}")),
            data_path: rebase(&format!("/var/opt/{name}")),
            etc_path: rebase(&format!("/etc/{name}")),
            backup_root: rebase("/root"),
            running_config: DEFAULT_RUNNING_CONFIG.to_string(),
            root,
        }
    }

    pub fn set_base_path(&mut self, path: PathBuf) {
        self.base_path = path;
    }

    pub fn set_log_path(&mut self, path: PathBuf) {
        self.log_path = path;
    }

    pub fn set_data_path(&mut self, path: PathBuf) {
        self.data_path = path;
    }

    pub fn set_etc_path(&mut self, path: PathBuf) {
        self.etc_path = path;
    }

    pub fn set_backup_root(&mut self, path: PathBuf) {
        self.backup_root = path;
    }

    pub fn set_running_config(&mut self, file_name: &str) {
        self.running_config = file_name.to_string();
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn etc_path(&self) -> &Path {
        &self.etc_path
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    // -- supervision tree --

    pub fn sv_path(&self) -> PathBuf {
        self.base_path.join("sv")
    }

    pub fn service_path(&self) -> PathBuf {
        self.base_path.join("service")
    }

    /// Activation link whose presence marks a service as enabled.
    pub fn service_link(&self, service: &str) -> PathBuf {
        self.service_path().join(service)
    }

    pub fn init_script(&self, service: &str) -> PathBuf {
        self.base_path.join("init").join(service)
    }

    pub fn pid_file(&self, service: &str) -> PathBuf {
        self.sv_path().join(service).join("supervise").join("pid")
    }

    pub fn runsvdir_start(&self) -> PathBuf {
        self.base_path.join("embedded/bin/runsvdir-start")
    }

    /// Directories prepended to `PATH` for every child process.
    pub fn bin_dirs(&self) -> [PathBuf; 2] {
        [
            self.base_path.join("bin"),
            self.base_path.join("embedded/bin"),
        ]
    }

    // -- configuration tool --

    pub fn chef_client(&self) -> PathBuf {
        self.base_path.join("embedded/bin/chef-client")
    }

    pub fn cookbook_file(&self, file: &str) -> PathBuf {
        self.base_path.join("embedded/cookbooks").join(file)
    }

    pub fn running_config(&self) -> PathBuf {
        self.etc_path.join(&self.running_config)
    }

    // -- host integration touched by teardown --

    pub fn upstart_conf(&self) -> PathBuf {
        rebase(
            &self.root,
            Path::new(&format!("/etc/init/{}-runsvdir.conf", self.name)),
        )
    }

    pub fn inittab(&self) -> PathBuf {
        rebase(&self.root, Path::new("/etc/inittab"))
    }

    pub fn scratch_path(&self) -> PathBuf {
        rebase(&self.root, Path::new("/tmp/opt"))
    }
}

fn rebase(root: &Path, absolute: &Path) -> PathBuf {
    match absolute.strip_prefix("/") {
        Ok(relative) => root.join(relative),
        Err(_) => root.join(absolute),
    }
}
