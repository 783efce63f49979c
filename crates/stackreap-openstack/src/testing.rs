//! Scripted stand-in for the `openstack` executable
//!
//! Each rule maps an argument prefix to canned stdout, or to stderr plus a
//! failing exit status. Every invocation is appended to a log. Tests that
//! spawn the script run `#[serial]`: a concurrent fork could hold the
//! freshly written script open and make exec fail with ETXTBSY.

use crate::cli::OpenStackCli;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

enum Reply {
    Stdout(String),
    Fail(String),
}

pub struct FakeCli {
    dir: TempDir,
    rules: Vec<(String, Reply)>,
    cli: OpenStackCli,
}

impl FakeCli {
    pub fn new(responses: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cli = OpenStackCli::new(None).with_program(dir.path().join("openstack").to_string_lossy());
        let mut fake = Self {
            dir,
            rules: Vec::new(),
            cli,
        };
        for (prefix, stdout) in responses {
            fake.rules
                .push((prefix.to_string(), Reply::Stdout(stdout.to_string())));
        }
        fake.write_script();
        fake
    }

    /// Makes invocations starting with `prefix` fail with `stderr`.
    /// Failures take precedence over canned output.
    pub fn fail(mut self, prefix: &str, stderr: &str) -> Self {
        self.rules
            .insert(0, (prefix.to_string(), Reply::Fail(stderr.to_string())));
        self.write_script();
        self
    }

    pub fn cli(&self) -> &OpenStackCli {
        &self.cli
    }

    pub fn into_cli(self) -> (TempDir, OpenStackCli) {
        (self.dir, self.cli)
    }

    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join("invocations.log")
    }

    fn write_script(&self) {
        let dir = self.dir.path();
        let mut script = format!(
            "#!/bin/sh\necho \"$*\" >> '{}'\ncase \"$*\" in\n",
            self.log_path().display()
        );
        for (i, (prefix, reply)) in self.rules.iter().enumerate() {
            let file = dir.join(format!("reply-{i}"));
            match reply {
                Reply::Stdout(out) => {
                    fs::write(&file, out).unwrap();
                    script.push_str(&format!("  \"{prefix}\"*) cat '{}' ;;\n", file.display()));
                }
                Reply::Fail(err) => {
                    fs::write(&file, err).unwrap();
                    script.push_str(&format!(
                        "  \"{prefix}\"*) cat '{}' >&2; exit 1 ;;\n",
                        file.display()
                    ));
                }
            }
        }
        script.push_str("esac\n");

        let path = dir.join("openstack");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
