//! Signing-key acquisition strategies for third-party apt repositories.
//!
//! The shell heritage of this tool fetched vendor keys with whatever worked:
//! curl piped into `gpg --dearmor`, wget as a stand-in when curl was absent,
//! and a keyserver receive as the last resort. Those become three `Strategy`
//! implementations assembled into one ordered chain per key. A strategy that
//! fails may leave a partial key file behind; the next strategy simply
//! overwrites it.

use crate::acquire::Strategy;
use crate::error::{Result, StewardError};
use crate::system;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything needed to obtain one repository signing key
#[derive(Debug, Clone)]
pub struct KeySpec {
    /// Stable identifier used in logs and error messages
    pub identifier: String,
    /// HTTPS URL of the ASCII-armored key
    pub url: String,
    /// Key fingerprint, for the keyserver fallback
    pub fingerprint: String,
    /// Keyserver for the last-resort fetch
    pub keyserver: String,
    /// Destination: dearmored keyring file under the keyring dir
    pub dest: PathBuf,
}

impl KeySpec {
    /// Build the ordered fallback chain for this key
    pub fn strategies(&self) -> Vec<Box<dyn Strategy + '_>> {
        vec![
            Box::new(HttpFetch {
                fetcher: "curl",
                args: &["-fsSL"],
                url: &self.url,
                dest: &self.dest,
            }),
            Box::new(HttpFetch {
                fetcher: "wget",
                args: &["-qO-"],
                url: &self.url,
                dest: &self.dest,
            }),
            Box::new(KeyserverRecv {
                keyserver: &self.keyserver,
                fingerprint: &self.fingerprint,
                dest: &self.dest,
            }),
        ]
    }
}

/// Fetch the armored key over HTTPS and dearmor it into place
struct HttpFetch<'a> {
    fetcher: &'static str,
    args: &'static [&'static str],
    url: &'a str,
    dest: &'a Path,
}

impl Strategy for HttpFetch<'_> {
    fn name(&self) -> &str {
        self.fetcher
    }

    fn attempt(&self) -> Result<()> {
        let mut args: Vec<&str> = self.args.to_vec();
        args.push(self.url);
        let fetched = system::run(self.fetcher, &args)?;
        fetched.ensure_success(self.fetcher)?;
        if fetched.stdout.is_empty() {
            return Err(StewardError::mutation(format!(
                "{} returned an empty body for {}",
                self.fetcher, self.url
            )));
        }
        dearmor_to(fetched.stdout.as_bytes(), self.dest)
    }
}

/// Receive the key from a keyserver directly into the destination keyring
struct KeyserverRecv<'a> {
    keyserver: &'a str,
    fingerprint: &'a str,
    dest: &'a Path,
}

impl Strategy for KeyserverRecv<'_> {
    fn name(&self) -> &str {
        "keyserver-recv"
    }

    fn attempt(&self) -> Result<()> {
        ensure_parent(self.dest)?;
        let dest = self.dest.display().to_string();
        let output = system::run(
            "gpg",
            &[
                "--no-default-keyring",
                "--keyring",
                &dest,
                "--keyserver",
                self.keyserver,
                "--recv-keys",
                self.fingerprint,
            ],
        )?;
        output.ensure_success("gpg --recv-keys")
    }
}

/// Pipe armored key material through `gpg --dearmor` into `dest`
fn dearmor_to(armored: &[u8], dest: &Path) -> Result<()> {
    ensure_parent(dest)?;
    // --yes: overwrite leftovers from an earlier failed strategy
    let dest_str = dest.display().to_string();
    let output = system::run_with_stdin(
        "gpg",
        &["--dearmor", "--yes", "-o", &dest_str],
        armored,
    )?;
    output.ensure_success("gpg --dearmor")?;
    if !dest.is_file() {
        return Err(StewardError::mutation(format!(
            "gpg --dearmor reported success but {} does not exist",
            dest.display()
        )));
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
