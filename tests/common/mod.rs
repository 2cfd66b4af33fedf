#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Encodes `text` the way referrer exports arrive: UTF-16LE with a byte-order mark.
pub fn utf16le(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

/// Encodes `text` as UTF-8 with a leading byte-order mark.
pub fn utf8_sig(text: &str) -> Vec<u8> {
    let mut bytes = b"\xEF\xBB\xBF".to_vec();
    bytes.extend_from_slice(text.as_bytes());
    bytes
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes raw `bytes` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, bytes).expect("write temp file contents");
        path
    }

    /// Reads a file produced under the workspace as UTF-8 text.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read workspace file")
    }
}

pub const DOMAIN_REFERRER_TSV: &str = "Target\tDomainRating\tRefDomainsDofollow\tLinkedDomains\tTotalTraffic\n\
example.com/\t50\t10\t20\t1000\n\
www.other.net\t5\t0\t7\t\n\
lonely.org/\t12\t3\t4\t5\n";

pub const DOMAIN_TRUST_CSV: &str = "Item,TrustFlow,CitationFlow\n\
https://example.com,30,15\n\
https://other.net,1,2\n";

pub const PAGE_REFERRER_TSV: &str = "Target\tURL Rating\tRef domains Dofollow\tLinked Domains\tTotal Traffic\n\
https://blog.example.com/post/\t22\t4\t8\t300\n";

pub const PAGE_TRUST_CSV: &str = "Item,TrustFlow,CitationFlow,Topical Trust Flow Topic 0\n\
blog.example.com/post,12,6,Computers/Internet\n";
