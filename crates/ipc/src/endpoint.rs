//! Endpoint allocation
//!
//! Each stream of a published chain gets its own socket path under the
//! configured base directory, named `<chain-hex>-<kind>.sock`. Paths are
//! unique per (chain, stream kind) among concurrently active chains; restart
//! collisions against stale files from a dead process are resolved at bind
//! time by a connect probe (see `PubSocket::bind`).

use std::path::{Path, PathBuf};

use chaintap_protocol::{ChainId, StreamKind};

/// A bound or bindable local address, exposed to subscribers as a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    path: PathBuf,
}

impl Endpoint {
    /// Wrap a socket path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Filesystem path of the socket
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// URL form handed to subscribers, e.g. `ipc:///tmp/chaintap/<chain>-consensus.sock`
    pub fn url(&self) -> String {
        format!("ipc://{}", self.path.display())
    }
}

/// Allocates endpoint paths for chain streams
#[derive(Debug, Clone)]
pub struct EndpointAllocator {
    base_dir: PathBuf,
}

impl EndpointAllocator {
    /// Create an allocator rooted at `base_dir`
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Socket directory
    #[inline]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Endpoint for one stream of one chain
    ///
    /// Deterministic: the same (chain, kind) always maps to the same path, so
    /// a restarted node reuses its previous addresses.
    pub fn allocate(&self, chain: &ChainId, kind: StreamKind) -> Endpoint {
        let name = format!("{chain}-{}.sock", kind.as_str());
        Endpoint::new(self.base_dir.join(name))
    }
}

#[cfg(test)]
#[path = "endpoint_test.rs"]
mod tests;
