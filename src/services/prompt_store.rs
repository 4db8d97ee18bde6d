use async_trait::async_trait;
use std::io;
use std::path::PathBuf;

/// Store of named prompt resources.
///
/// `io::ErrorKind::NotFound` is the one recoverable failure: the resolver
/// treats it as "no such resource" and moves on to the next candidate name.
/// Every other error kind (permissions, I/O) propagates and aborts the
/// in-flight request.
#[async_trait]
pub trait PromptStore: Send + Sync {
    async fn load(&self, name: &str) -> io::Result<String>;
}

/// Prompt store backed by a directory of text files.
#[derive(Clone, Debug)]
pub struct FsPromptStore {
    dir: PathBuf,
}

impl FsPromptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[async_trait]
impl PromptStore for FsPromptStore {
    async fn load(&self, name: &str) -> io::Result<String> {
        tokio::fs::read_to_string(self.dir.join(name)).await
    }
}
