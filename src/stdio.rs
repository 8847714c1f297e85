use std::fs::File;

/// Where a standard stream (stdin, stdout, stderr) ends up after the
/// process detaches from its terminal.
#[derive(Debug)]
pub enum Stdio {
    /// Redirect the stream to `/dev/null`. The default: a detached daemon
    /// has no terminal to talk to.
    Null,
    /// Redirect the stream to the given file, typically opened in append
    /// mode for logs.
    File(File),
    /// Leave the stream alone. Useful while debugging in the foreground.
    Inherit,
}

impl Stdio {
    /// A target that discards everything.
    pub fn null() -> Self {
        Stdio::Null
    }
}

impl From<File> for Stdio {
    fn from(f: File) -> Self {
        Stdio::File(f)
    }
}
