use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct TagFolderCommand {
    pub folder: PathBuf,
    pub pattern: String,
    pub recursive: bool,
    /// Write changes; otherwise only report them.
    pub apply: bool,
    pub allow_override: bool,
}
