use std::path::PathBuf;

/// A raw upload staged under the incoming area. Never mutated; consumed as
/// input by conversion, merge, or preview.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied name, kept for deriving output/preview base names
    pub original_name: String,
    /// Server-assigned storage path under the incoming area
    pub path: PathBuf,
    pub size: u64,
}

/// A conversion or merge result stored under the output area.
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    pub file_name: String,
    pub path: PathBuf,
}

/// A generated preview bundle: one consolidated view plus one image per page.
#[derive(Debug, Clone)]
pub struct PreviewBundle {
    /// Collision-resistant key the bundle directory is filed under
    pub key: String,
    pub root_path: PathBuf,
    pub page_count: usize,
}
