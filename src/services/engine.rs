use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine cannot open the source document at all
    #[error("unsupported source document: {0}")]
    UnsupportedSource(String),

    /// Any other engine-level failure
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Conversion profile selected per output format, mirroring the per-format
/// option sets of the underlying tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionProfile {
    WordProcessing,
    Spreadsheet,
    Presentation,
    Image,
}

/// Opaque document-processing capability. The pipeline assumes nothing about
/// a backend beyond success/failure and the artifacts it promises to produce.
#[async_trait]
pub trait DocumentEngine: Send + Sync {
    /// Convert `source` into `dest` using the given profile. Writes exactly
    /// one file at `dest` on success.
    async fn convert(
        &self,
        source: &Path,
        dest: &Path,
        profile: ConversionProfile,
    ) -> Result<(), EngineError>;

    /// Join `sources` strictly in slice order into a single document at
    /// `dest`. Page order of the result must match input order.
    async fn merge(&self, sources: &[PathBuf], dest: &Path) -> Result<(), EngineError>;

    /// Render one consolidated, self-contained view of `source` (all
    /// supporting resources embedded) to `dest`. Returns the page count.
    async fn render_view(&self, source: &Path, dest: &Path) -> Result<usize, EngineError>;

    /// Render one image per page of `source` into `dest_dir`, named
    /// `p_1.png` .. `p_N.png`. Returns the page count.
    async fn render_pages(&self, source: &Path, dest_dir: &Path) -> Result<usize, EngineError>;
}

/// PDF-centric engine backed by lopdf for page manipulation, `pdftocairo`
/// for rasterization, and LibreOffice for office-format conversion.
/// Non-PDF sources are normalized to PDF before any page-level operation.
pub struct PdfEngine {
    pdftocairo: String,
    soffice: String,
}

impl PdfEngine {
    pub fn new(pdftocairo: String, soffice: String) -> Self {
        Self { pdftocairo, soffice }
    }

    async fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<()> {
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("failed to spawn {}", program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("{} failed: {}", program, stderr);
            bail!("{} exited with {}: {}", program, output.status, stderr);
        }
        Ok(())
    }

    async fn is_pdf(path: &Path) -> bool {
        let mut magic = [0u8; 5];
        match tokio::fs::File::open(path).await {
            Ok(mut file) => match file.read_exact(&mut magic).await {
                Ok(_) => magic.starts_with(b"%PDF"),
                Err(_) => false,
            },
            Err(_) => false,
        }
    }

    /// Normalize any source to a PDF. PDF inputs are used as-is; anything
    /// else goes through LibreOffice into a scratch directory whose guard
    /// keeps the converted file alive for the caller.
    async fn ensure_pdf(&self, source: &Path) -> Result<(PathBuf, Option<TempDir>), EngineError> {
        if Self::is_pdf(source).await {
            return Ok((source.to_path_buf(), None));
        }

        let scratch = TempDir::new().map_err(|e| EngineError::Failed(e.into()))?;
        let outdir = scratch.path().to_string_lossy().to_string();
        let src = source.to_string_lossy().to_string();

        // A converter that never started is an engine failure; only a
        // converter that ran and rejected the input condemns the document.
        let output = Command::new(&self.soffice)
            .args(["--headless", "--convert-to", "pdf", "--outdir", &outdir, &src])
            .output()
            .await
            .map_err(|e| {
                EngineError::Failed(
                    anyhow::Error::from(e)
                        .context(format!("failed to spawn {}", self.soffice)),
                )
            })?;

        if !output.status.success() {
            error!(
                "{} rejected {}: {}",
                self.soffice,
                source.display(),
                String::from_utf8_lossy(&output.stderr)
            );
            return Err(EngineError::UnsupportedSource(display_name(source)));
        }

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let converted = scratch.path().join(format!("{}.pdf", stem));
        if !converted.is_file() {
            return Err(EngineError::UnsupportedSource(display_name(source)));
        }

        Ok((converted, Some(scratch)))
    }

    async fn page_count(&self, pdf: &Path) -> Result<usize, EngineError> {
        let path = pdf.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || {
            Document::load(&path).map(|doc| doc.get_pages().len())
        })
        .await
        .map_err(|e| EngineError::Failed(e.into()))?
        .map_err(|_| EngineError::UnsupportedSource(display_name(pdf)))?;

        if pages == 0 {
            return Err(EngineError::UnsupportedSource(display_name(pdf)));
        }
        Ok(pages)
    }

    /// Rasterize pages 1..=count of `pdf` into `dir` as `p_<n>.png`.
    async fn rasterize_pages(&self, pdf: &Path, dir: &Path, count: usize) -> anyhow::Result<()> {
        let src = pdf.to_string_lossy().to_string();
        for page in 1..=count {
            let prefix = dir.join(format!("p_{}", page));
            let prefix = prefix.to_string_lossy().to_string();
            let page_arg = page.to_string();
            self.run(
                &self.pdftocairo,
                &["-png", "-f", &page_arg, "-l", &page_arg, "-singlefile", &src, &prefix],
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentEngine for PdfEngine {
    async fn convert(
        &self,
        source: &Path,
        dest: &Path,
        profile: ConversionProfile,
    ) -> Result<(), EngineError> {
        match profile {
            ConversionProfile::WordProcessing
            | ConversionProfile::Spreadsheet
            | ConversionProfile::Presentation => {
                let ext = dest
                    .extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .ok_or_else(|| EngineError::Failed(anyhow!("destination has no extension")))?;

                let scratch = TempDir::new().map_err(|e| EngineError::Failed(e.into()))?;
                let outdir = scratch.path().to_string_lossy().to_string();
                let src = source.to_string_lossy().to_string();
                self.run(
                    &self.soffice,
                    &["--headless", "--convert-to", &ext, "--outdir", &outdir, &src],
                )
                .await?;

                let stem = source
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let produced = scratch.path().join(format!("{}.{}", stem, ext));
                if !produced.is_file() {
                    return Err(EngineError::UnsupportedSource(display_name(source)));
                }

                // rename can cross filesystems here, so copy instead
                tokio::fs::copy(&produced, dest)
                    .await
                    .context("failed to place converted file")?;
                Ok(())
            }
            ConversionProfile::Image => {
                let (pdf, _guard) = self.ensure_pdf(source).await?;
                let flag = match dest.extension().and_then(|e| e.to_str()) {
                    Some("jpg") | Some("jpeg") => "-jpeg",
                    _ => "-png",
                };
                let src = pdf.to_string_lossy().to_string();
                let prefix = dest.with_extension("");
                let prefix = prefix.to_string_lossy().to_string();
                self.run(&self.pdftocairo, &[flag, "-singlefile", &src, &prefix])
                    .await?;
                Ok(())
            }
        }
    }

    async fn merge(&self, sources: &[PathBuf], dest: &Path) -> Result<(), EngineError> {
        let mut normalized = Vec::with_capacity(sources.len());
        let mut guards = Vec::new();
        for source in sources {
            let (pdf, guard) = self.ensure_pdf(source).await?;
            normalized.push(pdf);
            if let Some(guard) = guard {
                guards.push(guard);
            }
        }

        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || merge_documents(&normalized, &dest))
            .await
            .map_err(|e| EngineError::Failed(e.into()))??;
        Ok(())
    }

    async fn render_view(&self, source: &Path, dest: &Path) -> Result<usize, EngineError> {
        let (pdf, _guard) = self.ensure_pdf(source).await?;
        let pages = self.page_count(&pdf).await?;

        let scratch = TempDir::new().map_err(|e| EngineError::Failed(e.into()))?;
        self.rasterize_pages(&pdf, scratch.path(), pages).await?;

        let mut body = String::new();
        for page in 1..=pages {
            let png = tokio::fs::read(scratch.path().join(format!("p_{}.png", page)))
                .await
                .context("missing rendered page")?;
            body.push_str(&format!(
                "<div class=\"page\" id=\"page-{page}\"><img src=\"data:image/png;base64,{}\" alt=\"Page {page}\"/></div>\n",
                BASE64.encode(&png),
            ));
        }

        let html = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n\
             <style>body{{margin:0;background:#525659}}.page{{margin:8px auto;width:fit-content}}.page img{{display:block;max-width:100%}}</style>\n\
             </head>\n<body>\n{}</body>\n</html>\n",
            body
        );
        tokio::fs::write(dest, html)
            .await
            .context("failed to write consolidated view")?;

        Ok(pages)
    }

    async fn render_pages(&self, source: &Path, dest_dir: &Path) -> Result<usize, EngineError> {
        let (pdf, _guard) = self.ensure_pdf(source).await?;
        let pages = self.page_count(&pdf).await?;
        self.rasterize_pages(&pdf, dest_dir, pages).await?;
        Ok(pages)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Sequential PDF join: pages of each input appended in slice order.
fn merge_documents(sources: &[PathBuf], dest: &Path) -> anyhow::Result<()> {
    let mut max_id = 1u32;
    // Page objects in append order; other objects keyed by renumbered id
    let mut document_pages: Vec<(ObjectId, Object)> = Vec::new();
    let mut document_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for source in sources {
        let mut doc = Document::load(source)
            .with_context(|| format!("failed to load {}", source.display()))?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, object_id) in doc.get_pages() {
            let object = doc
                .get_object(object_id)
                .with_context(|| format!("missing page object in {}", source.display()))?
                .to_owned();
            document_pages.push((object_id, object));
        }
        document_objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog_object: Option<(ObjectId, Object)> = None;
    let mut pages_object: Option<(ObjectId, Object)> = None;

    for (object_id, object) in &document_objects {
        match object.type_name().unwrap_or(b"") {
            b"Catalog" => {
                if catalog_object.is_none() {
                    catalog_object = Some((*object_id, object.clone()));
                }
            }
            b"Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref existing)) = pages_object {
                        if let Ok(existing) = existing.as_dict() {
                            dictionary.extend(existing);
                        }
                    }
                    pages_object = Some((
                        pages_object
                            .as_ref()
                            .map(|(id, _)| *id)
                            .unwrap_or(*object_id),
                        Object::Dictionary(dictionary),
                    ));
                }
            }
            // Page objects are re-parented below; outlines are dropped
            b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                merged.objects.insert(*object_id, object.clone());
            }
        }
    }

    let (catalog_id, catalog) =
        catalog_object.context("no catalog found in merge inputs")?;
    let (pages_id, pages) = pages_object.context("no pages root found in merge inputs")?;

    for (object_id, object) in &document_pages {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_id);
            merged
                .objects
                .insert(*object_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", document_pages.len() as u32);
        dictionary.set(
            "Kids",
            document_pages
                .iter()
                .map(|(id, _)| Object::Reference(*id))
                .collect::<Vec<_>>(),
        );
        merged.objects.insert(pages_id, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_id);
        dictionary.remove(b"Outlines");
        merged
            .objects
            .insert(catalog_id, Object::Dictionary(dictionary));
    }

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();
    merged
        .save(dest)
        .with_context(|| format!("failed to save merged document to {}", dest.display()))?;
    Ok(())
}
