use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// Content types accepted for upload and the extension each is stored under.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// On-disk image storage.
///
/// Each image is stored as `{dir}/{sha256}.{ext}`, so uploading the same
/// bytes twice yields the same path.
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Extension for a `Content-Type`, ignoring parameters such as charset.
    pub fn extension_for(content_type: &str) -> Option<&'static str> {
        let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
        IMAGE_TYPES
            .iter()
            .find(|(mime, _)| *mime == essence)
            .map(|(_, ext)| *ext)
    }

    fn content_type_for(ext: &str) -> Option<&'static str> {
        IMAGE_TYPES
            .iter()
            .find(|(_, e)| *e == ext)
            .map(|(mime, _)| *mime)
    }

    /// Accepts only names this store could have produced, which rules out
    /// path traversal.
    pub fn is_valid_name(name: &str) -> bool {
        let Some((hash, ext)) = name.split_once('.') else {
            return false;
        };
        hash.len() == 64
            && hash.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
            && Self::content_type_for(ext).is_some()
    }

    /// Store `data` and return its file name.
    pub async fn save(&self, data: &[u8], ext: &str) -> Result<String> {
        let hash = hex::encode(Sha256::digest(data));
        let name = format!("{hash}.{ext}");
        let path = self.dir.join(&name);

        if fs::try_exists(&path).await? {
            debug!("Image {} already stored", name);
            return Ok(name);
        }

        // Rename into place; readers never see a partial image.
        let tmp = self.dir.join(format!("{name}.part"));
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &path).await?;

        info!("Stored image {} ({} bytes)", name, data.len());
        Ok(name)
    }

    /// Read a stored image. Returns `None` if the name is unknown.
    pub async fn read(&self, name: &str) -> Result<Option<(Vec<u8>, &'static str)>> {
        let Some(content_type) = name
            .split_once('.')
            .and_then(|(_, ext)| Self::content_type_for(ext))
        else {
            return Ok(None);
        };

        match fs::read(self.dir.join(name)).await {
            Ok(bytes) => Ok(Some((bytes, content_type))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Public URL under which a stored image is served.
pub fn public_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/storage/images/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
