use jobnote_common::{CollisionPolicy, JobnoteError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Highest `" (n)"` suffix tried before giving up under [`CollisionPolicy::Suffix`].
const MAX_SUFFIX: u32 = 999;

fn persistence(path: &Path, source: std::io::Error) -> JobnoteError {
    JobnoteError::Persistence {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `text` to `{dir}/{file_stem}.md`, creating `dir` first.
///
/// Returns the path actually written, which differs from the plain name when
/// the suffix policy had to pick `"{stem} (2).md"` or later.
pub async fn persist(
    dir: &Path,
    file_stem: &str,
    text: &str,
    policy: CollisionPolicy,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| persistence(dir, e))?;

    let primary = dir.join(format!("{file_stem}.md"));
    let path = match policy {
        CollisionPolicy::Overwrite => {
            fs::write(&primary, text)
                .await
                .map_err(|e| persistence(&primary, e))?;
            primary
        }
        CollisionPolicy::Fail => {
            write_new(&primary, text).await?;
            primary
        }
        CollisionPolicy::Suffix => write_with_suffix(dir, file_stem, text).await?,
    };

    tracing::info!(path = %path.display(), bytes = text.len(), "document written");
    Ok(path)
}

/// Create-new write; fails with `AlreadyExists` if the file is there.
async fn write_new(path: &Path, text: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| persistence(path, e))?;
    file.write_all(text.as_bytes())
        .await
        .map_err(|e| persistence(path, e))?;
    file.flush().await.map_err(|e| persistence(path, e))?;
    Ok(())
}

async fn write_with_suffix(dir: &Path, file_stem: &str, text: &str) -> Result<PathBuf> {
    let mut last_err = None;
    for n in 1..=MAX_SUFFIX {
        let candidate = if n == 1 {
            dir.join(format!("{file_stem}.md"))
        } else {
            dir.join(format!("{file_stem} ({n}).md"))
        };
        match write_new(&candidate, text).await {
            Ok(()) => {
                if n > 1 {
                    tracing::warn!(path = %candidate.display(), "target existed, wrote suffixed copy");
                }
                return Ok(candidate);
            }
            Err(JobnoteError::Persistence { source, .. })
                if source.kind() == ErrorKind::AlreadyExists =>
            {
                last_err = Some(source);
            }
            Err(other) => return Err(other),
        }
    }

    let path = dir.join(format!("{file_stem}.md"));
    Err(persistence(
        &path,
        last_err.unwrap_or_else(|| std::io::Error::from(ErrorKind::AlreadyExists)),
    ))
}
