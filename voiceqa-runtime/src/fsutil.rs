use std::fs;
use std::path::Path;

use anyhow::Context;

pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(path).with_context(|| format!("failed to create dir: {}", path.display()))
}

pub fn replace_file(tmp: &Path, dst: &Path) -> anyhow::Result<()> {
    // `rename` fails on Windows when the destination already exists.
    #[cfg(windows)]
    if dst.exists() {
        fs::remove_file(dst)
            .with_context(|| format!("failed to remove old file: {}", dst.display()))?;
    }

    fs::rename(tmp, dst)
        .with_context(|| format!("failed to replace {} with {}", dst.display(), tmp.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("out.json");
        let tmp = dir.path().join("out.json.tmp");

        fs::write(&dst, "old").unwrap();
        fs::write(&tmp, "new").unwrap();

        replace_file(&tmp, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "new");
        assert!(!tmp.exists());
    }
}
