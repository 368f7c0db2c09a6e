// Small helpers shared by the JSON file stores.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub fn guild_file_name(guild_id: u64) -> String {
    format!("guild_{guild_id}.json")
}

/// Guild id from a `guild_<id>.json` file name.
pub fn parse_guild_file_name(name: &str) -> Option<u64> {
    name.strip_prefix("guild_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// File contents, or `None` when the file does not exist.
pub async fn read_optional(path: &Path) -> std::io::Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Writes through a temporary sibling and renames it into place, so a crash
/// mid-write never leaves a truncated file behind.
pub async fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await
}

/// Guild ids of every `guild_<id>.json` in `dir`. A missing directory is empty.
pub async fn list_guild_files(dir: &Path) -> std::io::Result<Vec<u64>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut ids = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if let Some(id) = entry.file_name().to_str().and_then(parse_guild_file_name) {
            ids.push(id);
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// `*.json` files in `dir` as `(stem, path)` pairs.
pub async fn list_json_files(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push((stem.to_string(), path.clone()));
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_guild_file_names() {
        assert_eq!(parse_guild_file_name("guild_123.json"), Some(123));
        assert_eq!(parse_guild_file_name(&guild_file_name(9)), Some(9));
        assert_eq!(parse_guild_file_name("guild_abc.json"), None);
        assert_eq!(parse_guild_file_name("global-config.json"), None);
    }

    #[tokio::test]
    async fn missing_files_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_optional(&dir.path().join("nope.json")).await.unwrap(), None);
        assert!(list_guild_files(&dir.path().join("nope")).await.unwrap().is_empty());

        write_file(&dir.path().join("sub/guild_4.json"), "{}").await.unwrap();
        assert_eq!(list_guild_files(&dir.path().join("sub")).await.unwrap(), vec![4]);
    }
}
