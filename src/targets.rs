//! Maps input URLs to destination paths.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use remote_file::filename_from_url;
use url::Url;

/// One URL and the file it is saved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub(crate) url: String,
    pub(crate) path: PathBuf,
}

/// Pairs each URL with a destination.
///
/// With `output` set exactly one URL is allowed. Otherwise filenames come
/// from the URLs and are placed in `output_dir`; names repeated within one
/// run get `_2`, `_3`, ... suffixes so two workers never share a file.
/// Unparseable URLs still get a target; the task reports the bad URL.
pub(crate) fn plan_targets(
    urls: &[String],
    output: Option<&Path>,
    output_dir: &Path,
) -> Result<Vec<Target>> {
    if let Some(output) = output {
        if urls.len() != 1 {
            bail!(
                "--output accepts exactly one URL, got {}; use --output-dir for several",
                urls.len()
            );
        }
        return Ok(vec![Target {
            url: urls[0].clone(),
            path: output.to_path_buf(),
        }]);
    }

    let mut used = HashSet::new();
    Ok(urls
        .iter()
        .map(|url| {
            let name = Url::parse(url)
                .map_or_else(|_| "download.bin".to_string(), |parsed| filename_from_url(&parsed));
            Target {
                url: url.clone(),
                path: output_dir.join(claim_unique_name(&mut used, &name)),
            }
        })
        .collect())
}

fn claim_unique_name(used: &mut HashSet<String>, name: &str) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    };
    let mut suffix = 2usize;
    loop {
        let candidate = format!("{stem}_{suffix}{ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Splits stdin text into URLs, skipping blank lines and `#` comments.
pub(crate) fn urls_from_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
