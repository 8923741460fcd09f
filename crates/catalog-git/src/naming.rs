//! Source id to working-copy directory name mapping

use catalog_fs::checksum::compute_checksum;

/// Longest slug kept before the hash suffix.
const MAX_SLUG_LEN: usize = 48;

/// Directory name for the working copy of a source.
///
/// The readable slug keeps directories recognizable on disk; the hash
/// suffix keeps two ids that slugify identically (`a/b` and `a-b`) apart.
///
/// `git:https://github.com/acme/services.git` ->
/// `git-https-github-com-acme-services-git-1a2b3c4d`
pub fn checkout_dir_name(source_id: &str) -> String {
    let mut slug = slugify(source_id);
    if slug.len() > MAX_SLUG_LEN {
        let mut cut = MAX_SLUG_LEN;
        while !slug.is_char_boundary(cut) {
            cut -= 1;
        }
        slug.truncate(cut);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    let checksum = compute_checksum(source_id.as_bytes());
    let hash = checksum.trim_start_matches("sha256:");
    let suffix = &hash[..8];

    if slug.is_empty() {
        format!("source-{suffix}")
    } else {
        format!("{slug}-{suffix}")
    }
}

/// Lowercase, replace runs of unsafe characters with a single dash.
fn slugify(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut last_was_dash = true; // Start true to skip leading dashes

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("git:https://example.com/a.git"), "git-https-example-com-a-git");
    }

    #[test]
    fn test_slugify_collapses_runs() {
        assert_eq!(slugify("--a//b__c--"), "a-b-c");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("dépôt"), "d-p-t");
    }
}
