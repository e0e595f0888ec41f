//! Command implementations.

use anyhow::Context;
use camino::Utf8Path;

pub mod analyze;
pub mod assessments;
pub mod info;
#[cfg(feature = "mcp")]
pub mod serve;
pub mod worker;

/// Read a file and validate its size against the configured limit.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    // Preflight: check file size via metadata before reading into memory.
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if size > max {
            anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    let content = std::fs::read_to_string(path.as_std_path())
        .with_context(|| format!("failed to read {path}"))?;
    Ok(content)
}

/// Feedback text without its link markup, for terminal output.
pub fn plain_feedback(feedback: &str) -> String {
    let mut plain = String::with_capacity(feedback.len());
    let mut in_tag = false;
    for c in feedback.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => plain.push(c),
            _ => {}
        }
    }
    plain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_anchor_markup() {
        let feedback = r#"<a href='https://yoa.st/33v' target='_blank'>Keyphrase length</a>: Good job!"#;
        assert_eq!(plain_feedback(feedback), "Keyphrase length: Good job!");
    }

    #[test]
    fn rejects_oversized_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::try_from(dir.path().join("big.md")).unwrap();
        std::fs::write(&path, "x".repeat(64)).unwrap();
        let err = read_input_file(&path, Some(10)).unwrap_err();
        assert!(err.to_string().contains("input too large"));
        assert_eq!(read_input_file(&path, None).unwrap().len(), 64);
    }
}
