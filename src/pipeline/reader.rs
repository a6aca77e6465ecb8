use std::io::BufRead;
use std::path::PathBuf;

/// Read newline-separated input paths. Blank lines and `#` comments are skipped.
pub fn read_paths(input: &mut dyn BufRead) -> Result<Vec<PathBuf>, String> {
    let mut paths = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line
            .map_err(|error| format!("failed reading path list line {}: {error}", index + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        paths.push(PathBuf::from(trimmed));
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::read_paths;
    use std::io::Cursor;
    use std::path::PathBuf;

    #[test]
    fn reads_paths_skipping_blanks_and_comments() {
        let mut input = Cursor::new("a.pdf\n\n  # scanned batch\n  dir/b.txt  \n");
        let paths = read_paths(&mut input).expect("read paths");
        assert_eq!(paths, vec![PathBuf::from("a.pdf"), PathBuf::from("dir/b.txt")]);
    }

    #[test]
    fn rejects_non_utf8_input() {
        let mut input = Cursor::new(vec![b'a', 0xff, b'\n']);
        let error = read_paths(&mut input).expect_err("invalid utf-8");
        assert!(error.contains("line 1"));
    }
}
