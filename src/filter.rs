use crate::error::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};

/// Decides which paths a scan must skip.
///
/// An ignore entry excludes a path when the path ends with it, or when the
/// entry, read as a shell glob, matches the whole path. Separators are
/// compared as `/` on every platform.
#[derive(Clone, Debug)]
pub struct IgnoreFilter {
    suffixes: Vec<String>,
    globs: GlobSet,
}

impl IgnoreFilter {
    pub fn new(ignores: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut suffixes = Vec::with_capacity(ignores.len());

        for ignore in ignores {
            let normalized = normalize(ignore);
            let glob = GlobBuilder::new(&normalized)
                .literal_separator(true)
                .build()?;

            debug!("Adding ignore: {}", normalized);
            builder.add(glob);
            suffixes.push(normalized);
        }

        Ok(Self {
            suffixes,
            globs: builder.build()?,
        })
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = to_slash(&path.to_string_lossy());

        if let Some(suffix) = self.suffixes.iter().find(|s| path.ends_with(s.as_str())) {
            debug!("Ignoring {:?}: ends with {:?}", path, suffix);
            return true;
        }

        if self.globs.is_match(&path) {
            debug!("Ignoring {:?}: matched ignore pattern", path);
            return true;
        }

        false
    }
}

/// Lexically cleans an ignore entry: repeated and trailing separators and
/// `.` components go away, and `..` folds into the component before it.
/// `..` at the start of a relative entry is kept; at the root it is dropped.
fn normalize(entry: &str) -> String {
    let mut parts: Vec<Component> = Vec::new();
    for component in Path::new(entry).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    let cleaned: PathBuf = parts.into_iter().collect();
    let cleaned = to_slash(&cleaned.to_string_lossy());
    if cleaned.is_empty() {
        String::from(".")
    } else {
        cleaned
    }
}

fn to_slash(path: &str) -> String {
    if cfg!(windows) {
        path.replace('\\', "/")
    } else {
        path.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize, IgnoreFilter};
    use std::path::Path;

    fn filter(ignores: &[&str]) -> IgnoreFilter {
        let ignores: Vec<String> = ignores.iter().map(|s| s.to_string()).collect();
        IgnoreFilter::new(&ignores).unwrap()
    }

    #[test]
    fn allows_everything_by_default() {
        let filter = filter(&[]);

        assert!(!filter.is_excluded(Path::new("/home/user/project/src/main.rs")));
    }

    #[test]
    fn excludes_suffix() {
        let filter = filter(&[".git", "node_modules"]);

        assert!(filter.is_excluded(Path::new("/home/user/project/.git")));
        assert!(filter.is_excluded(Path::new("/home/user/project/web/node_modules")));
        assert!(!filter.is_excluded(Path::new("/home/user/project/.git/HEAD")));
        assert!(!filter.is_excluded(Path::new("/home/user/project/src/main.rs")));
    }

    #[test]
    fn suffix_is_textual() {
        let filter = filter(&["log"]);

        assert!(filter.is_excluded(Path::new("/var/app/changelog")));
    }

    #[test]
    fn excludes_glob_over_whole_path() {
        let filter = filter(&["/home/user/project/*.swp"]);

        assert!(filter.is_excluded(Path::new("/home/user/project/.main.rs.swp")));
        assert!(!filter.is_excluded(Path::new("/home/user/project/src/.lib.rs.swp")));
    }

    #[test]
    fn star_does_not_cross_separators() {
        let filter = filter(&["*.rs"]);

        assert!(filter.is_excluded(Path::new("main.rs")));
        assert!(!filter.is_excluded(Path::new("/home/user/project/main.rs")));
    }

    #[test]
    fn double_star_crosses_separators() {
        let filter = filter(&["**/target/**"]);

        assert!(filter.is_excluded(Path::new("/home/user/project/target/debug/app")));
        assert!(!filter.is_excluded(Path::new("/home/user/project/src/app")));
    }

    #[test]
    fn cleans_entries() {
        assert_eq!(normalize("./target/"), "target");
        assert_eq!(normalize("a//b/./c"), "a/b/c");
        assert_eq!(normalize("./"), ".");
        assert_eq!(normalize("../sibling"), "../sibling");
    }

    #[test]
    fn folds_parent_components() {
        assert_eq!(normalize("a/../b"), "b");
        assert_eq!(normalize("src/gen/../../target"), "target");
        assert_eq!(normalize("a/b/../../.."), "..");
        assert_eq!(normalize("a/.."), ".");
        assert_eq!(normalize("/../etc"), "/etc");
    }

    #[test]
    fn folded_entries_still_match() {
        let filter = filter(&["web/../node_modules"]);

        assert!(filter.is_excluded(Path::new("/home/user/project/node_modules")));
        assert!(!filter.is_excluded(Path::new("/home/user/project/web/src")));
    }

    #[test]
    fn cleaned_entries_still_match() {
        let filter = filter(&["./target/"]);

        assert!(filter.is_excluded(Path::new("/home/user/project/target")));
    }

    #[test]
    fn rejects_malformed_glob() {
        assert!(IgnoreFilter::new(&["src/[abc".to_string()]).is_err());
    }

    #[test]
    fn nonexistent_entries_are_fine() {
        let filter = filter(&["does/not/exist/yet"]);

        assert!(filter.is_excluded(Path::new("/tmp/does/not/exist/yet")));
    }
}
