use std::path::{Component, Path};

pub const CLASS_EXTENSION: &str = "class";
pub const SOURCE_EXTENSION: &str = "java";

/// Derives the fully-qualified name of a class from its path inside the archive,
/// e.g. `com/acme/Foo.class` becomes `com.acme.Foo`.
///
/// Classes of a multi-release jar (`META-INF/versions/<N>/...`) are named as if they lived
/// at the archive root. Returns `None` for paths that are not class files.
pub fn derive(relative: &Path) -> Option<String> {
    if relative.extension()? != CLASS_EXTENSION {
        return None;
    }

    let stem = relative.with_extension("");
    let mut parts = Vec::new();
    for component in stem.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if let ["META-INF", "versions", version, rest @ ..] = parts.as_slice() {
        if !rest.is_empty() && version.bytes().all(|b| b.is_ascii_digit()) {
            return Some(rest.join("."));
        }
    }

    Some(parts.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_becomes_dotted_prefix() {
        assert_eq!(
            derive(Path::new("com/acme/Foo.class")).as_deref(),
            Some("com.acme.Foo")
        );
    }

    #[test]
    fn default_package() {
        assert_eq!(derive(Path::new("Main.class")).as_deref(), Some("Main"));
    }

    #[test]
    fn multi_release_prefix_is_dropped() {
        assert_eq!(
            derive(Path::new("META-INF/versions/11/com/acme/Foo.class")).as_deref(),
            Some("com.acme.Foo")
        );
    }

    #[test]
    fn module_info_in_versions_dir() {
        assert_eq!(
            derive(Path::new("META-INF/versions/9/module-info.class")).as_deref(),
            Some("module-info")
        );
    }

    #[test]
    fn non_class_files_have_no_name() {
        assert_eq!(derive(Path::new("META-INF/MANIFEST.MF")), None);
        assert_eq!(derive(Path::new("com/acme/messages.properties")), None);
    }

    #[test]
    fn nested_default_package_is_not_confused_with_versions() {
        assert_eq!(
            derive(Path::new("META-INF/versions/Foo.class")).as_deref(),
            Some("META-INF.versions.Foo")
        );
    }

    #[test]
    fn escaping_paths_have_no_name() {
        assert_eq!(derive(Path::new("../Foo.class")), None);
    }
}
