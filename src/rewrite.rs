// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path and content rewriting.
//!
//! Rewriting is applied to paths and to file content independently. A file
//! whose name carried the placeholder token still gets its content rewritten,
//! and a file whose name did not is still scanned.
//!
//! File content and path components are only ever treated as raw bytes, so
//! everything outside of a token match comes out exactly as it went in. Every
//! file is rewritten by default, binary or not. A [`ContentClassifier`] told to
//! skip binary files detects them up front and has them copied verbatim.

use crate::token::TokenMatcher;

use std::{
    borrow::Cow,
    collections::HashSet,
    ffi::{OsStr, OsString},
    path::{Component, Path, PathBuf},
};

/// Number of leading bytes inspected for NUL bytes.
pub const SNIFF_LEN: usize = 8000;

/// File extensions always treated as binary.
pub const BINARY_EXTENSIONS: &[&str] = &[
    "7z", "a", "avif", "bin", "bmp", "bz2", "class", "dll", "dylib", "eot", "exe", "gif", "gz",
    "ico", "jar", "jpeg", "jpg", "lib", "mp3", "mp4", "o", "obj", "otf", "pdf", "png", "pyc", "so",
    "tar", "tgz", "tif", "tiff", "ttf", "wasm", "webm", "webp", "woff", "woff2", "xz", "zip",
    "zst",
];

/// Map a source-relative path to its destination path.
///
/// Substitutes the placeholder token in every component of `relative`, then
/// joins the result under `dest_root`. Only normal components are kept, so
/// the result can never climb out of `dest_root`.
pub fn rewrite_path(
    matcher: &TokenMatcher,
    relative: impl AsRef<Path>,
    dest_root: impl AsRef<Path>,
    name: &str,
) -> PathBuf {
    let mut dest = dest_root.as_ref().to_path_buf();
    for component in relative.as_ref().components() {
        if let Component::Normal(part) = component {
            dest.push(rewrite_component(matcher, part, name));
        }
    }

    dest
}

/// Substitute the placeholder token in a symlink target.
///
/// Unlike [`rewrite_path`], root, current, and parent directory components are
/// kept so the link still resolves the same way relative to its new location.
pub fn rewrite_link_target(matcher: &TokenMatcher, target: impl AsRef<Path>, name: &str) -> PathBuf {
    let mut dest = PathBuf::new();
    for component in target.as_ref().components() {
        match component {
            Component::Normal(part) => dest.push(rewrite_component(matcher, part, name)),
            other => dest.push(other.as_os_str()),
        }
    }

    dest
}

#[cfg(unix)]
fn rewrite_component(matcher: &TokenMatcher, part: &OsStr, name: &str) -> OsString {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};
    match matcher.replace_bytes(part.as_bytes(), name) {
        Cow::Borrowed(_) => part.to_os_string(),
        Cow::Owned(bytes) => OsString::from_vec(bytes),
    }
}

#[cfg(not(unix))]
fn rewrite_component(matcher: &TokenMatcher, part: &OsStr, name: &str) -> OsString {
    match part.to_str() {
        Some(text) => OsString::from(matcher.replace(text, name).into_owned()),
        None => part.to_os_string(),
    }
}

/// Substitute the placeholder token over entire file content.
pub fn rewrite_content<'c>(matcher: &TokenMatcher, content: &'c [u8], name: &str) -> Cow<'c, [u8]> {
    matcher.replace_bytes(content, name)
}

/// Kind of file content.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Binary,
}

/// Decide whether file content should be rewritten.
///
/// Rewrites everything unless told to skip binary content.
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    extensions: HashSet<String>,
    skip_binary: bool,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl ContentClassifier {
    /// Construct new classifier with extra binary extensions.
    ///
    /// Extensions are matched case-insensitively, and may be given with or
    /// without a leading dot.
    pub fn new(extra_extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let extensions = BINARY_EXTENSIONS
            .iter()
            .map(|ext| ext.to_string())
            .chain(extra_extensions.into_iter().map(Into::into))
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        Self {
            extensions,
            skip_binary: false,
        }
    }

    /// Leave content classified as binary untouched.
    pub fn skip_binary(mut self, yes: bool) -> Self {
        self.skip_binary = yes;
        self
    }

    /// Classify file content by extension first, and NUL byte sniffing second.
    pub fn classify(&self, path: impl AsRef<Path>, content: &[u8]) -> ContentKind {
        let by_extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()));
        let sniffed = content.iter().take(SNIFF_LEN).any(|byte| *byte == 0);

        if by_extension || sniffed {
            ContentKind::Binary
        } else {
            ContentKind::Text
        }
    }

    /// Check if content at path should go through token substitution.
    pub fn should_rewrite(&self, path: impl AsRef<Path>, content: &[u8]) -> bool {
        !self.skip_binary || self.classify(path, content) == ContentKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("trex/handler.go", "/tmp/myapp/myapp/handler.go"; "token directory")]
    #[test_case("RH-TREX.md", "/tmp/myapp/myapp.md"; "token file name")]
    #[test_case("docs/guide.md", "/tmp/myapp/docs/guide.md"; "no token")]
    #[test_case("", "/tmp/myapp"; "source root")]
    #[test_case("../escape/trex", "/tmp/myapp/escape/myapp"; "parent components dropped")]
    #[test]
    fn rewrite_relative_path(relative: &str, expect: &str) {
        let result = rewrite_path(&TokenMatcher::default(), relative, "/tmp/myapp", "myapp");
        pretty_assertions::assert_eq!(result, PathBuf::from(expect));
    }

    #[test]
    fn destination_root_is_never_rewritten() {
        let result = rewrite_path(&TokenMatcher::default(), "trex.go", "/home/trex/out", "app");
        assert_eq!(result, PathBuf::from("/home/trex/out/app.go"));
    }

    #[test_case("/usr/share/trex/logo", "/usr/share/app/logo"; "absolute target")]
    #[test_case("../trex/run.sh", "../app/run.sh"; "relative target keeps parents")]
    #[test_case("./RH-TREX.md", "./app.md"; "sibling target")]
    #[test]
    fn rewrite_symlink_target(target: &str, expect: &str) {
        let result = rewrite_link_target(&TokenMatcher::default(), target, "app");
        pretty_assertions::assert_eq!(result, PathBuf::from(expect));
    }

    #[test]
    fn rewrite_content_only_touches_matches() {
        let content = b"package trex\n\n// RH-Trex keeps\tthis \xc3\xa9 intact\n";
        let result = rewrite_content(&TokenMatcher::default(), content, "widget");
        assert_eq!(
            &result[..],
            b"package widget\n\n// widget keeps\tthis \xc3\xa9 intact\n".as_slice()
        );
    }

    #[test_case("logo.png", b"trex", ContentKind::Binary; "binary extension")]
    #[test_case("LOGO.PNG", b"trex", ContentKind::Binary; "extension ignores case")]
    #[test_case("blob", b"tr\0ex", ContentKind::Binary; "nul byte")]
    #[test_case("main.go", b"package trex", ContentKind::Text; "plain text")]
    #[test_case("Makefile", b"", ContentKind::Text; "empty file")]
    #[test]
    fn classify_content(path: &str, content: &[u8], expect: ContentKind) {
        pretty_assertions::assert_eq!(ContentClassifier::default().classify(path, content), expect);
    }

    #[test]
    fn binary_content_is_rewritten_unless_skipped() {
        let classifier = ContentClassifier::new([".SQLite"]);
        assert_eq!(classifier.classify("db.sqlite", b"trex"), ContentKind::Binary);
        assert!(classifier.should_rewrite("db.sqlite", b"trex"));
        assert!(classifier.should_rewrite("blob", b"trex\0trex"));

        let classifier = classifier.skip_binary(true);
        assert!(!classifier.should_rewrite("db.sqlite", b"trex"));
        assert!(!classifier.should_rewrite("blob", b"trex\0trex"));
        assert!(classifier.should_rewrite("main.go", b"package trex"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_components_are_rewritten() {
        use std::os::unix::ffi::OsStrExt;

        let relative = Path::new(OsStr::from_bytes(b"RH-TREX\xff/\xfetrex.bin"));
        let result = rewrite_path(&TokenMatcher::default(), relative, "/tmp/app", "app");
        assert_eq!(result.as_os_str().as_bytes(), b"/tmp/app/app\xff/\xfeapp.bin");

        let target = Path::new(OsStr::from_bytes(b"../\xfftrex"));
        let result = rewrite_link_target(&TokenMatcher::default(), target, "app");
        assert_eq!(result.as_os_str().as_bytes(), b"../\xffapp");
    }
}
