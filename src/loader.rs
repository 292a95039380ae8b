use std::borrow::Cow;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;
use url::Url;

use super::error::RetrievalError;

mod ftp;

/// Where the text of a document comes from.
pub enum Source<'a> {
    /// The document itself.
    Text(&'a str),
    /// UTF-8 encoded document text.
    Bytes(&'a [u8]),
    /// A stream producing UTF-8 encoded document text. It is read to the end.
    Reader(Box<dyn Read + 'a>),
    /// An `http`, `https` or `ftp` URL.
    Url(Url),
    Path(PathBuf),
}

impl<'a> Source<'a> {
    /// Classifies a string the way a user would mean it on the command line: a string starting
    /// with `http:`, `https:` or `ftp:` is a URL, the path of an existing file is a path, and
    /// anything else is the document text itself.
    pub fn guess(input: &'a str) -> Self {
        let has_remote_scheme = ["http:", "https:", "ftp:"].iter().any(|scheme| {
            input
                .get(..scheme.len())
                .map_or(false, |prefix| prefix.eq_ignore_ascii_case(scheme))
        });
        if has_remote_scheme {
            if let Ok(url) = Url::parse(input) {
                return Self::Url(url);
            }
        }
        if Path::new(input).is_file() {
            return Self::Path(input.into());
        }
        Self::Text(input)
    }

    pub fn reader(reader: impl Read + 'a) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// Retrieves the document text.
    pub fn into_text(self) -> Result<Cow<'a, str>, RetrievalError> {
        match self {
            Self::Text(text) => Ok(Cow::Borrowed(text)),
            Self::Bytes(bytes) => Ok(Cow::Borrowed(std::str::from_utf8(bytes)?)),
            Self::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                decode(bytes).map(Cow::Owned)
            }
            Self::Url(url) => fetch(&url).map(Cow::Owned),
            Self::Path(path) => {
                debug!("reading {}", path.display());
                match fs::read(&path) {
                    Ok(bytes) => decode(bytes).map(Cow::Owned),
                    Err(source) => Err(RetrievalError::File { path, source }),
                }
            }
        }
    }
}

fn decode(bytes: Vec<u8>) -> Result<String, RetrievalError> {
    String::from_utf8(bytes).map_err(|error| RetrievalError::Utf8(error.utf8_error()))
}

fn fetch(url: &Url) -> Result<String, RetrievalError> {
    debug!("fetching {url}");
    match url.scheme() {
        "http" | "https" => {
            let http_error = |source| RetrievalError::Http {
                url: url.to_string(),
                source,
            };
            let bytes = reqwest::blocking::get(url.as_str())
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.bytes())
                .map_err(http_error)?;
            decode(bytes.to_vec())
        }
        "ftp" => decode(ftp::retrieve(url)?),
        scheme => Err(RetrievalError::UnsupportedScheme(scheme.into())),
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a [u8]> for Source<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Url> for Source<'_> {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl From<PathBuf> for Source<'_> {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a Path> for Source<'a> {
    fn from(path: &'a Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;

    #[test]
    fn literal_sources() {
        assert_eq!(Source::from("f: function()").into_text().unwrap(), "f: function()");
        assert_eq!(
            Source::from(&b"record r {}"[..]).into_text().unwrap(),
            "record r {}"
        );
        assert_eq!(
            Source::reader(Cursor::new("enum e { a }")).into_text().unwrap(),
            "enum e { a }"
        );
    }

    #[test]
    fn invalid_utf8_is_a_retrieval_error() {
        let bytes = [b'a', 0xff, b'b'];
        assert!(matches!(
            Source::from(&bytes[..]).into_text(),
            Err(RetrievalError::Utf8(_))
        ));
        assert!(matches!(
            Source::reader(Cursor::new(bytes)).into_text(),
            Err(RetrievalError::Utf8(_))
        ));
    }

    #[test]
    fn files_are_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "flags f {{ a, b }}").unwrap();

        assert_eq!(
            Source::from(file.path()).into_text().unwrap(),
            "flags f { a, b }"
        );

        let path = file.path().to_str().unwrap();
        assert!(matches!(Source::guess(path), Source::Path(_)));
    }

    #[test]
    fn missing_files_name_the_path() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("missing.witx");
        match Source::from(path.clone()).into_text() {
            Err(RetrievalError::File { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a file error, got {other:?}"),
        }
    }

    #[test]
    fn guessing() {
        assert!(matches!(
            Source::guess("https://example.com/a.witx"),
            Source::Url(url) if url.scheme() == "https"
        ));
        assert!(matches!(
            Source::guess("FTP://example.com/a.witx"),
            Source::Url(url) if url.scheme() == "ftp"
        ));
        assert!(matches!(
            Source::guess("f: function()"),
            Source::Text("f: function()")
        ));
        // not one of the remote schemes
        assert!(matches!(
            Source::guess("file:///etc/a.witx"),
            Source::Text(_)
        ));
    }

    #[test]
    fn unsupported_schemes_are_rejected() {
        let url = Url::parse("gopher://example.com/a.witx").unwrap();
        assert!(matches!(
            Source::from(url).into_text(),
            Err(RetrievalError::UnsupportedScheme(scheme)) if scheme == "gopher"
        ));
    }
}
