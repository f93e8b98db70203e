use core::fmt;

use url::Url;

const SEP: char = '/';

/// Base address of an imgpress server and the routes it serves.
#[derive(Clone, Debug)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    #[must_use]
    pub fn new(uri: &str) -> Option<Endpoint> {
        let base = Url::parse(uri).ok()?;
        if base.cannot_be_a_base() {
            return None;
        }
        Some(Endpoint { url: base })
    }

    #[must_use]
    pub fn images(&self) -> Url {
        self.join(&["api", "images"])
    }

    #[must_use]
    pub fn download(&self, id: &str) -> Url {
        self.join(&["api", "images", id, "download"])
    }

    #[must_use]
    pub fn analytics(&self) -> Url {
        self.join(&["api", "images", "analytics"])
    }

    /// Appends segments to the base path, keeping any prefix the base has.
    fn join(&self, segments: &[&str]) -> Url {
        let mut url = self.url.clone();
        let base: Vec<String> = self
            .url
            .path()
            .split(SEP)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        if let Ok(mut path) = url.path_segments_mut() {
            path.clear();
            path.extend(base.iter().map(String::as_str));
            // segments are percent encoded by `extend`
            path.extend(segments);
        }
        url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn new_correct_some() {
        // Act
        let r = Endpoint::new("http://localhost:5000");

        // Assert
        assert!(r.is_some());
    }

    #[rstest]
    #[case("http/localhost")]
    #[case("localhost:5000")]
    #[case("")]
    #[trace]
    fn new_incorrect_none(#[case] uri: &str) {
        assert!(Endpoint::new(uri).is_none());
    }

    #[rstest]
    #[case("http://localhost:5000", "http://localhost:5000/api/images")]
    #[case("http://localhost:5000/", "http://localhost:5000/api/images")]
    #[case("http://host/prefix", "http://host/prefix/api/images")]
    #[case("http://host/prefix/", "http://host/prefix/api/images")]
    #[trace]
    fn images(#[case] base: &str, #[case] expected: &str) {
        // Arrange
        let e = Endpoint::new(base).unwrap();

        // Act
        let url = e.images();

        // Assert
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn download_encodes_id() {
        // Arrange
        let e = Endpoint::new("http://localhost:5000").unwrap();

        // Act
        let url = e.download("a b/c");

        // Assert
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/images/a%20b%2Fc/download"
        );
    }

    #[test]
    fn analytics_route() {
        // Arrange
        let e = Endpoint::new("http://localhost:5000/").unwrap();

        // Act
        let url = e.analytics();

        // Assert
        assert_eq!(url.as_str(), "http://localhost:5000/api/images/analytics");
    }
}
