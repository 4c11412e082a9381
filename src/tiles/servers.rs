//! Mirror selection for tile requests.

use rand::Rng;
use url::Url;

use super::{TileCoordinate, TileError};

/// Public OpenStreetMap tile mirrors.
pub const OPENSTREETMAP_SERVERS: [&str; 3] = [
    "https://a.tile.openstreetmap.org",
    "https://b.tile.openstreetmap.org",
    "https://c.tile.openstreetmap.org",
];

/// An ordered, non-empty set of tile mirrors.
///
/// The pool itself is immutable; the "last used" marker lives in a
/// [`Rotation`] owned by each traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerPool {
    servers: Vec<Url>,
}

/// Which mirror a traversal used last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rotation {
    last: Option<usize>,
}

impl Rotation {
    /// Index of the most recently selected server.
    #[must_use]
    pub fn last(&self) -> Option<usize> {
        self.last
    }
}

impl ServerPool {
    /// Creates a pool from mirror base URLs.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidServer`] when the list is empty or a
    /// server is not an http(s) base URL.
    pub fn new(servers: Vec<Url>) -> Result<Self, TileError> {
        if servers.is_empty() {
            return Err(TileError::invalid_server("", "server pool is empty"));
        }
        for server in &servers {
            if !matches!(server.scheme(), "http" | "https") {
                return Err(TileError::invalid_server(server.as_str(), "scheme must be http or https"));
            }
            if server.cannot_be_a_base() {
                return Err(TileError::invalid_server(server.as_str(), "not a base URL"));
            }
        }
        Ok(Self { servers })
    }

    /// Parses and validates mirror base URLs.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidServer`] for unparseable entries, plus
    /// everything [`ServerPool::new`] rejects.
    pub fn parse<I, S>(servers: I) -> Result<Self, TileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let servers = servers
            .into_iter()
            .map(|raw| {
                Url::parse(raw.as_ref())
                    .map_err(|_| TileError::invalid_server(raw.as_ref(), "not a valid URL"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(servers)
    }

    /// The a/b/c OpenStreetMap mirrors.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the constants are valid URLs.
    pub fn openstreetmap() -> Result<Self, TileError> {
        Self::parse(OPENSTREETMAP_SERVERS)
    }

    #[must_use]
    pub fn servers(&self) -> &[Url] {
        &self.servers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Always false; pools are validated non-empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Picks a server uniformly among those other than the last one used.
    ///
    /// A pool of one always returns its only member.
    pub fn select<R: Rng + ?Sized>(&self, rotation: &mut Rotation, rng: &mut R) -> &Url {
        let count = self.servers.len();
        let index = match rotation.last {
            _ if count == 1 => 0,
            Some(last) if last < count => {
                let pick = rng.gen_range(0..count - 1);
                if pick >= last { pick + 1 } else { pick }
            }
            _ => rng.gen_range(0..count),
        };
        rotation.last = Some(index);
        &self.servers[index]
    }

    /// Builds `{server}/{z}/{x}/{y}.png`, keeping any path prefix of the server.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidServer`] if the server URL cannot take
    /// path segments.
    pub fn tile_url(server: &Url, tile: &TileCoordinate) -> Result<Url, TileError> {
        let mut url = server.clone();
        url.path_segments_mut()
            .map_err(|()| TileError::invalid_server(server.as_str(), "not a base URL"))?
            .pop_if_empty()
            .extend([
                tile.zoom().to_string(),
                tile.x().to_string(),
                format!("{}.png", tile.y()),
            ]);
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tiles::Zoom;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_openstreetmap_pool() {
        let pool = ServerPool::openstreetmap().unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.servers()[1].host_str(), Some("b.tile.openstreetmap.org"));
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        assert!(matches!(
            ServerPool::new(Vec::new()),
            Err(TileError::InvalidServer { .. })
        ));
    }

    #[test]
    fn test_non_http_server_is_rejected() {
        assert!(ServerPool::parse(["ftp://tiles.example"]).is_err());
        assert!(ServerPool::parse(["mailto:tiles@example.com"]).is_err());
        assert!(ServerPool::parse(["not a url"]).is_err());
    }

    #[test]
    fn test_select_never_repeats_consecutively() {
        let pool = ServerPool::openstreetmap().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut rotation = Rotation::default();
        let mut previous = pool.select(&mut rotation, &mut rng).clone();
        let mut seen = [0usize; 3];
        for _ in 0..1000 {
            let next = pool.select(&mut rotation, &mut rng).clone();
            assert_ne!(next, previous);
            let index = pool.servers().iter().position(|s| *s == next).unwrap();
            assert_eq!(rotation.last(), Some(index));
            seen[index] += 1;
            previous = next;
        }
        assert!(seen.iter().all(|&count| count > 0), "{seen:?}");
    }

    #[test]
    fn test_select_two_servers_alternates() {
        let pool = ServerPool::parse(["http://one.example", "http://two.example"]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut rotation = Rotation::default();
        let first = pool.select(&mut rotation, &mut rng).clone();
        for i in 0..10 {
            let pick = pool.select(&mut rotation, &mut rng);
            if i % 2 == 0 {
                assert_ne!(*pick, first);
            } else {
                assert_eq!(*pick, first);
            }
        }
    }

    #[test]
    fn test_select_single_server_always_returns_it() {
        let pool = ServerPool::parse(["http://only.example"]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut rotation = Rotation::default();
        for _ in 0..100 {
            assert_eq!(pool.select(&mut rotation, &mut rng).as_str(), "http://only.example/");
        }
    }

    #[test]
    fn test_tile_url_layout() {
        let tile = TileCoordinate::new(Zoom::new(4).unwrap(), 5, 2);
        let root = Url::parse("http://a.tile.openstreetmap.org").unwrap();
        assert_eq!(
            ServerPool::tile_url(&root, &tile).unwrap().as_str(),
            "http://a.tile.openstreetmap.org/4/5/2.png"
        );
        let prefixed = Url::parse("https://maps.example/osm/").unwrap();
        assert_eq!(
            ServerPool::tile_url(&prefixed, &tile).unwrap().as_str(),
            "https://maps.example/osm/4/5/2.png"
        );
    }
}
